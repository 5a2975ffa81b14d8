use crate::core::CodeRecord;
use crate::utils::error::{BatchError, Result};
use regex::{Captures, Regex};
use std::path::Path;

/// 以 `${name}` 佔位符為基礎的郵件範本
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    source: String,
}

impl EmailTemplate {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| BatchError::ResourceError {
            kind: "email template".to_string(),
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(&source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 逐字替換佔位符；未知的佔位符保持原樣
    pub fn render(&self, record: &CodeRecord) -> Result<String> {
        let fields = record
            .fields
            .as_ref()
            .ok_or_else(|| BatchError::RenderError {
                message: format!("CEP {} has no resolved address fields", record.code),
            })?;

        let re = Regex::new(r"\$\{([A-Za-z_]+)\}").map_err(|e| BatchError::RenderError {
            message: e.to_string(),
        })?;

        let rendered = re.replace_all(&self.source, |caps: &Captures| {
            let value = match &caps[1] {
                "code" | "cep" => record.code.as_str(),
                "street" | "logradouro" => fields.street.as_str(),
                "district" | "bairro" => fields.district.as_str(),
                "city" | "cidade" => fields.city.as_str(),
                "region" | "estado" => fields.region.as_str(),
                _ => return caps[0].to_string(),
            };
            value.to_string()
        });

        Ok(rendered.into_owned())
    }
}
