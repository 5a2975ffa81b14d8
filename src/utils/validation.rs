use crate::utils::error::{BatchError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => {
            match url.scheme() {
                "http" | "https" => Ok(()),
                scheme => Err(BatchError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: format!("Unsupported URL scheme: {}", scheme),
                }),
            }
        }
        Err(e) => Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(field_name: &str, files: &[String], allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(extension) {
                return Err(BatchError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(BatchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: "File has no extension or invalid filename".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 供應商網址必須包含 `{cep}`，替換後須為合法的 http(s) URL
pub fn validate_url_template(field_name: &str, template: &str) -> Result<()> {
    if !template.contains("{cep}") {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: template.to_string(),
            reason: "URL template must contain the {cep} placeholder".to_string(),
        });
    }
    validate_url(field_name, &template.replace("{cep}", "01001000"))
}

pub fn validate_email_address(field_name: &str, address: &str) -> Result<()> {
    validate_non_empty_string(field_name, address)?;
    address
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|e| BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: address.to_string(),
            reason: format!("Invalid email address: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("providers.url_template", "https://example.com").is_ok());
        assert!(validate_url("providers.url_template", "http://example.com").is_ok());
        assert!(validate_url("providers.url_template", "").is_err());
        assert!(validate_url("providers.url_template", "invalid-url").is_err());
        assert!(validate_url("providers.url_template", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("report.lines_per_page", 25, 1).is_ok());
        assert!(validate_positive_number("report.lines_per_page", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["ceps_lista_30.csv".to_string()];
        assert!(validate_file_extensions("input.path", &files, &["csv"]).is_ok());

        let invalid_files = vec!["dados.xlsx".to_string()];
        assert!(validate_file_extensions("input.path", &invalid_files, &["csv"]).is_err());
    }

    #[test]
    fn test_validate_url_template() {
        assert!(validate_url_template("url_template", "https://viacep.com.br/ws/{cep}/json/").is_ok());
        assert!(validate_url_template("url_template", "https://viacep.com.br/ws/json/").is_err());
        assert!(validate_url_template("url_template", "ftp://example.com/{cep}").is_err());
    }

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("mail.sender", "robot@example.com").is_ok());
        assert!(validate_email_address("mail.sender", "").is_err());
        assert!(validate_email_address("mail.sender", "robot").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("providers", 2usize, 1, 2).is_ok());
        assert!(validate_range("providers", 3usize, 1, 2).is_err());
        assert!(validate_range("providers", 0usize, 1, 2).is_err());
    }
}