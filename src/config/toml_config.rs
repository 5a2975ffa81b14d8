use crate::core::notifier::NotifyPolicy;
use crate::core::resolver::MAX_PROVIDERS;
use crate::core::ConfigProvider;
use crate::utils::error::{BatchError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOOKUP_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub input: InputConfig,
    pub providers: Vec<ProviderConfig>,
    pub mail: MailConfig,
    pub output: OutputConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: String,
    pub code_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// 查詢網址，`{cep}` 會被替換為正規化後的 CEP
    pub url_template: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
    pub field_mapping: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub timeout_seconds: u64,
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub credentials_file: String,
    pub template_file: String,
    pub policy: NotifyPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub dataset_filename: String,
    pub report_filename: String,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub lines_per_page: usize,
}

fn default_lookup_timeout() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_SECONDS
}

pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "viacep".to_string(),
            url_template: "https://viacep.com.br/ws/{cep}/json/".to_string(),
            timeout_seconds: DEFAULT_LOOKUP_TIMEOUT_SECONDS,
            field_mapping: None,
        },
        ProviderConfig {
            name: "opencep".to_string(),
            url_template: "https://api.opencep.com/v1/{cep}".to_string(),
            timeout_seconds: DEFAULT_LOOKUP_TIMEOUT_SECONDS,
            field_mapping: None,
        },
    ]
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            providers: default_providers(),
            mail: MailConfig::default(),
            output: OutputConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "ceps_lista.csv".to_string(),
            code_field: "CEP".to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            timeout_seconds: 30,
            sender: String::new(),
            recipient: String::new(),
            subject: "Informações para o CEP ${code}".to_string(),
            credentials_file: "pass.txt".to_string(),
            template_file: "email_modelo.html".to_string(),
            policy: NotifyPolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            dataset_filename: "dados_ceps_completos.csv".to_string(),
            report_filename: "relatorio.txt".to_string(),
            log_file: Some("processamento.log".to_string()),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { lines_per_page: 25 }
    }
}

impl BatchConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BatchError::ResourceError {
            kind: "configuration".to_string(),
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SMTP_SENDER})；只處理大寫名稱，郵件範本的 ${code} 等保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([A-Z][A-Z0-9_]*)\}").map_err(|e| {
            BatchError::ConfigError {
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn dataset_path(&self) -> PathBuf {
        Path::new(&self.output.path).join(&self.output.dataset_filename)
    }

    pub fn report_path(&self) -> PathBuf {
        Path::new(&self.output.path).join(&self.output.report_filename)
    }

    /// 日誌檔放在輸出目錄下 (絕對路徑除外)
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.output
            .log_file
            .as_ref()
            .map(|file| Path::new(&self.output.path).join(file))
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extensions(
            "input.path",
            std::slice::from_ref(&self.input.path),
            &["csv"],
        )?;
        validation::validate_non_empty_string("input.code_field", &self.input.code_field)?;

        validation::validate_range("providers", self.providers.len(), 1, MAX_PROVIDERS)?;
        for (index, provider) in self.providers.iter().enumerate() {
            let prefix = format!("providers[{}]", index);
            validation::validate_non_empty_string(&format!("{}.name", prefix), &provider.name)?;
            validation::validate_url_template(
                &format!("{}.url_template", prefix),
                &provider.url_template,
            )?;
            validation::validate_range(
                &format!("{}.timeout_seconds", prefix),
                provider.timeout_seconds,
                1,
                120,
            )?;
        }

        validation::validate_non_empty_string("mail.smtp_host", &self.mail.smtp_host)?;
        validation::validate_email_address("mail.sender", &self.mail.sender)?;
        validation::validate_email_address("mail.recipient", &self.mail.recipient)?;
        validation::validate_path("mail.credentials_file", &self.mail.credentials_file)?;
        validation::validate_path("mail.template_file", &self.mail.template_file)?;
        validation::validate_positive_number(
            "mail.timeout_seconds",
            self.mail.timeout_seconds as usize,
            1,
        )?;

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_path("output.dataset_filename", &self.output.dataset_filename)?;
        validation::validate_path("output.report_filename", &self.output.report_filename)?;
        if let Some(log_file) = &self.output.log_file {
            validation::validate_path("output.log_file", log_file)?;
        }

        validation::validate_positive_number("report.lines_per_page", self.report.lines_per_page, 1)?;

        Ok(())
    }
}

impl ConfigProvider for BatchConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn code_field(&self) -> &str {
        &self.input.code_field
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn dataset_filename(&self) -> &str {
        &self.output.dataset_filename
    }

    fn report_filename(&self) -> &str {
        &self.output.report_filename
    }

    fn lines_per_page(&self) -> usize {
        self.report.lines_per_page
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
