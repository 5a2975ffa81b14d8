pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::notifier::NotifyPolicy;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::BatchConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "cep-batch")]
#[command(about = "Resolve CEPs in batch, notify by e-mail and build a summary report")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Input CSV with the CEP list
    #[arg(long)]
    pub input: Option<String>,

    /// Name of the column holding the CEPs
    #[arg(long)]
    pub code_field: Option<String>,

    /// Directory for the dataset, report and log
    #[arg(long)]
    pub output_dir: Option<String>,

    /// File holding the SMTP password
    #[arg(long)]
    pub credentials_file: Option<String>,

    /// HTML e-mail template
    #[arg(long)]
    pub template: Option<String>,

    #[arg(long)]
    pub sender: Option<String>,

    #[arg(long)]
    pub recipient: Option<String>,

    /// What to do with records already notified
    #[arg(long, value_enum)]
    pub notify_policy: Option<NotifyPolicy>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit console logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage after each stage")]
    pub monitor: bool,

    #[arg(long, help = "Validate configuration and show what would run")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML (若有指定) 後套用命令列覆蓋
    pub fn load_batch_config(&self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_file(path)?,
            None => BatchConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut BatchConfig) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(code_field) = &self.code_field {
            config.input.code_field = code_field.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output.path = output_dir.clone();
        }
        if let Some(credentials_file) = &self.credentials_file {
            config.mail.credentials_file = credentials_file.clone();
        }
        if let Some(template) = &self.template {
            config.mail.template_file = template.clone();
        }
        if let Some(sender) = &self.sender {
            config.mail.sender = sender.clone();
        }
        if let Some(recipient) = &self.recipient {
            config.mail.recipient = recipient.clone();
        }
        if let Some(policy) = self.notify_policy {
            config.mail.policy = policy;
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::try_parse_from([
            "cep-batch",
            "--input",
            "ceps_lista_30.csv",
            "--output-dir",
            "/tmp/out",
            "--sender",
            "robot@example.com",
            "--recipient",
            "ops@example.com",
            "--notify-policy",
            "resend",
        ])
        .unwrap();

        let config = cli.load_batch_config().unwrap();
        assert_eq!(config.input.path, "ceps_lista_30.csv");
        assert_eq!(config.output.path, "/tmp/out");
        assert_eq!(config.mail.sender, "robot@example.com");
        assert_eq!(config.mail.policy, NotifyPolicy::Resend);
        assert_eq!(config.input.code_field, "CEP");
    }

    #[test]
    fn test_cli_flags_default_to_off() {
        let cli = CliConfig::try_parse_from(["cep-batch"]).unwrap();
        assert!(!cli.verbose);
        assert!(!cli.dry_run);
        assert!(cli.notify_policy.is_none());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let cli = CliConfig::try_parse_from(["cep-batch", "--config", "/nonexistent/cep.toml"])
            .unwrap();
        assert!(cli.load_batch_config().is_err());
    }
}
