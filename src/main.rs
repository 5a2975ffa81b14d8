use anyhow::Context;
use cep_batch::utils::error::{BatchError, ErrorSeverity};
use cep_batch::utils::{logger, validation::Validate};
use cep_batch::{
    BatchConfig, BatchEngine, BatchPipeline, CliConfig, LocalStorage, NotificationResources,
    Notifier, Resolver, SmtpMailer,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.load_batch_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let log_file = config.log_file_path();
    if let Err(e) = logger::init_cli_logger(cli.verbose, cli.log_json, log_file.as_deref()) {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("Starting cep-batch");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        display_config_summary(&config);
        return Ok(());
    }

    let resolver =
        Resolver::from_config(&config.providers).context("Failed to build lookup providers")?;
    let mailer = SmtpMailer::new(
        &config.mail.smtp_host,
        config.mail.smtp_port,
        Duration::from_secs(config.mail.timeout_seconds),
    );
    let notifier = Notifier::new(mailer, &config.mail.sender, &config.mail.recipient)
        .with_subject(&config.mail.subject)
        .with_policy(config.mail.policy);
    let resources = NotificationResources {
        template_file: PathBuf::from(&config.mail.template_file),
        credentials_file: PathBuf::from(&config.mail.credentials_file),
        username: config.mail.sender.clone(),
    };

    // 相對路徑以目前工作目錄為基準
    let storage = LocalStorage::new(".".to_string());
    let pipeline = BatchPipeline::new(storage, config, resolver);
    let engine = BatchEngine::new_with_monitoring(pipeline, notifier, resources, cli.monitor);

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ CEP batch completed successfully!");
            println!("✅ CEP batch completed successfully!");
            println!("📁 Dataset saved to: {}", outcome.dataset_path);
            println!("📄 Report saved to: {}", outcome.report_path);
            println!(
                "📊 Lookups: {} ok / {} failed | E-mails: {} sent / {} failed",
                outcome.summary.lookup_success,
                outcome.summary.lookup_failed,
                outcome.summary.notify_sent,
                outcome.summary.notify_failed
            );
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn exit_with(e: BatchError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ CEP batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn display_config_summary(config: &BatchConfig) {
    println!("📋 Configuration Summary:");
    println!(
        "  Input: {} (column '{}')",
        config.input.path, config.input.code_field
    );
    println!("  Providers (in order):");
    for provider in &config.providers {
        println!(
            "    - {}: {} (timeout {}s)",
            provider.name, provider.url_template, provider.timeout_seconds
        );
    }
    println!(
        "  SMTP: {}:{} as {}",
        config.mail.smtp_host, config.mail.smtp_port, config.mail.sender
    );
    println!("  Recipient: {}", config.mail.recipient);
    println!("  Template: {}", config.mail.template_file);
    println!("  Notify policy: {:?}", config.mail.policy);
    println!("  Dataset: {}", config.dataset_path().display());
    println!("  Report: {}", config.report_path().display());
    if let Some(log_file) = config.log_file_path() {
        println!("  Log: {}", log_file.display());
    }
    println!("  🔍 DRY RUN MODE - nothing was processed");
}
