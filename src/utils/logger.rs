use crate::utils::error::{BatchError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type FileLayer<S> = fmt::Layer<S, DefaultFields, Format, Mutex<File>>;

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cep_batch=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cep_batch=info"))
    }
}

/// 附加模式的日誌檔，每行帶時間戳記與等級，不使用 ANSI 色碼
pub fn file_layer<S>(path: &Path) -> Result<FileLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false))
}

/// 終端輸出 (compact 或 JSON) 加上附加模式的日誌檔
pub fn init_cli_logger(verbose: bool, json: bool, log_file: Option<&Path>) -> Result<()> {
    let compact_layer = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });

    let json_layer = json.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .json()
    });

    let file_layer = log_file.map(file_layer).transpose()?;

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(compact_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BatchError::ConfigError {
            message: format!("Failed to initialise logging: {}", e),
        })
}
