pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::mail::SmtpMailer;
pub use config::{cli::LocalStorage, toml_config::BatchConfig};
pub use core::{
    etl::{BatchEngine, NotificationResources, RunOutcome},
    notifier::{Notifier, NotifyPolicy},
    pipeline::BatchPipeline,
    report::{ReportAggregator, ReportSummary},
    resolver::Resolver,
    template::EmailTemplate,
};
pub use domain::model::{BatchResultSet, CodeRecord, LookupStatus, NotifyStatus};
pub use utils::error::{BatchError, Result};
