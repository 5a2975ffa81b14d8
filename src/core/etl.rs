use crate::adapters::mail::load_credentials;
use crate::core::notifier::Notifier;
use crate::core::pipeline::BatchPipeline;
use crate::core::report::{ReportAggregator, ReportSummary};
use crate::core::template::EmailTemplate;
use crate::core::{ConfigProvider, MailTransport, Pipeline, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;
use tracing::Instrument;

/// 通知階段才讀取的檔案
#[derive(Debug, Clone)]
pub struct NotificationResources {
    pub template_file: PathBuf,
    pub credentials_file: PathBuf,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub dataset_path: String,
    pub report_path: String,
    pub summary: ReportSummary,
}

pub struct BatchEngine<S: Storage, C: ConfigProvider, T: MailTransport> {
    pipeline: BatchPipeline<S, C>,
    notifier: Notifier<T>,
    resources: NotificationResources,
    monitor: SystemMonitor,
}

impl<S: Storage, C: ConfigProvider, T: MailTransport> BatchEngine<S, C, T> {
    pub fn new(
        pipeline: BatchPipeline<S, C>,
        notifier: Notifier<T>,
        resources: NotificationResources,
    ) -> Self {
        Self::new_with_monitoring(pipeline, notifier, resources, false)
    }

    pub fn new_with_monitoring(
        pipeline: BatchPipeline<S, C>,
        notifier: Notifier<T>,
        resources: NotificationResources,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            pipeline,
            notifier,
            resources,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn notifier(&self) -> &Notifier<T> {
        &self.notifier
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let run_id = chrono::Local::now().format("%Y%m%dT%H%M%S").to_string();
        let span = tracing::info_span!("batch_run", run_id = %run_id);
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> Result<RunOutcome> {
        tracing::info!("🚀 Starting CEP batch");
        self.monitor.log_stats("Start");

        // 1. 查詢
        let codes = self.pipeline.extract().await?;
        let batch = self.pipeline.transform(codes).await?;
        let dataset_path = self.pipeline.load(&batch).await?;
        self.monitor.log_stats("Lookup");

        // 2. 通知；範本或密碼檔缺少時中止，前一階段的資料集仍保留
        let template = EmailTemplate::from_file(&self.resources.template_file)?;
        tracing::debug!("Loaded e-mail template ({} bytes)", template.source().len());
        let credentials =
            load_credentials(&self.resources.username, &self.resources.credentials_file)?;

        let batch = self
            .notifier
            .notify_all(batch, &template, &credentials)
            .await;
        self.pipeline.load(&batch).await?;
        self.monitor.log_stats("Notification");

        // 3. 報表
        let report = ReportAggregator::new(self.pipeline.config().lines_per_page()).render(&batch);
        let report_path = self.pipeline.persist_report(&report).await?;
        self.monitor.log_stats("Report");
        self.monitor.log_final_stats();

        let summary = report.summary;
        tracing::info!(
            "📊 Lookups - success: {}, failed: {} | E-mails - sent: {}, failed: {}",
            summary.lookup_success,
            summary.lookup_failed,
            summary.notify_sent,
            summary.notify_failed
        );

        Ok(RunOutcome {
            dataset_path,
            report_path,
            summary,
        })
    }
}
