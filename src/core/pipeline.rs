use crate::adapters::dataset::{decode_input_codes, encode_dataset};
use crate::core::report::ReportArtifact;
use crate::core::resolver::Resolver;
use crate::core::{BatchResultSet, ConfigProvider, Pipeline, Storage};
use crate::utils::error::{BatchError, Result};
use std::path::Path;

pub struct BatchPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    resolver: Resolver,
}

impl<S: Storage, C: ConfigProvider> BatchPipeline<S, C> {
    pub fn new(storage: S, config: C, resolver: Resolver) -> Self {
        Self {
            storage,
            config,
            resolver,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 依序查詢所有 CEP，整批完成後才寫出資料集
    pub async fn run(&self, input_codes: Vec<String>) -> Result<BatchResultSet> {
        let batch = self.transform(input_codes).await?;
        self.load(&batch).await?;
        Ok(batch)
    }

    pub async fn persist_report(&self, report: &ReportArtifact) -> Result<String> {
        let path = self.output_file(self.config.report_filename());
        self.write_artifact("report", &path, report.to_text().as_bytes())
            .await?;
        Ok(path)
    }

    fn output_file(&self, filename: &str) -> String {
        Path::new(self.config.output_path())
            .join(filename)
            .to_string_lossy()
            .into_owned()
    }

    async fn write_artifact(&self, artifact: &str, path: &str, data: &[u8]) -> Result<()> {
        tracing::debug!("Writing {} ({} bytes) to {}", artifact, data.len(), path);
        if let Err(e) = self.storage.write_file(path, data).await {
            tracing::error!("❌ Failed to write {} to {}: {}", artifact, path, e);
            return Err(BatchError::PersistenceError {
                artifact: format!("{} ({})", artifact, path),
                message: e.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for BatchPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<String>> {
        let path = self.config.input_path();
        tracing::info!("Reading CEPs from: {}", path);

        let data = self
            .storage
            .read_file(path)
            .await
            .map_err(|e| BatchError::ResourceError {
                kind: "input CSV".to_string(),
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let codes = decode_input_codes(&data, self.config.code_field(), path)?;
        tracing::info!("Read {} CEPs from {}", codes.len(), path);
        Ok(codes)
    }

    async fn transform(&self, codes: Vec<String>) -> Result<BatchResultSet> {
        if codes.is_empty() {
            return Err(BatchError::EmptyInputError {
                path: self.config.input_path().to_string(),
            });
        }

        let total = codes.len();
        let mut batch = BatchResultSet::new();
        for (index, code) in codes.iter().enumerate() {
            tracing::info!("Consulting CEP {} ({}/{})", code, index + 1, total);
            batch.push(self.resolver.resolve(code).await);
        }

        Ok(batch)
    }

    async fn load(&self, batch: &BatchResultSet) -> Result<String> {
        let path = self.output_file(self.config.dataset_filename());
        let data = encode_dataset(batch)?;
        self.write_artifact("dataset", &path, &data).await?;
        tracing::info!("Dataset with {} records saved to {}", batch.len(), path);
        Ok(path)
    }
}
