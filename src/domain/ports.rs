use crate::domain::model::{BatchResultSet, MailCredentials, RawResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn code_field(&self) -> &str;
    fn output_path(&self) -> &str;
    fn dataset_filename(&self) -> &str;
    fn report_filename(&self) -> &str;
    fn lines_per_page(&self) -> usize;
}

/// 單一外部查詢服務
#[async_trait]
pub trait LookupProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn query(&self, code: &str) -> RawResult;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// 郵件傳送；每次呼叫都必須建立新的連線
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail, credentials: &MailCredentials) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<String>>;
    async fn transform(&self, codes: Vec<String>) -> Result<BatchResultSet>;
    async fn load(&self, batch: &BatchResultSet) -> Result<String>;
}
