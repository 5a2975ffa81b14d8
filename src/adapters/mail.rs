use crate::domain::model::MailCredentials;
use crate::domain::ports::{MailTransport, OutgoingMail};
use crate::utils::error::{BatchError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use std::time::Duration;

/// 從專用檔案讀取 SMTP 密碼 (去除前後空白)
pub fn load_credentials<P: AsRef<Path>>(username: &str, path: P) -> Result<MailCredentials> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| BatchError::ResourceError {
        kind: "credentials".to_string(),
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let secret = content.trim();
    if secret.is_empty() {
        return Err(BatchError::ResourceError {
            kind: "credentials".to_string(),
            path: path.display().to_string(),
            message: "file is empty".to_string(),
        });
    }

    Ok(MailCredentials::new(username, secret))
}

fn smtp_credentials(credentials: &MailCredentials) -> Credentials {
    Credentials::new(
        credentials.username.clone(),
        credentials.secret().to_string(),
    )
}

#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    pub fn build_message(mail: &OutgoingMail) -> Result<Message> {
        let from: Mailbox = mail.from.parse()?;
        let to: Mailbox = mail.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body.clone())?;
        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, mail: &OutgoingMail, credentials: &MailCredentials) -> Result<()> {
        let message = Self::build_message(mail)?;

        // 每封郵件建立獨立的 STARTTLS 連線
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(smtp_credentials(credentials))
            .timeout(Some(self.timeout))
            .build();

        tracing::debug!("Opening SMTP session to {}:{}", self.host, self.port);
        let response = transport.send(message).await?;
        tracing::debug!("SMTP relay answered with code {}", response.code());
        Ok(())
    }
}
