use crate::core::template::EmailTemplate;
use crate::core::{BatchResultSet, CodeRecord, MailTransport, OutgoingMail};
use crate::domain::model::{LookupStatus, MailCredentials, NotifyStatus};
use serde::{Deserialize, Serialize};

/// 已有終態通知狀態的記錄，重跑時如何處理
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// 不重寄已是 Sent / Failed 的記錄
    #[default]
    SkipTerminal,
    /// 重新開放並重寄
    Resend,
}

pub struct Notifier<T: MailTransport> {
    transport: T,
    sender: String,
    recipient: String,
    subject: EmailTemplate,
    policy: NotifyPolicy,
}

impl<T: MailTransport> Notifier<T> {
    pub fn new(transport: T, sender: &str, recipient: &str) -> Self {
        Self {
            transport,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            subject: EmailTemplate::new("Informações para o CEP ${code}"),
            policy: NotifyPolicy::default(),
        }
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = EmailTemplate::new(subject);
        self
    }

    pub fn with_policy(mut self, policy: NotifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 依序處理每筆記錄，單筆失敗不會中斷整批
    pub async fn notify_all(
        &self,
        mut batch: BatchResultSet,
        template: &EmailTemplate,
        credentials: &MailCredentials,
    ) -> BatchResultSet {
        for record in batch.records.iter_mut() {
            if record.notify_status.is_terminal() {
                match self.policy {
                    NotifyPolicy::SkipTerminal => {
                        tracing::debug!(
                            "Skipping CEP {}: notification already {}",
                            record.code,
                            record.notify_status
                        );
                        continue;
                    }
                    NotifyPolicy::Resend => record.reopen_notification(),
                }
            }

            let outcome = match record.lookup_status {
                LookupStatus::Success => self.notify_record(record, template, credentials).await,
                _ => {
                    tracing::info!(
                        "E-mail for CEP {} not sent: lookup did not succeed",
                        record.code
                    );
                    NotifyStatus::Failed
                }
            };

            if let Err(e) = record.record_notification(outcome) {
                tracing::warn!("⚠️ {}", e);
            }
        }

        batch
    }

    async fn notify_record(
        &self,
        record: &CodeRecord,
        template: &EmailTemplate,
        credentials: &MailCredentials,
    ) -> NotifyStatus {
        let rendered = template
            .render(record)
            .and_then(|body| Ok((self.subject.render(record)?, body)));
        let (subject, html_body) = match rendered {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("❌ Could not render e-mail for CEP {}: {}", record.code, e);
                return NotifyStatus::Failed;
            }
        };

        let mail = OutgoingMail {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject,
            html_body,
        };

        tracing::info!("Sending e-mail to {} (CEP: {})", mail.to, record.code);
        match self.transport.deliver(&mail, credentials).await {
            Ok(()) => {
                tracing::info!(
                    "✅ E-mail sent successfully to {} (CEP: {})",
                    mail.to,
                    record.code
                );
                NotifyStatus::Sent
            }
            Err(e) => {
                tracing::error!(
                    "❌ Failed to send e-mail to {} (CEP: {}): {}",
                    mail.to,
                    record.code,
                    e
                );
                NotifyStatus::Failed
            }
        }
    }
}
