use crate::utils::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupStatus {
    Pending,
    Success,
    Failed,
}

impl LookupStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LookupStatus::Pending)
    }
}

impl fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupStatus::Pending => "Pending",
            LookupStatus::Success => "Success",
            LookupStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyStatus {
    NotAttempted,
    Sent,
    Failed,
}

impl NotifyStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotifyStatus::NotAttempted)
    }
}

impl fmt::Display for NotifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotifyStatus::NotAttempted => "NotAttempted",
            NotifyStatus::Sent => "Sent",
            NotifyStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// 地址欄位，只有查詢成功時才會有值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub street: String,
    pub district: String,
    pub city: String,
    pub region: String,
}

/// 單一供應商查詢的三種結果
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Resolved(AddressFields),
    Unresolved { reason: String },
    Unreachable { reason: String },
}

impl RawResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RawResult::Resolved(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub input: String,
    pub code: String,
    pub lookup_status: LookupStatus,
    pub fields: Option<AddressFields>,
    pub provider: Option<String>,
    pub notify_status: NotifyStatus,
}

impl CodeRecord {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            code: normalize_code(input),
            lookup_status: LookupStatus::Pending,
            fields: None,
            provider: None,
            notify_status: NotifyStatus::NotAttempted,
        }
    }

    pub fn mark_resolved(&mut self, fields: AddressFields, provider: &str) {
        self.lookup_status = LookupStatus::Success;
        self.fields = Some(fields);
        self.provider = Some(provider.to_string());
    }

    pub fn mark_unresolved(&mut self) {
        self.lookup_status = LookupStatus::Failed;
        self.fields = None;
        self.provider = None;
    }

    /// 記錄通知結果；查詢尚未結束或通知已是終態時拒絕
    pub fn record_notification(&mut self, status: NotifyStatus) -> Result<()> {
        if !self.lookup_status.is_terminal() {
            return Err(BatchError::InvalidTransition {
                code: self.code.clone(),
                message: "notification recorded before lookup finished".to_string(),
            });
        }
        if self.notify_status.is_terminal() {
            return Err(BatchError::InvalidTransition {
                code: self.code.clone(),
                message: format!("notification already {}", self.notify_status),
            });
        }
        if !status.is_terminal() {
            return Err(BatchError::InvalidTransition {
                code: self.code.clone(),
                message: "notification outcome must be Sent or Failed".to_string(),
            });
        }
        if self.lookup_status == LookupStatus::Failed && status == NotifyStatus::Sent {
            return Err(BatchError::InvalidTransition {
                code: self.code.clone(),
                message: "unresolved records cannot be notified".to_string(),
            });
        }
        self.notify_status = status;
        Ok(())
    }

    /// 重新開放通知狀態，僅供 resend 策略使用
    pub fn reopen_notification(&mut self) {
        self.notify_status = NotifyStatus::NotAttempted;
    }

    pub fn is_complete(&self) -> bool {
        self.lookup_status.is_terminal() && self.notify_status.is_terminal()
    }
}

/// 去除連字號、點與空白
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | '.') && !c.is_whitespace())
        .collect()
}

/// SMTP 登入資訊；密碼不得出現在日誌或輸出檔案
#[derive(Clone)]
pub struct MailCredentials {
    pub username: String,
    secret: String,
}

impl MailCredentials {
    pub fn new(username: &str, secret: &str) -> Self {
        Self {
            username: username.to_string(),
            secret: secret.to_string(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResultSet {
    pub records: Vec<CodeRecord>,
}

impl BatchResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CodeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CodeRecord> {
        self.records.iter()
    }
}

impl FromIterator<CodeRecord> for BatchResultSet {
    fn from_iter<I: IntoIterator<Item = CodeRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
