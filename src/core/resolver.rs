use crate::adapters::http::HttpLookupProvider;
use crate::config::toml_config::ProviderConfig;
use crate::core::{CodeRecord, LookupProvider, RawResult};
use crate::utils::error::{BatchError, Result};

/// 主要 + 備援
pub const MAX_PROVIDERS: usize = 2;

/// 依固定順序嘗試各供應商，直到有一個成功或全部失敗
pub struct Resolver {
    providers: Vec<Box<dyn LookupProvider>>,
}

impl Resolver {
    /// 每個 CEP 最多查詢 MAX_PROVIDERS 次，清單為空或超過時拒絕
    pub fn new(providers: Vec<Box<dyn LookupProvider>>) -> Result<Self> {
        if providers.is_empty() || providers.len() > MAX_PROVIDERS {
            return Err(BatchError::ConfigValidationError {
                field: "providers".to_string(),
                message: format!(
                    "expected 1 to {} lookup providers, got {}",
                    MAX_PROVIDERS,
                    providers.len()
                ),
            });
        }
        Ok(Self { providers })
    }

    pub fn from_config(configs: &[ProviderConfig]) -> Result<Self> {
        let mut providers: Vec<Box<dyn LookupProvider>> = Vec::with_capacity(configs.len());
        for config in configs {
            providers.push(Box::new(HttpLookupProvider::new(config)?));
        }
        Self::new(providers)
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// 永遠回傳一筆已有終態查詢結果的記錄，失敗不會往上拋
    pub async fn resolve(&self, input: &str) -> CodeRecord {
        let mut record = CodeRecord::new(input);

        // 空白儲存格：不呼叫任何供應商，直接記為失敗
        if record.code.is_empty() {
            tracing::error!("❌ Empty CEP value {:?} cannot be looked up", input);
            record.mark_unresolved();
            return record;
        }

        for (attempt, provider) in self.providers.iter().enumerate() {
            if attempt > 0 {
                tracing::info!(
                    "Falling back to {} for CEP {}",
                    provider.name(),
                    record.code
                );
            }
            tracing::info!("Querying {} for CEP {}", provider.name(), record.code);

            match provider.query(&record.code).await {
                RawResult::Resolved(fields) => {
                    tracing::info!(
                        "✅ CEP {} resolved by {} ({}/{})",
                        record.code,
                        provider.name(),
                        fields.city,
                        fields.region
                    );
                    record.mark_resolved(fields, provider.name());
                    return record;
                }
                RawResult::Unresolved { reason } => {
                    tracing::warn!(
                        "{} could not resolve CEP {}: {}",
                        provider.name(),
                        record.code,
                        reason
                    );
                }
                RawResult::Unreachable { reason } => {
                    tracing::warn!(
                        "{} unreachable for CEP {}: {}",
                        provider.name(),
                        record.code,
                        reason
                    );
                }
            }
        }

        tracing::error!(
            "❌ CEP {} could not be resolved by any provider",
            record.code
        );
        record.mark_unresolved();
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AddressFields, LookupStatus, NotifyStatus};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct ScriptedProvider {
        name: String,
        outcome: RawResult,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(name: &str, outcome: RawResult) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let provider = Self {
                name: name.to_string(),
                outcome,
                calls: calls.clone(),
            };
            (provider, calls)
        }
    }

    #[async_trait]
    impl LookupProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn query(&self, code: &str) -> RawResult {
            self.calls.lock().await.push(code.to_string());
            self.outcome.clone()
        }
    }

    fn fields(city: &str) -> AddressFields {
        AddressFields {
            street: "Rua A".to_string(),
            district: "Centro".to_string(),
            city: city.to_string(),
            region: "SP".to_string(),
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let (primary, primary_calls) =
            ScriptedProvider::new("primary", RawResult::Resolved(fields("São Paulo")));
        let (secondary, secondary_calls) =
            ScriptedProvider::new("secondary", RawResult::Resolved(fields("Campinas")));
        let resolver = Resolver::new(vec![Box::new(primary), Box::new(secondary)]).unwrap();

        let record = resolver.resolve("01001-000").await;

        assert_eq!(record.lookup_status, LookupStatus::Success);
        assert_eq!(record.fields.unwrap().city, "São Paulo");
        assert_eq!(record.provider.as_deref(), Some("primary"));
        assert_eq!(primary_calls.lock().await.as_slice(), ["01001000"]);
        assert!(secondary_calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_unresolved() {
        let (primary, _) = ScriptedProvider::new(
            "primary",
            RawResult::Unresolved {
                reason: "not found".to_string(),
            },
        );
        let (secondary, secondary_calls) =
            ScriptedProvider::new("secondary", RawResult::Resolved(fields("Campinas")));
        let resolver = Resolver::new(vec![Box::new(primary), Box::new(secondary)]).unwrap();

        let record = resolver.resolve("13010-000").await;

        assert_eq!(record.lookup_status, LookupStatus::Success);
        assert_eq!(record.fields, Some(fields("Campinas")));
        assert_eq!(record.provider.as_deref(), Some("secondary"));
        assert_eq!(secondary_calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_unreachable() {
        let (primary, _) = ScriptedProvider::new(
            "primary",
            RawResult::Unreachable {
                reason: "timeout".to_string(),
            },
        );
        let (secondary, _) =
            ScriptedProvider::new("secondary", RawResult::Resolved(fields("Santos")));
        let resolver = Resolver::new(vec![Box::new(primary), Box::new(secondary)]).unwrap();

        let record = resolver.resolve("11010-000").await;

        assert_eq!(record.lookup_status, LookupStatus::Success);
        assert_eq!(record.fields.unwrap().city, "Santos");
    }

    #[tokio::test]
    async fn test_both_providers_failing_yields_failed_record() {
        let (primary, primary_calls) = ScriptedProvider::new(
            "primary",
            RawResult::Unresolved {
                reason: "not found".to_string(),
            },
        );
        let (secondary, secondary_calls) = ScriptedProvider::new(
            "secondary",
            RawResult::Unreachable {
                reason: "HTTP status 503".to_string(),
            },
        );
        let resolver = Resolver::new(vec![Box::new(primary), Box::new(secondary)]).unwrap();

        let record = resolver.resolve("00000-000").await;

        assert_eq!(record.lookup_status, LookupStatus::Failed);
        assert_eq!(record.notify_status, NotifyStatus::NotAttempted);
        assert!(record.fields.is_none());
        assert!(record.provider.is_none());
        assert_eq!(primary_calls.lock().await.len(), 1);
        assert_eq!(secondary_calls.lock().await.len(), 1);
    }

    #[test]
    fn test_from_config_keeps_provider_order() {
        let resolver =
            Resolver::from_config(&crate::config::toml_config::default_providers()).unwrap();
        assert_eq!(resolver.provider_names(), vec!["viacep", "opencep"]);
    }

    fn unreachable(name: &str) -> (ScriptedProvider, Arc<Mutex<Vec<String>>>) {
        ScriptedProvider::new(
            name,
            RawResult::Unreachable {
                reason: "connection refused".to_string(),
            },
        )
    }

    #[test]
    fn test_rejects_more_than_two_providers() {
        let (first, _) = unreachable("first");
        let (second, _) = unreachable("second");
        let (third, _) = unreachable("third");

        let err = Resolver::new(vec![Box::new(first), Box::new(second), Box::new(third)])
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_rejects_empty_provider_list() {
        assert!(Resolver::new(Vec::new()).is_err());
        assert!(Resolver::from_config(&[]).is_err());
    }

    #[test]
    fn test_from_config_rejects_four_providers() {
        let mut configs = crate::config::toml_config::default_providers();
        configs.extend(crate::config::toml_config::default_providers());
        assert_eq!(configs.len(), 4);

        assert!(Resolver::from_config(&configs).is_err());
    }

    #[tokio::test]
    async fn test_blank_code_fails_without_provider_calls() {
        let (primary, primary_calls) =
            ScriptedProvider::new("primary", RawResult::Resolved(fields("São Paulo")));
        let resolver = Resolver::new(vec![Box::new(primary)]).unwrap();

        let record = resolver.resolve(" - ").await;

        assert_eq!(record.input, " - ");
        assert_eq!(record.lookup_status, LookupStatus::Failed);
        assert!(primary_calls.lock().await.is_empty());
    }

    #[test]
    fn test_fallback_is_appended_to_log_file() {
        use tracing_subscriber::layer::SubscriberExt;

        let dir = tempfile::TempDir::new().unwrap();
        let log_path = dir.path().join("output").join("processamento.log");

        // 兩次執行：第二次必須附加在第一次之後
        for _ in 0..2 {
            let layer = crate::utils::logger::file_layer(&log_path).unwrap();
            let subscriber = tracing_subscriber::registry().with(layer);
            tracing::subscriber::with_default(subscriber, || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    let (primary, _) = unreachable("viacep");
                    let (secondary, _) =
                        ScriptedProvider::new("opencep", RawResult::Resolved(fields("São Paulo")));
                    let resolver =
                        Resolver::new(vec![Box::new(primary), Box::new(secondary)]).unwrap();
                    resolver.resolve("01001-000").await;
                });
            });
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        let fallback_lines: Vec<&str> = content
            .lines()
            .filter(|line| line.contains("Falling back to opencep for CEP 01001000"))
            .collect();
        assert_eq!(fallback_lines.len(), 2);
        assert!(fallback_lines.iter().all(|line| line.contains("INFO")));
        assert_eq!(
            content
                .lines()
                .filter(|line| line.contains("WARN") && line.contains("viacep unreachable"))
                .count(),
            2
        );
        // 時間戳記在行首
        assert!(fallback_lines[0].starts_with(|c: char| c.is_ascii_digit()));
    }
}
