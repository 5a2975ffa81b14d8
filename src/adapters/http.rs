use crate::config::toml_config::ProviderConfig;
use crate::domain::model::{AddressFields, RawResult};
use crate::domain::ports::LookupProvider;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const REQUIRED_FIELDS: [&str; 3] = ["code", "city", "region"];

/// ViaCEP 格式的預設欄位對應 (回應欄位 -> 標準欄位)
pub fn default_field_mapping() -> HashMap<String, String> {
    [
        ("cep", "code"),
        ("logradouro", "street"),
        ("bairro", "district"),
        ("localidade", "city"),
        ("uf", "region"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

pub struct HttpLookupProvider {
    name: String,
    url_template: String,
    field_mapping: HashMap<String, String>,
    client: Client,
}

impl HttpLookupProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            name: config.name.clone(),
            url_template: config.url_template.clone(),
            field_mapping: config
                .field_mapping
                .clone()
                .unwrap_or_else(default_field_mapping),
            client,
        })
    }

    /// CEP 以路徑片段編碼後代入，`?`、`#`、`/` 不會改變請求路徑
    fn url_for(&self, code: &str) -> Option<String> {
        let mut scratch = Url::parse("http://localhost/").ok()?;
        scratch.path_segments_mut().ok()?.clear().push(code);
        let segment = scratch.path().trim_start_matches('/');
        Some(self.url_template.replace("{cep}", segment))
    }
}

#[async_trait]
impl LookupProvider for HttpLookupProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, code: &str) -> RawResult {
        let Some(url) = self.url_for(code) else {
            return RawResult::Unresolved {
                reason: format!("CEP {:?} cannot be placed in the request URL", code),
            };
        };
        tracing::debug!("Making lookup request to: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return RawResult::Unreachable {
                    reason: format!("request timed out: {}", e),
                }
            }
            Err(e) => {
                return RawResult::Unreachable {
                    reason: format!("request failed: {}", e),
                }
            }
        };

        let status = response.status();
        tracing::debug!("{} response status: {}", self.name, status);
        if !status.is_success() {
            return RawResult::Unreachable {
                reason: format!("HTTP status {}", status),
            };
        }

        // 讀取 body 失敗 (逾時、連線中斷) 屬於傳輸錯誤；只有解析失敗才是 Unresolved
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return RawResult::Unreachable {
                    reason: format!("failed to read response body: {}", e),
                }
            }
        };

        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(body) => classify_response(&body, &self.field_mapping),
            Err(e) => RawResult::Unresolved {
                reason: format!("malformed response body: {}", e),
            },
        }
    }
}

/// 將供應商回應分類為 Resolved / Unresolved
pub fn classify_response(
    body: &serde_json::Value,
    field_mapping: &HashMap<String, String>,
) -> RawResult {
    let serde_json::Value::Object(obj) = body else {
        return RawResult::Unresolved {
            reason: "response body is not a JSON object".to_string(),
        };
    };

    // ViaCEP 以 {"erro": true} 表示查無此 CEP
    if obj.contains_key("erro") {
        return RawResult::Unresolved {
            reason: "provider reported the CEP as not found".to_string(),
        };
    }

    let mut values: HashMap<&str, String> = HashMap::new();
    for (source, target) in field_mapping {
        let text = match obj.get(source) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        if !text.is_empty() {
            values.insert(target.as_str(), text);
        }
    }

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !values.contains_key(field))
        .collect();
    if !missing.is_empty() {
        return RawResult::Unresolved {
            reason: format!("response is missing {}", missing.join(", ")),
        };
    }

    let mut take = |field: &str| values.remove(field).unwrap_or_default();
    RawResult::Resolved(AddressFields {
        street: take("street"),
        district: take("district"),
        city: take("city"),
        region: take("region"),
    })
}
