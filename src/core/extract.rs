use crate::domain::model::RawRecord;
use crate::utils::error::Result;
use reqwest::Client;
use serde_json::Value;

/// Thin client over the platform REST API. Every response travels through
/// `unwrap_payload`, which absorbs the envelope drift the backend has shipped
/// over time.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_records(&self, path: &str) -> Result<Vec<RawRecord>> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!("📡 GET {}", url);
        let response = self.client.get(&url).send().await?;
        tracing::debug!("📡 {} -> {}", url, response.status());
        let response = response.error_for_status()?;
        let payload: Value = response.json().await?;
        Ok(unwrap_payload(payload))
    }

    /// Related collections degrade to empty on failure so one bad fetch
    /// cannot abort a partially-available report.
    pub async fn fetch_records_or_empty(&self, path: &str) -> Vec<RawRecord> {
        match self.fetch_records(path).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("🔶 Fetch of '{}' failed, treating as empty: {}", path, e);
                Vec::new()
            }
        }
    }
}

/// Envelope shapes seen in the wild: a bare array, `{"data": ...}` (possibly
/// nested, `data.data`), an object wrapping a single array-valued key, or a
/// plain object that is itself the record.
pub fn unwrap_payload(payload: Value) -> Vec<RawRecord> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(RawRecord::from(map)),
                _ => None,
            })
            .collect(),
        Value::Object(map) => {
            if let Some(inner) = map.get("data") {
                return unwrap_payload(inner.clone());
            }
            let single_array_key = {
                let mut keys = map
                    .iter()
                    .filter(|(_, v)| v.is_array())
                    .map(|(k, _)| k.clone());
                match (keys.next(), keys.next()) {
                    (Some(key), None) => Some(key),
                    _ => None,
                }
            };
            let mut map = map;
            if let Some(key) = single_array_key {
                if let Some(inner) = map.remove(&key) {
                    return unwrap_payload(inner);
                }
            }
            vec![RawRecord::from(map)]
        }
        _ => Vec::new(),
    }
}

const ID_FIELDS: &[&str] = &["id", "_id", "propertyId", "userId", "organizationId", "code"];

/// Find the requested entity in a fetched collection. Ids are compared after
/// stringification so numeric and string ids match interchangeably.
pub fn find_entity<'a>(records: &'a [RawRecord], id: &str) -> Option<&'a RawRecord> {
    records.iter().find(|record| {
        ID_FIELDS.iter().any(|field| {
            record
                .get(field)
                .map(|value| match value {
                    Value::String(s) => s == id,
                    Value::Number(n) => n.to_string() == id,
                    _ => false,
                })
                .unwrap_or(false)
        })
    })
}
