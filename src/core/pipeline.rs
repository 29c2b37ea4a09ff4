use crate::core::extract::{find_entity, ApiClient};
use crate::core::normalize::{FieldChains, Normalizer};
use crate::core::report::build_report;
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::{EntityKind, RawRecord, RelatedData, ReportInputs, ReportOutput};
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use chrono::Utc;

/// Fetches one entity plus its related collections, normalizes them, and
/// assembles the paginated PDF. Every fetch degrades rather than aborts: a
/// missing collection renders as an empty section, a missing entity yields
/// no document.
pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    api: ApiClient,
    normalizer: Normalizer,
    kind: EntityKind,
    entity_id: String,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C, kind: EntityKind, entity_id: String) -> Self {
        Self::with_chains(storage, config, kind, entity_id, FieldChains::default())
    }

    pub fn with_chains(
        storage: S,
        config: C,
        kind: EntityKind,
        entity_id: String,
        chains: FieldChains,
    ) -> Self {
        let api = ApiClient::new(config.base_url());
        Self {
            storage,
            config,
            api,
            normalizer: Normalizer::new(chains),
            kind,
            entity_id,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    type Input = ReportInputs;
    type Output = ReportOutput;

    async fn extract(&self) -> Result<ReportInputs> {
        let id = &self.entity_id;
        let (entities, related) = match self.kind {
            EntityKind::Property => {
                let investments_path = format!("properties/{}/investments", id);
                let (entities, investments) = tokio::join!(
                    self.api.fetch_records_or_empty("properties"),
                    self.api.fetch_records_or_empty(&investments_path),
                );
                (entities, RelatedData::Property { investments })
            }
            EntityKind::Organization => {
                let properties_path = format!("organizations/{}/properties", id);
                let investments_path = format!("organizations/{}/investments", id);
                let (entities, properties, investments) = tokio::join!(
                    self.api.fetch_records_or_empty("organizations"),
                    self.api.fetch_records_or_empty(&properties_path),
                    self.api.fetch_records_or_empty(&investments_path),
                );
                (
                    entities,
                    RelatedData::Organization {
                        properties,
                        investments,
                    },
                )
            }
            EntityKind::User => {
                let portfolio_path = format!("users/{}/investments", id);
                let transactions_path = format!("users/{}/transactions", id);
                let (entities, portfolio, transactions) = tokio::join!(
                    self.api.fetch_records_or_empty("users"),
                    self.api.fetch_records_or_empty(&portfolio_path),
                    self.api.fetch_records_or_empty(&transactions_path),
                );
                (
                    entities,
                    RelatedData::User {
                        portfolio,
                        transactions,
                    },
                )
            }
        };

        let entity = find_entity(&entities, id).cloned();
        tracing::info!(
            "📥 Extracted {} {} candidates, entity '{}' {}",
            entities.len(),
            self.kind,
            id,
            if entity.is_some() { "found" } else { "not found" }
        );
        Ok(ReportInputs { entity, related })
    }

    async fn transform(&self, inputs: ReportInputs) -> Result<ReportOutput> {
        let Some(entity) = inputs.entity else {
            tracing::warn!(
                "🔶 {} '{}' not found in fetched set, no report will be generated",
                self.kind,
                self.entity_id
            );
            return Ok(ReportOutput { artifact: None });
        };

        let defaulted = count_defaulted_entity_fields(&self.normalizer, &entity, self.kind);
        if defaulted > 0 {
            tracing::debug!(
                "🔄 {} entity fields fell back to defaults during normalization",
                defaulted
            );
        }

        let artifact = build_report(&self.normalizer, &entity, &inputs.related, Utc::now());
        tracing::info!(
            "🔄 Assembled '{}' ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(ReportOutput {
            artifact: Some(artifact),
        })
    }

    async fn load(&self, output: ReportOutput) -> Result<String> {
        match output.artifact {
            Some(artifact) => {
                self.storage
                    .write_file(&artifact.file_name, &artifact.bytes)
                    .await?;
                Ok(format!(
                    "{}/{}",
                    self.config.output_path(),
                    artifact.file_name
                ))
            }
            None => Ok(format!(
                "no document ({} '{}' not found)",
                self.kind, self.entity_id
            )),
        }
    }
}

/// Single boundary where defaulted normalization outcomes get surfaced to
/// the logs instead of per-call-site handlers. Only the chains the report
/// body actually reads for this entity kind are probed.
fn count_defaulted_entity_fields(
    normalizer: &Normalizer,
    entity: &RawRecord,
    kind: EntityKind,
) -> usize {
    let chains = &normalizer.chains;
    let probed: Vec<&[String]> = match kind {
        EntityKind::Property => vec![
            chains.total_value.as_slice(),
            chains.total_tokens.as_slice(),
            chains.available_tokens.as_slice(),
        ],
        // Organization bodies aggregate from related collections, not
        // entity-level numeric fields.
        EntityKind::Organization => Vec::new(),
        EntityKind::User => vec![chains.wallet_balance.as_slice(), chains.roi.as_slice()],
    };
    probed
        .into_iter()
        .filter(|chain| normalizer.resolve_number(entity, chain).is_defaulted())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn record(pairs: &[(&str, serde_json::Value)]) -> RawRecord {
        let mut data = HashMap::new();
        for (k, v) in pairs {
            data.insert(k.to_string(), v.clone());
        }
        RawRecord { data }
    }

    #[test]
    fn test_defaulted_field_count_scoped_to_entity_kind() {
        let n = Normalizer::default();

        // Organizations carry no entity-level numeric fields, so a sparse
        // org record must not count as degraded.
        let org = record(&[("organizationId", json!("ORG-9")), ("name", json!("Acme"))]);
        assert_eq!(
            count_defaulted_entity_fields(&n, &org, EntityKind::Organization),
            0
        );

        // Property: total_value and available_tokens are missing here.
        let property = record(&[("name", json!("Harbor")), ("totalTokens", json!(1000))]);
        assert_eq!(
            count_defaulted_entity_fields(&n, &property, EntityKind::Property),
            2
        );

        // User: only roi falls back.
        let user = record(&[("walletBalance", json!(950.25))]);
        assert_eq!(count_defaulted_entity_fields(&n, &user, EntityKind::User), 1);
    }
}
