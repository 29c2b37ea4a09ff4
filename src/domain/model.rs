use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// An unschema'd payload from the network boundary. The backend has shipped
/// the same concepts under different key names across versions, so nothing
/// here is guaranteed beyond "string keys, JSON values".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub data: HashMap<String, serde_json::Value>,
}

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RawRecord {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: map.into_iter().collect(),
        }
    }
}

/// One aggregated point of the canonical chart series. `value2` is a
/// business-defined derived metric (70% of raw volume), not a second source
/// field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub value: f64,
    pub value2: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Property,
    Organization,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Property => "Property",
            EntityKind::Organization => "Organization",
            EntityKind::User => "User",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "property" => Ok(EntityKind::Property),
            "organization" | "org" => Ok(EntityKind::Organization),
            "user" => Ok(EntityKind::User),
            other => Err(format!(
                "unknown entity kind '{}', expected property, organization or user",
                other
            )),
        }
    }
}

/// A named table rendered into the report. Rows are already stringified
/// cells; `overflow_noun` feeds the "... and N more investments" summary
/// line when the table is capped.
#[derive(Debug, Clone)]
pub struct ReportSection {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub overflow_noun: String,
}

/// Collections fetched alongside the selected entity. A failed fetch
/// degrades to an empty vec upstream, so empty here just means "section
/// renders empty".
#[derive(Debug, Clone)]
pub enum RelatedData {
    Property {
        investments: Vec<RawRecord>,
    },
    Organization {
        properties: Vec<RawRecord>,
        investments: Vec<RawRecord>,
    },
    User {
        portfolio: Vec<RawRecord>,
        transactions: Vec<RawRecord>,
    },
}

impl RelatedData {
    pub fn kind(&self) -> EntityKind {
        match self {
            RelatedData::Property { .. } => EntityKind::Property,
            RelatedData::Organization { .. } => EntityKind::Organization,
            RelatedData::User { .. } => EntityKind::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub entity: Option<RawRecord>,
    pub related: RelatedData,
}

/// A finished downloadable document.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `artifact` is None when the entity could not be resolved; the load stage
/// then produces no document instead of rendering a broken report.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub artifact: Option<ReportArtifact>,
}

#[derive(Debug, Clone)]
pub struct ChartOutput {
    pub file_name: String,
    pub csv: String,
    pub points: Vec<TimeSeriesPoint>,
}
