use crate::domain::model::{RawRecord, TimeSeriesPoint};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Sentinel for fields the backend never sent under any known name.
pub const NOT_AVAILABLE: &str = "N/A";

/// Outcome of a single normalization step. `Defaulted` means the input was
/// absent or unparseable and the documented default was substituted; callers
/// log those once at the pipeline boundary instead of scattering handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<T> {
    Ok(T),
    Defaulted(T),
}

impl<T> Resolved<T> {
    pub fn value(self) -> T {
        match self {
            Resolved::Ok(v) | Resolved::Defaulted(v) => v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Resolved::Defaulted(_))
    }
}

/// Ordered candidate field names per logical field. The backend has exposed
/// the same concept under different key names across endpoint versions;
/// keeping every chain here makes shape drift a one-place edit, and a TOML
/// config can override any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldChains {
    pub date: Vec<String>,
    pub amount: Vec<String>,
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub code: Vec<String>,
    pub status: Vec<String>,
    pub location: Vec<String>,
    pub email: Vec<String>,
    pub total_value: Vec<String>,
    pub total_tokens: Vec<String>,
    pub available_tokens: Vec<String>,
    pub wallet_balance: Vec<String>,
    pub roi: Vec<String>,
    pub investor: Vec<String>,
    pub tokens: Vec<String>,
    pub tx_type: Vec<String>,
}

fn chain(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldChains {
    fn default() -> Self {
        Self {
            date: chain(&[
                "date",
                "day",
                "investmentDate",
                "createdAt",
                "created_at",
                "timestamp",
                "time",
            ]),
            amount: chain(&["value", "amount", "volume", "total", "totalVolume", "sum"]),
            id: chain(&[
                "id",
                "_id",
                "propertyId",
                "userId",
                "organizationId",
                "code",
            ]),
            name: chain(&["name", "title", "propertyName", "fullName", "userName"]),
            // Covers every field the entity lookup matches on, so whatever
            // identified the entity can also name its report file.
            code: chain(&[
                "code",
                "propertyCode",
                "symbol",
                "id",
                "_id",
                "propertyId",
                "userId",
                "organizationId",
            ]),
            status: chain(&["status", "state", "propertyStatus"]),
            location: chain(&["location", "address", "city", "country"]),
            email: chain(&["email", "contactEmail", "contact_email"]),
            total_value: chain(&[
                "pricing_total_value",
                "totalValueUSDT",
                "totalValue",
                "total_value",
                "price",
            ]),
            total_tokens: chain(&["totalTokens", "total_tokens", "tokenSupply"]),
            available_tokens: chain(&[
                "availableTokens",
                "available_tokens",
                "remainingTokens",
            ]),
            wallet_balance: chain(&["walletBalance", "wallet_balance", "balance"]),
            roi: chain(&["roi", "totalRoi", "returnRate", "expectedRoi"]),
            investor: chain(&["investorName", "investor", "userName", "user", "email"]),
            tokens: chain(&["tokens", "tokenAmount", "numTokens", "quantity"]),
            tx_type: chain(&["type", "transactionType", "txType", "kind"]),
        }
    }
}

/// A resolved calendar day plus its short display label ("Nov 8").
#[derive(Debug, Clone, PartialEq)]
pub struct DateKey {
    pub day: NaiveDate,
    pub label: String,
}

pub struct Normalizer {
    pub chains: FieldChains,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            chains: FieldChains::default(),
        }
    }
}

impl Normalizer {
    pub fn new(chains: FieldChains) -> Self {
        Self { chains }
    }

    /// First date-like field that parses wins; None means the caller should
    /// skip the record rather than fail the batch.
    pub fn resolve_date_key(&self, record: &RawRecord) -> Option<DateKey> {
        for field in &self.chains.date {
            if let Some(value) = record.get(field) {
                if let Some(day) = parse_date_value(value) {
                    return Some(DateKey {
                        day,
                        label: day.format("%b %-d").to_string(),
                    });
                }
            }
        }
        None
    }

    /// First amount-like field wins, then `parse_amount`. Defaults to 0.
    pub fn resolve_amount(&self, record: &RawRecord) -> f64 {
        self.resolve_number(record, &self.chains.amount).value()
    }

    pub fn resolve_number(&self, record: &RawRecord, chain: &[String]) -> Resolved<f64> {
        for field in chain {
            if let Some(value) = record.get(field) {
                if !value.is_null() {
                    return parse_amount(value);
                }
            }
        }
        Resolved::Defaulted(0.0)
    }

    /// First defined, non-null field as display text, else the `N/A`
    /// sentinel.
    pub fn resolve_field(&self, record: &RawRecord, chain: &[String]) -> String {
        for field in chain {
            if let Some(value) = record.get(field) {
                match value {
                    Value::Null => continue,
                    Value::String(s) => return s.clone(),
                    Value::Number(n) => return n.to_string(),
                    Value::Bool(b) => return b.to_string(),
                    other => return other.to_string(),
                }
            }
        }
        NOT_AVAILABLE.to_string()
    }

    /// Group records by resolved day, accumulating volume and a per-day
    /// count; `value2` is the fixed-ratio derived series. Records without a
    /// resolvable date are dropped silently. An empty result degrades to the
    /// illustrative sample series so staging charts never render blank; the
    /// caller logs that degrade once.
    pub fn normalize_time_series(
        &self,
        records: &[RawRecord],
        window: Option<usize>,
    ) -> Vec<TimeSeriesPoint> {
        let mut buckets: BTreeMap<NaiveDate, (String, f64, u32)> = BTreeMap::new();

        for record in records {
            let Some(key) = self.resolve_date_key(record) else {
                continue;
            };
            let amount = self.resolve_amount(record);
            let entry = buckets.entry(key.day).or_insert((key.label, 0.0, 0));
            entry.1 += amount;
            entry.2 += 1;
        }

        if buckets.is_empty() {
            return sample_series();
        }

        let mut points: Vec<TimeSeriesPoint> = buckets
            .into_values()
            .map(|(label, value, count)| TimeSeriesPoint {
                date: label,
                value2: value * 0.7,
                value,
                count,
            })
            .collect();

        if let Some(n) = window {
            if points.len() > n {
                points.drain(..points.len() - n);
            }
        }

        points
    }
}

/// The single point of tolerance for amount shapes: plain numbers,
/// currency-prefixed strings ("$1,200"), and magnitude suffixes ("3.5k",
/// "2M"). Unparseable input defaults to 0, never an error.
pub fn parse_amount(value: &Value) -> Resolved<f64> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Resolved::Ok(v),
            _ => Resolved::Defaulted(0.0),
        },
        Value::String(s) => parse_amount_str(s),
        _ => Resolved::Defaulted(0.0),
    }
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.kKmM-]").expect("static regex"))
}

fn parse_amount_str(raw: &str) -> Resolved<f64> {
    let cleaned = amount_regex().replace_all(raw, "");
    let (numeric, multiplier) = match cleaned.chars().last() {
        Some('m') | Some('M') => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        Some('k') | Some('K') => (&cleaned[..cleaned.len() - 1], 1_000.0),
        _ => (cleaned.as_ref(), 1.0),
    };

    match numeric.parse::<f64>() {
        Ok(v) if v.is_finite() => Resolved::Ok(v * multiplier),
        _ => Resolved::Defaulted(0.0),
    }
}

fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        // Epoch timestamps: large values are milliseconds, small ones seconds.
        Value::Number(n) => {
            let raw = n.as_i64()?;
            let secs = if raw.abs() > 100_000_000_000 {
                raw / 1000
            } else {
                raw
            };
            DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        return Some(d);
    }
    // Already-normalized day labels ("Nov 8"); pin to the current year so
    // re-normalizing an aggregated series keeps one bucket per label.
    let with_year = format!("{} {}", s, Utc::now().year());
    NaiveDate::parse_from_str(&with_year, "%b %d %Y").ok()
}

/// Fixed illustrative series shown when normalization produced nothing.
/// Display-continuity policy carried over from the dashboard; remove this
/// constant to surface genuine empty states instead.
const SAMPLE_SERIES: &[(&str, f64, u32)] = &[
    ("Oct 15", 45_000.0, 3),
    ("Oct 16", 52_000.0, 4),
    ("Oct 17", 48_000.0, 3),
    ("Oct 18", 61_000.0, 5),
    ("Oct 19", 55_000.0, 4),
    ("Oct 20", 67_000.0, 6),
    ("Oct 21", 72_000.0, 5),
    ("Oct 22", 68_000.0, 4),
    ("Oct 23", 79_000.0, 7),
    ("Oct 24", 85_000.0, 6),
    ("Oct 25", 81_000.0, 5),
    ("Oct 26", 94_000.0, 8),
    ("Oct 27", 102_000.0, 9),
];

pub fn sample_series() -> Vec<TimeSeriesPoint> {
    SAMPLE_SERIES
        .iter()
        .map(|(date, value, count)| TimeSeriesPoint {
            date: date.to_string(),
            value: *value,
            value2: value * 0.7,
            count: *count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn record(pairs: &[(&str, Value)]) -> RawRecord {
        let mut data = HashMap::new();
        for (k, v) in pairs {
            data.insert(k.to_string(), v.clone());
        }
        RawRecord { data }
    }

    #[test]
    fn test_parse_amount_numeric_passthrough() {
        assert_eq!(parse_amount(&json!(42)).value(), 42.0);
        assert_eq!(parse_amount(&json!(1234.56)).value(), 1234.56);
        assert_eq!(parse_amount(&json!(-300)).value(), -300.0);
        assert!(!parse_amount(&json!(42)).is_defaulted());
    }

    #[test]
    fn test_parse_amount_currency_string() {
        assert_eq!(parse_amount(&json!("$1,200")).value(), 1200.0);
        assert_eq!(parse_amount(&json!("1,200 USDT")).value(), 1200.0);
    }

    #[test]
    fn test_parse_amount_magnitude_suffixes() {
        assert_eq!(parse_amount(&json!("3.5k")).value(), 3500.0);
        assert_eq!(parse_amount(&json!("2M")).value(), 2_000_000.0);
        assert_eq!(parse_amount(&json!("10K")).value(), 10_000.0);
    }

    #[test]
    fn test_parse_amount_garbage_defaults_to_zero() {
        let cases = [json!(null), json!("garbage"), json!(""), json!([1, 2])];
        for case in &cases {
            let resolved = parse_amount(case);
            assert_eq!(resolved.value(), 0.0, "case: {}", case);
        }
        assert!(parse_amount(&json!("garbage")).is_defaulted());
        assert!(parse_amount(&json!(null)).is_defaulted());
    }

    #[test]
    fn test_resolve_date_key_falls_back_to_created_at() {
        let n = Normalizer::default();
        let r = record(&[
            ("amount", json!(100)),
            ("createdAt", json!("2024-11-08T00:00:00Z")),
        ]);
        let key = n.resolve_date_key(&r).unwrap();
        assert_eq!(key.label, "Nov 8");
    }

    #[test]
    fn test_resolve_date_key_priority_order() {
        let n = Normalizer::default();
        let r = record(&[
            ("createdAt", json!("2024-11-08T00:00:00Z")),
            ("date", json!("2024-01-02")),
        ]);
        // `date` outranks `createdAt` in the chain.
        assert_eq!(n.resolve_date_key(&r).unwrap().label, "Jan 2");
    }

    #[test]
    fn test_resolve_date_key_none_when_nothing_parses() {
        let n = Normalizer::default();
        let r = record(&[("name", json!("no dates here")), ("date", json!("soon"))]);
        assert!(n.resolve_date_key(&r).is_none());
    }

    #[test]
    fn test_resolve_date_key_epoch_millis() {
        let n = Normalizer::default();
        // 2024-11-08T12:00:00Z in milliseconds.
        let r = record(&[("timestamp", json!(1731067200000i64))]);
        assert_eq!(n.resolve_date_key(&r).unwrap().label, "Nov 8");
    }

    #[test]
    fn test_resolve_amount_field_priority() {
        let n = Normalizer::default();
        let r = record(&[("total", json!("9k")), ("amount", json!("$250"))]);
        // `amount` outranks `total`.
        assert_eq!(n.resolve_amount(&r), 250.0);
    }

    #[test]
    fn test_resolve_field_chain_fallback() {
        let n = Normalizer::default();
        let r = record(&[("totalValueUSDT", json!(500_000))]);
        assert_eq!(n.resolve_field(&r, &n.chains.total_value), "500000");
        assert_eq!(
            n.resolve_number(&r, &n.chains.total_value).value(),
            500_000.0
        );

        let empty = record(&[("unrelated", json!(1))]);
        assert_eq!(n.resolve_field(&empty, &n.chains.total_value), NOT_AVAILABLE);
    }

    #[test]
    fn test_normalize_time_series_aggregates_same_day() {
        let n = Normalizer::default();
        let records = vec![
            record(&[("date", json!("2024-11-08")), ("amount", json!(100))]),
            record(&[
                ("createdAt", json!("2024-11-08T15:30:00Z")),
                ("value", json!("$200")),
            ]),
        ];
        let points = n.normalize_time_series(&records, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, "Nov 8");
        assert_eq!(points[0].value, 300.0);
        assert!((points[0].value2 - 210.0).abs() < 1e-9);
        assert_eq!(points[0].count, 2);
    }

    #[test]
    fn test_normalize_time_series_sorted_ascending_and_skips_bad_records() {
        let n = Normalizer::default();
        let records = vec![
            record(&[("date", json!("2024-11-09")), ("amount", json!(50))]),
            record(&[("note", json!("no date at all")), ("amount", json!(999))]),
            record(&[("date", json!("2024-11-07")), ("amount", json!(10))]),
        ];
        let points = n.normalize_time_series(&records, None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "Nov 7");
        assert_eq!(points[1].date, "Nov 9");
    }

    #[test]
    fn test_normalize_time_series_window_keeps_most_recent() {
        let n = Normalizer::default();
        let records = vec![
            record(&[("date", json!("2024-11-07")), ("amount", json!(1))]),
            record(&[("date", json!("2024-11-08")), ("amount", json!(2))]),
            record(&[("date", json!("2024-11-09")), ("amount", json!(3))]),
        ];
        let points = n.normalize_time_series(&records, Some(2));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "Nov 8");
        assert_eq!(points[1].date, "Nov 9");
    }

    #[test]
    fn test_normalize_time_series_empty_falls_back_to_sample() {
        let n = Normalizer::default();
        let points = n.normalize_time_series(&[], None);
        assert_eq!(points.len(), 13);
        assert_eq!(points[0].date, "Oct 15");
        assert_eq!(points[0].value, 45_000.0);
        assert!((points[0].value2 - 31_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_time_series_idempotent_totals() {
        let n = Normalizer::default();
        let raw = vec![
            record(&[("date", json!("2024-11-08")), ("amount", json!(100))]),
            record(&[("date", json!("2024-11-08")), ("amount", json!(200))]),
            record(&[("date", json!("2024-11-09")), ("amount", json!(50))]),
        ];
        let first = n.normalize_time_series(&raw, None);

        // Re-feed the aggregated points as if they were raw records.
        let reshaped: Vec<RawRecord> = first
            .iter()
            .map(|p| record(&[("date", json!(p.date)), ("value", json!(p.value))]))
            .collect();
        let second = n.normalize_time_series(&reshaped, None);

        let total_first: f64 = first.iter().map(|p| p.value).sum();
        let total_second: f64 = second.iter().map(|p| p.value).sum();
        assert_eq!(total_first, total_second);
        assert_eq!(first.len(), second.len());
    }
}
