//! The three report kinds, composed from the layout primitives. Each builder
//! tolerates partially-available data: a missing collection renders as an
//! empty table, and a missing entity produces no document at all.

use crate::core::layout::DocumentBuilder;
use crate::core::normalize::Normalizer;
use crate::core::pdf;
use crate::domain::model::{
    EntityKind, RawRecord, RelatedData, ReportArtifact, ReportSection,
};
use chrono::{DateTime, Utc};

pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let grouped = group_thousands(whole);
    if negative {
        format!("-${}.{:02}", grouped, frac)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}

pub fn format_int(value: f64) -> String {
    group_thousands(value.abs().round() as u64)
}

fn group_thousands(mut n: u64) -> String {
    let mut parts = Vec::new();
    loop {
        if n < 1000 {
            parts.push(n.to_string());
            break;
        }
        parts.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    parts.reverse();
    parts.join(",")
}

fn sanitize_code(code: &str) -> String {
    let cleaned: String = code
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// `<Kind>_Report_<code>_<YYYY-MM-DD>.pdf`
pub fn report_file_name(kind: EntityKind, code: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}_Report_{}_{}.pdf",
        kind.as_str(),
        sanitize_code(code),
        generated_at.format("%Y-%m-%d")
    )
}

/// Assemble one report: phase 1 lays out content pages, phase 2 stamps the
/// running footer once the page count is known, then the PDF backend
/// serializes the result.
pub fn build_report(
    normalizer: &Normalizer,
    entity: &RawRecord,
    related: &RelatedData,
    generated_at: DateTime<Utc>,
) -> ReportArtifact {
    let kind = related.kind();
    let name = normalizer.resolve_field(entity, &normalizer.chains.name);
    let code = normalizer.resolve_field(entity, &normalizer.chains.code);

    let mut builder = DocumentBuilder::new();
    builder.title(&format!("{} Report", kind.as_str()), &name);

    match related {
        RelatedData::Property { investments } => {
            property_body(normalizer, entity, investments, &mut builder);
        }
        RelatedData::Organization {
            properties,
            investments,
        } => {
            organization_body(normalizer, entity, properties, investments, &mut builder);
        }
        RelatedData::User {
            portfolio,
            transactions,
        } => {
            user_body(normalizer, entity, portfolio, transactions, &mut builder);
        }
    }

    let mut document = builder.finish();
    document.stamp_footers(generated_at);

    ReportArtifact {
        file_name: report_file_name(kind, &code, generated_at),
        bytes: pdf::render(&document),
    }
}

fn info_block(builder: &mut DocumentBuilder, title: &str, rows: &[(String, String)]) {
    builder.section_header(title);
    for (i, (label, value)) in rows.iter().enumerate() {
        builder.info_row(label, value, i % 2 == 1);
    }
    builder.spacer(4.0);
}

fn property_body(
    n: &Normalizer,
    entity: &RawRecord,
    investments: &[RawRecord],
    builder: &mut DocumentBuilder,
) {
    let total_tokens = n.resolve_number(entity, &n.chains.total_tokens).value();
    let available = n.resolve_number(entity, &n.chains.available_tokens).value();
    let bought = (total_tokens - available).max(0.0);
    let funding_pct = if total_tokens > 0.0 {
        bought / total_tokens * 100.0
    } else {
        0.0
    };

    let rows = vec![
        (
            "Property Name".to_string(),
            n.resolve_field(entity, &n.chains.name),
        ),
        (
            "Property Code".to_string(),
            n.resolve_field(entity, &n.chains.code),
        ),
        (
            "Status".to_string(),
            n.resolve_field(entity, &n.chains.status),
        ),
        (
            "Location".to_string(),
            n.resolve_field(entity, &n.chains.location),
        ),
        (
            "Total Value".to_string(),
            format_currency(n.resolve_number(entity, &n.chains.total_value).value()),
        ),
        ("Total Tokens".to_string(), format_int(total_tokens)),
        ("Available Tokens".to_string(), format_int(available)),
        ("Tokens Sold".to_string(), format_int(bought)),
        (
            "Funding Progress".to_string(),
            format!("{:.1}%", funding_pct),
        ),
    ];
    info_block(builder, "Property Information", &rows);

    builder.table(&ReportSection {
        title: "Investment Details".to_string(),
        columns: vec![
            "Investor".to_string(),
            "Amount".to_string(),
            "Tokens".to_string(),
            "Status".to_string(),
        ],
        rows: investments
            .iter()
            .map(|inv| {
                vec![
                    n.resolve_field(inv, &n.chains.investor),
                    format_currency(n.resolve_amount(inv)),
                    format_int(n.resolve_number(inv, &n.chains.tokens).value()),
                    n.resolve_field(inv, &n.chains.status),
                ]
            })
            .collect(),
        overflow_noun: "investments".to_string(),
    });
}

fn organization_body(
    n: &Normalizer,
    entity: &RawRecord,
    properties: &[RawRecord],
    investments: &[RawRecord],
    builder: &mut DocumentBuilder,
) {
    let rows = vec![
        (
            "Organization Name".to_string(),
            n.resolve_field(entity, &n.chains.name),
        ),
        (
            "Organization Code".to_string(),
            n.resolve_field(entity, &n.chains.code),
        ),
        (
            "Status".to_string(),
            n.resolve_field(entity, &n.chains.status),
        ),
        (
            "Contact Email".to_string(),
            n.resolve_field(entity, &n.chains.email),
        ),
    ];
    info_block(builder, "Organization Information", &rows);

    let total_volume: f64 = investments.iter().map(|r| n.resolve_amount(r)).sum();
    let stats = vec![
        (
            "Total Investment Volume".to_string(),
            format_currency(total_volume),
        ),
        ("Properties".to_string(), properties.len().to_string()),
        ("Investments".to_string(), investments.len().to_string()),
    ];
    info_block(builder, "Summary Statistics", &stats);

    builder.table(&ReportSection {
        title: "Properties List".to_string(),
        columns: vec![
            "Property".to_string(),
            "Value".to_string(),
            "Location".to_string(),
            "Status".to_string(),
        ],
        rows: properties
            .iter()
            .map(|p| {
                vec![
                    n.resolve_field(p, &n.chains.name),
                    format_currency(n.resolve_number(p, &n.chains.total_value).value()),
                    n.resolve_field(p, &n.chains.location),
                    n.resolve_field(p, &n.chains.status),
                ]
            })
            .collect(),
        overflow_noun: "properties".to_string(),
    });
}

fn user_body(
    n: &Normalizer,
    entity: &RawRecord,
    portfolio: &[RawRecord],
    transactions: &[RawRecord],
    builder: &mut DocumentBuilder,
) {
    let rows = vec![
        ("Name".to_string(), n.resolve_field(entity, &n.chains.name)),
        ("Email".to_string(), n.resolve_field(entity, &n.chains.email)),
        (
            "Status".to_string(),
            n.resolve_field(entity, &n.chains.status),
        ),
    ];
    info_block(builder, "User Information", &rows);

    let portfolio_total: f64 = portfolio.iter().map(|r| n.resolve_amount(r)).sum();
    let roi = n.resolve_number(entity, &n.chains.roi).value();
    let summary = vec![
        (
            "Wallet Balance".to_string(),
            format_currency(n.resolve_number(entity, &n.chains.wallet_balance).value()),
        ),
        (
            "Portfolio Total".to_string(),
            format_currency(portfolio_total),
        ),
        ("ROI".to_string(), format!("{:.1}%", roi)),
    ];
    info_block(builder, "Financial Summary", &summary);

    builder.table(&ReportSection {
        title: "Portfolio".to_string(),
        columns: vec![
            "Property".to_string(),
            "Amount".to_string(),
            "Tokens".to_string(),
            "Status".to_string(),
        ],
        rows: portfolio
            .iter()
            .map(|h| {
                vec![
                    n.resolve_field(h, &n.chains.name),
                    format_currency(n.resolve_amount(h)),
                    format_int(n.resolve_number(h, &n.chains.tokens).value()),
                    n.resolve_field(h, &n.chains.status),
                ]
            })
            .collect(),
        overflow_noun: "holdings".to_string(),
    });
    builder.spacer(4.0);

    builder.table(&ReportSection {
        title: "Transactions".to_string(),
        columns: vec![
            "Date".to_string(),
            "Type".to_string(),
            "Amount".to_string(),
            "Status".to_string(),
        ],
        rows: transactions
            .iter()
            .map(|tx| {
                vec![
                    n.resolve_date_key(tx)
                        .map(|k| k.label)
                        .unwrap_or_else(|| crate::core::normalize::NOT_AVAILABLE.to_string()),
                    n.resolve_field(tx, &n.chains.tx_type),
                    format_currency(n.resolve_amount(tx)),
                    n.resolve_field(tx, &n.chains.status),
                ]
            })
            .collect(),
        overflow_noun: "transactions".to_string(),
    });
}
