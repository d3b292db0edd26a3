use std::time::Instant;

use clap::Args;
use serde::Serialize;
use serde_json::Value;

use health_risk_core::classification::Category;
use health_risk_core::config::ReferenceData;
use health_risk_core::entity::EntityKind;
use health_risk_core::indicators::{
    classify_rows, AccountLine, EntityIndicatorSet, IndicatorEngine,
};
use health_risk_core::pipeline::{analyze_ledger, risk_report, total_amount, RowFilter};
use health_risk_core::registry::ValidationSummary;
use health_risk_core::reporting::{
    category_summary, tier_distribution, CategorySummaryRow, TierCount,
};
use health_risk_core::with_metadata;

use crate::commands::resolve_identity;
use crate::input::ledger::{read_ledger, CLASSIFICATION_COLUMNS};

/// Arguments shared by every ledger-driven command
#[derive(Args)]
pub struct LedgerArgs {
    /// Path to a CSV or JSON ledger (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Skip registry lookups; entity kinds come from labels and identifiers
    #[arg(long)]
    pub no_registry: bool,
}

/// Arguments for ledger classification
#[derive(Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Keep only lines of this entity kind (EPS, IPS, UNDETERMINED, ERROR)
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<EntityKind>,

    /// Keep only lines of this category (English or local name)
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,

    /// Keep only lines of this identifier
    #[arg(long)]
    pub identifier: Option<String>,
}

#[derive(Serialize)]
struct LedgerSummary {
    validation: ValidationSummary,
    categories: Vec<CategorySummaryRow>,
    tiers: Vec<TierCount>,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn run_classify(
    args: ClassifyArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = read_ledger(args.ledger.input.as_deref())?;
    table.require(CLASSIFICATION_COLUMNS)?;

    let start = Instant::now();
    let identity = resolve_identity(data, &table.rows, args.ledger.no_registry);
    let lines = classify_rows(table.rows, &data.classifier(), identity.as_ref());

    let filter = RowFilter {
        kind: args.kind,
        category: args.category,
        identifier: args.identifier,
    };
    let selected: Vec<AccountLine> = filter.apply(&lines).into_iter().cloned().collect();

    let mut warnings = Vec::new();
    let unclassified = selected
        .iter()
        .filter(|l| l.category == Category::Unclassified)
        .count();
    if unclassified > 0 {
        warnings.push(format!("{unclassified} lines could not be classified."));
    }

    let output = with_metadata(
        "Ledger classification (exact code, first declared prefix, label keywords)",
        &serde_json::json!({
            "filter": filter,
            "lines_total": lines.len(),
            "lines_selected": selected.len(),
            "amount_selected": total_amount(&selected),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        selected,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_indicators(
    args: LedgerArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = read_ledger(args.input.as_deref())?;
    table.require(CLASSIFICATION_COLUMNS)?;

    let start = Instant::now();
    let identity = resolve_identity(data, &table.rows, args.no_registry);
    let lines = classify_rows(table.rows, &data.classifier(), identity.as_ref());
    let indicators = IndicatorEngine::new().aggregate(&lines, identity.as_ref());

    let mut warnings = Vec::new();
    if indicators.is_empty() {
        warnings.push("No entity has a countable amount.".into());
    }

    let result: Vec<EntityIndicatorSet> = indicators.into_values().collect();
    let output = with_metadata(
        "Per-entity liquidity, leverage and profitability ratios",
        &serde_json::json!({
            "zero_denominator": "ratio reported as 0",
            "total_assets": "sum of asset categories only",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_score(
    args: LedgerArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = read_ledger(args.input.as_deref())?;
    table.require(CLASSIFICATION_COLUMNS)?;

    let identity = resolve_identity(data, &table.rows, args.no_registry);
    let analysis = analyze_ledger(data, table.rows, identity.as_ref());

    let report = risk_report(&analysis.result.indicators, &analysis.result.verdicts);
    let output = with_metadata(
        &analysis.methodology,
        &analysis.assumptions,
        analysis.warnings.clone(),
        analysis.metadata.computation_time_us,
        report,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_summary(
    args: LedgerArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = read_ledger(args.input.as_deref())?;
    table.require(CLASSIFICATION_COLUMNS)?;

    let identity = resolve_identity(data, &table.rows, args.no_registry);
    let analysis = analyze_ledger(data, table.rows, identity.as_ref());
    let result = &analysis.result;

    let summary = LedgerSummary {
        validation: identity
            .as_ref()
            .map(|m| ValidationSummary::from_records(m.values()))
            .unwrap_or_default(),
        categories: category_summary(&result.lines),
        tiers: tier_distribution(result.verdicts.values()),
    };
    let output = with_metadata(
        "Ledger summary by category, entity kind and risk tier",
        &analysis.assumptions,
        analysis.warnings.clone(),
        analysis.metadata.computation_time_us,
        summary,
    );
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// Argument parsers
// ---------------------------------------------------------------------------

pub fn parse_kind(raw: &str) -> Result<EntityKind, String> {
    match raw.trim().to_uppercase().as_str() {
        "EPS" => Ok(EntityKind::Eps),
        "IPS" => Ok(EntityKind::Ips),
        "UNDETERMINED" | "NO DETERMINADO" => Ok(EntityKind::Undetermined),
        "ERROR" => Ok(EntityKind::Error),
        other => Err(format!("unknown entity kind '{other}'")),
    }
}

pub fn parse_category(raw: &str) -> Result<Category, String> {
    let wanted = raw.trim().to_lowercase();
    Category::ALL
        .into_iter()
        .find(|c| c.name().to_lowercase() == wanted || c.local_name().to_lowercase() == wanted)
        .ok_or_else(|| format!("unknown category '{raw}'"))
}
