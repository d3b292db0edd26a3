use std::time::Instant;

use clap::Args;
use serde_json::Value;

use health_risk_core::config::ReferenceData;
use health_risk_core::indicators::{classify_rows, IndicatorEngine};
use health_risk_core::reporting::compare_entities;
use health_risk_core::with_metadata;

use crate::commands::ledger::LedgerArgs;
use crate::commands::resolve_identity;
use crate::input::ledger::{read_ledger, CLASSIFICATION_COLUMNS};

/// Arguments for entity comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Identifier of the entity under review
    #[arg(long)]
    pub principal: String,

    /// Comma-separated identifiers to compare against
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<String>,
}

pub fn run_compare(
    args: CompareArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = read_ledger(args.ledger.input.as_deref())?;
    table.require(CLASSIFICATION_COLUMNS)?;

    let start = Instant::now();
    let identity = resolve_identity(data, &table.rows, args.ledger.no_registry);
    let lines = classify_rows(table.rows, &data.classifier(), identity.as_ref());
    let indicators = IndicatorEngine::new().aggregate(&lines, identity.as_ref());

    let comparison = compare_entities(&indicators, &args.principal, &args.peers)?;

    let mut warnings = Vec::new();
    if !comparison.missing.is_empty() {
        warnings.push(format!(
            "No indicators for: {}.",
            comparison.missing.join(", ")
        ));
    }
    let excluded = comparison.rows.len() - comparison.normalized.len();
    if excluded > 0 {
        warnings.push(format!(
            "{excluded} entities with a zero current ratio are left out of the normalized scores."
        ));
    }

    let output = with_metadata(
        "Min-max normalized peer comparison",
        &serde_json::json!({
            "solvency": "1 - debt_ratio",
            "constant_series": "0.5",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        comparison,
    );
    Ok(serde_json::to_value(output)?)
}
