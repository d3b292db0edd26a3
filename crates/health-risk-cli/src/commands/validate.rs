use std::time::Instant;

use clap::Args;
use serde::Serialize;
use serde_json::Value;

use health_risk_core::config::ReferenceData;
use health_risk_core::registry::{IdentifierRecord, ValidationSummary};
use health_risk_core::with_metadata;

use crate::input::ledger::{read_ledger, VALIDATION_COLUMNS};

/// Arguments for identifier validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to a CSV or JSON ledger (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Only list identifiers the registry does not know
    #[arg(long)]
    pub invalid_only: bool,
}

#[derive(Serialize)]
struct ValidationReport {
    summary: ValidationSummary,
    records: Vec<IdentifierRecord>,
}

pub fn run_validate(
    args: ValidateArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = read_ledger(args.input.as_deref())?;
    table.require(VALIDATION_COLUMNS)?;

    let start = Instant::now();
    let entries = table
        .rows
        .iter()
        .map(|r| (r.identifier(), r.entity_label.as_deref()));
    let identity = data.resolver().resolve_all(entries);
    let summary = ValidationSummary::from_records(identity.values());

    let mut warnings = Vec::new();
    let unknown = summary.total_entities - summary.valid_count;
    if unknown > 0 {
        warnings.push(format!(
            "{unknown} identifiers are not in the registry; their kind comes from the leading digit."
        ));
    }

    let records: Vec<IdentifierRecord> = identity
        .into_values()
        .filter(|r| !args.invalid_only || !r.valid)
        .collect();

    let output = with_metadata(
        "Registry identifier validation",
        &serde_json::json!({
            "registry_entries": data.registry.len(),
            "invalid_only": args.invalid_only,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        ValidationReport { summary, records },
    );
    Ok(serde_json::to_value(output)?)
}
