use std::collections::BTreeMap;

use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use serde_json::Value;

use health_risk_core::config::{EngineConfig, ReferenceData};
use health_risk_core::indicators::{classify_rows, IndicatorEngine, LedgerRow};
use health_risk_core::registry::IdentityMap;
use health_risk_core::risk::assess_with;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn reference_data(config: Option<EngineConfig>) -> NapiResult<ReferenceData> {
    match config {
        Some(config) => ReferenceData::from_config(config).map_err(to_napi_error),
        None => Ok(ReferenceData::builtin()),
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct IdentifierEntry {
    identifier: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Deserialize)]
struct ResolveInput {
    entries: Vec<IdentifierEntry>,
    #[serde(default)]
    config: Option<EngineConfig>,
}

#[derive(Deserialize)]
struct LedgerInput {
    rows: Vec<LedgerRow>,
    #[serde(default = "default_true")]
    use_registry: bool,
    #[serde(default)]
    config: Option<EngineConfig>,
}

#[derive(Deserialize)]
struct RiskInput {
    ratios: BTreeMap<String, Value>,
    #[serde(default)]
    config: Option<EngineConfig>,
}

fn default_true() -> bool {
    true
}

impl LedgerInput {
    fn identity(&self, data: &ReferenceData) -> Option<IdentityMap> {
        self.use_registry.then(|| {
            data.resolver().resolve_all(
                self.rows
                    .iter()
                    .map(|r| (r.identifier(), r.entity_label.as_deref())),
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[napi]
pub fn resolve_identifiers(input_json: String) -> NapiResult<String> {
    let input: ResolveInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let data = reference_data(input.config)?;
    let identity = data.resolver().resolve_all(
        input
            .entries
            .iter()
            .map(|e| (e.identifier.as_str(), e.label.as_deref())),
    );
    serde_json::to_string(&identity).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[napi]
pub fn classify_ledger(input_json: String) -> NapiResult<String> {
    let input: LedgerInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let data = reference_data(input.config.clone())?;
    let identity = input.identity(&data);
    let lines = classify_rows(input.rows, &data.classifier(), identity.as_ref());
    serde_json::to_string(&lines).map_err(to_napi_error)
}

#[napi]
pub fn aggregate_indicators(input_json: String) -> NapiResult<String> {
    let input: LedgerInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let data = reference_data(input.config.clone())?;
    let identity = input.identity(&data);
    let lines = classify_rows(input.rows, &data.classifier(), identity.as_ref());
    let indicators = IndicatorEngine::new().aggregate(&lines, identity.as_ref());
    serde_json::to_string(&indicators).map_err(to_napi_error)
}

#[napi]
pub fn analyze_ledger(input_json: String) -> NapiResult<String> {
    let input: LedgerInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let data = reference_data(input.config.clone())?;
    let identity = input.identity(&data);
    let output = health_risk_core::pipeline::analyze_ledger(&data, input.rows, identity.as_ref());
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[napi]
pub fn score_risk(input_json: String) -> NapiResult<String> {
    let input: RiskInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let data = reference_data(input.config)?;
    let verdict = assess_with(&data.scorer(), &input.ratios);
    serde_json::to_string(&verdict).map_err(to_napi_error)
}
