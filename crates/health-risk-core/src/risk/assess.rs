use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::indicators::{Ratio, RatioSet};
use crate::risk::scorer::{RiskScorer, RiskVerdict};
use crate::types::parse_decimal;

/// Parse loosely-typed ratio values into a complete [`RatioSet`].
///
/// Numbers and numeric strings are accepted. Returns `None` when any of
/// the seven named ratios is missing or not numeric.
pub fn parse_ratio_set(raw: &BTreeMap<String, Value>) -> Option<RatioSet> {
    Ratio::ALL
        .into_iter()
        .map(|r| raw.get(r.name()).and_then(value_to_decimal).map(|v| (r, v)))
        .collect()
}

/// Score a loosely-typed ratio map with the default thresholds.
pub fn assess(raw: &BTreeMap<String, Value>) -> RiskVerdict {
    assess_with(&RiskScorer::default(), raw)
}

/// Score a loosely-typed ratio map. Incomplete input yields the
/// `UNCOMPUTABLE` verdict and the scorer is never invoked.
pub fn assess_with(scorer: &RiskScorer, raw: &BTreeMap<String, Value>) -> RiskVerdict {
    match parse_ratio_set(raw) {
        Some(ratios) => scorer
            .score(&ratios)
            .unwrap_or_else(|_| RiskVerdict::uncomputable()),
        None => {
            log::debug!("ratio set incomplete, verdict is uncomputable");
            RiskVerdict::uncomputable()
        }
    }
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}
