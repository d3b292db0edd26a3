//! End-to-end ledger analysis: classification, aggregation and scoring in a
//! single call, plus the row filter and export rows used by front ends.

use std::collections::BTreeMap;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classification::Category;
use crate::config::ReferenceData;
use crate::entity::EntityKind;
use crate::indicators::{
    classify_rows, AccountLine, EntityIndicatorSet, IndicatorEngine, LedgerRow,
};
use crate::registry::IdentityMap;
use crate::risk::{RiskScorer, RiskTier, RiskVerdict};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAnalysis {
    pub lines: Vec<AccountLine>,
    pub indicators: BTreeMap<String, EntityIndicatorSet>,
    pub verdicts: BTreeMap<String, RiskVerdict>,
}

/// Optional filters over classified lines. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowFilter {
    pub kind: Option<EntityKind>,
    pub category: Option<Category>,
    pub identifier: Option<String>,
}

/// Flat per-entity risk row for tabular export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskReportRow {
    pub identifier: String,
    pub entity_label: String,
    pub entity_kind: EntityKind,
    pub tier: RiskTier,
    pub probability: Rate,
    pub points: u32,
    pub current_ratio: Multiple,
    pub debt_ratio: Rate,
    pub net_margin: Rate,
    pub net_income: Money,
    pub factors: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full pipeline over raw ledger rows.
///
/// `identity` is the output of a prior identifier resolution pass; without
/// it entity kinds come from labels and leading digits only.
pub fn analyze_ledger(
    data: &ReferenceData,
    rows: Vec<LedgerRow>,
    identity: Option<&IdentityMap>,
) -> ComputationOutput<LedgerAnalysis> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let row_count = rows.len();

    // -- Classification -------------------------------------------------------
    let lines = classify_rows(rows, &data.classifier(), identity);

    let unclassified = lines
        .iter()
        .filter(|l| l.category == Category::Unclassified)
        .count();
    if unclassified > 0 {
        warnings.push(format!(
            "{unclassified} of {row_count} rows could not be classified and are excluded from ratios."
        ));
    }
    let unparsed = lines
        .iter()
        .filter(|l| l.amount.is_some() && l.value.is_none())
        .count();
    if unparsed > 0 {
        warnings.push(format!("{unparsed} rows carry a non-numeric amount."));
    }

    // -- Aggregation ----------------------------------------------------------
    let indicators = IndicatorEngine::new().aggregate(&lines, identity);
    if indicators.is_empty() && row_count > 0 {
        warnings.push("No entity has a countable amount; no indicators were produced.".into());
    }

    // -- Scoring --------------------------------------------------------------
    let verdicts = score_all(&data.scorer(), &indicators);

    log::debug!(
        "analyzed {} rows into {} entities",
        row_count,
        indicators.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "prefix_match": "first declared prefix wins",
        "zero_denominator": "ratio reported as 0",
        "total_assets": "sum of asset categories only",
        "thresholds": data.thresholds,
    });

    with_metadata(
        "Health-sector ledger risk analysis",
        &assumptions,
        warnings,
        elapsed,
        LedgerAnalysis {
            lines,
            indicators,
            verdicts,
        },
    )
}

/// Score every entity's complete ratio set.
pub fn score_all(
    scorer: &RiskScorer,
    indicators: &BTreeMap<String, EntityIndicatorSet>,
) -> BTreeMap<String, RiskVerdict> {
    let score_one = |(id, set): (&String, &EntityIndicatorSet)| {
        let verdict = scorer
            .score(&set.ratios())
            .unwrap_or_else(|_| RiskVerdict::uncomputable());
        (id.clone(), verdict)
    };

    #[cfg(feature = "parallel")]
    let verdicts = indicators.par_iter().map(score_one).collect();

    #[cfg(not(feature = "parallel"))]
    let verdicts = indicators.iter().map(score_one).collect();

    verdicts
}

impl RowFilter {
    pub fn matches(&self, line: &AccountLine) -> bool {
        self.kind.map_or(true, |k| line.entity_kind == k)
            && self.category.map_or(true, |c| line.category == c)
            && self
                .identifier
                .as_deref()
                .map_or(true, |id| line.identifier == id.trim())
    }

    pub fn apply<'a>(&self, lines: &'a [AccountLine]) -> Vec<&'a AccountLine> {
        lines.iter().filter(|l| self.matches(l)).collect()
    }
}

impl RiskReportRow {
    pub fn new(set: &EntityIndicatorSet, verdict: &RiskVerdict) -> Self {
        RiskReportRow {
            identifier: set.identifier.clone(),
            entity_label: set.entity_label.clone(),
            entity_kind: set.entity_kind,
            tier: verdict.tier,
            probability: verdict.probability,
            points: verdict.points,
            current_ratio: set.current_ratio,
            debt_ratio: set.debt_ratio,
            net_margin: set.net_margin,
            net_income: set.net_income,
            factors: verdict.factor_summary(),
        }
    }
}

/// Join indicators with their verdicts, highest probability first. Ties
/// keep identifier order.
pub fn risk_report(
    indicators: &BTreeMap<String, EntityIndicatorSet>,
    verdicts: &BTreeMap<String, RiskVerdict>,
) -> Vec<RiskReportRow> {
    let mut rows: Vec<RiskReportRow> = indicators
        .iter()
        .filter_map(|(id, set)| verdicts.get(id).map(|v| RiskReportRow::new(set, v)))
        .collect();
    rows.sort_by(|a, b| b.probability.cmp(&a.probability));
    rows
}

/// Sum of parsed amounts over a filtered view, mostly for display totals.
/// Saturates at the decimal limits.
pub fn total_amount<'a>(lines: impl IntoIterator<Item = &'a AccountLine>) -> Money {
    lines
        .into_iter()
        .filter_map(|l| l.value)
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
