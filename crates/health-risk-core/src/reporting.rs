//! Aggregate views over pipeline output for dashboards and exports.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::classification::Category;
use crate::entity::EntityKind;
use crate::error::HealthRiskError;
use crate::indicators::{AccountLine, EntityIndicatorSet};
use crate::risk::{RiskTier, RiskVerdict};
use crate::types::{Money, Multiple, Rate};
use crate::CoreResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummaryRow {
    pub category: Category,
    pub entity_kind: EntityKind,
    pub total_amount: Money,
    pub entity_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub identifier: String,
    pub entity_label: String,
    pub is_principal: bool,
    pub current_ratio: Multiple,
    pub debt_ratio: Rate,
    pub net_margin: Rate,
}

/// Min-max scores in [0, 1]; higher is healthier on every axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedScores {
    pub identifier: String,
    pub liquidity: Rate,
    pub solvency: Rate,
    pub profitability: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityComparison {
    pub rows: Vec<ComparisonRow>,
    pub normalized: Vec<NormalizedScores>,
    /// Requested peers that have no indicator set.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCount {
    pub tier: RiskTier,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Category summary
// ---------------------------------------------------------------------------

/// Summed parsed amounts and distinct entity counts per (category, kind).
pub fn category_summary<'a>(
    lines: impl IntoIterator<Item = &'a AccountLine>,
) -> Vec<CategorySummaryRow> {
    let mut buckets: BTreeMap<(Category, EntityKind), (Money, BTreeSet<&str>)> = BTreeMap::new();
    for line in lines {
        let (total, ids) = buckets
            .entry((line.category, line.entity_kind))
            .or_insert_with(|| (Decimal::ZERO, BTreeSet::new()));
        if let Some(value) = line.value {
            *total = total.saturating_add(value);
        }
        ids.insert(line.identifier.as_str());
    }

    buckets
        .into_iter()
        .map(|((category, entity_kind), (total_amount, ids))| CategorySummaryRow {
            category,
            entity_kind,
            total_amount,
            entity_count: ids.len(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Entity comparison
// ---------------------------------------------------------------------------

/// Compare a principal entity against peers on liquidity, solvency and
/// profitability.
///
/// Entities whose current ratio is zero carry no usable balance sheet and
/// are left out of the normalized view.
pub fn compare_entities(
    indicators: &BTreeMap<String, EntityIndicatorSet>,
    principal: &str,
    peers: &[String],
) -> CoreResult<EntityComparison> {
    let principal = principal.trim();
    let head = indicators
        .get(principal)
        .ok_or_else(|| HealthRiskError::InvalidInput {
            field: "principal".into(),
            reason: format!("no indicators for identifier '{principal}'"),
        })?;

    let mut selected: Vec<&EntityIndicatorSet> = vec![head];
    let mut missing = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::from([principal]);
    for peer in peers {
        let peer = peer.trim();
        if !seen.insert(peer) {
            continue;
        }
        match indicators.get(peer) {
            Some(set) => selected.push(set),
            None => missing.push(peer.to_string()),
        }
    }
    if !missing.is_empty() {
        log::warn!("comparison peers without indicators: {}", missing.join(", "));
    }

    let rows = selected
        .iter()
        .map(|s| ComparisonRow {
            identifier: s.identifier.clone(),
            entity_label: s.entity_label.clone(),
            is_principal: s.identifier == principal,
            current_ratio: s.current_ratio,
            debt_ratio: s.debt_ratio,
            net_margin: s.net_margin,
        })
        .collect();

    let scored: Vec<&EntityIndicatorSet> = selected
        .into_iter()
        .filter(|s| !s.current_ratio.is_zero())
        .collect();
    let liquidity = min_max(scored.iter().map(|s| s.current_ratio));
    let solvency = min_max(scored.iter().map(|s| Decimal::ONE.saturating_sub(s.debt_ratio)));
    let profitability = min_max(scored.iter().map(|s| s.net_margin));

    let normalized = scored
        .iter()
        .enumerate()
        .map(|(i, s)| NormalizedScores {
            identifier: s.identifier.clone(),
            liquidity: liquidity[i],
            solvency: solvency[i],
            profitability: profitability[i],
        })
        .collect();

    Ok(EntityComparison {
        rows,
        normalized,
        missing,
    })
}

/// Rescale to [0, 1]. A constant series maps to 0.5. A spread wider than
/// the decimal range is rescaled from halved values.
fn min_max(values: impl Iterator<Item = Decimal>) -> Vec<Decimal> {
    rescale(values.collect())
}

fn rescale(values: Vec<Decimal>) -> Vec<Decimal> {
    let (Some(min), Some(max)) = (values.iter().min().copied(), values.iter().max().copied())
    else {
        return values;
    };
    let Some(range) = max.checked_sub(min) else {
        return rescale(values.iter().map(|v| *v / dec!(2)).collect());
    };
    if range.is_zero() {
        return vec![dec!(0.5); values.len()];
    }
    values
        .iter()
        .map(|v| {
            v.checked_sub(min)
                .and_then(|d| d.checked_div(range))
                .unwrap_or(dec!(0.5))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tier distribution
// ---------------------------------------------------------------------------

/// Entity counts per tier, always listing every tier from HIGH to
/// UNCOMPUTABLE.
pub fn tier_distribution<'a>(
    verdicts: impl IntoIterator<Item = &'a RiskVerdict>,
) -> Vec<TierCount> {
    let mut counts: BTreeMap<RiskTier, usize> = BTreeMap::new();
    for v in verdicts {
        *counts.entry(v.tier).or_default() += 1;
    }
    RiskTier::ALL
        .into_iter()
        .map(|tier| TierCount {
            tier,
            count: counts.get(&tier).copied().unwrap_or(0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{AccountClassifier, Taxonomy};
    use crate::indicators::{classify_rows, CategoryTotals, LedgerRow};
    use pretty_assertions::assert_eq;

    fn set(id: &str, current: Decimal, debt: Decimal, margin: Decimal) -> EntityIndicatorSet {
        let mut s = EntityIndicatorSet::from_totals(
            id.into(),
            format!("Entity {id}"),
            EntityKind::Ips,
            CategoryTotals::new(),
        );
        s.current_ratio = current;
        s.debt_ratio = debt;
        s.net_margin = margin;
        s
    }

    fn indicator_map(sets: Vec<EntityIndicatorSet>) -> BTreeMap<String, EntityIndicatorSet> {
        sets.into_iter().map(|s| (s.identifier.clone(), s)).collect()
    }

    #[test]
    fn test_category_summary_groups_and_counts() {
        let tax = Taxonomy::builtin();
        let rows = vec![
            ("900000001", "IPS A", "1", "100"),
            ("900000001", "IPS A", "12", "50"),
            ("900000002", "IPS B", "1", "25"),
            ("800000003", "EPS C", "1", "10"),
            ("800000003", "EPS C", "4", "x"),
        ]
        .into_iter()
        .map(|(id, label, code, amount)| LedgerRow {
            identifier: Some(id.into()),
            entity_label: Some(label.into()),
            account_code: Some(code.into()),
            account_label: None,
            amount: Some(amount.into()),
        })
        .collect();
        let lines = classify_rows(rows, &AccountClassifier::new(&tax), None);

        let summary = category_summary(&lines);
        assert_eq!(
            summary,
            vec![
                CategorySummaryRow {
                    category: Category::CurrentAssets,
                    entity_kind: EntityKind::Eps,
                    total_amount: dec!(10),
                    entity_count: 1,
                },
                CategorySummaryRow {
                    category: Category::CurrentAssets,
                    entity_kind: EntityKind::Ips,
                    total_amount: dec!(175),
                    entity_count: 2,
                },
                CategorySummaryRow {
                    category: Category::Revenue,
                    entity_kind: EntityKind::Eps,
                    total_amount: Decimal::ZERO,
                    entity_count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_compare_entities_normalizes() {
        let map = indicator_map(vec![
            set("1", dec!(2.0), dec!(0.2), dec!(0.10)),
            set("2", dec!(1.0), dec!(0.6), dec!(0.00)),
            set("3", dec!(1.5), dec!(0.4), dec!(0.05)),
        ]);
        let cmp = compare_entities(&map, "1", &["2".into(), "3".into()]).unwrap();
        assert_eq!(cmp.rows.len(), 3);
        assert!(cmp.rows[0].is_principal);
        assert!(cmp.missing.is_empty());

        let first = &cmp.normalized[0];
        assert_eq!(first.liquidity, dec!(1));
        assert_eq!(first.solvency, dec!(1));
        assert_eq!(first.profitability, dec!(1));
        let second = &cmp.normalized[1];
        assert_eq!(second.liquidity, dec!(0));
        assert_eq!(second.solvency, dec!(0));
        let third = &cmp.normalized[2];
        assert_eq!(third.liquidity, dec!(0.5));
        assert_eq!(third.profitability, dec!(0.5));
    }

    #[test]
    fn test_compare_constant_series_is_half() {
        let map = indicator_map(vec![
            set("1", dec!(1.2), dec!(0.3), dec!(0.1)),
            set("2", dec!(1.2), dec!(0.3), dec!(0.1)),
        ]);
        let cmp = compare_entities(&map, "1", &["2".into()]).unwrap();
        for n in &cmp.normalized {
            assert_eq!(n.liquidity, dec!(0.5));
            assert_eq!(n.solvency, dec!(0.5));
        }
    }

    #[test]
    fn test_compare_excludes_zero_current_ratio_and_reports_missing() {
        let map = indicator_map(vec![
            set("1", dec!(2.0), dec!(0.2), dec!(0.1)),
            set("2", dec!(0), dec!(0.9), dec!(-0.5)),
        ]);
        let cmp =
            compare_entities(&map, "1", &["2".into(), "404".into(), "1".into()]).unwrap();
        assert_eq!(cmp.rows.len(), 2);
        assert_eq!(cmp.normalized.len(), 1);
        assert_eq!(cmp.normalized[0].identifier, "1");
        assert_eq!(cmp.missing, vec!["404".to_string()]);
    }

    #[test]
    fn test_min_max_spread_wider_than_decimal_range() {
        let big = Decimal::from_scientific("5e28").unwrap();
        let scaled = min_max(vec![-big, big, Decimal::ZERO].into_iter());
        assert_eq!(scaled, vec![dec!(0), dec!(1), dec!(0.5)]);
    }

    #[test]
    fn test_category_summary_saturates() {
        let tax = Taxonomy::builtin();
        let rows = (0..2)
            .map(|_| LedgerRow {
                identifier: Some("900000001".into()),
                entity_label: Some("IPS A".into()),
                account_code: Some("1".into()),
                account_label: None,
                amount: Some("5e28".into()),
            })
            .collect();
        let lines = classify_rows(rows, &AccountClassifier::new(&tax), None);
        let summary = category_summary(&lines);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_amount, Decimal::MAX);
        assert_eq!(summary[0].entity_count, 1);
    }

    #[test]
    fn test_compare_unknown_principal() {
        let map = indicator_map(vec![set("1", dec!(1), dec!(0), dec!(0))]);
        match compare_entities(&map, "999", &[]).unwrap_err() {
            HealthRiskError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_tier_distribution_lists_every_tier() {
        let verdicts = vec![
            RiskVerdict::uncomputable(),
            RiskVerdict {
                tier: RiskTier::High,
                probability: dec!(0.95),
                points: 8,
                factors: Vec::new(),
            },
            RiskVerdict::uncomputable(),
        ];
        let dist = tier_distribution(&verdicts);
        let counts: Vec<(RiskTier, usize)> = dist.iter().map(|t| (t.tier, t.count)).collect();
        assert_eq!(
            counts,
            vec![
                (RiskTier::High, 1),
                (RiskTier::Medium, 0),
                (RiskTier::Low, 0),
                (RiskTier::Uncomputable, 2),
            ]
        );
    }
}
