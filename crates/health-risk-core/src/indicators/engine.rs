use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::entity::resolve_kind;
use crate::indicators::ledger::AccountLine;
use crate::indicators::ratios::{CategoryTotals, EntityIndicatorSet};
use crate::registry::{normalize_identifier, IdentityMap};

/// Entity label reported when none of an entity's rows carries one.
pub const MISSING_ENTITY_LABEL: &str = "No entity label";

/// Aggregates classified ledger lines into per-entity indicator sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        IndicatorEngine
    }

    /// Group `lines` by identifier and compute one indicator set per group.
    ///
    /// Lines with an absent or zero amount do not count toward totals; a
    /// group left with no countable amount produces no entry. A line whose
    /// amount would overflow its category total is skipped and logged.
    pub fn aggregate(
        &self,
        lines: &[AccountLine],
        identity: Option<&IdentityMap>,
    ) -> BTreeMap<String, EntityIndicatorSet> {
        let mut groups: BTreeMap<&str, Vec<&AccountLine>> = BTreeMap::new();
        for line in lines {
            groups.entry(line.identifier.trim()).or_default().push(line);
        }

        #[cfg(feature = "parallel")]
        let computed: Vec<(String, EntityIndicatorSet)> = groups
            .par_iter()
            .filter_map(|(id, group)| {
                build_indicator_set(id, group, identity).map(|set| (id.to_string(), set))
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let computed: Vec<(String, EntityIndicatorSet)> = groups
            .iter()
            .filter_map(|(id, group)| {
                build_indicator_set(id, group, identity).map(|set| (id.to_string(), set))
            })
            .collect();

        let dropped = groups.len() - computed.len();
        if dropped > 0 {
            log::debug!("{dropped} entities had no countable amounts and were skipped");
        }

        computed.into_iter().collect()
    }
}

fn build_indicator_set(
    identifier: &str,
    group: &[&AccountLine],
    identity: Option<&IdentityMap>,
) -> Option<EntityIndicatorSet> {
    let mut totals = CategoryTotals::new();
    for line in group {
        let Some(value) = line.countable_value() else {
            continue;
        };
        let total = totals.entry(line.category).or_default();
        match total.checked_add(value) {
            Some(sum) => *total = sum,
            None => log::warn!(
                "{identifier}: amount {value} overflows the {} total and is skipped",
                line.category
            ),
        }
    }
    if totals.is_empty() {
        return None;
    }

    let label = group
        .iter()
        .filter_map(|l| l.entity_label.as_deref())
        .map(str::trim)
        .find(|l| !l.is_empty());

    let normalized = normalize_identifier(identifier);
    let record = identity.and_then(|m| m.get(&normalized));
    let kind = resolve_kind(&normalized, label, record);

    Some(EntityIndicatorSet::from_totals(
        identifier.to_string(),
        label.unwrap_or(MISSING_ENTITY_LABEL).to_string(),
        kind,
        totals,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
