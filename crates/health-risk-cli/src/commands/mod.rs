pub mod compare;
pub mod ledger;
pub mod risk;
pub mod validate;

use health_risk_core::config::ReferenceData;
use health_risk_core::indicators::LedgerRow;
use health_risk_core::registry::IdentityMap;

/// Resolve every identifier in `rows` once, unless registry lookups are
/// switched off.
pub fn resolve_identity(
    data: &ReferenceData,
    rows: &[LedgerRow],
    skip_registry: bool,
) -> Option<IdentityMap> {
    if skip_registry {
        return None;
    }
    let entries = rows
        .iter()
        .map(|r| (r.identifier(), r.entity_label.as_deref()));
    Some(data.resolver().resolve_all(entries))
}
