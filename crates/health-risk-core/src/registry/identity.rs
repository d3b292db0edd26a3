use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entity::{kind_from_leading_digit, EntityKind};
use crate::registry::table::EntityRegistry;
use crate::types::{parse_decimal, timestamp_format};

/// Registry name reported for identifiers the registry does not know.
pub const NOT_FOUND_NAME: &str = "NOT FOUND IN REGISTRY";
/// Registry status reported for identifiers the registry does not know.
pub const NOT_VERIFIED_STATUS: &str = "NOT VERIFIED";
/// Status and kind marker for lookups that failed internally.
pub const ERROR_STATUS: &str = "ERROR";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of resolving one identifier against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    /// Digits-only identifier.
    pub identifier: String,
    pub registry_name: String,
    pub kind: EntityKind,
    pub registry_status: String,
    pub valid: bool,
    #[serde(with = "timestamp_format")]
    pub checked_at: NaiveDateTime,
    /// Label supplied by the caller alongside the identifier.
    pub label: String,
}

/// Resolved identities keyed by normalized identifier.
pub type IdentityMap = BTreeMap<String, IdentifierRecord>;

/// Headline counts over a set of resolved identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_entities: usize,
    pub eps_count: usize,
    pub ips_count: usize,
    pub valid_count: usize,
}

/// Resolves raw identifiers against an injected registry.
pub struct IdentityResolver<'a> {
    registry: &'a dyn EntityRegistry,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Reduce a raw identifier to its digits.
///
/// Values carrying a decimal point are first coerced through a numeric parse
/// so spreadsheet artifacts such as `"800123456.0"` lose their fraction
/// instead of gaining a trailing zero. Text that does not parse (for example
/// `"800.123.456"`) is stripped as-is.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('.') {
        if let Some(value) = parse_decimal(trimmed) {
            return digits_only(&value.trunc().to_string());
        }
    }
    digits_only(trimmed)
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

impl<'a> IdentityResolver<'a> {
    pub fn new(registry: &'a dyn EntityRegistry) -> Self {
        IdentityResolver { registry }
    }

    /// Resolve an identifier, stamping the record with the current local time.
    pub fn resolve(&self, identifier: &str, label: &str) -> IdentifierRecord {
        self.resolve_at(identifier, label, chrono::Local::now().naive_local())
    }

    /// Resolve an identifier with an explicit lookup timestamp. Never fails:
    /// a registry error becomes an `ERROR` record.
    pub fn resolve_at(
        &self,
        identifier: &str,
        label: &str,
        checked_at: NaiveDateTime,
    ) -> IdentifierRecord {
        let normalized = normalize_identifier(identifier);

        match self.registry.lookup(&normalized) {
            Ok(Some(entry)) => IdentifierRecord {
                identifier: normalized,
                registry_name: entry.name,
                kind: entry.kind,
                registry_status: entry.status,
                valid: true,
                checked_at,
                label: label.to_string(),
            },
            Ok(None) => IdentifierRecord {
                kind: kind_from_leading_digit(&normalized),
                identifier: normalized,
                registry_name: NOT_FOUND_NAME.to_string(),
                registry_status: NOT_VERIFIED_STATUS.to_string(),
                valid: false,
                checked_at,
                label: label.to_string(),
            },
            Err(e) => {
                log::warn!("registry lookup failed for {normalized}: {e}");
                IdentifierRecord {
                    identifier: normalized,
                    registry_name: format!("ERROR: {e}"),
                    kind: EntityKind::Error,
                    registry_status: ERROR_STATUS.to_string(),
                    valid: false,
                    checked_at,
                    label: label.to_string(),
                }
            }
        }
    }

    /// Resolve every distinct identifier in `entries` once.
    ///
    /// Blank identifiers are skipped. The label kept for an identifier is the
    /// first non-blank label seen for it.
    pub fn resolve_all<'r, I>(&self, entries: I) -> IdentityMap
    where
        I: IntoIterator<Item = (&'r str, Option<&'r str>)>,
    {
        let checked_at = chrono::Local::now().naive_local();
        let mut labels: BTreeMap<&str, &str> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();

        for (raw, label) in entries {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let label = label.map(str::trim).unwrap_or_default();
            match labels.get_mut(raw) {
                Some(existing) if existing.is_empty() => *existing = label,
                Some(_) => {}
                None => {
                    labels.insert(raw, label);
                    order.push(raw);
                }
            }
        }

        let mut map = IdentityMap::new();
        for raw in order {
            let label = labels.get(raw).copied().unwrap_or_default();
            let record = self.resolve_at(raw, label, checked_at);
            map.entry(record.identifier.clone()).or_insert(record);
        }

        log::debug!("resolved {} distinct identifiers", map.len());
        map
    }
}

impl ValidationSummary {
    pub fn from_records<'r>(records: impl IntoIterator<Item = &'r IdentifierRecord>) -> Self {
        let mut summary = ValidationSummary::default();
        for record in records {
            summary.total_entities += 1;
            match record.kind {
                EntityKind::Eps => summary.eps_count += 1,
                EntityKind::Ips => summary.ips_count += 1,
                _ => {}
            }
            if record.valid {
                summary.valid_count += 1;
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthRiskError;
    use crate::registry::table::{RegistryEntry, StaticRegistry};
    use crate::CoreResult;
    use chrono::NaiveDate;

    struct FailingRegistry;

    impl EntityRegistry for FailingRegistry {
        fn lookup(&self, identifier: &str) -> CoreResult<Option<RegistryEntry>> {
            Err(HealthRiskError::Registry {
                identifier: identifier.to_string(),
                reason: "backend unavailable".into(),
            })
        }
    }

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap()
    }

    #[test]
    fn test_normalize_strips_formatting() {
        assert_eq!(normalize_identifier(" 800-123-456 "), "800123456");
        assert_eq!(normalize_identifier("800.123.456"), "800123456");
        assert_eq!(normalize_identifier("NIT 900987654-1"), "9009876541");
    }

    #[test]
    fn test_normalize_drops_spreadsheet_fraction() {
        assert_eq!(normalize_identifier("123456.0"), "123456");
        assert_eq!(normalize_identifier("800123456.0"), "800123456");
        assert_eq!(normalize_identifier("8.00123456E8"), "800123456");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_identifier(""), "");
        assert_eq!(normalize_identifier("   "), "");
        assert_eq!(normalize_identifier("abc"), "");
    }

    #[test]
    fn test_resolve_registry_hit() {
        let reg = StaticRegistry::builtin();
        let resolver = IdentityResolver::new(&reg);
        let rec = resolver.resolve_at("900987654", "Clinica del Country SA", fixed_time());
        assert!(rec.valid);
        assert_eq!(rec.registry_name, "CLINICA DEL COUNTRY");
        assert_eq!(rec.kind, EntityKind::Ips);
        assert_eq!(rec.registry_status, "ACTIVE");
        assert_eq!(rec.label, "Clinica del Country SA");
        assert_eq!(rec.checked_at, fixed_time());
    }

    #[test]
    fn test_resolve_miss_uses_leading_digit() {
        let reg = StaticRegistry::builtin();
        let resolver = IdentityResolver::new(&reg);

        let eps = resolver.resolve_at("811111111", "", fixed_time());
        assert!(!eps.valid);
        assert_eq!(eps.kind, EntityKind::Eps);
        assert_eq!(eps.registry_name, NOT_FOUND_NAME);
        assert_eq!(eps.registry_status, NOT_VERIFIED_STATUS);

        let ips = resolver.resolve_at("9123", "", fixed_time());
        assert_eq!(ips.kind, EntityKind::Ips);

        let other = resolver.resolve_at("123456789", "", fixed_time());
        assert_eq!(other.kind, EntityKind::Undetermined);
    }

    #[test]
    fn test_resolve_miss_ignores_label_for_kind() {
        let reg = StaticRegistry::builtin();
        let resolver = IdentityResolver::new(&reg);
        let rec = resolver.resolve_at("811111111", "HOSPITAL DEL SUR", fixed_time());
        assert_eq!(rec.kind, EntityKind::Eps);
    }

    #[test]
    fn test_resolve_registry_error_becomes_record() {
        let resolver = IdentityResolver::new(&FailingRegistry);
        let rec = resolver.resolve_at("800123456.0", "EPS X", fixed_time());
        assert_eq!(rec.identifier, "800123456");
        assert_eq!(rec.kind, EntityKind::Error);
        assert_eq!(rec.registry_status, ERROR_STATUS);
        assert!(!rec.valid);
        assert!(rec.registry_name.starts_with("ERROR: "));
        assert!(rec.registry_name.contains("backend unavailable"));
    }

    #[test]
    fn test_resolve_all_dedupes_and_keeps_first_label() {
        let reg = StaticRegistry::builtin();
        let resolver = IdentityResolver::new(&reg);
        let rows = vec![
            ("800123456", Some("")),
            ("800123456", Some("Sanitas")),
            ("800123456", Some("Other")),
            ("", Some("ignored")),
            ("999", None),
        ];
        let map = resolver.resolve_all(rows);
        assert_eq!(map.len(), 2);
        assert_eq!(map["800123456"].label, "Sanitas");
        assert_eq!(map["999"].kind, EntityKind::Ips);
    }

    #[test]
    fn test_validation_summary() {
        let reg = StaticRegistry::builtin();
        let resolver = IdentityResolver::new(&reg);
        let map = resolver.resolve_all(vec![
            ("800123456", None),
            ("900987654", None),
            ("812345678", None),
            ("712345678", None),
        ]);
        let summary = ValidationSummary::from_records(map.values());
        assert_eq!(
            summary,
            ValidationSummary {
                total_entities: 4,
                eps_count: 2,
                ips_count: 1,
                valid_count: 2,
            }
        );
    }

    #[test]
    fn test_record_timestamp_format() {
        let reg = StaticRegistry::builtin();
        let resolver = IdentityResolver::new(&reg);
        let rec = resolver.resolve_at("800123456", "", fixed_time());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["checked_at"], "2024-03-15 10:30:00");
        assert_eq!(json["kind"], "EPS");
    }
}
