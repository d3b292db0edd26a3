use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::error::HealthRiskError;
use crate::registry::identity::normalize_identifier;
use crate::CoreResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One known entity in the health-sector registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub identifier: String,
    pub name: String,
    pub kind: EntityKind,
    pub status: String,
}

/// Source of registry facts. Implementations must be read-only for their
/// whole lifetime so one instance can be shared across threads.
pub trait EntityRegistry: Send + Sync {
    /// Look up a normalized (digits-only) identifier.
    fn lookup(&self, identifier: &str) -> CoreResult<Option<RegistryEntry>>;
}

/// In-process registry snapshot keyed by normalized identifier.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: HashMap<String, RegistryEntry>,
}

// ---------------------------------------------------------------------------
// Built-in snapshot
// ---------------------------------------------------------------------------

const BUILTIN_ENTRIES: &[(&str, &str, EntityKind, &str)] = &[
    ("800123456", "EPS SANITAS", EntityKind::Eps, "ACTIVE"),
    ("900987654", "CLINICA DEL COUNTRY", EntityKind::Ips, "ACTIVE"),
    ("830456789", "IPS SALUD TOTAL", EntityKind::Ips, "ACTIVE"),
    ("860123987", "LABORATORIO CLINICO ABC", EntityKind::Ips, "ACTIVE"),
    ("870456123", "EPS COOMEVA", EntityKind::Eps, "ACTIVE"),
    ("880789456", "HOSPITAL CENTRAL", EntityKind::Ips, "ACTIVE"),
    ("890123456", "EPS SURA", EntityKind::Eps, "ACTIVE"),
];

/// The registry entries shipped with the engine.
pub fn builtin_entries() -> Vec<RegistryEntry> {
    BUILTIN_ENTRIES
        .iter()
        .map(|(id, name, kind, status)| RegistryEntry {
            identifier: (*id).to_string(),
            name: (*name).to_string(),
            kind: *kind,
            status: (*status).to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// StaticRegistry
// ---------------------------------------------------------------------------

impl StaticRegistry {
    pub fn builtin() -> Self {
        let entries = builtin_entries()
            .into_iter()
            .map(|e| (e.identifier.clone(), e))
            .collect();
        StaticRegistry { entries }
    }

    /// Build a registry from configured entries. Identifiers are normalized
    /// on the way in; an entry whose identifier normalizes to nothing, or a
    /// duplicate, is rejected.
    pub fn from_entries(entries: Vec<RegistryEntry>) -> CoreResult<Self> {
        let mut map = HashMap::with_capacity(entries.len());
        for mut entry in entries {
            let key = normalize_identifier(&entry.identifier);
            if key.is_empty() {
                return Err(HealthRiskError::InvalidInput {
                    field: "registry.identifier".into(),
                    reason: format!("'{}' contains no digits", entry.identifier),
                });
            }
            if map.contains_key(&key) {
                return Err(HealthRiskError::InvalidInput {
                    field: "registry.identifier".into(),
                    reason: format!("duplicate identifier {key}"),
                });
            }
            entry.identifier = key.clone();
            map.insert(key, entry);
        }
        Ok(StaticRegistry { entries: map })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by identifier.
    pub fn entries(&self) -> Vec<&RegistryEntry> {
        let mut all: Vec<&RegistryEntry> = self.entries.values().collect();
        all.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        all
    }
}

impl EntityRegistry for StaticRegistry {
    fn lookup(&self, identifier: &str) -> CoreResult<Option<RegistryEntry>> {
        Ok(self.entries.get(identifier).cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_seven_entries() {
        let reg = StaticRegistry::builtin();
        assert_eq!(reg.len(), 7);
        let sura = reg.lookup("890123456").unwrap().unwrap();
        assert_eq!(sura.name, "EPS SURA");
        assert_eq!(sura.kind, EntityKind::Eps);
    }

    #[test]
    fn test_from_entries_normalizes_keys() {
        let reg = StaticRegistry::from_entries(vec![RegistryEntry {
            identifier: "900.111.222".into(),
            name: "IPS NORTE".into(),
            kind: EntityKind::Ips,
            status: "ACTIVE".into(),
        }])
        .unwrap();
        assert!(reg.lookup("900111222").unwrap().is_some());
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let entry = RegistryEntry {
            identifier: "900111222".into(),
            name: "A".into(),
            kind: EntityKind::Ips,
            status: "ACTIVE".into(),
        };
        let err = StaticRegistry::from_entries(vec![entry.clone(), entry]).unwrap_err();
        match err {
            HealthRiskError::InvalidInput { field, .. } => {
                assert_eq!(field, "registry.identifier")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_from_entries_rejects_empty_identifier() {
        let err = StaticRegistry::from_entries(vec![RegistryEntry {
            identifier: "n/a".into(),
            name: "A".into(),
            kind: EntityKind::Ips,
            status: "ACTIVE".into(),
        }]);
        assert!(err.is_err());
    }

    #[test]
    fn test_entries_sorted() {
        let reg = StaticRegistry::builtin();
        let ids: Vec<&str> = reg.entries().iter().map(|e| e.identifier.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
