//! Entity kind inference shared by every stage of the pipeline.
//!
//! Resolution order:
//! 1. **Identity record** -- a registry result for the identifier, including
//!    `UNDETERMINED`. Only an `ERROR` record (an identifier that failed
//!    validation) falls through.
//! 2. **Label keywords** -- "EPS" marks an insurer; "IPS", "CLINICA" or
//!    "HOSPITAL" mark a provider.
//! 3. **Leading digit** -- `8` for insurers, `9` for providers.
//! 4. Otherwise `UNDETERMINED`.

use serde::{Deserialize, Serialize};

use crate::registry::IdentifierRecord;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// Health insurer (Entidad Promotora de Salud).
    Eps,
    /// Health service provider (Institución Prestadora de Servicios).
    Ips,
    #[serde(alias = "NO DETERMINADO")]
    Undetermined,
    Error,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Eps => write!(f, "EPS"),
            EntityKind::Ips => write!(f, "IPS"),
            EntityKind::Undetermined => write!(f, "UNDETERMINED"),
            EntityKind::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const INSURER_LABEL_KEYWORDS: &[&str] = &["EPS"];
const PROVIDER_LABEL_KEYWORDS: &[&str] = &["IPS", "CLINICA", "HOSPITAL"];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the kind of an entity from everything known about it.
///
/// `identifier` is expected in normalized (digits-only) form when the
/// leading-digit rule should apply.
pub fn resolve_kind(
    identifier: &str,
    label: Option<&str>,
    identity: Option<&IdentifierRecord>,
) -> EntityKind {
    if let Some(record) = identity {
        if record.kind != EntityKind::Error {
            return record.kind;
        }
    }

    if let Some(kind) = label.and_then(kind_from_label) {
        return kind;
    }

    kind_from_leading_digit(identifier)
}

/// Keyword match on the upper-cased entity label.
pub fn kind_from_label(label: &str) -> Option<EntityKind> {
    let upper = label.to_uppercase();
    if INSURER_LABEL_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Some(EntityKind::Eps)
    } else if PROVIDER_LABEL_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Some(EntityKind::Ips)
    } else {
        None
    }
}

/// `8...` identifiers belong to insurers and `9...` to providers.
pub fn kind_from_leading_digit(identifier: &str) -> EntityKind {
    match identifier.trim().chars().next() {
        Some('8') => EntityKind::Eps,
        Some('9') => EntityKind::Ips,
        _ => EntityKind::Undetermined,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
