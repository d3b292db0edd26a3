use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::classification::{AccountClassifier, Category, Classification};
use crate::entity::{resolve_kind, EntityKind};
use crate::registry::{normalize_identifier, IdentityMap};
use crate::types::{parse_decimal, Money, Rate};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One ledger row as supplied by the caller, after column-name
/// normalization. Every field is optional; `amount` is kept as text because
/// it may not parse. Numbers and booleans are accepted and kept as their
/// text form; `null` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(default, deserialize_with = "scalar_text")]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub entity_label: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub account_code: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub account_label: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub amount: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected text, number or boolean, got {other}"
        ))),
    }
}

/// A ledger row enriched with its classification and entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLine {
    pub identifier: String,
    pub entity_label: Option<String>,
    pub account_code: Option<String>,
    pub account_label: Option<String>,
    /// Amount text exactly as supplied.
    pub amount: Option<String>,
    /// Parsed amount; `None` when the text is not numeric.
    pub value: Option<Money>,
    pub category: Category,
    pub subcategory: String,
    pub confidence: Rate,
    pub entity_kind: EntityKind,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl LedgerRow {
    pub fn identifier(&self) -> &str {
        self.identifier.as_deref().map(str::trim).unwrap_or_default()
    }
}

impl AccountLine {
    pub fn new(row: LedgerRow, classification: Classification, entity_kind: EntityKind) -> Self {
        let identifier = row.identifier().to_string();
        let value = row.amount.as_deref().and_then(parse_decimal);
        AccountLine {
            identifier,
            entity_label: row.entity_label,
            account_code: row.account_code,
            account_label: row.account_label,
            amount: row.amount,
            value,
            category: classification.category,
            subcategory: classification.subcategory,
            confidence: classification.confidence,
            entity_kind,
        }
    }

    /// The amount that takes part in aggregation: parsed and non-zero.
    pub fn countable_value(&self) -> Option<Money> {
        self.value.filter(|v| !v.is_zero())
    }
}

/// Classify every row and attach the entity kind resolved from the row's
/// identifier, its entity label and the optional identity map.
pub fn classify_rows(
    rows: Vec<LedgerRow>,
    classifier: &AccountClassifier<'_>,
    identity: Option<&IdentityMap>,
) -> Vec<AccountLine> {
    let lines: Vec<AccountLine> = rows
        .into_iter()
        .map(|row| {
            let classification =
                classifier.classify(row.account_code.as_deref(), row.account_label.as_deref());
            let normalized = normalize_identifier(row.identifier());
            let record = identity.and_then(|m| m.get(&normalized));
            let kind = resolve_kind(&normalized, row.entity_label.as_deref(), record);
            AccountLine::new(row, classification, kind)
        })
        .collect();

    let unclassified = lines
        .iter()
        .filter(|l| l.category == Category::Unclassified)
        .count();
    log::debug!(
        "classified {} ledger rows ({} unclassified)",
        lines.len(),
        unclassified
    );
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
