use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::HealthRiskError;
use crate::CoreResult;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Standardized financial categories. Declaration order is the display
/// order used by summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Current assets", alias = "Activo corriente")]
    CurrentAssets,
    #[serde(rename = "Cash on hand", alias = "Disponible")]
    CashOnHand,
    #[serde(rename = "Inventories", alias = "Inventarios")]
    Inventories,
    #[serde(rename = "Current liabilities", alias = "Pasivo corriente")]
    CurrentLiabilities,
    #[serde(rename = "Non-current liabilities", alias = "Pasivo No corriente")]
    NonCurrentLiabilities,
    #[serde(rename = "Equity", alias = "Patrimonio")]
    Equity,
    #[serde(rename = "Net income", alias = "Utilidad neta")]
    NetIncome,
    #[serde(rename = "Revenue", alias = "Ventas")]
    Revenue,
    #[serde(rename = "Costs", alias = "Costos")]
    Costs,
    #[serde(rename = "Expenses", alias = "Gastos")]
    Expenses,
    #[serde(rename = "Unclassified", alias = "No clasificada")]
    Unclassified,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::CurrentAssets,
        Category::CashOnHand,
        Category::Inventories,
        Category::CurrentLiabilities,
        Category::NonCurrentLiabilities,
        Category::Equity,
        Category::NetIncome,
        Category::Revenue,
        Category::Costs,
        Category::Expenses,
        Category::Unclassified,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::CurrentAssets => "Current assets",
            Category::CashOnHand => "Cash on hand",
            Category::Inventories => "Inventories",
            Category::CurrentLiabilities => "Current liabilities",
            Category::NonCurrentLiabilities => "Non-current liabilities",
            Category::Equity => "Equity",
            Category::NetIncome => "Net income",
            Category::Revenue => "Revenue",
            Category::Costs => "Costs",
            Category::Expenses => "Expenses",
            Category::Unclassified => "Unclassified",
        }
    }

    /// Name in the local chart of accounts.
    pub fn local_name(&self) -> &'static str {
        match self {
            Category::CurrentAssets => "Activo corriente",
            Category::CashOnHand => "Disponible",
            Category::Inventories => "Inventarios",
            Category::CurrentLiabilities => "Pasivo corriente",
            Category::NonCurrentLiabilities => "Pasivo No corriente",
            Category::Equity => "Patrimonio",
            Category::NetIncome => "Utilidad neta",
            Category::Revenue => "Ventas",
            Category::Costs => "Costos",
            Category::Expenses => "Gastos",
            Category::Unclassified => "No clasificada",
        }
    }

    /// Categories whose local name carries "Activo"; these add up to total
    /// assets. Cash on hand and inventories are booked under their own
    /// headings and are not part of that sum.
    pub fn is_asset(&self) -> bool {
        self.local_name().contains("Activo")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// Maps an accounting-code prefix to its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub code: String,
    pub category: Category,
    pub subcategory: String,
}

/// Ordered code table. Order matters: prefix matching walks the entries in
/// declaration order and takes the first hit.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
    exact: HashMap<String, usize>,
}

const BUILTIN_TAXONOMY: &[(&str, Category, &str)] = &[
    ("1", Category::CurrentAssets, "1 - Cash and equivalents"),
    ("11", Category::CurrentAssets, "11 - Investments"),
    ("1105", Category::CashOnHand, "1105 - Petty cash"),
    ("1110", Category::CashOnHand, "1110 - Banks"),
    ("12", Category::CurrentAssets, "12 - Trade receivables"),
    ("13", Category::Inventories, "13 - Inventories"),
    ("2", Category::CurrentLiabilities, "Current liabilities"),
    ("21", Category::CurrentLiabilities, "21 - Financial obligations"),
    ("22", Category::CurrentLiabilities, "22 - Accounts payable"),
    ("3", Category::NonCurrentLiabilities, "Non-current liabilities"),
    ("5", Category::Equity, "Equity"),
    ("51", Category::Equity, "51 - Share capital"),
    ("55", Category::NetIncome, "55 - Result for the period"),
    ("4", Category::Revenue, "Revenue"),
    ("41", Category::Revenue, "41 - Ordinary operating income"),
    ("4105", Category::Revenue, "4105 - Health services income"),
    ("6", Category::Costs, "Cost of sales"),
    ("7", Category::Expenses, "Operating expenses"),
];

/// The code table shipped with the engine, in declaration order.
pub fn builtin_entries() -> Vec<TaxonomyEntry> {
    BUILTIN_TAXONOMY
        .iter()
        .map(|(code, category, sub)| TaxonomyEntry {
            code: (*code).to_string(),
            category: *category,
            subcategory: (*sub).to_string(),
        })
        .collect()
}

impl Taxonomy {
    pub fn builtin() -> Self {
        // The built-in table has unique, non-empty codes.
        Self::index(builtin_entries())
    }

    /// Build a taxonomy from configured entries, keeping their order.
    pub fn from_entries(entries: Vec<TaxonomyEntry>) -> CoreResult<Self> {
        let mut seen = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let code = entry.code.trim();
            if code.is_empty() {
                return Err(HealthRiskError::InvalidInput {
                    field: format!("taxonomy[{i}].code"),
                    reason: "Account code prefix cannot be empty.".into(),
                });
            }
            if seen.insert(code.to_string(), i).is_some() {
                return Err(HealthRiskError::InvalidInput {
                    field: format!("taxonomy[{i}].code"),
                    reason: format!("Duplicate account code prefix '{code}'."),
                });
            }
        }
        let trimmed = entries
            .into_iter()
            .map(|mut e| {
                e.code = e.code.trim().to_string();
                e
            })
            .collect();
        Ok(Self::index(trimmed))
    }

    fn index(entries: Vec<TaxonomyEntry>) -> Self {
        let exact = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.clone(), i))
            .collect();
        Taxonomy { entries, exact }
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn exact(&self, code: &str) -> Option<&TaxonomyEntry> {
        self.exact.get(code).map(|&i| &self.entries[i])
    }

    /// First entry, in declaration order, whose code is a prefix of `code`.
    pub fn first_prefix(&self, code: &str) -> Option<&TaxonomyEntry> {
        self.entries.iter().find(|e| code.starts_with(e.code.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_current_assets_count_as_assets() {
        let assets: Vec<Category> = Category::ALL.into_iter().filter(|c| c.is_asset()).collect();
        assert_eq!(assets, vec![Category::CurrentAssets]);
    }

    #[test]
    fn test_spanish_alias_deserializes() {
        let c: Category = serde_json::from_str("\"Pasivo No corriente\"").unwrap();
        assert_eq!(c, Category::NonCurrentLiabilities);
        let c: Category = serde_json::from_str("\"Net income\"").unwrap();
        assert_eq!(c, Category::NetIncome);
        assert_eq!(serde_json::to_string(&Category::CashOnHand).unwrap(), "\"Cash on hand\"");
    }

    #[test]
    fn test_first_prefix_is_declaration_order() {
        let tax = Taxonomy::builtin();
        // "1305" starts with both "1" and "13"; "1" is declared first.
        let hit = tax.first_prefix("1305").unwrap();
        assert_eq!(hit.code, "1");
        assert_eq!(hit.category, Category::CurrentAssets);
    }

    #[test]
    fn test_exact_lookup() {
        let tax = Taxonomy::builtin();
        assert_eq!(tax.exact("1105").unwrap().category, Category::CashOnHand);
        assert!(tax.exact("110505").is_none());
    }

    #[test]
    fn test_from_entries_rejects_duplicate_codes() {
        let mut entries = builtin_entries();
        entries.push(entries[0].clone());
        assert!(Taxonomy::from_entries(entries).is_err());
    }

    #[test]
    fn test_from_entries_keeps_order() {
        let entries = vec![
            TaxonomyEntry {
                code: "13".into(),
                category: Category::Inventories,
                subcategory: "Inventories".into(),
            },
            TaxonomyEntry {
                code: "1".into(),
                category: Category::CurrentAssets,
                subcategory: "Assets".into(),
            },
        ];
        let tax = Taxonomy::from_entries(entries).unwrap();
        assert_eq!(tax.first_prefix("1305").unwrap().category, Category::Inventories);
    }
}
