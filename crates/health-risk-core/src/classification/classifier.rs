use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::classification::taxonomy::{Category, Taxonomy, TaxonomyEntry};
use crate::types::Rate;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactCode,
    CodePrefix,
    LabelKeyword,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub subcategory: String,
    pub confidence: Rate,
    pub method: MatchMethod,
}

/// Maps (account code, label) pairs onto the injected taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct AccountClassifier<'a> {
    taxonomy: &'a Taxonomy,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const EXACT_CONFIDENCE: Decimal = dec!(1.0);
const PREFIX_CONFIDENCE: Decimal = dec!(0.8);
const KEYWORD_CONFIDENCE: Decimal = dec!(0.6);

pub const UNCLASSIFIED_SUBCATEGORY: &str = "Unclassified";
pub const KEYWORD_SUBCATEGORY: &str = "Classified by label";

/// Label keyword groups, tested in this order against the lowercased label.
const LABEL_KEYWORDS: &[(&[&str], Category)] = &[
    (&["activo", "inversión"], Category::CurrentAssets),
    (&["pasivo", "deuda"], Category::CurrentLiabilities),
    (&["patrimonio", "capital"], Category::Equity),
    (&["ingreso", "venta"], Category::Revenue),
    (&["costo", "gasto"], Category::Costs),
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl Classification {
    pub fn unclassified() -> Self {
        Classification {
            category: Category::Unclassified,
            subcategory: UNCLASSIFIED_SUBCATEGORY.to_string(),
            confidence: Decimal::ZERO,
            method: MatchMethod::Unmatched,
        }
    }

    fn from_entry(entry: &TaxonomyEntry, confidence: Decimal, method: MatchMethod) -> Self {
        Classification {
            category: entry.category,
            subcategory: entry.subcategory.clone(),
            confidence,
            method,
        }
    }
}

impl<'a> AccountClassifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        AccountClassifier { taxonomy }
    }

    /// Classify one ledger line. First match wins:
    ///
    /// 1. no code → unclassified
    /// 2. exact code (1.0)
    /// 3. first declared prefix (0.8)
    /// 4. label keywords (0.6)
    /// 5. unclassified
    pub fn classify(&self, code: Option<&str>, label: Option<&str>) -> Classification {
        let code = match code.map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => return Classification::unclassified(),
        };

        if let Some(entry) = self.taxonomy.exact(code) {
            return Classification::from_entry(entry, EXACT_CONFIDENCE, MatchMethod::ExactCode);
        }

        if let Some(entry) = self.taxonomy.first_prefix(code) {
            return Classification::from_entry(entry, PREFIX_CONFIDENCE, MatchMethod::CodePrefix);
        }

        label
            .and_then(classify_by_label)
            .unwrap_or_else(Classification::unclassified)
    }
}

fn classify_by_label(label: &str) -> Option<Classification> {
    let lower = label.to_lowercase();
    LABEL_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, category)| Classification {
            category: *category,
            subcategory: KEYWORD_SUBCATEGORY.to_string(),
            confidence: KEYWORD_CONFIDENCE,
            method: MatchMethod::LabelKeyword,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(code: Option<&str>, label: Option<&str>) -> Classification {
        let tax = Taxonomy::builtin();
        AccountClassifier::new(&tax).classify(code, label)
    }

    #[test]
    fn test_missing_code_is_unclassified_even_with_label() {
        let c = classify(None, Some("Activo corriente total"));
        assert_eq!(c, Classification::unclassified());
        let c = classify(Some("   "), Some("Activo"));
        assert_eq!(c.category, Category::Unclassified);
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        let c = classify(Some("1105"), Some("Caja general"));
        assert_eq!(c.category, Category::CashOnHand);
        assert_eq!(c.subcategory, "1105 - Petty cash");
        assert_eq!(c.confidence, dec!(1.0));
        assert_eq!(c.method, MatchMethod::ExactCode);
    }

    #[test]
    fn test_prefix_first_declared_wins() {
        // "110505" starts with "1", "11" and "1105"; "1" is declared first.
        let c = classify(Some("110505"), None);
        assert_eq!(c.category, Category::CurrentAssets);
        assert_eq!(c.subcategory, "1 - Cash and equivalents");
        assert_eq!(c.confidence, dec!(0.8));

        // "5505" resolves through "5" (equity), not "55".
        let c = classify(Some("5505"), None);
        assert_eq!(c.category, Category::Equity);
    }

    #[test]
    fn test_code_is_trimmed() {
        let c = classify(Some(" 2105 "), None);
        assert_eq!(c.category, Category::CurrentLiabilities);
        assert_eq!(c.method, MatchMethod::CodePrefix);
    }

    #[test]
    fn test_keyword_fallback_order() {
        let c = classify(Some("9999"), Some("Deuda con proveedores"));
        assert_eq!(c.category, Category::CurrentLiabilities);
        assert_eq!(c.subcategory, KEYWORD_SUBCATEGORY);
        assert_eq!(c.confidence, dec!(0.6));

        // Contains both "inversión" and "capital"; the asset group is tested first.
        let c = classify(Some("9999"), Some("INVERSIÓN DE CAPITAL"));
        assert_eq!(c.category, Category::CurrentAssets);

        let c = classify(Some("8888"), Some("Gasto de personal"));
        assert_eq!(c.category, Category::Costs);

        let c = classify(Some("8888"), Some("Ventas netas"));
        assert_eq!(c.category, Category::Revenue);
    }

    #[test]
    fn test_no_match_unclassified() {
        let c = classify(Some("9999"), Some("Otros conceptos"));
        assert_eq!(c, Classification::unclassified());
        let c = classify(Some("9999"), None);
        assert_eq!(c, Classification::unclassified());
    }

    #[test]
    fn test_every_builtin_key_exact() {
        let tax = Taxonomy::builtin();
        let classifier = AccountClassifier::new(&tax);
        for entry in tax.entries() {
            let c = classifier.classify(Some(entry.code.as_str()), Some("irrelevant"));
            assert_eq!(c.category, entry.category, "code {}", entry.code);
            assert_eq!(c.confidence, dec!(1.0), "code {}", entry.code);
        }
    }
}
