use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger amounts. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios and probabilities expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Multiples such as the current ratio (1.8x).
pub type Multiple = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Division that yields zero instead of failing when the denominator is zero
/// or the quotient does not fit in a Decimal.
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Lenient numeric parse for spreadsheet-originated text: plain decimals and
/// scientific notation are accepted, anything else is `None`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// `%Y-%m-%d %H:%M:%S` serialization for lookup timestamps.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_divide_zero_denominator() {
        assert_eq!(safe_divide(dec!(10), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_safe_divide_overflow_is_zero() {
        assert_eq!(safe_divide(Decimal::MAX, dec!(0.0001)), Decimal::ZERO);
    }

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal(" 1500.25 "), Some(dec!(1500.25)));
        assert_eq!(parse_decimal("-42"), Some(dec!(-42)));
        assert_eq!(parse_decimal("1.5e3"), Some(dec!(1500)));
        assert_eq!(parse_decimal("1,500"), None);
        assert_eq!(parse_decimal("n/a"), None);
        assert_eq!(parse_decimal("   "), None);
    }

    #[test]
    fn test_safe_divide_regular() {
        assert_eq!(safe_divide(dec!(300), dec!(150)), dec!(2));
    }
}
