use std::collections::BTreeSet;

use serde_json::Value;

use health_risk_core::indicators::LedgerRow;

use crate::input;

pub const IDENTIFIER: &str = "identifier";
pub const ENTITY_LABEL: &str = "entity_label";
pub const ACCOUNT_CODE: &str = "account_code";
pub const ACCOUNT_LABEL: &str = "account_label";
pub const AMOUNT: &str = "amount";

/// Columns identifier validation cannot run without.
pub const VALIDATION_COLUMNS: &[&str] = &[IDENTIFIER];

/// Columns ledger classification cannot run without.
pub const CLASSIFICATION_COLUMNS: &[&str] = &[IDENTIFIER, ACCOUNT_CODE, AMOUNT, ACCOUNT_LABEL];

/// Parsed ledger plus the canonical columns that were present in the source.
#[derive(Debug, Default)]
pub struct LedgerTable {
    pub columns: BTreeSet<&'static str>,
    /// Normalized source headers, for error messages.
    pub source_columns: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

impl LedgerTable {
    /// Fail with the list of missing columns before any analysis runs.
    pub fn require(&self, required: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !self.columns.contains(c))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(format!(
            "missing required columns: {} (found: {})",
            missing.join(", "),
            self.source_columns.join(", ")
        )
        .into())
    }
}

/// Load a ledger from `path` (CSV or JSON) or, without a path, from stdin.
pub fn read_ledger(path: Option<&str>) -> Result<LedgerTable, Box<dyn std::error::Error>> {
    let table = if let Some(path) = path {
        let text = input::file::read_text(path)?;
        if input::file::is_csv(path) {
            parse_csv(&text)?
        } else {
            parse_json(&serde_json::from_str(&text)?)?
        }
    } else if let Some(text) = input::stdin::read_stdin_text()? {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            parse_json(&serde_json::from_str(trimmed)?)?
        } else {
            parse_csv(&text)?
        }
    } else {
        return Err("--input file is required (or pipe a ledger on stdin)".into());
    };
    log::debug!(
        "loaded {} ledger rows with columns [{}]",
        table.rows.len(),
        table.source_columns.join(", ")
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Header handling
// ---------------------------------------------------------------------------

/// Trim, lowercase, fold accents and drop anything outside `[a-z0-9_]`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

/// Map a normalized header onto a ledger field.
pub fn canonical_field(normalized: &str) -> Option<&'static str> {
    match normalized {
        "nit" | "identifier" => Some(IDENTIFIER),
        "razonsocial" | "entity_label" => Some(ENTITY_LABEL),
        "codigoconcepto" | "account_code" => Some(ACCOUNT_CODE),
        "denominacion" | "account_label" => Some(ACCOUNT_LABEL),
        "valor" | "amount" => Some(AMOUNT),
        _ => None,
    }
}

fn set_field(row: &mut LedgerRow, field: &str, value: Option<String>) {
    let slot = match field {
        IDENTIFIER => &mut row.identifier,
        ENTITY_LABEL => &mut row.entity_label,
        ACCOUNT_CODE => &mut row.account_code,
        ACCOUNT_LABEL => &mut row.account_label,
        AMOUNT => &mut row.amount,
        _ => return,
    };
    if slot.is_none() {
        *slot = value;
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

pub fn parse_csv(text: &str) -> Result<LedgerTable, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut table = LedgerTable::default();
    let mut fields: Vec<Option<&'static str>> = Vec::new();
    for header in reader.headers()?.iter() {
        let normalized = normalize_header(header);
        let field = canonical_field(&normalized);
        if let Some(f) = field {
            table.columns.insert(f);
        }
        table.source_columns.push(normalized);
        fields.push(field);
    }

    for record in reader.records() {
        let record = record?;
        let mut row = LedgerRow::default();
        for (value, field) in record.iter().zip(&fields) {
            if let Some(field) = field {
                set_field(&mut row, field, non_blank(value));
            }
        }
        table.rows.push(row);
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Accepts an array of row objects, or an object holding one under `rows`.
pub fn parse_json(value: &Value) -> Result<LedgerTable, Box<dyn std::error::Error>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("rows") {
            Some(Value::Array(items)) => items,
            _ => return Err("JSON ledger must be an array of rows or an object with 'rows'".into()),
        },
        _ => return Err("JSON ledger must be an array of rows".into()),
    };

    let mut table = LedgerTable::default();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (i, item) in items.iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(format!("ledger row {i} is not an object").into());
        };
        let mut row = LedgerRow::default();
        for (key, val) in map {
            let normalized = normalize_header(key);
            if let Some(field) = canonical_field(&normalized) {
                table.columns.insert(field);
                set_field(&mut row, field, json_text(val));
            }
            if seen.insert(normalized.clone()) {
                table.source_columns.push(normalized);
            }
        }
        table.rows.push(row);
    }
    Ok(table)
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Razón Social "), "razonsocial");
        assert_eq!(normalize_header("NIT"), "nit");
        assert_eq!(normalize_header("Código Concepto"), "codigoconcepto");
        assert_eq!(normalize_header("Denominación"), "denominacion");
        assert_eq!(normalize_header("\u{feff}valor"), "valor");
        assert_eq!(normalize_header("account_code"), "account_code");
    }

    #[test]
    fn test_csv_with_local_headers() {
        let text = "NIT,Razón Social,Código Concepto,Denominación,Valor\n\
                    800123456,EPS SANITAS,1105,Caja,1500.50\n\
                    900987654,,21, ,\n";
        let table = parse_csv(text).unwrap();
        assert!(table.require(CLASSIFICATION_COLUMNS).is_ok());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].identifier.as_deref(), Some("800123456"));
        assert_eq!(table.rows[0].entity_label.as_deref(), Some("EPS SANITAS"));
        assert_eq!(table.rows[0].amount.as_deref(), Some("1500.50"));
        assert_eq!(table.rows[1].entity_label, None);
        assert_eq!(table.rows[1].account_label, None);
        assert_eq!(table.rows[1].amount, None);
    }

    #[test]
    fn test_semicolon_csv() {
        let table = parse_csv("nit;valor\n800123456;10\n").unwrap();
        assert_eq!(table.rows[0].amount.as_deref(), Some("10"));
        let err = table.require(CLASSIFICATION_COLUMNS).unwrap_err().to_string();
        assert!(err.contains("account_code, account_label"));
        assert!(table.require(VALIDATION_COLUMNS).is_ok());
    }

    #[test]
    fn test_json_rows_with_numbers() {
        let table = parse_json(&json!([
            {"nit": 800123456, "codigoconcepto": "1", "valor": 12.5, "denominacion": "Caja"},
            {"identifier": "900987654", "account_code": "2", "amount": null}
        ]))
        .unwrap();
        assert_eq!(table.rows[0].identifier.as_deref(), Some("800123456"));
        assert_eq!(table.rows[0].amount.as_deref(), Some("12.5"));
        assert_eq!(table.rows[1].amount, None);
        assert!(table.require(CLASSIFICATION_COLUMNS).is_ok());
    }

    #[test]
    fn test_json_requires_rows() {
        assert!(parse_json(&json!({"data": []})).is_err());
        assert!(parse_json(&json!([1, 2])).is_err());
        assert_eq!(parse_json(&json!({"rows": []})).unwrap().rows.len(), 0);
    }
}
