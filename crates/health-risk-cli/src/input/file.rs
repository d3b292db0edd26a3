use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a file as text. Bytes that are not valid UTF-8 are decoded as
/// Latin-1, the usual encoding of spreadsheet exports.
pub fn read_text(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let bytes = fs::read(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    Ok(decode_text(bytes, &canonical.display().to_string()))
}

/// UTF-8 when valid, Latin-1 otherwise. `source` names the input in the log.
pub(crate) fn decode_text(bytes: Vec<u8>, source: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::info!("'{source}' is not UTF-8, decoding as Latin-1");
            decode_latin1(e.as_bytes())
        }
    }
}

/// Read a JSON file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = read_text(path)?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", path, e))?;
    Ok(value)
}

pub fn is_csv(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

pub fn is_yaml(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_decoding() {
        // "Razón" in Latin-1
        let bytes = [0x52, 0x61, 0x7a, 0xf3, 0x6e];
        assert_eq!(decode_latin1(&bytes), "Razón");
    }

    #[test]
    fn test_decode_text_prefers_utf8() {
        assert_eq!(decode_text("Razón".as_bytes().to_vec(), "stdin"), "Razón");
        assert_eq!(
            decode_text(vec![0x4e, 0x49, 0x54, 0x3b, 0xf1], "stdin"),
            "NIT;ñ"
        );
    }

    #[test]
    fn test_extension_checks() {
        assert!(is_csv("ledger.CSV"));
        assert!(!is_csv("ledger.json"));
        assert!(is_yaml("engine.yml"));
        assert!(!is_yaml("engine"));
    }
}
