use serde_json::{Map, Value};

/// Keys that answer the question a command was asked, most telling first.
const HEADLINE_KEYS: [&str; 4] = ["tier", "summary", "total_entities", "category"];

/// Print only the headline of a result: the tier of a single verdict, one
/// line per entity for reports, or the first headline field found.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(items) => {
            for item in items {
                println!("{}", item_line(item));
            }
        }
        Value::Object(map) => println!("{}", object_line(map)),
        other => println!("{}", scalar(other)),
    }
}

/// `identifier tier probability` for report rows, `identifier` otherwise.
fn item_line(item: &Value) -> String {
    let Value::Object(map) = item else {
        return scalar(item);
    };
    let parts: Vec<String> = ["identifier", "tier", "probability", "category"]
        .iter()
        .filter_map(|k| map.get(*k))
        .map(scalar)
        .collect();
    if parts.is_empty() {
        object_line(map)
    } else {
        parts.join(" ")
    }
}

fn object_line(map: &Map<String, Value>) -> String {
    if let (Some(tier), Some(probability)) = (map.get("tier"), map.get("probability")) {
        return format!("{} {}", scalar(tier), scalar(probability));
    }
    for key in HEADLINE_KEYS {
        match map.get(key) {
            Some(Value::Null) | None => continue,
            Some(Value::Object(nested)) => return object_line(nested),
            Some(val) => return format!("{key}: {}", scalar(val)),
        }
    }
    match map.iter().next() {
        Some((key, val)) => format!("{key}: {}", scalar(val)),
        None => String::new(),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Object(map) if map.is_empty() => String::new(),
        Value::Array(items) => format!("{} items", items.len()),
        other => other.to_string(),
    }
}
