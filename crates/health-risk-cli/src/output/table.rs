use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render the envelope as tables: scalar result fields as a field/value
/// table, each nested list of records as its own titled table, followed by
/// warnings and methodology.
pub fn print_table(value: &Value) {
    let Value::Object(envelope) = value else {
        print_section(None, value);
        return;
    };
    match envelope.get("result") {
        Some(result) => {
            print_section(None, result);
            print_footer(envelope);
        }
        None => print_section(None, value),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    if let Some(title) = title {
        println!("\n{title}:");
    }
    match value {
        Value::Array(items) => print_records(items),
        Value::Object(map) => print_object(map),
        other => println!("{}", cell(other)),
    }
}

/// Scalars go in one field/value table; nested records get their own.
fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested = Vec::new();
    let mut scalars = 0;
    for (key, val) in map {
        if is_record_list(val) || matches!(val, Value::Object(m) if !m.is_empty()) {
            nested.push((key.as_str(), val));
        } else {
            builder.push_record([key.as_str(), &cell(val)]);
            scalars += 1;
        }
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }
    for (key, val) in nested {
        print_section(Some(key), val);
    }
}

fn print_records(items: &[Value]) {
    if items.is_empty() {
        println!("(no rows)");
        return;
    }
    let Some(Value::Object(first)) = items.first() else {
        for item in items {
            println!("{}", cell(item));
        }
        return;
    };

    let headers: Vec<&String> = first.keys().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for item in items {
        if let Value::Object(row) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }
    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {methodology}");
    }
}

fn is_record_list(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.first().is_some_and(Value::is_object))
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
        other => other.to_string(),
    }
}
