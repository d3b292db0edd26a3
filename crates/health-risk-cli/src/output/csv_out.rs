use std::io;

use serde_json::{Map, Value};

/// Write the result as CSV: one row per record for list results, the first
/// record list of an object result, or field/value pairs otherwise.
pub fn print_csv(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    let written = match result {
        Value::Array(items) => write_records(&mut wtr, items),
        Value::Object(map) => match first_record_list(map) {
            Some(items) => write_records(&mut wtr, items),
            None => write_fields(&mut wtr, map),
        },
        other => wtr.write_record([field(other)]),
    };
    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("could not write CSV output: {e}");
    }
}

fn first_record_list(map: &Map<String, Value>) -> Option<&[Value]> {
    map.values().find_map(|v| match v {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => {
            Some(items.as_slice())
        }
        _ => None,
    })
}

fn write_fields<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.clone(), field(val)])?;
    }
    Ok(())
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, items: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = items.first() else {
        for item in items {
            wtr.write_record([field(item)])?;
        }
        return Ok(());
    };
    let headers: Vec<&String> = first.keys().collect();
    wtr.write_record(&headers)?;
    for item in items {
        if let Value::Object(row) = item {
            wtr.write_record(
                headers
                    .iter()
                    .map(|h| row.get(h.as_str()).map(field).unwrap_or_default()),
            )?;
        }
    }
    Ok(())
}

fn field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(result: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        match result {
            Value::Array(items) => write_records(&mut wtr, items).unwrap(),
            Value::Object(map) => write_fields(&mut wtr, map).unwrap(),
            _ => unreachable!(),
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_records_use_first_row_headers() {
        let out = render(&json!([
            {"identifier": "800123456", "tier": "HIGH"},
            {"identifier": "900987654", "tier": "LOW"}
        ]));
        assert_eq!(out, "identifier,tier\n800123456,HIGH\n900987654,LOW\n");
    }

    #[test]
    fn test_fields_for_single_verdict() {
        let out = render(&json!({"points": 7, "tier": "HIGH"}));
        assert_eq!(out, "field,value\npoints,7\ntier,HIGH\n");
    }

    #[test]
    fn test_first_record_list_skips_scalars() {
        let map = json!({"summary": {"total_entities": 1}, "records": [{"identifier": "1"}]});
        let items = first_record_list(map.as_object().unwrap()).unwrap();
        assert_eq!(items.len(), 1);
    }
}
