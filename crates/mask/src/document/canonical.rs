use serde_json::Value;

/// Normalize a field that may hold a bare record, a collection or nothing
/// into a sequence of zero or more records.
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Render a scalar identifier field as text. Integers stay integral so
/// `12` and `"12"` name the same files.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        // `<number id="..">12</number>` decodes to an object with `#text`
        Value::Object(map) => map.get("#text").and_then(scalar_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_or_many_wraps_singletons() {
        let single = json!({"svg": "[]"});
        assert_eq!(one_or_many(Some(&single)), vec![&single]);

        let many = json!([{"svg": "a"}, {"svg": "b"}]);
        assert_eq!(one_or_many(Some(&many)).len(), 2);

        assert!(one_or_many(None).is_empty());
        assert!(one_or_many(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("  0042 ")), Some("0042".to_string()));
        assert_eq!(scalar_text(&json!(17)), Some("17".to_string()));
        assert_eq!(scalar_text(&json!({"@kind": "a", "#text": "9"})), Some("9".to_string()));
        assert_eq!(scalar_text(&json!("")), None);
        assert_eq!(scalar_text(&json!([1, 2])), None);
    }
}
