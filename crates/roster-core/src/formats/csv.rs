//! CSV encoder for flat records.
//!
//! Accepts one object or an array of objects whose values are scalars. The
//! header row comes from the first record's keys.

use super::FormatError;
use serde_json::Value;

/// Render `value` as CSV with a header row.
pub fn to_csv(value: &Value) -> Result<String, FormatError> {
    let rows: Vec<&serde_json::Map<String, Value>> = match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().ok_or(FormatError::NotTabular))
            .collect::<Result<_, _>>()?,
        _ => return Err(FormatError::NotTabular),
    };

    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut out = String::new();
    out.push_str(
        &headers
            .iter()
            .map(|h| quote(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push_str("\r\n");

    for row in rows {
        let mut cells = Vec::with_capacity(headers.len());
        for header in &headers {
            cells.push(cell(row.get(header.as_str()).unwrap_or(&Value::Null))?);
        }
        out.push_str(&cells.join(","));
        out.push_str("\r\n");
    }
    Ok(out)
}

fn cell(value: &Value) -> Result<String, FormatError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(quote(s)),
        Value::Array(_) | Value::Object(_) => Err(FormatError::NotTabular),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_of_records() {
        let csv = to_csv(&json!([
            {"id": "1", "name": "IT_Solutions Ltd", "fullAddress": "583 Wall Dr. USA"},
            {"id": "2", "name": "Admin \"Solutions\"", "fullAddress": "312 Forest Avenue"},
        ]));
        assert_eq!(
            csv.ok().as_deref(),
            Some(
                "\"id\",\"name\",\"fullAddress\"\r\n\
                 \"1\",\"IT_Solutions Ltd\",\"583 Wall Dr. USA\"\r\n\
                 \"2\",\"Admin \"\"Solutions\"\"\",\"312 Forest Avenue\"\r\n"
            )
        );
    }

    #[test]
    fn single_record_and_numbers() {
        let csv = to_csv(&json!({"name": "Sam", "age": 26}));
        assert_eq!(csv.ok().as_deref(), Some("\"name\",\"age\"\r\n\"Sam\",26\r\n"));
    }

    #[test]
    fn nested_values_are_rejected() {
        let csv = to_csv(&json!([{"name": "Sam", "links": []}]));
        assert_eq!(csv, Err(FormatError::NotTabular));
    }

    #[test]
    fn empty_array_is_empty_document() {
        assert_eq!(to_csv(&json!([])).ok().as_deref(), Some(""));
    }
}
