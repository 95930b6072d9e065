//! XML encoder for JSON-shaped values.
//!
//! Objects become child elements, arrays become repeated elements named after
//! the singular of their parent key. Nulls become empty elements.

use serde_json::Value;

/// Render `value` under a root element.
///
/// `item` names the elements of a top-level array (`<companies><company>…`).
#[must_use]
pub fn to_xml(value: &Value, root: &str, item: &str) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    match value {
        Value::Array(items) => {
            open(&mut out, root);
            for element in items {
                write_element(&mut out, item, element);
            }
            close(&mut out, root);
        }
        other => write_element(&mut out, root, other),
    }
    out
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    let name = element_name(name);
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(&name);
            out.push_str(" />");
        }
        Value::Object(map) => {
            open(out, &name);
            for (key, child) in map {
                write_element(out, key, child);
            }
            close(out, &name);
        }
        Value::Array(items) => {
            open(out, &name);
            let child = singular(&name);
            for element in items {
                write_element(out, &child, element);
            }
            close(out, &name);
        }
        Value::Bool(b) => text_element(out, &name, if *b { "true" } else { "false" }),
        Value::Number(n) => text_element(out, &name, &n.to_string()),
        Value::String(s) => text_element(out, &name, s),
    }
}

fn open(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn text_element(out: &mut String, name: &str, text: &str) {
    open(out, name);
    escape_into(out, text);
    close(out, name);
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

/// `links` -> `link`, `companies` -> `company`, `value` -> `item`.
fn singular(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix('s') {
        if stem.is_empty() { "item".into() } else { stem.to_string() }
    } else {
        "item".into()
    }
}

/// Keys come from DTO property names; anything that is not a valid XML name
/// character is replaced so the document stays well-formed.
fn element_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}
