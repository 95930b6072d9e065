//! # Validation
//!
//! Input rules for incoming DTOs. Errors are collected per field rather than
//! failing fast so a client sees every problem in one 422 response.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name -> messages. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Merge another set of errors, prefixing every field with `prefix.`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.errors {
            let key = format!("{prefix}.{field}");
            self.errors.entry(key).or_default().extend(messages);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Implemented by every DTO accepted from a client.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

// =============================================================================
// RULE HELPERS
// =============================================================================

/// Required, non-blank string with a maximum character count.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
    required_message: &str,
    length_message: &str,
) {
    match value {
        Some(text) if !text.trim().is_empty() => {
            if text.chars().count() > max_len {
                errors.add(field, length_message);
            }
        }
        _ => errors.add(field, required_message),
    }
}

/// Optional string with a maximum character count.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
    length_message: &str,
) {
    if let Some(text) = value {
        if text.chars().count() > max_len {
            errors.add(field, length_message);
        }
    }
}

/// Required integer with an inclusive lower bound.
pub(crate) fn required_min(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<i64>,
    min: i64,
    required_message: &str,
    range_message: &str,
) {
    match value {
        Some(v) if v < min || v > i64::from(i32::MAX) => errors.add(field, range_message),
        Some(_) => {}
        None => errors.add(field, required_message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_multiple_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "required");
        errors.add("name", "too long");
        errors.add("age", "too young");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.field("name"), ["required", "too long"]);
        assert!(errors.field("position").is_empty());
    }

    #[test]
    fn merge_prefixed_namespaces_fields() {
        let mut inner = ValidationErrors::new();
        inner.add("name", "required");

        let mut outer = ValidationErrors::new();
        outer.merge_prefixed("employees[1]", inner);

        assert_eq!(outer.field("employees[1].name"), ["required"]);
    }

    #[test]
    fn serializes_as_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("age", "Age is a required field.");
        let json = serde_json::to_value(&errors).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"age": ["Age is a required field."]}));
    }

    #[test]
    fn required_text_checks_blank_and_length() {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "a", Some("   "), 5, "req", "len");
        required_text(&mut errors, "b", Some("abcdef"), 5, "req", "len");
        required_text(&mut errors, "c", Some("abc"), 5, "req", "len");
        required_text(&mut errors, "d", None, 5, "req", "len");

        assert_eq!(errors.field("a"), ["req"]);
        assert_eq!(errors.field("b"), ["len"]);
        assert!(errors.field("c").is_empty());
        assert_eq!(errors.field("d"), ["req"]);
    }
}
