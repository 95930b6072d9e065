//! # JSON Patch
//!
//! RFC 6902 operations over a `serde_json::Value`, used by the PATCH endpoint.
//! The patch is applied to a copy of the DTO document, so a failure part-way
//! through leaves the stored record untouched.

use crate::validation::ValidationErrors;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    fn path(&self) -> &str {
        match self {
            Self::Add { path, .. }
            | Self::Remove { path }
            | Self::Replace { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. }
            | Self::Test { path, .. } => path,
        }
    }
}

/// A patch document: an ordered list of operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(pub Vec<PatchOperation>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("The target location specified by path segment '{0}' was not found.")]
    PathNotFound(String),

    #[error("The path '{0}' is not a valid JSON pointer.")]
    InvalidPointer(String),

    #[error("The index value provided by path segment '{0}' is out of bounds of the array size.")]
    IndexOutOfBounds(String),

    #[error("The current value at '{0}' is not equal to the test value.")]
    TestFailed(String),

    #[error("Cannot move '{from}' into its own child '{path}'.")]
    MoveIntoChild { from: String, path: String },
}

impl PatchDocument {
    /// Apply every operation in order, stopping at the first failure.
    pub fn apply(&self, doc: &mut Value) -> Result<(), (String, PatchError)> {
        for op in &self.0 {
            apply_operation(doc, op).map_err(|err| (op.path().to_string(), err))?;
        }
        Ok(())
    }

    /// Patch a DTO: serialize it, apply the operations, deserialize back.
    ///
    /// Failures are reported as validation errors keyed by the property the
    /// failing operation targeted.
    pub fn apply_to<T>(&self, dto: &T) -> Result<T, ValidationErrors>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut errors = ValidationErrors::new();
        let mut doc = serde_json::to_value(dto).map_err(|err| {
            let mut e = ValidationErrors::new();
            e.add("document", err.to_string());
            e
        })?;

        if let Err((path, err)) = self.apply(&mut doc) {
            errors.add(field_key(&path), err.to_string());
            return Err(errors);
        }

        serde_json::from_value(doc).map_err(|err| {
            errors.add("document", format!("The patched document is invalid: {err}"));
            errors
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn field_key(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

fn apply_operation(doc: &mut Value, op: &PatchOperation) -> Result<(), PatchError> {
    match op {
        PatchOperation::Add { path, value } => add(doc, path, value.clone()),
        PatchOperation::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            if get(doc, path)?.is_none() {
                return Err(PatchError::PathNotFound(path.clone()));
            }
            if path.is_empty() {
                *doc = value.clone();
                return Ok(());
            }
            remove(doc, path)?;
            add(doc, path, value.clone())
        }
        PatchOperation::Move { from, path } => {
            if path.starts_with(&format!("{from}/")) {
                return Err(PatchError::MoveIntoChild {
                    from: from.clone(),
                    path: path.clone(),
                });
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOperation::Copy { from, path } => {
            let value = get(doc, from)?
                .cloned()
                .ok_or_else(|| PatchError::PathNotFound(from.clone()))?;
            add(doc, path, value)
        }
        PatchOperation::Test { path, value } => match get(doc, path)? {
            Some(current) if current == value => Ok(()),
            _ => Err(PatchError::TestFailed(path.clone())),
        },
    }
}

/// Split a JSON pointer into unescaped tokens.
fn tokens(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(path.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn get<'a>(doc: &'a Value, path: &str) -> Result<Option<&'a Value>, PatchError> {
    let mut current = doc;
    for token in tokens(path)? {
        let next = match current {
            Value::Object(map) => map.get(&token),
            Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Resolve the container of `path` and return it with the final token.
fn parent_mut<'a>(doc: &'a mut Value, path: &str) -> Result<(&'a mut Value, String), PatchError> {
    let mut parts = tokens(path)?;
    let Some(last) = parts.pop() else {
        return Err(PatchError::InvalidPointer(path.to_string()));
    };
    let mut current = doc;
    for token in parts {
        current = match current {
            Value::Object(map) => map.get_mut(&token),
            Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            _ => None,
        }
        .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
    }
    Ok((current, last))
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, last) = parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            map.insert(last, value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index: usize = last
                .parse()
                .map_err(|_| PatchError::InvalidPointer(path.to_string()))?;
            if index > items.len() {
                return Err(PatchError::IndexOutOfBounds(last));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, PatchError> {
    let (parent, last) = parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => map
            .shift_remove(&last)
            .ok_or_else(|| PatchError::PathNotFound(path.to_string())),
        Value::Array(items) => {
            let index: usize = last
                .parse()
                .map_err(|_| PatchError::InvalidPointer(path.to_string()))?;
            if index >= items.len() {
                return Err(PatchError::IndexOutOfBounds(last));
            }
            Ok(items.remove(index))
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::EmployeeForUpdate;
    use serde_json::json;

    fn doc(ops: Value) -> PatchDocument {
        serde_json::from_value(ops).unwrap_or_default()
    }

    fn employee() -> EmployeeForUpdate {
        EmployeeForUpdate {
            name: Some("Sam Raiden".into()),
            age: Some(26),
            position: Some("Software developer".into()),
        }
    }

    #[test]
    fn replace_updates_a_property() {
        let patch = doc(json!([{"op": "replace", "path": "/age", "value": 28}]));
        let patched = patch.apply_to(&employee());
        assert_eq!(patched.map(|e| e.age), Ok(Some(28)));
    }

    #[test]
    fn remove_clears_a_property() {
        let patch = doc(json!([{"op": "remove", "path": "/name"}]));
        assert_eq!(patch.apply_to(&employee()).map(|e| e.name), Ok(None));
    }

    #[test]
    fn move_copy_and_test() {
        let mut value = json!({"a": 1, "list": [1, 2]});
        let patch = doc(json!([
            {"op": "test", "path": "/a", "value": 1},
            {"op": "copy", "from": "/a", "path": "/b"},
            {"op": "move", "from": "/b", "path": "/list/0"},
            {"op": "add", "path": "/list/-", "value": 9},
        ]));
        assert_eq!(patch.apply(&mut value), Ok(()));
        assert_eq!(value, json!({"a": 1, "list": [1, 1, 2, 9]}));
    }

    #[test]
    fn failed_test_reports_path() {
        let patch = doc(json!([{"op": "test", "path": "/age", "value": 99}]));
        let errors = patch.apply_to(&employee()).err().unwrap_or_default();
        assert_eq!(
            errors.field("age"),
            ["The current value at '/age' is not equal to the test value."]
        );
    }

    #[test]
    fn replace_of_missing_path_fails() {
        let mut value = json!({});
        let patch = doc(json!([{"op": "replace", "path": "/nope", "value": 1}]));
        assert_eq!(
            patch.apply(&mut value),
            Err(("/nope".into(), PatchError::PathNotFound("/nope".into())))
        );
    }

    #[test]
    fn wrong_type_is_reported_as_invalid_document() {
        let patch = doc(json!([{"op": "replace", "path": "/age", "value": "old"}]));
        let errors = patch.apply_to(&employee()).err().unwrap_or_default();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["document"]);
    }

    #[test]
    fn pointer_escapes_are_decoded() {
        let mut value = json!({"a/b": 1, "m~n": 2});
        let patch = doc(json!([
            {"op": "remove", "path": "/a~1b"},
            {"op": "replace", "path": "/m~0n", "value": 3},
        ]));
        assert_eq!(patch.apply(&mut value), Ok(()));
        assert_eq!(value, json!({"m~n": 3}));
    }

    #[test]
    fn move_into_own_child_is_rejected() {
        let mut value = json!({"a": {"b": 1}});
        let patch = doc(json!([{"op": "move", "from": "/a", "path": "/a/c"}]));
        assert!(matches!(
            patch.apply(&mut value),
            Err((_, PatchError::MoveIntoChild { .. }))
        ));
    }
}
