//! Externally computed validation results, addressed by [`Path`].
//!
//! The engine never evaluates constraints itself. A validation service hands
//! back a tree shaped like the model, and the walker surfaces whatever sits
//! at each field's path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model;
use crate::path::Path;

/// A parallel tree of error messages.
///
/// At any path: a string or a non-empty array marks the field invalid with
/// those messages, `true` or a number marks it invalid without a message,
/// and a mapping only holds errors for its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationTree {
    errors: Value,
}

impl ValidationTree {
    pub fn new(errors: Value) -> Self {
        Self { errors }
    }

    /// Build a tree from `(path, message)` pairs. Messages at the same path
    /// accumulate.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Path, String)>,
    {
        let mut errors = Value::Null;
        for (path, message) in entries {
            match model::get_mut(&mut errors, &path) {
                Some(Value::Array(messages)) => messages.push(Value::String(message)),
                _ => {
                    model::set(&mut errors, &path, Value::Array(vec![Value::String(message)]));
                }
            }
        }
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        match &self.errors {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.errors
    }

    pub fn lookup(&self, path: &Path) -> FieldErrors {
        match model::get(&self.errors, path) {
            None | Some(Value::Null) | Some(Value::Bool(false)) | Some(Value::Object(_)) => {
                FieldErrors::default()
            }
            Some(Value::String(message)) => FieldErrors {
                invalid: true,
                messages: vec![message.clone()],
            },
            Some(Value::Array(items)) => FieldErrors {
                invalid: !items.is_empty(),
                messages: items
                    .iter()
                    .map(|item| match item {
                        Value::String(message) => message.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            },
            Some(_) => FieldErrors {
                invalid: true,
                messages: Vec::new(),
            },
        }
    }
}

/// Errors surfaced on one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub invalid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(pointer: &str) -> Path {
        Path::from_pointer(pointer).unwrap()
    }

    #[test]
    fn lookup_shapes() {
        let tree = ValidationTree::new(json!({
            "speed": "too fast",
            "pid": { "p": ["must be positive", "must be finite"], "i": true, "d": null },
            "wheels": [null, "bad wheel"],
            "empty": []
        }));

        assert_eq!(tree.lookup(&path("/speed")).messages, vec!["too fast"]);
        assert_eq!(tree.lookup(&path("/pid/p")).messages.len(), 2);
        assert!(tree.lookup(&path("/pid/i")).invalid);
        assert!(tree.lookup(&path("/pid/i")).messages.is_empty());
        assert!(!tree.lookup(&path("/pid/d")).invalid);
        assert!(!tree.lookup(&path("/pid")).invalid);
        assert!(tree.lookup(&path("/wheels/1")).invalid);
        assert!(!tree.lookup(&path("/wheels/0")).invalid);
        assert!(!tree.lookup(&path("/empty")).invalid);
        assert!(!tree.lookup(&path("/missing/deep")).invalid);
    }

    #[test]
    fn from_entries_accumulates() {
        let tree = ValidationTree::from_entries([
            (path("/pid/p"), "a".to_string()),
            (path("/pid/p"), "b".to_string()),
            (path("/speed"), "c".to_string()),
        ]);
        assert_eq!(
            tree.as_value(),
            &json!({ "pid": { "p": ["a", "b"] }, "speed": ["c"] })
        );
        assert!(!tree.is_empty());
        assert!(ValidationTree::default().is_empty());
    }

    #[test]
    fn root_level_error() {
        let tree = ValidationTree::new(json!("whole document rejected"));
        assert!(tree.lookup(&Path::root()).invalid);
    }
}
