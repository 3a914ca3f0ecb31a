//! Path-addressed reads and writes over a model tree.
//!
//! The model is an arbitrary `serde_json::Value`. Reads short-circuit to
//! `None` on any missing step; writes create empty mappings at missing or
//! `null` intermediate steps. A write through a scalar is a no-op that
//! returns `false` rather than an error.

use serde_json::{Map, Value};

use crate::path::{Path, PathKey};

/// Read the value at `path`. The empty path returns `model` itself.
pub fn get<'a>(model: &'a Value, path: &Path) -> Option<&'a Value> {
    path.keys().iter().try_fold(model, child)
}

/// Mutable counterpart of [`get`]. Never creates structure.
pub fn get_mut<'a>(model: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    path.keys().iter().try_fold(model, child_mut)
}

/// Write `value` at `path`, creating empty mappings along the way.
///
/// - The empty path replaces `model`.
/// - An [`PathKey::Index`] against a mapping addresses the decimal key.
/// - Writing at index `len` appends; beyond `len` pads with `null`.
///
/// Returns `false` when the path runs through a scalar (or names a
/// non-numeric key inside a sequence) and nothing was written.
pub fn set(model: &mut Value, path: &Path, value: Value) -> bool {
    let Some((last, parents)) = path.keys().split_last() else {
        *model = value;
        return true;
    };

    let mut node = model;
    for key in parents {
        let Some(next) = child_or_insert(node, key) else {
            tracing::trace!(path = %path, key = %key, "write blocked by non-container");
            return false;
        };
        node = next;
    }
    assign(node, last, value)
}

/// Remove and return the value at `path`. Sequence elements after the
/// removed one shift down. Removing the root is not supported.
pub fn remove(model: &mut Value, path: &Path) -> Option<Value> {
    let (last, _) = path.keys().split_last()?;
    let parent = get_mut(model, &path.parent()?)?;
    match parent {
        Value::Object(map) => map.shift_remove(&*last.as_field()),
        Value::Array(items) => {
            let index = last.as_index()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

fn child<'a>(container: &'a Value, key: &PathKey) -> Option<&'a Value> {
    match container {
        Value::Object(map) => map.get(&*key.as_field()),
        Value::Array(items) => key.as_index().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn child_mut<'a>(container: &'a mut Value, key: &PathKey) -> Option<&'a mut Value> {
    match container {
        Value::Object(map) => map.get_mut(&*key.as_field()),
        Value::Array(items) => match key.as_index() {
            Some(index) => items.get_mut(index),
            None => None,
        },
        _ => None,
    }
}

/// Step into `key`, materializing a `null` slot when it is missing. The
/// caller's next step turns that slot into a mapping.
fn child_or_insert<'a>(container: &'a mut Value, key: &PathKey) -> Option<&'a mut Value> {
    if container.is_null() {
        *container = Value::Object(Map::new());
    }
    match container {
        Value::Object(map) => Some(map.entry(key.as_field().into_owned()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = key.as_index()?;
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

fn assign(container: &mut Value, key: &PathKey, value: Value) -> bool {
    if container.is_null() {
        *container = Value::Object(Map::new());
    }
    match container {
        Value::Object(map) => {
            map.insert(key.as_field().into_owned(), value);
            true
        }
        Value::Array(items) => match key.as_index() {
            Some(index) if index < items.len() => {
                items[index] = value;
                true
            }
            Some(index) => {
                items.resize(index, Value::Null);
                items.push(value);
                true
            }
            None => false,
        },
        _ => false,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
