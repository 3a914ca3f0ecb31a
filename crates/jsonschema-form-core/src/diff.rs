//! Structural comparison between a live subtree and its saved snapshot.
//!
//! Mappings compare by key union, sequences element-wise, and numbers by
//! value rather than representation, so `5` and `5.0` are not a change.

use serde_json::{Map, Number, Value};

use crate::path::Path;

/// Whether `current` differs from `original`. Absent on one side only is a
/// difference; absent on both is not.
pub fn is_dirty(original: Option<&Value>, current: Option<&Value>) -> bool {
    match (original, current) {
        (None, None) => false,
        (Some(original), Some(current)) => values_differ(original, current),
        _ => true,
    }
}

fn values_differ(original: &Value, current: &Value) -> bool {
    match (original, current) {
        (Value::Object(a), Value::Object(b)) => objects_differ(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() != b.len() || a.iter().zip(b).any(|(x, y)| values_differ(x, y))
        }
        (Value::Number(a), Value::Number(b)) => !numbers_equal(a, b),
        (a, b) => a != b,
    }
}

fn objects_differ(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.iter()
        .any(|(key, value)| is_dirty(Some(value), b.get(key)))
        || b.keys().any(|key| !a.contains_key(key))
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (integer(a), integer(b)) {
        (Some(x), Some(y)) => x == y,
        (Some(int), None) => b.as_f64().is_some_and(|float| float_is_integer(float, int)),
        (None, Some(int)) => a.as_f64().is_some_and(|float| float_is_integer(float, int)),
        (None, None) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

// Exact above 2^53, where `int as f64` would round.
fn float_is_integer(float: f64, int: i128) -> bool {
    float.fract() == 0.0 && float.abs() < 1e38 && float as i128 == int
}

/// The smallest paths at which `current` differs from `original`.
///
/// Containers of the same kind are descended into; anything else that
/// differs is reported at its own path. Keys only one side has are reported
/// once, at the key. The result follows `original`'s key order, then keys
/// new in `current`.
pub fn changed_paths(original: &Value, current: &Value) -> Vec<Path> {
    let mut out = Vec::new();
    collect(&Path::root(), Some(original), Some(current), &mut out);
    out
}

fn collect(
    path: &Path,
    original: Option<&Value>,
    current: Option<&Value>,
    out: &mut Vec<Path>,
) {
    match (original, current) {
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            for (key, value) in a {
                collect(&path.child(key.as_str()), Some(value), b.get(key), out);
            }
            for (key, value) in b.iter().filter(|(key, _)| !a.contains_key(*key)) {
                collect(&path.child(key.as_str()), None, Some(value), out);
            }
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            for index in 0..a.len().max(b.len()) {
                collect(&path.child(index), a.get(index), b.get(index), out);
            }
        }
        (original, current) => {
            if is_dirty(original, current) {
                out.push(path.clone());
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dirty(a: Value, b: Value) -> bool {
        is_dirty(Some(&a), Some(&b))
    }

    #[test]
    fn identical_values_are_clean() {
        for value in [
            json!(null),
            json!(true),
            json!("s"),
            json!([1, { "a": [] }]),
            json!({ "a": { "b": [1, 2] }, "c": null }),
        ] {
            assert!(!dirty(value.clone(), value));
        }
    }

    #[test]
    fn absence() {
        assert!(!is_dirty(None, None));
        assert!(is_dirty(None, Some(&json!(null))));
        assert!(is_dirty(Some(&json!(0)), None));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(!dirty(json!(5), json!(5.0)));
        assert!(!dirty(json!(-3), json!(-3.0)));
        assert!(dirty(json!(5), json!(5.5)));
        assert!(!dirty(json!(u64::MAX), json!(u64::MAX)));
    }

    #[test]
    fn large_integers_against_floats_are_exact() {
        assert!(dirty(json!(9_007_199_254_740_993_i64), json!(9_007_199_254_740_992.0)));
        assert!(dirty(json!(9_007_199_254_740_992.0), json!(9_007_199_254_740_993_u64)));
        assert!(!dirty(json!(9_007_199_254_740_992_i64), json!(9_007_199_254_740_992.0)));
        assert!(dirty(json!(i64::MAX), json!(1e300)));
    }

    #[test]
    fn key_presence_is_dirty() {
        assert!(dirty(json!({ "a": 1 }), json!({ "a": 1, "b": null })));
        assert!(dirty(json!({ "a": 1, "b": 2 }), json!({ "a": 1 })));
        assert!(!dirty(json!({ "a": 1, "b": 2 }), json!({ "b": 2, "a": 1 })));
    }

    #[test]
    fn arrays_compare_length_then_elements() {
        assert!(dirty(json!([1, 2]), json!([1, 2, 3])));
        assert!(dirty(json!([1, 2]), json!([2, 1])));
        assert!(!dirty(json!([{ "x": 1 }]), json!([{ "x": 1.0 }])));
    }

    #[test]
    fn container_vs_scalar_is_dirty() {
        assert!(dirty(json!({}), json!(null)));
        assert!(dirty(json!([]), json!({})));
        assert!(dirty(json!("1"), json!(1)));
    }

    #[test]
    fn edit_and_revert_restores_clean_state() {
        let original = json!({ "pid": { "p": 1.5, "i": 0 } });
        let mut current = original.clone();
        current["pid"]["p"] = json!(2.0);
        assert!(dirty(original.clone(), current.clone()));
        current["pid"]["p"] = json!(1.5);
        assert!(!dirty(original, current));
    }

    #[test]
    fn changed_paths_reports_leaves() {
        let original = json!({ "a": { "b": 1, "c": [1, 2] }, "gone": true, "same": 5 });
        let current = json!({ "a": { "b": 2, "c": [1, 2, 3] }, "same": 5.0, "new": {} });
        let paths: Vec<String> = changed_paths(&original, &current)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(paths, vec!["/a/b", "/a/c/2", "/gone", "/new"]);
    }

    #[test]
    fn changed_paths_root_replacement() {
        let paths = changed_paths(&json!({ "a": 1 }), &json!([1]));
        assert_eq!(paths, vec![Path::root()]);
        assert!(changed_paths(&json!({ "a": 1 }), &json!({ "a": 1 })).is_empty());
    }
}
