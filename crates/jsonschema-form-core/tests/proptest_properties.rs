//! Property-based tests for the engine's invariants.
//!
//! Schemas are generated as small object trees whose properties are leaves
//! (optionally with `default` or `const`) or nested objects. Data is drawn
//! independently so it can disagree with the schema in every way:
//! undeclared keys, scalars where objects are expected, and so on.

use jsonschema_form_core::{
    changed_paths, effective_alternatives, fill_defaults, is_dirty, model, select_variant,
    EngineOptions, Path, SchemaDocument, VariantTracker,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof!["[a-e]", "[a-z]{1,6}"]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        (-1000.0f64..1000.0).prop_map(|n| json!(n)),
        "[a-z]{0,8}".prop_map(Value::String),
    ]
}

/// Arbitrary JSON, a few levels deep.
fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::vec((arb_key(), inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn arb_leaf_schema() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!({ "type": "string" })),
        arb_scalar().prop_map(|d| json!({ "type": "number", "default": d })),
        arb_scalar().prop_map(|c| json!({ "const": c })),
        Just(json!({ "enum": ["a", "b"] })),
    ]
}

/// An object schema with up to three levels of nested objects.
fn arb_object_schema() -> impl Strategy<Value = Value> {
    let leaf_object = proptest::collection::vec((arb_key(), arb_leaf_schema()), 0..5)
        .prop_map(object_schema);
    leaf_object.prop_recursive(3, 32, 5, |inner| {
        proptest::collection::vec(
            (arb_key(), prop_oneof![arb_leaf_schema(), inner]),
            0..5,
        )
        .prop_map(object_schema)
    })
}

fn object_schema(properties: Vec<(String, Value)>) -> Value {
    let properties: Map<String, Value> = properties.into_iter().collect();
    json!({ "type": "object", "properties": properties })
}

fn load(schema: &Value) -> SchemaDocument {
    SchemaDocument::from_value(schema, &EngineOptions::default()).unwrap()
}

fn filled(document: &SchemaDocument, mut target: Value) -> Value {
    fill_defaults(&mut target, document.root(), &document.defs);
    target
}

/// Every key of `value` is declared by `schema`, transitively through
/// nested objects.
fn keys_declared(value: &Value, schema: &Value) -> bool {
    let (Value::Object(map), Some(Value::Object(properties))) = (value, schema.get("properties"))
    else {
        return true;
    };
    map.iter().all(|(key, child)| match properties.get(key) {
        None => false,
        Some(child_schema) => keys_declared(child, child_schema),
    })
}

/// Every declared property with a `const` holds it.
fn consts_hold(value: &Value, schema: &Value) -> bool {
    let (Value::Object(map), Some(Value::Object(properties))) = (value, schema.get("properties"))
    else {
        return true;
    };
    properties.iter().all(|(key, child_schema)| {
        let held = match child_schema.get("const") {
            Some(constant) => map.get(key) == Some(constant),
            None => true,
        };
        held && map.get(key).map_or(true, |child| consts_hold(child, child_schema))
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fill_defaults_is_idempotent(schema in arb_object_schema(), data in arb_value()) {
        let document = load(&schema);
        let once = filled(&document, data);
        let twice = filled(&document, once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn fill_defaults_only_keeps_declared_keys(schema in arb_object_schema(), data in arb_value()) {
        let document = load(&schema);
        let result = filled(&document, data);
        prop_assert!(result.is_object());
        prop_assert!(keys_declared(&result, &schema), "{result} vs {schema}");
        prop_assert!(consts_hold(&result, &schema), "{result} vs {schema}");
    }

    #[test]
    fn is_dirty_is_reflexive(value in arb_value()) {
        let copy = value.clone();
        prop_assert!(!is_dirty(Some(&value), Some(&copy)));
        prop_assert!(changed_paths(&value, &copy).is_empty());
    }

    #[test]
    fn changing_a_leaf_is_dirty(value in arb_value(), replacement in "[A-Z]{1,4}") {
        let mut changed = value.clone();
        let mut leaf = Path::root();
        // Walk to the first scalar leaf.
        let mut cursor = &value;
        loop {
            match cursor {
                Value::Object(map) if !map.is_empty() => {
                    let (key, child) = map.iter().next().unwrap();
                    leaf.push(key.as_str());
                    cursor = child;
                }
                Value::Array(items) if !items.is_empty() => {
                    leaf.push(0usize);
                    cursor = &items[0];
                }
                _ => break,
            }
        }
        model::set(&mut changed, &leaf, Value::String(replacement));
        prop_assert!(is_dirty(Some(&value), Some(&changed)));
        prop_assert!(changed_paths(&value, &changed).contains(&leaf));
    }

    #[test]
    fn selection_is_deterministic_and_prefers_superset(
        shared in proptest::collection::btree_set("[a-z]{1,4}", 1..4),
        extra in proptest::collection::btree_set("[A-Z]{1,4}", 1..4),
    ) {
        let narrow: Map<String, Value> = shared.iter().map(|k| (k.clone(), json!({}))).collect();
        let mut wide = narrow.clone();
        wide.extend(extra.iter().map(|k| (k.clone(), json!({}))));
        let document = load(&json!({
            "anyOf": [
                { "type": "object", "properties": narrow },
                { "type": "object", "properties": wide }
            ]
        }));
        let alternatives = effective_alternatives(&document.root, &document.defs);
        let data: Map<String, Value> = shared
            .iter()
            .chain(&extra)
            .map(|k| (k.clone(), json!(1)))
            .collect();
        let data = Value::Object(data);

        let first = select_variant(Some(&data), &alternatives);
        prop_assert_eq!(first, 1);
        prop_assert_eq!(select_variant(Some(&data), &alternatives), first);
    }

    #[test]
    fn variant_round_trip_restores_subtree(subtree in arb_value(), other in 0usize..2) {
        let document = load(&json!({
            "type": "object",
            "properties": {
                "slot": {
                    "anyOf": [
                        { "type": "object", "properties": { "a": { "default": 1 }, "b": {} } },
                        { "type": "object", "properties": { "a": {}, "c": { "default": "c" } } },
                        { "type": "string", "default": "s" }
                    ]
                }
            }
        }));
        let slot = &document.root.properties().unwrap()["slot"];
        let alternatives = effective_alternatives(slot, &document.defs);
        let path = Path::root().child("slot");
        let original = json!({ "slot": subtree });
        let mut model = original.clone();
        let mut tracker = VariantTracker::new();

        let start = tracker.ensure(&path, &model, &alternatives);
        let target = if other == 0 { (start + 1) % 3 } else { (start + 2) % 3 };
        prop_assert!(tracker.switch(&mut model, &path, target, &alternatives, &document.defs));
        prop_assert!(tracker.switch(&mut model, &path, start, &alternatives, &document.defs));
        prop_assert_eq!(model, original);
    }
}
