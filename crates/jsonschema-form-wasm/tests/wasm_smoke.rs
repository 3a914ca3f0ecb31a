//! In-crate smoke tests for the WASM boundary layer.
//!
//! These run under `wasm32-unknown-unknown` via `wasm-pack test --node`
//! and validate the WASM API contract at the JsValue level.

use serde_json::{json, Value};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_node_experimental);

use jsonschema_form_wasm::{build_defaults, is_dirty, FormSession};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_to_json(val: &JsValue) -> Value {
    serde_wasm_bindgen::from_value(val.clone()).expect("JsValue → serde_json::Value")
}

fn to_js(value: &Value) -> JsValue {
    use serde::Serialize;
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap()
}

fn schema_js() -> JsValue {
    to_js(&json!({
        "type": "object",
        "properties": {
            "speed": { "type": "number", "default": 1.5 },
            "drive": {
                "anyOf": [
                    {
                        "title": "Tank",
                        "type": "object",
                        "properties": { "x": { "default": 0 }, "y": {} }
                    },
                    {
                        "title": "Ackermann",
                        "type": "object",
                        "properties": { "x": {}, "z": { "default": "z" } }
                    }
                ]
            },
            "sensors": {
                "type": "array",
                "items": { "type": "object", "properties": { "hz": { "default": 10 } } }
            }
        }
    }))
}

fn session(data: Value) -> FormSession {
    FormSession::new(schema_js(), to_js(&data), JsValue::UNDEFINED).unwrap()
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn test_field_tree_shape() {
    let mut form = session(json!({ "drive": { "x": 1, "z": 2 } }));
    let tree = js_to_json(&form.field_tree(JsValue::UNDEFINED).unwrap());

    assert_eq!(tree["kind"], "object");
    let drive = &tree["children"][1];
    assert_eq!(drive["path"], "/drive");
    assert_eq!(drive["kind"], "polymorphic");
    assert_eq!(drive["choice"]["selected"], 1);
    assert_eq!(drive["choice"]["options"][0]["title"], "Tank");
}

#[wasm_bindgen_test]
fn test_edit_switch_and_save_cycle() {
    let mut form = session(json!({ "drive": { "x": 1, "y": 2 } }));
    assert!(!form.is_dirty("/drive").unwrap());

    assert!(form.switch_variant("/drive", 1).unwrap());
    assert_eq!(js_to_json(&form.get("/drive").unwrap()), json!({ "x": 1, "z": "z" }));
    assert_eq!(js_to_json(&form.dirty_fields().unwrap()), json!(["drive"]));

    let payload = js_to_json(&form.save_payload("/drive").unwrap());
    assert_eq!(payload, json!({ "x": 1, "z": "z" }));
    form.commit_saved("/drive").unwrap();
    assert!(!form.is_dirty("/drive").unwrap());
}

#[wasm_bindgen_test]
fn test_array_items() {
    let mut form = session(json!({}));
    assert_eq!(form.add_item("/sensors").unwrap(), Some(0));
    assert_eq!(form.add_item("/sensors").unwrap(), Some(1));
    assert!(form.remove_item("/sensors", 0).unwrap());
    assert_eq!(js_to_json(&form.model().unwrap()), json!({ "sensors": [{ "hz": 10 }] }));
    assert_eq!(form.add_item("/speed").unwrap(), None);
}

#[wasm_bindgen_test]
fn test_fill_defaults_and_reload() {
    let mut form = session(json!({ "stale": true }));
    form.fill_defaults();
    assert_eq!(js_to_json(&form.model().unwrap()), json!({ "speed": 1.5 }));

    form.reload(to_js(&json!({ "speed": 2 }))).unwrap();
    assert!(js_to_json(&form.dirty_fields().unwrap())
        .as_array()
        .unwrap()
        .is_empty());
}

#[wasm_bindgen_test]
fn test_validation_overlay() {
    let mut form = session(json!({ "speed": 9 }));
    let errors = to_js(&json!({ "speed": "too fast" }));
    let tree = js_to_json(&form.field_tree(errors).unwrap());
    assert_eq!(tree["children"][0]["invalid"], true);
    assert_eq!(tree["children"][0]["messages"], json!(["too fast"]));
}

#[wasm_bindgen_test]
fn test_stateless_helpers() {
    let defaults = js_to_json(&build_defaults(schema_js()).unwrap());
    assert_eq!(defaults, json!({ "speed": 1.5 }));

    assert!(!is_dirty(to_js(&json!({ "a": 5 })), to_js(&json!({ "a": 5.0 }))).unwrap());
    assert!(is_dirty(JsValue::UNDEFINED, to_js(&json!(1))).unwrap());
}

// ---------------------------------------------------------------------------
// Error paths
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn test_rejects_bad_input() {
    assert!(FormSession::new(to_js(&json!([1])), JsValue::UNDEFINED, JsValue::UNDEFINED).is_err());

    let form = session(json!({}));
    assert!(form.get("no-leading-slash").is_err());
}
