#![no_main]

use jsonschema_form_core::{
    changed_paths, walk, EditSession, EngineOptions, Path, SchemaDocument, TypeWidgets,
    VariantTracker, WalkContext,
};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

// Accepts arbitrary bytes, either `{"schema": ..., "data": ...}` or a schema
// alone, and drives a session through defaulting, walking, switching and
// diffing. Goal: no panics, even on malformed schemas.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let (schema, model) = match input {
        Value::Object(mut obj) if obj.contains_key("schema") => (
            obj.remove("schema").unwrap_or(Value::Null),
            obj.remove("data").unwrap_or(Value::Null),
        ),
        schema => (schema, Value::Object(Default::default())),
    };

    let options = EngineOptions {
        max_depth: 16,
        max_ref_hops: 8,
    };
    let Ok(document) = SchemaDocument::from_value(&schema, &options) else {
        return;
    };

    let mut session = EditSession::new(model);
    session.fill_defaults(&document);

    let widgets = TypeWidgets::standard();
    let context = WalkContext::new(&widgets).with_options(options);
    let mut tracker = VariantTracker::new();
    let tree = walk(&document, session.model(), &mut tracker, &context);

    // Poke every polymorphic and array field the walk found.
    let mut pending = vec![&tree];
    let mut paths: Vec<Path> = Vec::new();
    while let Some(node) = pending.pop() {
        paths.push(node.path.clone());
        pending.extend(node.children());
    }
    for path in &paths {
        session.switch_variant(&document, path, 1);
        session.switch_variant(&document, path, 0);
        if let Some(index) = session.add_array_item(&document, path) {
            session.remove_array_item(path, index);
        }
    }

    let _ = session.dirty_fields();
    let _ = changed_paths(session.snapshot(), session.model());
    let _ = session.field_tree(&document, &context);
});
