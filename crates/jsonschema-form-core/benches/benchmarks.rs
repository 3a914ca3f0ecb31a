//! Criterion benchmarks for the form engine.
//!
//! Fixtures are parsed outside the measured loop so only schema loading,
//! defaulting, walking and diffing are timed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Value;
use std::fs;
use std::path::Path;

use jsonschema_form_core::{
    changed_paths, is_dirty, walk, EditSession, EngineOptions, SchemaDocument, TypeWidgets,
    VariantTracker, WalkContext,
};

/// Load and parse a fixture from the shared test fixtures directory.
fn load_fixture(name: &str) -> Value {
    let fixtures_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/schemas");
    let path = Path::new(fixtures_dir).join(name);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

fn bench_load_document(c: &mut Criterion) {
    let schema = load_fixture("robot_settings.json");
    let options = EngineOptions::default();

    c.bench_function("document/robot_settings", |b| {
        b.iter(|| SchemaDocument::from_value(black_box(&schema), black_box(&options)).unwrap())
    });
}

fn bench_fill_defaults(c: &mut Criterion) {
    let document =
        SchemaDocument::from_value(&load_fixture("robot_settings.json"), &EngineOptions::default())
            .unwrap();
    let data = load_fixture("robot_settings.data.json");

    c.bench_function("fill_defaults/robot_settings", |b| {
        b.iter(|| {
            let mut session = EditSession::new(black_box(data.clone()));
            session.fill_defaults(&document);
            session
        })
    });
}

fn bench_walk(c: &mut Criterion) {
    let document =
        SchemaDocument::from_value(&load_fixture("robot_settings.json"), &EngineOptions::default())
            .unwrap();
    let data = load_fixture("robot_settings.data.json");
    let widgets = TypeWidgets::standard();
    let context = WalkContext::new(&widgets);

    c.bench_function("walk/robot_settings", |b| {
        b.iter(|| {
            let mut tracker = VariantTracker::new();
            let tree = walk(&document, black_box(&data), &mut tracker, &context);
            black_box(tree.children().len())
        })
    });
}

fn bench_walk_recursive(c: &mut Criterion) {
    let document =
        SchemaDocument::from_value(&load_fixture("recursive.json"), &EngineOptions::default())
            .unwrap();
    let mut data = serde_json::json!({ "label": "leaf" });
    // Complete binary tree, 2^10 leaves.
    for depth in 0..10 {
        data = serde_json::json!({
            "label": format!("n{depth}"),
            "children": [data.clone(), data]
        });
    }
    let widgets = TypeWidgets::standard();
    let context = WalkContext::new(&widgets);

    c.bench_function("walk/recursive", |b| {
        b.iter(|| {
            let mut tracker = VariantTracker::new();
            walk(&document, black_box(&data), &mut tracker, &context)
                .children()
                .len()
        })
    });
}

fn bench_diff(c: &mut Criterion) {
    let original = load_fixture("robot_settings.data.json");
    let mut current = original.clone();
    current["drive"]["pid"]["p"] = serde_json::json!(3.0);

    c.bench_function("diff/is_dirty", |b| {
        b.iter(|| is_dirty(black_box(Some(&original)), black_box(Some(&current))))
    });
    c.bench_function("diff/changed_paths", |b| {
        b.iter(|| changed_paths(black_box(&original), black_box(&current)))
    });
}

criterion_group!(
    benches,
    bench_load_document,
    bench_fill_defaults,
    bench_walk,
    bench_walk_recursive,
    bench_diff
);
criterion_main!(benches);
