//! Editing session.
//!
//! An [`EditSession`] owns the live model, the snapshot taken at the last
//! load or save, and the variant tracker. The schema document is borrowed
//! per call, so one parsed document can serve any number of sessions.

use serde_json::Value;

use crate::defaults::{build_new_array_item, fill_defaults};
use crate::diff::is_dirty;
use crate::model;
use crate::path::Path;
use crate::resolver::{effective_alternatives, resolve, Resolved};
use crate::schema::{SchemaDocument, SchemaKind};
use crate::selector::select_variant;
use crate::variants::VariantTracker;
use crate::walker::{walk, FieldNode, WalkContext};

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    model: Value,
    snapshot: Value,
    tracker: VariantTracker,
}

impl EditSession {
    /// Start editing `data`. The snapshot is a deep copy of it.
    pub fn new(data: Value) -> Self {
        Self {
            snapshot: data.clone(),
            model: data,
            tracker: VariantTracker::new(),
        }
    }

    pub fn model(&self) -> &Value {
        &self.model
    }

    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    pub fn tracker(&self) -> &VariantTracker {
        &self.tracker
    }

    pub fn into_model(self) -> Value {
        self.model
    }

    pub fn get(&self, path: &Path) -> Option<&Value> {
        model::get(&self.model, path)
    }

    pub fn set(&mut self, path: &Path, value: Value) -> bool {
        model::set(&mut self.model, path, value)
    }

    /// Shape the whole model to the root schema: force constants, fill
    /// defaults, prune undeclared keys.
    pub fn fill_defaults(&mut self, document: &SchemaDocument) {
        fill_defaults(&mut self.model, document.root(), &document.defs);
    }

    /// The field tree for the current model.
    pub fn field_tree<'d>(
        &mut self,
        document: &'d SchemaDocument,
        context: &WalkContext<'_>,
    ) -> FieldNode<'d> {
        walk(document, &self.model, &mut self.tracker, context)
    }

    pub fn selected_variant(&self, path: &Path) -> Option<usize> {
        self.tracker.selected(path)
    }

    /// Switch the polymorphic location at `path` to alternative `index`.
    ///
    /// Returns `false` when `path` is not polymorphic, `index` is out of
    /// range or already selected. Arrays of polymorphic items choose the
    /// next element's shape through [`Self::set_new_item_variant`] instead.
    pub fn switch_variant(
        &mut self,
        document: &SchemaDocument,
        path: &Path,
        index: usize,
    ) -> bool {
        let Some(schema) = self.schema_at(document, path) else {
            tracing::debug!(path = %path, "no schema at path");
            return false;
        };
        if matches!(schema.kind(), SchemaKind::Array { .. }) {
            return false;
        }
        let alternatives = effective_alternatives(schema.node, &document.defs);
        self.tracker
            .switch(&mut self.model, path, index, &alternatives, &document.defs)
    }

    /// Choose the alternative used for the next element added to the array
    /// at `path`.
    pub fn set_new_item_variant(
        &mut self,
        document: &SchemaDocument,
        path: &Path,
        index: usize,
    ) -> bool {
        let Some(items) = self.array_items_at(document, path) else {
            return false;
        };
        if index >= effective_alternatives(items.node, &document.defs).len() {
            return false;
        }
        self.tracker.set_new_item_variant(path, index);
        true
    }

    /// Append a new element to the array at `path` and return its index.
    ///
    /// A missing or `null` array is created. The element is built from the
    /// item schema; for polymorphic items, from the alternative chosen with
    /// [`Self::set_new_item_variant`] (the first by default), which also
    /// becomes the new element's selected variant.
    pub fn add_array_item(&mut self, document: &SchemaDocument, path: &Path) -> Option<usize> {
        let array_schema = self.collapsed_at(document, path)?;
        let SchemaKind::Array { items } = array_schema.kind() else {
            return None;
        };

        let selected = self.tracker.new_item_variant(path);
        let item = build_new_array_item(array_schema, selected, &document.defs);
        let polymorphic_items = !effective_alternatives(items, &document.defs).is_empty();

        if matches!(self.get(path), None | Some(Value::Null)) {
            self.set(path, Value::Array(Vec::new()));
        }
        let Some(Value::Array(elements)) = model::get_mut(&mut self.model, path) else {
            tracing::debug!(path = %path, "cannot append to a non-array value");
            return None;
        };
        elements.push(item);
        let index = elements.len() - 1;

        let element = path.child(index);
        self.tracker.forget(&element);
        if polymorphic_items {
            self.tracker.set_selected(&element, selected);
        }
        tracing::debug!(path = %path, index, variant = selected, "added array item");
        Some(index)
    }

    /// Remove element `index` of the array at `path`. Variant state of later
    /// elements moves down with them.
    pub fn remove_array_item(&mut self, path: &Path, index: usize) -> bool {
        if !matches!(self.get(path), Some(Value::Array(_))) {
            return false;
        }
        if model::remove(&mut self.model, &path.child(index)).is_none() {
            return false;
        }
        self.tracker.shift_after_removal(path, index);
        tracing::debug!(path = %path, index, "removed array item");
        true
    }

    /// Whether the subtree at `path` differs from the snapshot.
    pub fn is_dirty(&self, path: &Path) -> bool {
        is_dirty(model::get(&self.snapshot, path), model::get(&self.model, path))
    }

    /// Top-level fields whose Save action is enabled, in model order
    /// followed by fields only the snapshot still has.
    pub fn dirty_fields(&self) -> Vec<String> {
        let mut names: Vec<&String> = Vec::new();
        for value in [&self.model, &self.snapshot] {
            let Value::Object(map) = value else {
                continue;
            };
            for key in map.keys() {
                if !names.contains(&key) {
                    names.push(key);
                }
            }
        }
        names
            .into_iter()
            .filter(|name| self.is_dirty(&Path::root().child(name.as_str())))
            .cloned()
            .collect()
    }

    /// The value a save of `path` would send.
    pub fn save_payload(&self, path: &Path) -> Option<&Value> {
        self.get(path)
    }

    /// Send the value at `path` to `sink`. On success the snapshot at `path`
    /// catches up with the model and `Ok(true)` is returned; a missing value
    /// is `Ok(false)` and the sink is not called. On failure nothing changes.
    pub fn save<F, E>(&mut self, path: &Path, sink: F) -> Result<bool, E>
    where
        F: FnOnce(&Path, &Value) -> Result<(), E>,
    {
        let Some(payload) = self.save_payload(path) else {
            return Ok(false);
        };
        if let Err(err) = sink(path, payload) {
            tracing::debug!(path = %path, "save rejected, keeping snapshot");
            return Err(err);
        }
        self.commit_saved(path);
        Ok(true)
    }

    /// Record the value at `path` as saved.
    pub fn commit_saved(&mut self, path: &Path) {
        match model::get(&self.model, path).cloned() {
            Some(value) => {
                model::set(&mut self.snapshot, path, value);
            }
            None => {
                model::remove(&mut self.snapshot, path);
            }
        }
        tracing::debug!(path = %path, "snapshot updated");
    }

    /// Replace model and snapshot with `data` and forget all variant state.
    pub fn reload(&mut self, data: Value) {
        self.snapshot = data.clone();
        self.model = data;
        self.tracker.clear();
        tracing::debug!("session reloaded");
    }

    /// The schema node declared at `path`, without collapsing a polymorphic
    /// node found there.
    fn schema_at<'d>(&self, document: &'d SchemaDocument, path: &Path) -> Option<Resolved<'d>> {
        let mut current = document.root();
        let mut prefix = Path::root();
        for key in path.keys() {
            current = self.collapse(document, &prefix, current)?;
            current = match current.kind() {
                SchemaKind::Object { properties, .. } => {
                    resolve(properties.get(&*key.as_field())?, &document.defs)
                }
                SchemaKind::Array { items } => {
                    key.as_index()?;
                    resolve(items, &document.defs)
                }
                _ => return None,
            };
            prefix.push(key.clone());
        }
        Some(current)
    }

    fn collapsed_at<'d>(&self, document: &'d SchemaDocument, path: &Path) -> Option<Resolved<'d>> {
        let schema = self.schema_at(document, path)?;
        self.collapse(document, path, schema)
    }

    fn array_items_at<'d>(
        &self,
        document: &'d SchemaDocument,
        path: &Path,
    ) -> Option<Resolved<'d>> {
        match self.collapsed_at(document, path)?.kind() {
            SchemaKind::Array { items } => Some(resolve(items, &document.defs)),
            _ => None,
        }
    }

    /// The active alternative when `schema` is polymorphic at `path`.
    fn collapse<'d>(
        &self,
        document: &'d SchemaDocument,
        path: &Path,
        schema: Resolved<'d>,
    ) -> Option<Resolved<'d>> {
        if !matches!(schema.kind(), SchemaKind::Polymorphic { .. }) {
            return Some(schema);
        }
        let alternatives = effective_alternatives(schema.node, &document.defs);
        let selected = self
            .tracker
            .selected(path)
            .unwrap_or_else(|| select_variant(self.get(path), &alternatives));
        alternatives
            .get(selected)
            .copied()
            .filter(|active| !matches!(active.kind(), SchemaKind::Polymorphic { .. }))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
