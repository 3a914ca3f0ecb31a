//! Per-path variant selection with lossless toggling.
//!
//! Every polymorphic location holds the index of its selected alternative
//! and a cache of the subtree the user had under each index. Switching away
//! snapshots the current subtree; switching back restores it verbatim, so a
//! user can explore other shapes without losing what they typed.

use std::collections::HashMap;

use serde_json::Value;

use crate::defaults::{build_defaults, fill_defaults, scalar_seed};
use crate::model;
use crate::path::{Path, PathKey};
use crate::resolver::Resolved;
use crate::schema::DefsTable;
use crate::selector::select_variant;

/// State of one polymorphic location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantState {
    selected: usize,
    cache: HashMap<usize, Value>,
}

impl VariantState {
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The subtree last seen under `index`, if the user ever left it.
    pub fn cached(&self, index: usize) -> Option<&Value> {
        self.cache.get(&index)
    }
}

/// Variant state for every polymorphic location visited in one session.
///
/// The alternative chosen for the next element of an array of polymorphic
/// items is kept apart from `states`: an array can itself be the active
/// alternative of a union at the same path.
#[derive(Debug, Clone, Default)]
pub struct VariantTracker {
    states: HashMap<Path, VariantState>,
    new_items: HashMap<Path, usize>,
}

impl VariantTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, path: &Path) -> Option<&VariantState> {
        self.states.get(path)
    }

    pub fn selected(&self, path: &Path) -> Option<usize> {
        self.states.get(path).map(VariantState::selected)
    }

    /// The selected index at `path`, guessing it from the data on first visit.
    pub fn ensure(&mut self, path: &Path, model: &Value, alternatives: &[Resolved<'_>]) -> usize {
        if let Some(state) = self.states.get(path) {
            return state.selected;
        }
        let selected = select_variant(model::get(model, path), alternatives);
        tracing::trace!(path = %path, selected, "initial variant selection");
        self.states.insert(
            path.clone(),
            VariantState {
                selected,
                cache: HashMap::new(),
            },
        );
        selected
    }

    /// Record a selection without touching the model or the cache.
    pub fn set_selected(&mut self, path: &Path, index: usize) {
        self.states.entry(path.clone()).or_default().selected = index;
    }

    /// Alternative used for the next element added to the array at `path`.
    pub fn new_item_variant(&self, path: &Path) -> usize {
        self.new_items.get(path).copied().unwrap_or(0)
    }

    pub fn set_new_item_variant(&mut self, path: &Path, index: usize) {
        self.new_items.insert(path.clone(), index);
    }

    /// Switch the location at `path` to alternative `new_index`.
    ///
    /// The current subtree is cached under the old index. A cached subtree
    /// for `new_index` is restored as-is; otherwise an object alternative is
    /// defaulted in place (keys shared with the old shape survive) and a
    /// non-object alternative takes its `const` / `default` / first `enum`
    /// literal when it has one.
    ///
    /// Returns `false` (and changes nothing) when `new_index` is out of
    /// range or already selected.
    pub fn switch(
        &mut self,
        model: &mut Value,
        path: &Path,
        new_index: usize,
        alternatives: &[Resolved<'_>],
        defs: &DefsTable,
    ) -> bool {
        let Some(target) = alternatives.get(new_index).copied() else {
            tracing::debug!(path = %path, new_index, "variant index out of range");
            return false;
        };
        let old_index = self.ensure(path, model, alternatives);
        if old_index == new_index {
            return false;
        }

        let state = self.states.entry(path.clone()).or_default();
        if let Some(current) = model::get(model, path) {
            state.cache.insert(old_index, current.clone());
        }

        if let Some(cached) = state.cache.get(&new_index) {
            model::set(model, path, cached.clone());
        } else if target.is_object() {
            match model::get_mut(model, path) {
                Some(current) => fill_defaults(current, target, defs),
                None => {
                    model::set(model, path, build_defaults(target, defs));
                }
            }
        } else if let Some(seed) = scalar_seed(target) {
            model::set(model, path, seed);
        }

        state.selected = new_index;
        tracing::debug!(path = %path, from = old_index, to = new_index, "switched variant");
        true
    }

    /// Drop the state of `path` and of everything below it.
    pub fn forget(&mut self, path: &Path) {
        self.states.retain(|key, _| !key.starts_with(path));
        self.new_items.retain(|key, _| !key.starts_with(path));
    }

    /// Keep per-element state attached to its element after the element at
    /// `removed` was deleted from the array at `array_path`: the removed
    /// element's states are dropped and later siblings move down one index.
    pub fn shift_after_removal(&mut self, array_path: &Path, removed: usize) {
        self.states = shift_keys(std::mem::take(&mut self.states), array_path, removed);
        self.new_items = shift_keys(std::mem::take(&mut self.new_items), array_path, removed);
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.new_items.clear();
    }
}

fn shift_keys<V>(
    entries: HashMap<Path, V>,
    array_path: &Path,
    removed: usize,
) -> HashMap<Path, V> {
    let depth = array_path.len();
    entries
        .into_iter()
        .filter_map(|(path, value)| {
            if path.len() <= depth || !path.starts_with(array_path) {
                return Some((path, value));
            }
            match path.keys()[depth].as_index() {
                Some(index) if index == removed => None,
                Some(index) if index > removed => {
                    Some((path.with_key_at(depth, PathKey::Index(index - 1)), value))
                }
                _ => Some((path, value)),
            }
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
