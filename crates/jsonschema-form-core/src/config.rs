//! Configuration for the form engine.

use serde::{Deserialize, Serialize};

/// Options for loading schema documents and walking field trees.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`, `max-ref-hops`).
/// Missing fields fall back to their defaults, so `{}` is a valid options
/// object from JavaScript or a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineOptions {
    /// Maximum field tree depth. Recursive schemas (a node whose property
    /// refers back to itself) are cut off here with an unsupported field.
    pub max_depth: usize,
    /// Maximum number of `$ref` hops followed when resolving a reference
    /// chain (`A -> B -> C`). Longer chains are treated as unresolvable.
    pub max_ref_hops: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_ref_hops: 32,
        }
    }
}
