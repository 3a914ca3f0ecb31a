//! Schema-driven configuration engine.
//!
//! Takes a JSON-Schema-like document emitted by a settings backend and turns
//! it into an editable model: references are resolved against the local
//! definitions table, polymorphic (`anyOf` / `oneOf`) fields get a selected
//! variant with per-variant undo caching, new structure is synthesized from
//! `default` / `const`, and a structural comparator decides whether a field
//! group has unsaved edits.
//!
//! ```
//! use jsonschema_form_core::{EditSession, EngineOptions, Path, SchemaDocument};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "speed": { "type": "number", "default": 5 }
//!     }
//! });
//! let document = SchemaDocument::from_value(&schema, &EngineOptions::default()).unwrap();
//!
//! let mut session = EditSession::new(json!({}));
//! session.fill_defaults(&document);
//! assert_eq!(session.model(), &json!({ "speed": 5 }));
//!
//! let speed = Path::root().child("speed");
//! session.set(&speed, json!(7));
//! assert!(session.is_dirty(&speed));
//! ```

pub mod config;
pub mod defaults;
pub mod diff;
pub mod error;
pub mod model;
pub mod path;
pub mod resolver;
pub mod schema;
pub mod selector;
pub mod session;
pub mod validation;
pub mod variants;
pub mod walker;
pub mod widgets;

pub use config::EngineOptions;
pub use defaults::{build_defaults, build_new_array_item, fill_defaults};
pub use diff::{changed_paths, is_dirty};
pub use error::FormError;
pub use path::{Path, PathKey};
pub use resolver::{effective_alternatives, resolve, Resolved};
pub use schema::{
    Combinator, Constraints, DefsTable, ScalarType, SchemaDocument, SchemaKind, SchemaMeta,
    SchemaNode,
};
pub use selector::select_variant;
pub use session::EditSession;
pub use validation::{FieldErrors, ValidationTree};
pub use variants::{VariantState, VariantTracker};
pub use walker::{
    walk, FieldKind, FieldNode, UnsupportedReason, VariantChoice, VariantOption, WalkContext,
};
pub use widgets::{TypeWidgets, WidgetRegistry};
