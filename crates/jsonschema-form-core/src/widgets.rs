//! Leaf widget bindings.
//!
//! The engine does not render anything. For every opaque leaf it asks a
//! [`WidgetRegistry`] which widget the presentation layer should mount and
//! passes the answer through on the field descriptor.

use std::collections::HashMap;

use crate::resolver::Resolved;

/// Maps a leaf schema to a widget identifier.
pub trait WidgetRegistry {
    /// `None` means "no widget": the leaf is shown read-only.
    fn widget_for(&self, schema: &Resolved<'_>) -> Option<String>;
}

/// A registry keyed by widget hint (`x-widget` / `format`) first, then by
/// scalar type name (`string`, `number`, ...).
#[derive(Debug, Clone, Default)]
pub struct TypeWidgets {
    by_hint: HashMap<String, String>,
}

impl TypeWidgets {
    /// An empty registry: every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text inputs for strings, number inputs for numbers and integers,
    /// toggles for booleans.
    pub fn standard() -> Self {
        Self::new()
            .with("string", "text")
            .with("number", "number")
            .with("integer", "number")
            .with("boolean", "toggle")
    }

    pub fn with(mut self, hint: impl Into<String>, widget: impl Into<String>) -> Self {
        self.by_hint.insert(hint.into(), widget.into());
        self
    }
}

impl WidgetRegistry for TypeWidgets {
    fn widget_for(&self, schema: &Resolved<'_>) -> Option<String> {
        schema
            .widget_hint()
            .and_then(|hint| self.by_hint.get(hint))
            .or_else(|| {
                schema
                    .scalar_type()
                    .and_then(|ty| self.by_hint.get(ty.as_str()))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;
    use serde_json::json;

    fn widget(registry: &TypeWidgets, schema: serde_json::Value) -> Option<String> {
        let node = SchemaNode::from_value(&schema);
        registry.widget_for(&Resolved::direct(&node))
    }

    #[test]
    fn standard_maps_scalar_types() {
        let registry = TypeWidgets::standard();
        assert_eq!(widget(&registry, json!({ "type": "string" })).as_deref(), Some("text"));
        assert_eq!(widget(&registry, json!({ "type": "integer" })).as_deref(), Some("number"));
        assert_eq!(widget(&registry, json!({ "type": "boolean" })).as_deref(), Some("toggle"));
        assert_eq!(widget(&registry, json!({ "type": "null" })), None);
        assert_eq!(widget(&registry, json!({})), None);
    }

    #[test]
    fn hint_takes_precedence() {
        let registry = TypeWidgets::standard().with("color", "color-picker");
        assert_eq!(
            widget(&registry, json!({ "type": "string", "format": "color" })).as_deref(),
            Some("color-picker")
        );
        assert_eq!(
            widget(&registry, json!({ "type": "string", "x-widget": "color" })).as_deref(),
            Some("color-picker")
        );
        assert_eq!(
            widget(&registry, json!({ "type": "string", "format": "uuid" })).as_deref(),
            Some("text")
        );
    }

    #[test]
    fn empty_registry_binds_nothing() {
        assert_eq!(widget(&TypeWidgets::new(), json!({ "type": "string" })), None);
    }
}
