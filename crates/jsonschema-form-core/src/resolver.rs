//! Local `$ref` resolution and polymorphic candidate lists.
//!
//! Resolution is a pure function over an explicit [`DefsTable`]; nothing is
//! resolved ahead of time. Callers resolve at every consumption point, and
//! children of a resolved node are resolved when they in turn are consumed.
//!
//! Only same-document pointers of the form `#/$defs/<name>` and
//! `#/definitions/<name>` are followed. Chains (`A -> B -> C`) are followed
//! transitively up to [`DefsTable::max_hops`]; cycles, over-long chains,
//! unknown names and external URLs leave the node as a
//! [`SchemaKind::Reference`], which consumers treat as unsupported.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde_json::Value;

use crate::path::unescape_pointer_segment;
use crate::schema::{Constraints, DefsTable, ScalarType, SchemaKind, SchemaNode};

const DEFINITION_PREFIXES: &[&str] = &["#/$defs/", "#/definitions/"];

// ---------------------------------------------------------------------------
// Resolved
// ---------------------------------------------------------------------------

/// A schema node after reference resolution.
///
/// `site` is the node as written where it was consumed (possibly a `$ref`);
/// `node` is what it resolved to. Metadata written beside a `$ref`
/// (`title`, `description`, `default`, `const`) overrides the target's, so
/// the accessors below read `site` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    pub site: &'a SchemaNode,
    pub node: &'a SchemaNode,
}

impl<'a> Resolved<'a> {
    /// Wrap a node that is not a reference.
    pub fn direct(node: &'a SchemaNode) -> Self {
        Self { site: node, node }
    }

    pub fn kind(&self) -> &'a SchemaKind {
        &self.node.kind
    }

    /// `false` when the reference could not be followed.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.node.kind, SchemaKind::Reference { .. })
    }

    pub fn is_object(&self) -> bool {
        self.node.is_object()
    }

    pub fn properties(&self) -> Option<&'a IndexMap<String, SchemaNode>> {
        self.node.properties()
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.node.kind {
            SchemaKind::Scalar { ty } => ty,
            _ => None,
        }
    }

    pub fn title(&self) -> Option<&'a str> {
        self.site
            .meta
            .title
            .as_deref()
            .or(self.node.meta.title.as_deref())
    }

    pub fn description(&self) -> Option<&'a str> {
        self.site
            .meta
            .description
            .as_deref()
            .or(self.node.meta.description.as_deref())
    }

    pub fn default_value(&self) -> Option<&'a Value> {
        self.site
            .meta
            .default
            .as_ref()
            .or(self.node.meta.default.as_ref())
    }

    pub fn const_value(&self) -> Option<&'a Value> {
        self.site
            .meta
            .const_value
            .as_ref()
            .or(self.node.meta.const_value.as_ref())
    }

    pub fn widget_hint(&self) -> Option<&'a str> {
        self.site
            .meta
            .widget
            .as_deref()
            .or(self.node.meta.widget.as_deref())
    }

    /// Site constraints over target constraints, field by field.
    pub fn constraints(&self) -> Constraints {
        self.site
            .meta
            .constraints
            .clone()
            .or(self.node.meta.constraints.clone())
    }

    pub fn examples(&self) -> &'a [Value] {
        if self.site.meta.examples.is_empty() {
            &self.node.meta.examples
        } else {
            &self.site.meta.examples
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve `node` against `defs`. Non-reference nodes come back unchanged.
pub fn resolve<'a>(node: &'a SchemaNode, defs: &'a DefsTable) -> Resolved<'a> {
    let mut current = node;
    let mut visited: Vec<&str> = Vec::new();

    while let SchemaKind::Reference { target } = &current.kind {
        if visited.contains(&target.as_str()) {
            tracing::debug!(reference = %target, "reference cycle, leaving unresolved");
            break;
        }
        if visited.len() >= defs.max_hops() {
            tracing::debug!(
                reference = %target,
                max_hops = defs.max_hops(),
                "reference chain too long, leaving unresolved"
            );
            break;
        }
        visited.push(target);

        let Some(next) = definition_name(target).and_then(|name| defs.get(&name)) else {
            tracing::debug!(reference = %target, "unresolvable reference");
            break;
        };
        tracing::trace!(reference = %target, "resolved reference");
        current = next;
    }

    Resolved {
        site: node,
        node: current,
    }
}

/// The definition name a local pointer refers to, or `None` for anything
/// that is not a direct `#/$defs/<name>` / `#/definitions/<name>` lookup.
///
/// # Example
/// ```
/// use jsonschema_form_core::resolver::definition_name;
/// assert_eq!(definition_name("#/$defs/Pid").as_deref(), Some("Pid"));
/// assert_eq!(definition_name("#/definitions/a~1b").as_deref(), Some("a/b"));
/// assert_eq!(definition_name("https://example.com/s.json"), None);
/// ```
pub fn definition_name(reference: &str) -> Option<Cow<'_, str>> {
    let name = DEFINITION_PREFIXES
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(unescape_pointer_segment(name))
}

/// The concrete candidate list for a polymorphic location.
///
/// Returns the first non-empty of: the alternatives of an array's `items`,
/// or the node's own alternatives. Every candidate is resolved, and an
/// alternative that is itself polymorphic is replaced by its own
/// alternatives in place, so the list never contains unions. An empty
/// result means "not polymorphic".
pub fn effective_alternatives<'a>(node: &'a SchemaNode, defs: &'a DefsTable) -> Vec<Resolved<'a>> {
    let resolved = resolve(node, defs);

    if let SchemaKind::Array { items } = resolved.kind() {
        let from_items = alternatives_of(resolve(items, defs), defs);
        if !from_items.is_empty() {
            return from_items;
        }
    }

    alternatives_of(resolved, defs)
}

fn alternatives_of<'a>(node: Resolved<'a>, defs: &'a DefsTable) -> Vec<Resolved<'a>> {
    let mut out = Vec::new();
    flatten_into(node, defs, 0, &mut out);
    out
}

fn flatten_into<'a>(
    node: Resolved<'a>,
    defs: &'a DefsTable,
    level: usize,
    out: &mut Vec<Resolved<'a>>,
) {
    let SchemaKind::Polymorphic { alternatives, .. } = node.kind() else {
        return;
    };
    for alternative in alternatives {
        let alternative = resolve(alternative, defs);
        let nested = matches!(alternative.kind(), SchemaKind::Polymorphic { .. });
        if nested && level < defs.max_hops() {
            flatten_into(alternative, defs, level + 1, out);
        } else {
            out.push(alternative);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
