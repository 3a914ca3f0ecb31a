//! Field tree walker.
//!
//! Composes resolution, variant tracking and the model store into a tree of
//! [`FieldNode`] descriptors for a presentation layer. The walk reads the
//! model and never writes it; the only state it touches is the tracker,
//! which records the initial variant of every polymorphic location visited.
//!
//! Object properties are expanded whether or not data exists for them, so a
//! recursive schema would never bottom out. A schema node that reappears
//! among its own ancestors is therefore only expanded while the model still
//! has data at that path, and `EngineOptions::max_depth` bounds everything
//! else.

use serde::Serialize;
use serde_json::Value;

use crate::config::EngineOptions;
use crate::model;
use crate::path::Path;
use crate::resolver::{effective_alternatives, resolve, Resolved};
use crate::schema::{Constraints, DefsTable, SchemaDocument, SchemaKind, SchemaNode};
use crate::validation::{FieldErrors, ValidationTree};
use crate::variants::VariantTracker;
use crate::widgets::WidgetRegistry;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// External collaborators consulted during a walk.
#[derive(Clone, Copy)]
pub struct WalkContext<'c> {
    pub widgets: &'c dyn WidgetRegistry,
    pub validation: Option<&'c ValidationTree>,
    pub options: EngineOptions,
}

impl<'c> WalkContext<'c> {
    pub fn new(widgets: &'c dyn WidgetRegistry) -> Self {
        Self {
            widgets,
            validation: None,
            options: EngineOptions::default(),
        }
    }

    pub fn with_validation(mut self, validation: &'c ValidationTree) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// One field of the form, bound to its [`Path`] in the model.
#[derive(Debug, Clone, Serialize)]
pub struct FieldNode<'d> {
    pub path: Path,
    #[serde(skip)]
    pub schema: Resolved<'d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(flatten)]
    pub errors: FieldErrors,
    #[serde(flatten)]
    pub kind: FieldKind<'d>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind<'d> {
    /// One child per declared property, in declaration order.
    Object { children: Vec<FieldNode<'d>> },
    /// One child per existing element. `item_variants` is present when the
    /// items are polymorphic; its selection picks the shape of the next
    /// element added.
    Array {
        items: Vec<FieldNode<'d>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_variants: Option<VariantChoice>,
    },
    /// `active` is the selected alternative, walked at the same path.
    Polymorphic {
        choice: VariantChoice,
        active: Box<FieldNode<'d>>,
    },
    Enumerated { options: Vec<Value> },
    Leaf {
        #[serde(skip_serializing_if = "Option::is_none")]
        widget: Option<String>,
        #[serde(skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
        #[serde(skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
    /// Shown as an inert leaf.
    Unsupported { reason: UnsupportedReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantChoice {
    pub selected: usize,
    pub options: Vec<VariantOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOption {
    pub index: usize,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// A `$ref` that is missing, external, cyclic or too long a chain.
    UnresolvedReference { target: String },
    /// `anyOf` / `oneOf` with nothing in it.
    NoAlternatives,
    /// The selected alternative is itself a union nested too deep to
    /// flatten.
    NestedAlternatives,
    /// A recursive schema with no data left to follow.
    Recursive,
    DepthLimit,
}

impl<'d> FieldNode<'d> {
    /// The value this field is bound to.
    pub fn get<'m>(&self, model: &'m Value) -> Option<&'m Value> {
        model::get(model, &self.path)
    }

    pub fn set(&self, model: &mut Value, value: Value) -> bool {
        model::set(model, &self.path, value)
    }

    /// Direct children: properties, elements, or the active alternative.
    pub fn children(&self) -> Vec<&FieldNode<'d>> {
        match &self.kind {
            FieldKind::Object { children } => children.iter().collect(),
            FieldKind::Array { items, .. } => items.iter().collect(),
            FieldKind::Polymorphic { active, .. } => vec![active.as_ref()],
            _ => Vec::new(),
        }
    }

    /// The outermost descriptor bound to `path`. A polymorphic location and
    /// its active alternative share a path; the polymorphic node is found.
    pub fn find(&self, path: &Path) -> Option<&FieldNode<'d>> {
        if &self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find(path))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, FieldKind::Unsupported { .. })
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// Build the field tree for `model` under `document`.
///
/// The first visit to each polymorphic location records its initial
/// selection in `tracker`; later walks reuse it.
pub fn walk<'d>(
    document: &'d SchemaDocument,
    model: &Value,
    tracker: &mut VariantTracker,
    context: &WalkContext<'_>,
) -> FieldNode<'d> {
    let mut walker = Walker {
        defs: &document.defs,
        model,
        tracker,
        context,
        ancestors: Vec::new(),
    };
    walker.field(Path::root(), document.root(), None, false, 0)
}

struct Walker<'d, 'w, 'c> {
    defs: &'d DefsTable,
    model: &'w Value,
    tracker: &'w mut VariantTracker,
    context: &'w WalkContext<'c>,
    ancestors: Vec<&'d SchemaNode>,
}

impl<'d> Walker<'d, '_, '_> {
    fn field(
        &mut self,
        path: Path,
        schema: Resolved<'d>,
        name: Option<&str>,
        required: bool,
        depth: usize,
    ) -> FieldNode<'d> {
        let errors = self
            .context
            .validation
            .map(|validation| validation.lookup(&path))
            .unwrap_or_default();
        let kind = self.kind(&path, schema, depth);
        FieldNode {
            title: schema.title().or(name).map(str::to_string),
            description: schema.description().map(str::to_string),
            path,
            schema,
            required,
            errors,
            kind,
        }
    }

    fn kind(&mut self, path: &Path, schema: Resolved<'d>, depth: usize) -> FieldKind<'d> {
        if depth > self.context.options.max_depth {
            tracing::debug!(path = %path, depth, "walk depth limit reached");
            return unsupported(UnsupportedReason::DepthLimit);
        }

        let recursive = self.ancestors.iter().any(|node| std::ptr::eq(*node, schema.node));
        if recursive && matches!(model::get(self.model, path), None | Some(Value::Null)) {
            tracing::trace!(path = %path, "recursive schema without data");
            return unsupported(UnsupportedReason::Recursive);
        }

        self.ancestors.push(schema.node);
        let kind = self.expand(path, schema, depth);
        self.ancestors.pop();
        kind
    }

    fn expand(&mut self, path: &Path, schema: Resolved<'d>, depth: usize) -> FieldKind<'d> {
        match schema.kind() {
            SchemaKind::Reference { target } => {
                tracing::warn!(path = %path, reference = %target, "unresolved reference");
                unsupported(UnsupportedReason::UnresolvedReference {
                    target: target.clone(),
                })
            }

            SchemaKind::Object {
                properties,
                required,
            } => {
                let children = properties
                    .iter()
                    .map(|(name, property)| {
                        let property = resolve(property, self.defs);
                        let is_required = required.iter().any(|r| r == name);
                        self.field(
                            path.child(name.as_str()),
                            property,
                            Some(name.as_str()),
                            is_required,
                            depth + 1,
                        )
                    })
                    .collect();
                FieldKind::Object { children }
            }

            SchemaKind::Array { items } => {
                let item_schema = resolve(items, self.defs);
                let alternatives = effective_alternatives(items, self.defs);
                let item_variants = (!alternatives.is_empty()).then(|| {
                    let selected = self.tracker.new_item_variant(path);
                    variant_choice(selected, &alternatives)
                });
                let len = model::get(self.model, path)
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                let items = (0..len)
                    .map(|index| self.field(path.child(index), item_schema, None, false, depth + 1))
                    .collect();
                FieldKind::Array {
                    items,
                    item_variants,
                }
            }

            SchemaKind::Polymorphic { .. } => {
                let alternatives = effective_alternatives(schema.node, self.defs);
                if alternatives.is_empty() {
                    return unsupported(UnsupportedReason::NoAlternatives);
                }
                let selected = self
                    .tracker
                    .ensure(path, self.model, &alternatives)
                    .min(alternatives.len() - 1);
                let active = alternatives[selected];
                if matches!(active.kind(), SchemaKind::Polymorphic { .. }) {
                    return unsupported(UnsupportedReason::NestedAlternatives);
                }
                let choice = variant_choice(selected, &alternatives);
                let active = self.field(path.clone(), active, None, false, depth + 1);
                FieldKind::Polymorphic {
                    choice,
                    active: Box::new(active),
                }
            }

            SchemaKind::Enumerated { values } => FieldKind::Enumerated {
                options: values.clone(),
            },

            SchemaKind::Scalar { .. } => FieldKind::Leaf {
                widget: self.context.widgets.widget_for(&schema),
                constraints: schema.constraints(),
                tooltip: tooltip(&schema),
            },
        }
    }
}

fn unsupported<'d>(reason: UnsupportedReason) -> FieldKind<'d> {
    FieldKind::Unsupported { reason }
}

fn variant_choice(selected: usize, alternatives: &[Resolved<'_>]) -> VariantChoice {
    let options = alternatives
        .iter()
        .enumerate()
        .map(|(index, alternative)| VariantOption {
            index,
            title: alternative
                .title()
                .map_or_else(|| format!("Option {}", index + 1), str::to_string),
        })
        .collect();
    VariantChoice { selected, options }
}

/// Description, then a line listing the examples.
fn tooltip(schema: &Resolved<'_>) -> Option<String> {
    let examples = schema
        .examples()
        .iter()
        .map(|example| match example {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>();

    let mut lines = Vec::new();
    if let Some(description) = schema.description() {
        lines.push(description.to_string());
    }
    if !examples.is_empty() {
        lines.push(format!("Examples: {}", examples.join(", ")));
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

// ===========================================================================
// Tests
// ===========================================================================
