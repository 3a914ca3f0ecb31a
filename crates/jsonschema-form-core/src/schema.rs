//! Typed schema model.
//!
//! JSON Schema identifies a node's shape by whichever keywords happen to be
//! present (`properties` ⇒ object, `items` ⇒ array, `anyOf` ⇒ union).
//! [`SchemaNode::from_value`] probes those keywords once and records the
//! answer as a [`SchemaKind`], so consumers match exhaustively instead of
//! re-probing fields at every use.
//!
//! ## Parse precedence
//!
//! | Keyword present                                   | Kind           |
//! |---------------------------------------------------|----------------|
//! | `$ref`                                            | `Reference`    |
//! | `anyOf` / `oneOf` (even empty)                    | `Polymorphic`  |
//! | `properties`, or `type: object` + closed          | `Object`       |
//! | `items`, or `type: array`                         | `Array`        |
//! | `enum`                                            | `Enumerated`   |
//! | anything else (incl. free-form objects)           | `Scalar`       |
//!
//! A lone `allOf: [X]` wrapper with no structural keywords of its own takes
//! `X`'s kind and keeps its own metadata on top of `X`'s.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::EngineOptions;
use crate::error::FormError;
use crate::resolver::{resolve, Resolved};

/// Keywords that decide a node's kind. Their absence is what lets a single
/// `allOf` member stand in for the node.
const STRUCTURAL_KEYWORDS: &[&str] = &["$ref", "anyOf", "oneOf", "properties", "items", "enum"];

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A parsed schema plus its local definitions table. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub root: SchemaNode,
    pub defs: DefsTable,
}

impl SchemaDocument {
    /// Parse a schema document.
    ///
    /// Definitions are collected from both `definitions` and `$defs` at the
    /// root; on a name clash the `$defs` entry wins.
    pub fn from_value(schema: &Value, options: &EngineOptions) -> Result<Self, FormError> {
        let Some(obj) = schema.as_object() else {
            return Err(FormError::SchemaError {
                path: "#".to_string(),
                message: format!(
                    "root schema must be an object (found: {})",
                    json_type_name(schema)
                ),
            });
        };

        let mut defs = DefsTable::new(options.max_ref_hops);
        for keyword in ["definitions", "$defs"] {
            match obj.get(keyword) {
                None => {}
                Some(Value::Object(entries)) => {
                    for (name, entry) in entries {
                        defs.insert(name.clone(), SchemaNode::from_value(entry));
                    }
                }
                Some(other) => {
                    return Err(FormError::SchemaError {
                        path: format!("#/{keyword}"),
                        message: format!(
                            "expected a mapping of schemas (found: {})",
                            json_type_name(other)
                        ),
                    });
                }
            }
        }

        let root = SchemaNode::from_value(schema);
        tracing::debug!(
            definitions = defs.len(),
            root_kind = root.kind.name(),
            "loaded schema document"
        );
        Ok(Self { root, defs })
    }

    /// Parse a schema document from JSON text.
    pub fn from_json(text: &str, options: &EngineOptions) -> Result<Self, FormError> {
        let schema: Value = serde_json::from_str(text)?;
        Self::from_value(&schema, options)
    }

    /// The root node, resolved.
    pub fn root(&self) -> Resolved<'_> {
        resolve(&self.root, &self.defs)
    }
}

/// Definition name → schema node, closed over for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DefsTable {
    entries: IndexMap<String, SchemaNode>,
    max_hops: usize,
}

impl DefsTable {
    pub fn new(max_hops: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_hops,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) {
        self.entries.insert(name.into(), node);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest reference chain the resolver follows.
    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }
}

impl Default for DefsTable {
    fn default() -> Self {
        Self::new(EngineOptions::default().max_ref_hops)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    pub meta: SchemaMeta,
    pub kind: SchemaKind,
}

/// Shape of a schema node, decided once at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object {
        properties: IndexMap<String, SchemaNode>,
        required: Vec<String>,
    },
    /// `items` is an untyped scalar when the schema declares none.
    Array { items: Box<SchemaNode> },
    Polymorphic {
        combinator: Combinator,
        alternatives: Vec<SchemaNode>,
    },
    Enumerated { values: Vec<Value> },
    /// `ty` is `None` for untyped and free-form nodes.
    Scalar { ty: Option<ScalarType> },
    /// A `$ref`, kept verbatim until resolution.
    Reference { target: String },
}

impl Default for SchemaKind {
    fn default() -> Self {
        SchemaKind::Scalar { ty: None }
    }
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Polymorphic { .. } => "polymorphic",
            SchemaKind::Enumerated { .. } => "enumerated",
            SchemaKind::Scalar { .. } => "scalar",
            SchemaKind::Reference { .. } => "reference",
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        if let Some(target) = obj.get("$ref").and_then(Value::as_str) {
            return SchemaKind::Reference {
                target: target.to_string(),
            };
        }

        for (keyword, combinator) in [("anyOf", Combinator::AnyOf), ("oneOf", Combinator::OneOf)] {
            if let Some(Value::Array(alternatives)) = obj.get(keyword) {
                return SchemaKind::Polymorphic {
                    combinator,
                    alternatives: alternatives.iter().map(SchemaNode::from_value).collect(),
                };
            }
        }

        let declared = declared_type(obj);

        if is_closed_object(obj, declared) {
            let properties = obj
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| {
                    props
                        .iter()
                        .map(|(name, schema)| (name.clone(), SchemaNode::from_value(schema)))
                        .collect()
                })
                .unwrap_or_default();
            let required = obj
                .get("required")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            return SchemaKind::Object {
                properties,
                required,
            };
        }

        if obj.contains_key("items") || declared == Some("array") {
            // Tuple-form `items: [...]` and boolean `items` are opaque here.
            let items = match obj.get("items") {
                Some(schema @ Value::Object(_)) => SchemaNode::from_value(schema),
                _ => SchemaNode::default(),
            };
            return SchemaKind::Array {
                items: Box::new(items),
            };
        }

        if let Some(Value::Array(values)) = obj.get("enum") {
            return SchemaKind::Enumerated {
                values: values.clone(),
            };
        }

        SchemaKind::Scalar {
            ty: declared.and_then(ScalarType::from_name),
        }
    }
}

impl SchemaNode {
    /// Parse one schema node. Total: boolean schemas and other non-object
    /// values become untyped scalars.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(obj) = value else {
            return Self::default();
        };

        let mut node = Self {
            meta: SchemaMeta::from_object(obj),
            kind: SchemaKind::from_object(obj),
        };

        if let Some(member) = sole_all_of_member(obj) {
            let inner = Self::from_value(member);
            node.kind = inner.kind;
            node.meta = node.meta.or(inner.meta);
        }

        node
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object { .. })
    }

    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }
}

/// `allOf: [X]` with no structural keyword beside it.
fn sole_all_of_member(obj: &Map<String, Value>) -> Option<&Value> {
    if STRUCTURAL_KEYWORDS.iter().any(|k| obj.contains_key(*k)) {
        return None;
    }
    match obj.get("allOf")?.as_array()?.as_slice() {
        [member] => Some(member),
        _ => None,
    }
}

/// First non-`null` entry of `type`, or `"null"` when that is all there is.
fn declared_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type")? {
        Value::String(name) => Some(name),
        Value::Array(names) => {
            let mut names = names.iter().filter_map(Value::as_str);
            let first = names.clone().next();
            names.find(|name| *name != "null").or(first)
        }
        _ => None,
    }
}

/// Objects with declared properties, or explicitly closed empty objects.
/// Free-form mappings (`additionalProperties` not `false`) stay opaque so
/// defaulting never prunes their user-chosen keys.
fn is_closed_object(obj: &Map<String, Value>, declared: Option<&str>) -> bool {
    obj.contains_key("properties")
        || (declared == Some("object")
            && obj.get("additionalProperties") == Some(&Value::Bool(false)))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Documentation, defaults and constraints shared by every kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub examples: Vec<Value>,
    pub default: Option<Value>,
    /// `const`: authoritative over anything the user entered.
    pub const_value: Option<Value>,
    pub constraints: Constraints,
    /// Leaf widget hint: `x-widget`, falling back to `format`.
    pub widget: Option<String>,
}

impl SchemaMeta {
    fn from_object(obj: &Map<String, Value>) -> Self {
        let examples = match (obj.get("examples"), obj.get("example")) {
            (Some(Value::Array(values)), _) => values.clone(),
            (_, Some(single)) => vec![single.clone()],
            _ => Vec::new(),
        };
        let constraints = Constraints::from_object(obj);
        let widget = string_at(obj, "x-widget").or_else(|| constraints.format.clone());
        Self {
            title: string_at(obj, "title"),
            description: string_at(obj, "description"),
            examples,
            default: obj.get("default").cloned(),
            const_value: obj.get("const").cloned(),
            constraints,
            widget,
        }
    }

    /// Field-wise `self` over `fallback`.
    pub fn or(self, fallback: SchemaMeta) -> Self {
        Self {
            title: self.title.or(fallback.title),
            description: self.description.or(fallback.description),
            examples: if self.examples.is_empty() {
                fallback.examples
            } else {
                self.examples
            },
            default: self.default.or(fallback.default),
            const_value: self.const_value.or(fallback.const_value),
            constraints: self.constraints.or(fallback.constraints),
            widget: self.widget.or(fallback.widget),
        }
    }
}

/// Value constraints forwarded to leaf widgets. Never enforced here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Constraints {
    fn from_object(obj: &Map<String, Value>) -> Self {
        let number = |key: &str| obj.get(key).and_then(Value::as_f64);
        let count = |key: &str| obj.get(key).and_then(Value::as_u64);
        Self {
            minimum: number("minimum"),
            maximum: number("maximum"),
            // Draft-4 boolean exclusives are not numbers and drop out here.
            exclusive_minimum: number("exclusiveMinimum"),
            exclusive_maximum: number("exclusiveMaximum"),
            multiple_of: number("multipleOf"),
            min_length: count("minLength"),
            max_length: count("maxLength"),
            min_items: count("minItems"),
            max_items: count("maxItems"),
            pattern: string_at(obj, "pattern"),
            format: string_at(obj, "format"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn or(self, fallback: Constraints) -> Self {
        Self {
            minimum: self.minimum.or(fallback.minimum),
            maximum: self.maximum.or(fallback.maximum),
            exclusive_minimum: self.exclusive_minimum.or(fallback.exclusive_minimum),
            exclusive_maximum: self.exclusive_maximum.or(fallback.exclusive_maximum),
            multiple_of: self.multiple_of.or(fallback.multiple_of),
            min_length: self.min_length.or(fallback.min_length),
            max_length: self.max_length.or(fallback.max_length),
            min_items: self.min_items.or(fallback.min_items),
            max_items: self.max_items.or(fallback.max_items),
            pattern: self.pattern.or(fallback.pattern),
            format: self.format.or(fallback.format),
        }
    }
}

fn string_at(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Small enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Combinator {
    AnyOf,
    OneOf,
}

/// Declared JSON type of a scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ScalarType::String),
            "number" => Some(ScalarType::Number),
            "integer" => Some(ScalarType::Integer),
            "boolean" => Some(ScalarType::Boolean),
            "null" => Some(ScalarType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Integer => "integer",
            ScalarType::Boolean => "boolean",
            ScalarType::Null => "null",
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
