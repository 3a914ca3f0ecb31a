//! Default and instance synthesis.
//!
//! [`fill_defaults`] shapes an existing object to its schema in place:
//! `const` is forced, `default` fills holes, nested objects are recursed
//! into, and undeclared keys are pruned. Running it twice is the same as
//! running it once. The builders below reuse it on fresh empty objects.

use serde_json::{Map, Value};

use crate::resolver::{resolve, Resolved};
use crate::schema::{DefsTable, SchemaKind};

/// Shape `target` to the object schema `schema` in place.
///
/// For every declared property `p`:
/// - `p` has a `const` ⇒ `target[p] = const`, whatever was there;
/// - `target[p]` is absent and `p` has a `default` ⇒ `target[p] = default`;
/// - `target[p]` is an object and `p` is object-shaped ⇒ recurse.
///
/// Afterwards every key not declared by the schema is removed. A non-object
/// `target` is replaced by an empty object first. Non-object schemas leave
/// `target` untouched.
pub fn fill_defaults(target: &mut Value, schema: Resolved<'_>, defs: &DefsTable) {
    if !schema.is_object() {
        return;
    }
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        fill_object(map, schema, defs);
    }
}

fn fill_object(target: &mut Map<String, Value>, schema: Resolved<'_>, defs: &DefsTable) {
    let Some(properties) = schema.properties() else {
        return;
    };

    for (name, property) in properties {
        let property = resolve(property, defs);

        if let Some(constant) = property.const_value() {
            target.insert(name.clone(), constant.clone());
            continue;
        }

        if !target.contains_key(name) {
            if let Some(default) = property.default_value() {
                target.insert(name.clone(), default.clone());
            }
            continue;
        }

        if let Some(Value::Object(child)) = target.get_mut(name) {
            if property.is_object() {
                fill_object(child, property, defs);
            }
        }
    }

    target.retain(|key, _| properties.contains_key(key));
}

/// A freshly defaulted object for an object schema: [`fill_defaults`]
/// applied to `{}`. Non-object schemas produce `{}` as well.
pub fn build_defaults(schema: Resolved<'_>, defs: &DefsTable) -> Value {
    let mut value = Value::Object(Map::new());
    fill_defaults(&mut value, schema, defs);
    value
}

/// The value a non-object schema offers on its own: `const`, `default`, or
/// the first `enum` literal.
pub fn scalar_seed(schema: Resolved<'_>) -> Option<Value> {
    if let Some(constant) = schema.const_value() {
        return Some(constant.clone());
    }
    if let Some(default) = schema.default_value() {
        return Some(default.clone());
    }
    match schema.kind() {
        SchemaKind::Enumerated { values } => values.first().cloned(),
        _ => None,
    }
}

/// The value appended when the user adds an element to an array.
///
/// - polymorphic items: the alternative at `selected`, defaulted when it is
///   object-shaped, else `null` (also `null` for an out-of-range index);
/// - object items: a defaulted object;
/// - enumerated items: the first literal;
/// - anything else: `null`.
pub fn build_new_array_item(
    array_schema: Resolved<'_>,
    selected: usize,
    defs: &DefsTable,
) -> Value {
    let SchemaKind::Array { items } = array_schema.kind() else {
        return Value::Null;
    };
    let item = resolve(items, defs);

    match item.kind() {
        SchemaKind::Polymorphic { alternatives, .. } => alternatives
            .get(selected)
            .map(|alternative| resolve(alternative, defs))
            .filter(Resolved::is_object)
            .map_or(Value::Null, |alternative| build_defaults(alternative, defs)),
        SchemaKind::Object { .. } => build_defaults(item, defs),
        SchemaKind::Enumerated { values } => values.first().cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
