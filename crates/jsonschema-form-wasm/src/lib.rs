//! WASM bindings for jsonschema-form.
//!
//! Exposes an editing session (`FormSession`) and two stateless helpers via
//! `wasm-bindgen` for the browser dashboard. Uses `serde-wasm-bindgen` for
//! JS ↔ serde_json::Value marshalling; values cross the boundary as plain
//! JS objects, and paths as JSON Pointer strings (`"/drive/pid/p"`).

use jsonschema_form_core::{
    EditSession, EngineOptions, Path, SchemaDocument, TypeWidgets, ValidationTree, WalkContext,
};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

/// Installs the panic hook so Rust panics show up in the JS console.
///
/// Called automatically when the WASM module loads (`#[wasm_bindgen(start)]`).
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

// ---------------------------------------------------------------------------
// Marshalling helpers
// ---------------------------------------------------------------------------

fn js_error(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

/// Serialize with plain objects for maps, which is what the dashboard reads.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(js_error)
}

fn from_js(value: JsValue) -> Result<Value, JsError> {
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}

fn options_from_js(options: JsValue) -> Result<EngineOptions, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(EngineOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(js_error)
}

fn parse_pointer(pointer: &str) -> Result<Path, JsError> {
    Path::from_pointer(pointer).map_err(js_error)
}

// ---------------------------------------------------------------------------
// FormSession
// ---------------------------------------------------------------------------

/// One settings form: a parsed schema plus the data being edited.
#[wasm_bindgen]
pub struct FormSession {
    document: SchemaDocument,
    session: EditSession,
    options: EngineOptions,
    widgets: TypeWidgets,
}

#[wasm_bindgen]
impl FormSession {
    /// Accepts the schema, the stored settings and optional engine options
    /// (`{ "max-depth": 64, "max-ref-hops": 32 }`).
    #[wasm_bindgen(constructor)]
    pub fn new(schema: JsValue, data: JsValue, options: JsValue) -> Result<FormSession, JsError> {
        let options = options_from_js(options)?;
        let schema = from_js(schema)?;
        let document = SchemaDocument::from_value(&schema, &options).map_err(js_error)?;
        let data = if data.is_undefined() {
            Value::Object(Default::default())
        } else {
            from_js(data)?
        };
        Ok(FormSession {
            document,
            session: EditSession::new(data),
            options,
            widgets: TypeWidgets::standard(),
        })
    }

    /// Bind a widget id to a widget hint (`x-widget` / `format`) or scalar
    /// type name, overriding the standard bindings.
    #[wasm_bindgen(js_name = bindWidget)]
    pub fn bind_widget(&mut self, hint: String, widget: String) {
        let widgets = std::mem::take(&mut self.widgets);
        self.widgets = widgets.with(hint, widget);
    }

    /// The field tree. `errors` is an optional validation tree shaped like
    /// the model.
    #[wasm_bindgen(js_name = fieldTree)]
    pub fn field_tree(&mut self, errors: JsValue) -> Result<JsValue, JsError> {
        let validation = if errors.is_undefined() || errors.is_null() {
            None
        } else {
            Some(ValidationTree::new(from_js(errors)?))
        };
        let mut context = WalkContext::new(&self.widgets).with_options(self.options);
        if let Some(validation) = &validation {
            context = context.with_validation(validation);
        }
        let tree = self.session.field_tree(&self.document, &context);
        to_js(&tree)
    }

    /// The value at `pointer`, or `undefined`.
    pub fn get(&self, pointer: &str) -> Result<JsValue, JsError> {
        match self.session.get(&parse_pointer(pointer)?) {
            Some(value) => to_js(value),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn set(&mut self, pointer: &str, value: JsValue) -> Result<bool, JsError> {
        let path = parse_pointer(pointer)?;
        Ok(self.session.set(&path, from_js(value)?))
    }

    #[wasm_bindgen(js_name = switchVariant)]
    pub fn switch_variant(&mut self, pointer: &str, index: u32) -> Result<bool, JsError> {
        let path = parse_pointer(pointer)?;
        Ok(self
            .session
            .switch_variant(&self.document, &path, index as usize))
    }

    #[wasm_bindgen(js_name = setNewItemVariant)]
    pub fn set_new_item_variant(&mut self, pointer: &str, index: u32) -> Result<bool, JsError> {
        let path = parse_pointer(pointer)?;
        Ok(self
            .session
            .set_new_item_variant(&self.document, &path, index as usize))
    }

    /// Append an element to the array at `pointer`; returns its index, or
    /// `undefined` when `pointer` is not an array field.
    #[wasm_bindgen(js_name = addItem)]
    pub fn add_item(&mut self, pointer: &str) -> Result<Option<u32>, JsError> {
        let path = parse_pointer(pointer)?;
        Ok(self
            .session
            .add_array_item(&self.document, &path)
            .and_then(|index| u32::try_from(index).ok()))
    }

    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, pointer: &str, index: u32) -> Result<bool, JsError> {
        let path = parse_pointer(pointer)?;
        Ok(self.session.remove_array_item(&path, index as usize))
    }

    #[wasm_bindgen(js_name = isDirty)]
    pub fn is_dirty(&self, pointer: &str) -> Result<bool, JsError> {
        Ok(self.session.is_dirty(&parse_pointer(pointer)?))
    }

    /// Names of the top-level fields with unsaved edits.
    #[wasm_bindgen(js_name = dirtyFields)]
    pub fn dirty_fields(&self) -> Result<JsValue, JsError> {
        to_js(&self.session.dirty_fields())
    }

    /// The value to send to the settings endpoint for `pointer`.
    #[wasm_bindgen(js_name = savePayload)]
    pub fn save_payload(&self, pointer: &str) -> Result<JsValue, JsError> {
        self.get(pointer)
    }

    /// Call after the settings endpoint accepted the payload for `pointer`.
    #[wasm_bindgen(js_name = commitSaved)]
    pub fn commit_saved(&mut self, pointer: &str) -> Result<(), JsError> {
        let path = parse_pointer(pointer)?;
        self.session.commit_saved(&path);
        Ok(())
    }

    #[wasm_bindgen(js_name = fillDefaults)]
    pub fn fill_defaults(&mut self) {
        self.session.fill_defaults(&self.document);
    }

    /// Replace the data (e.g. after re-fetching it) and forget variant state.
    pub fn reload(&mut self, data: JsValue) -> Result<(), JsError> {
        self.session.reload(from_js(data)?);
        Ok(())
    }

    pub fn model(&self) -> Result<JsValue, JsError> {
        to_js(self.session.model())
    }
}

// ---------------------------------------------------------------------------
// Stateless helpers
// ---------------------------------------------------------------------------

/// A freshly defaulted object for `schema`.
#[wasm_bindgen(js_name = buildDefaults)]
pub fn build_defaults(schema: JsValue) -> Result<JsValue, JsError> {
    let schema = from_js(schema)?;
    let document =
        SchemaDocument::from_value(&schema, &EngineOptions::default()).map_err(js_error)?;
    to_js(&jsonschema_form_core::build_defaults(
        document.root(),
        &document.defs,
    ))
}

/// Structural comparison; `undefined` counts as absent.
#[wasm_bindgen(js_name = isDirty)]
pub fn is_dirty(original: JsValue, current: JsValue) -> Result<bool, JsError> {
    let original = (!original.is_undefined()).then(|| from_js(original)).transpose()?;
    let current = (!current.is_undefined()).then(|| from_js(current)).transpose()?;
    Ok(jsonschema_form_core::is_dirty(
        original.as_ref(),
        current.as_ref(),
    ))
}
