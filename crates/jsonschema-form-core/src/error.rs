//! Error types for loading schema documents and addressing model paths.
//!
//! The engine itself is total: malformed schema fragments degrade to
//! unsupported fields and bad writes become no-ops. Only the boundaries
//! (parsing a document, parsing a JSON Pointer) can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Schema error at {path}: {message}")]
    SchemaError { path: String, message: String },

    #[error("Invalid JSON Pointer {pointer:?}: {message}")]
    InvalidPointer { pointer: String, message: String },
}
