use serde_json::Value;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::schema::SchemaError;

/// Top-level error type for the iko library.
///
/// Conversion failures are never caught or wrapped by the engine: the first
/// one raised by any field aborts the whole `dump`/`load` call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("required key not found: {key}")]
    MissingKey { key: String },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("field hook failed: {0}")]
    Hook(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl Error {
    /// Wraps a failure raised inside a user-supplied hook.
    pub fn hook(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Hook(err.into())
    }

    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        Error::TypeMismatch {
            expected,
            found: kind_of(found),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
