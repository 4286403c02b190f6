use std::path::PathBuf;
use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("required definition file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read definition file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse definition file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to parse inline definitions: {0}")]
    InlineParseError(#[source] toml::de::Error),

    #[error("invalid definition document: {0}")]
    InvalidDocument(#[source] toml::de::Error),

    #[error("invalid definition of schema '{schema}': {source}")]
    InvalidDefinition {
        schema: String,
        source: toml::de::Error,
    },

    #[error("invalid field '{schema}.{attr}': {reason}")]
    InvalidField {
        schema: String,
        attr: String,
        reason: &'static str,
    },

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("hooks not found: {0}")]
    HookNotFound(String),

    #[error("field type not found: {0}")]
    FieldTypeNotFound(String),

    #[error("circular schema reference: {0}")]
    CircularReference(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
