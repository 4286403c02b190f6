//! Iko converts keyed mappings between an external ("wire") shape and an
//! internal ("storage") shape.
//!
//! Use [`Schema::load`] to marshal from request to storage and
//! [`Schema::dump`] to marshal from storage to response.

pub mod context;
mod error;
pub mod field;
pub mod registry;
pub mod schema;

pub use context::Context;
pub use error::Error;
pub use field::{Field, FieldBuilder, FieldDefault, FieldHooks, FieldType, Slot, ABSENT};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use schema::{
    Declaration, Schema, SchemaBuilder, SchemaError, SchemaHooks, SchemaOptions, Selection,
    Unknown,
};

/// A keyed mapping in either representation.
pub type Data = serde_json::Map<String, serde_json::Value>;
