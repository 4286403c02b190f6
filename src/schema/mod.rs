//! Schemas: named, ordered field sets with bulk conversions.

mod builder;
mod convert;
mod error;
mod hooks;
mod options;

use std::fmt;
use std::sync::Arc;

use crate::Field;

pub use builder::{Declaration, SchemaBuilder};
pub use error::SchemaError;
pub use hooks::SchemaHooks;
pub use options::{SchemaOptions, Selection, Unknown};

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Internal to external.
    Dump,
    /// External to internal.
    Load,
}

/// An ordered collection of named fields.
///
/// A schema is immutable once built and can be shared (it is cheap to clone
/// and `Send + Sync`) across any number of concurrent conversions.
///
/// ## Example
///
/// ```
/// use futures::executor::block_on;
/// use iko::{Context, Field, Schema};
/// use serde_json::json;
///
/// let schema = Schema::builder("Document")
///     .field("_id", Field::builder().outer_name("id").build()?)
///     .field("title", Field::new())
///     .build();
///
/// let serde_json::Value::Object(internal) = json!({ "_id": 42, "title": "moon" }) else {
///     unreachable!()
/// };
/// let external = block_on(schema.dump(&internal, &Context::new()))?;
/// assert_eq!(serde_json::Value::Object(external), json!({ "id": 42, "title": "moon" }));
/// # Ok::<(), iko::Error>(())
/// ```
#[derive(Clone)]
pub struct Schema {
    name: String,
    fields: Vec<(String, Field)>,
    options: SchemaOptions,
    hooks: Option<Arc<dyn SchemaHooks>>,
}

impl Schema {
    /// Starts declaring a schema called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(attr, field)| (attr.as_str(), field))
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, field)| field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("options", &self.options)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}
