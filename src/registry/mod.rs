//! Run-time schema construction.
//!
//! A [`Registry`] holds schemas by name. Schemas get in either
//! programmatically, through [`Registry::define`], or from TOML definition
//! documents loaded by a [`RegistryBuilder`]. Both produce the same schemas
//! as [`Schema::builder`].

mod builder;
mod definition;
mod error;
mod file;
mod resolve;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Declaration, Schema};

pub use builder::RegistryBuilder;
pub use error::RegistryError;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder loading definitions from TOML documents.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Registers `schema` under its name, replacing any schema of that name.
    pub fn register(&mut self, schema: impl Into<Arc<Schema>>) -> Arc<Schema> {
        let schema = schema.into();
        self.schemas
            .insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    /// Builds and registers a schema from loose field declarations.
    ///
    /// `parents` name registered schemas whose fields are merged first, in
    /// order; `fields` are then declared in iteration order.
    ///
    /// ```
    /// use iko::{Field, FieldType, Registry};
    ///
    /// let mut registry = Registry::new();
    /// registry.define("Named", &[], [("name", FieldType::plain())])?;
    /// let person = registry.define(
    ///     "Person",
    ///     &["Named"],
    ///     [("age", Field::builder().default(0).build()?)],
    /// )?;
    /// assert_eq!(person.len(), 2);
    /// # Ok::<(), iko::Error>(())
    /// ```
    pub fn define<I, K, D>(
        &mut self,
        name: impl Into<String>,
        parents: &[&str],
        fields: I,
    ) -> Result<Arc<Schema>, RegistryError>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<Declaration>,
    {
        let mut builder = Schema::builder(name);
        for parent in parents {
            let parent = self
                .get(parent)
                .ok_or_else(|| RegistryError::SchemaNotFound(parent.to_string()))?;
            builder = builder.extend(&parent);
        }
        Ok(self.register(builder.fields(fields).build()))
    }
}
