//! Reference resolution for definition documents.
//!
//! Schemas are built on first reference, depth first, so `extends`, `nested`
//! and `list` may name schemas defined later in the document. A reference
//! back into a schema still being built is a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::definition::{FieldDecl, FieldDef, SchemaDef};
use super::{Registry, RegistryError};
use crate::{Field, FieldHooks, FieldType, Schema, SchemaHooks};

pub(super) struct Resolver<'a> {
    definitions: toml::Table,
    field_hooks: &'a HashMap<String, Arc<dyn FieldHooks>>,
    schema_hooks: &'a HashMap<String, Arc<dyn SchemaHooks>>,
    field_types: &'a HashMap<String, FieldType>,
    registry: &'a mut Registry,
    built: HashSet<String>,
    visiting: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        definitions: toml::Table,
        field_hooks: &'a HashMap<String, Arc<dyn FieldHooks>>,
        schema_hooks: &'a HashMap<String, Arc<dyn SchemaHooks>>,
        field_types: &'a HashMap<String, FieldType>,
        registry: &'a mut Registry,
    ) -> Self {
        Self {
            definitions,
            field_hooks,
            schema_hooks,
            field_types,
            registry,
            built: HashSet::new(),
            visiting: Vec::new(),
        }
    }

    /// Builds every defined schema into the registry.
    pub fn resolve_all(mut self) -> Result<(), RegistryError> {
        let names: Vec<String> = self.definitions.keys().cloned().collect();
        for name in names {
            self.resolve(&name)?;
        }
        Ok(())
    }

    fn resolve(&mut self, name: &str) -> Result<Arc<Schema>, RegistryError> {
        if self.visiting.iter().any(|visiting| visiting == name) {
            let mut chain = self.visiting.clone();
            chain.push(name.to_string());
            return Err(RegistryError::CircularReference(chain.join(" -> ")));
        }

        let defined_here = self.definitions.contains_key(name);
        if !defined_here || self.built.contains(name) {
            return self
                .registry
                .get(name)
                .ok_or_else(|| RegistryError::SchemaNotFound(name.to_string()));
        }

        let def: SchemaDef = self.definitions[name].clone().try_into().map_err(|source| {
            RegistryError::InvalidDefinition {
                schema: name.to_string(),
                source,
            }
        })?;

        self.visiting.push(name.to_string());
        let schema = self.build(name, def);
        self.visiting.pop();

        let schema = self.registry.register(schema?);
        self.built.insert(name.to_string());
        debug!(schema = name, fields = schema.len(), "schema resolved");
        Ok(schema)
    }

    fn build(&mut self, name: &str, def: SchemaDef) -> Result<Schema, RegistryError> {
        let mut builder = Schema::builder(name);
        for parent in &def.extends {
            let parent = self.resolve(parent)?;
            builder = builder.extend(&parent);
        }
        if let Some(meta) = def.meta {
            if let Some(policy) = meta.unknown {
                builder = builder.unknown(policy);
            }
            if let Some(names) = meta.exclude {
                builder = builder.exclude(names);
            }
        }
        if let Some(hooks) = &def.hooks {
            let hooks = self
                .schema_hooks
                .get(hooks)
                .cloned()
                .ok_or_else(|| RegistryError::HookNotFound(hooks.clone()))?;
            builder = builder.shared_hooks(hooks);
        }

        for (attr, raw) in def.fields {
            let decl: FieldDecl = raw.try_into().map_err(|source| RegistryError::InvalidDefinition {
                schema: name.to_string(),
                source,
            })?;
            builder = match decl {
                FieldDecl::Type(type_name) => builder.field(attr, self.field_type(type_name)?),
                FieldDecl::Def(def) => {
                    let field = self.field(name, &attr, *def)?;
                    builder.field(attr, field)
                }
            };
        }

        Ok(builder.build())
    }

    fn field_type(&self, name: String) -> Result<FieldType, RegistryError> {
        self.field_types
            .get(&name)
            .cloned()
            .ok_or(RegistryError::FieldTypeNotFound(name))
    }

    fn field(&mut self, schema: &str, attr: &str, def: FieldDef) -> Result<Field, RegistryError> {
        let invalid = |reason| RegistryError::InvalidField {
            schema: schema.to_string(),
            attr: attr.to_string(),
            reason,
        };

        let shaped = def.nested.is_some() || def.list.is_some() || def.list_field.is_some();
        let mut builder = match (def.constant, &def.nested) {
            (Some(_), _) if shaped => {
                return Err(invalid("const cannot be combined with nested, list or list_field"));
            }
            (Some(value), _) => Field::constant(value),
            (None, Some(_)) if def.list.is_some() || def.list_field.is_some() => {
                return Err(invalid("nested cannot be combined with list or list_field"));
            }
            (None, Some(nested)) => Field::nested(self.resolve(nested)?),
            (None, None) => Field::builder(),
        };
        if let Some(list) = &def.list {
            builder = builder.schema(self.resolve(list)?);
        }
        if let Some(item) = def.list_field {
            builder = match *item {
                FieldDecl::Type(type_name) => builder.item(self.field_type(type_name)?),
                FieldDecl::Def(item) => builder.item(self.field(schema, attr, *item)?),
            };
        }

        if let Some(hooks) = def.hooks {
            let hooks = self
                .field_hooks
                .get(&hooks)
                .cloned()
                .ok_or(RegistryError::HookNotFound(hooks))?;
            builder = builder.shared_hooks(hooks);
        }
        if let Some(default) = def.default {
            builder = builder.default(default);
        }
        if def.required {
            builder = builder.required();
        }
        if let Some(name) = def.dump_to {
            builder = builder.dump_to(name);
        }
        if let Some(name) = def.load_from {
            builder = builder.load_from(name);
        }
        if let Some(name) = def.outer_name {
            builder = builder.outer_name(name);
        }
        for value in def.absent {
            builder = builder.absent_on(value);
        }

        Ok(builder.build()?)
    }
}
