use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::definition::Document;
use super::file::load_definition_file;
use super::resolve::Resolver;
use super::{Registry, RegistryError};
use crate::{FieldHooks, FieldType, Schema, SchemaHooks};

/// A definition document in the loading pipeline.
#[derive(Debug)]
enum DefinitionSource {
    File { path: PathBuf, required: bool },
    Inline(String),
}

/// Builder for a [`Registry`] from TOML definition documents.
///
/// Documents are merged in registration order, with later documents
/// overriding earlier ones. Nested tables are merged recursively; other
/// values (including arrays) are replaced entirely.
///
/// Hooks cannot be written in TOML, so they are registered by name and
/// referenced from field (`hooks = "name"`) or schema (`hooks = "name"`)
/// definitions. A field declared as a bare string names a field type;
/// `"Field"` is always available.
///
/// ## Example
///
/// ```
/// use iko::Registry;
///
/// let registry = Registry::builder()
///     .with_str(
///         r#"
///         [schema.Named.fields]
///         name = "Field"
///
///         [schema.Person]
///         extends = ["Named"]
///         fields = { _id = { outer_name = "id" } }
///         "#,
///     )
///     .build()?;
///
/// let person = registry.get("Person").expect("defined above");
/// assert_eq!(person.len(), 2);
/// # Ok::<(), iko::RegistryError>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct RegistryBuilder {
    sources: Vec<DefinitionSource>,
    registry: Registry,
    field_hooks: HashMap<String, Arc<dyn FieldHooks>>,
    schema_hooks: HashMap<String, Arc<dyn SchemaHooks>>,
    field_types: HashMap<String, FieldType>,
}

impl RegistryBuilder {
    pub(super) fn new() -> Self {
        let plain = FieldType::plain();
        Self {
            sources: Vec::new(),
            registry: Registry::new(),
            field_hooks: HashMap::new(),
            schema_hooks: HashMap::new(),
            field_types: HashMap::from([(plain.name().to_string(), plain)]),
        }
    }

    /// Adds a TOML definition file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(DefinitionSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds an in-memory TOML definition document.
    pub fn with_str(mut self, source: impl Into<String>) -> Self {
        self.sources.push(DefinitionSource::Inline(source.into()));
        self
    }

    /// Makes an already built schema available to definitions by its name.
    pub fn with_schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.registry.register(schema);
        self
    }

    pub fn with_field_hooks(mut self, name: impl Into<String>, hooks: impl FieldHooks + 'static) -> Self {
        self.field_hooks.insert(name.into(), Arc::new(hooks));
        self
    }

    pub fn with_schema_hooks(
        mut self,
        name: impl Into<String>,
        hooks: impl SchemaHooks + 'static,
    ) -> Self {
        self.schema_hooks.insert(name.into(), Arc::new(hooks));
        self
    }

    /// Makes a field type available to bare-string field declarations.
    pub fn with_field_type(mut self, ty: FieldType) -> Self {
        self.field_types.insert(ty.name().to_string(), ty);
        self
    }

    /// Loads and merges every document, then builds all defined schemas.
    pub fn build(mut self) -> Result<Registry, RegistryError> {
        let mut merged = toml::Table::new();

        for source in self.sources {
            match source {
                DefinitionSource::File { path, required } => {
                    if let Some(table) = load_definition_file(&path, required)? {
                        deep_merge(&mut merged, table);
                    }
                }
                DefinitionSource::Inline(contents) => {
                    let table = toml::from_str(&contents).map_err(RegistryError::InlineParseError)?;
                    deep_merge(&mut merged, table);
                }
            }
        }

        let document: Document = toml::Value::Table(merged)
            .try_into()
            .map_err(RegistryError::InvalidDocument)?;

        Resolver::new(
            document.schema,
            &self.field_hooks,
            &self.schema_hooks,
            &self.field_types,
            &mut self.registry,
        )
        .resolve_all()?;

        Ok(self.registry)
    }
}

/// Layers `overlay` onto the definitions gathered so far.
///
/// Tables merge key by key, so a later layer can add a schema, add a field to
/// an existing schema or change one setting of a field while the rest of its
/// definition stays. Anything else, `extends` and `absent` lists included, is
/// replaced whole. A field added by a later layer goes after the fields that
/// were already there.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(layer)) => deep_merge(existing, layer),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_merge_overrides_leaves() {
        let mut base: toml::Table = toml::from_str(
            r#"
            [schema.User.fields]
            name = {}
            _id = { dump_to = "id" }
            "#,
        )
        .unwrap();
        let overlay: toml::Table = toml::from_str(
            r#"
            [schema.User.fields]
            _id = { outer_name = "id" }
            email = {}
            "#,
        )
        .unwrap();

        deep_merge(&mut base, overlay);

        let fields = base["schema"]["User"]["fields"].as_table().unwrap();
        let names: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["name", "_id", "email"]);
        let id = fields["_id"].as_table().unwrap();
        assert_eq!(id.get("dump_to").and_then(|v| v.as_str()), Some("id"));
        assert_eq!(id.get("outer_name").and_then(|v| v.as_str()), Some("id"));
    }

    #[test]
    fn test_deep_merge_replaces_lists() {
        let mut base: toml::Table = toml::from_str("[schema.User]\nextends = [\"A\", \"B\"]").unwrap();
        let overlay: toml::Table = toml::from_str("[schema.User]\nextends = [\"C\"]").unwrap();

        deep_merge(&mut base, overlay);

        let extends = base["schema"]["User"]["extends"].as_array().unwrap();
        assert_eq!(extends.len(), 1);
        assert_eq!(extends[0].as_str(), Some("C"));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let result = RegistryBuilder::new().with_str("[schemas.User]").build();
        assert!(matches!(result, Err(RegistryError::InvalidDocument(_))));
    }

    #[test]
    fn test_inline_parse_error() {
        let result = RegistryBuilder::new().with_str("[schema").build();
        assert!(matches!(result, Err(RegistryError::InlineParseError(_))));
    }
}
