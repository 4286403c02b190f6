use std::sync::Arc;

use tracing::debug;

use super::{Schema, SchemaHooks, SchemaOptions, Unknown};
use crate::{Field, FieldType};

/// A schema attribute declaration: a configured field or a bare field type.
#[derive(Debug, Clone)]
pub enum Declaration {
    Field(Field),
    Type(FieldType),
}

impl From<Field> for Declaration {
    fn from(field: Field) -> Self {
        Declaration::Field(field)
    }
}

impl From<FieldType> for Declaration {
    fn from(ty: FieldType) -> Self {
        Declaration::Type(ty)
    }
}

/// Builder for a [`Schema`].
///
/// Parents are merged in the order they are given, then the builder's own
/// declarations are applied. A declaration reusing an attribute name replaces
/// the earlier field in place, so the most-derived declaration wins while the
/// first declaration's position is kept.
///
/// Each option (`unknown`, `exclude`) and the hooks are inherited from the
/// last parent that sets them to something other than the default. A value
/// set on the builder itself always wins, whether it is set before or after
/// [`extend`](Self::extend).
///
/// ## Example
///
/// ```
/// use iko::{Field, Schema};
///
/// let named = Schema::builder("Named").field("name", Field::new()).build();
/// let aged = Schema::builder("Aged").field("age", Field::builder().default(0).build()?).build();
///
/// let person = Schema::builder("Person")
///     .extend(&named)
///     .extend(&aged)
///     .field("name", Field::builder().dump_to("full_name").build()?)
///     .build();
///
/// let names: Vec<_> = person.fields().map(|(attr, _)| attr).collect();
/// assert_eq!(names, ["name", "age"]);
/// assert_eq!(person.field("name").and_then(|f| f.dump_to()), Some("full_name"));
/// # Ok::<(), iko::SchemaError>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<(String, Field)>,
    unknown: Option<Unknown>,
    exclude: Option<Vec<String>>,
    hooks: Option<Arc<dyn SchemaHooks>>,
    inherited_options: SchemaOptions,
    inherited_hooks: Option<Arc<dyn SchemaHooks>>,
}

impl SchemaBuilder {
    pub(super) fn new(name: String) -> Self {
        Self {
            name,
            fields: Vec::new(),
            unknown: None,
            exclude: None,
            hooks: None,
            inherited_options: SchemaOptions::default(),
            inherited_hooks: None,
        }
    }

    /// Merges the fields of `parent` into this schema.
    pub fn extend(mut self, parent: &Schema) -> Self {
        for (attr, field) in &parent.fields {
            self.insert(attr.clone(), field.clone());
        }
        if parent.options.unknown != Unknown::default() {
            self.inherited_options.unknown = parent.options.unknown;
        }
        if !parent.options.exclude.is_empty() {
            self.inherited_options.exclude = parent.options.exclude.clone();
        }
        if parent.hooks.is_some() {
            self.inherited_hooks = parent.hooks.clone();
        }
        self
    }

    /// Declares attribute `attr`.
    ///
    /// A [`FieldType`] is instantiated with no configuration, except when its
    /// name equals `attr`: such a declaration is skipped and the attribute
    /// keeps whatever field a parent gave it.
    pub fn field(mut self, attr: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        let attr = attr.into();
        let field = match declaration.into() {
            Declaration::Field(field) => field,
            Declaration::Type(ty) if ty.name() == attr => {
                debug!(schema = %self.name, attr = %attr, "field type named after its attribute, skipped");
                return self;
            }
            Declaration::Type(ty) => ty.instantiate(),
        };
        self.insert(attr, field);
        self
    }

    /// Declares several attributes at once, in iteration order.
    pub fn fields<I, K, D>(self, declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<Declaration>,
    {
        declarations
            .into_iter()
            .fold(self, |builder, (attr, declaration)| builder.field(attr, declaration))
    }

    /// Sets every option at once, replacing anything inherited.
    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.unknown = Some(options.unknown);
        self.exclude = Some(options.exclude);
        self
    }

    pub fn unknown(mut self, policy: Unknown) -> Self {
        self.unknown = Some(policy);
        self
    }

    /// Adds names to the schema's own static exclusions. Once set, inherited
    /// exclusions no longer apply.
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude
            .get_or_insert_with(Vec::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn hooks(mut self, hooks: impl SchemaHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn shared_hooks(mut self, hooks: Arc<dyn SchemaHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn build(self) -> Schema {
        debug!(schema = %self.name, fields = self.fields.len(), "schema built");
        let options = SchemaOptions {
            unknown: self.unknown.unwrap_or(self.inherited_options.unknown),
            exclude: self.exclude.unwrap_or(self.inherited_options.exclude),
        };
        Schema {
            name: self.name,
            fields: self.fields,
            options,
            hooks: self.hooks.or(self.inherited_hooks),
        }
    }

    fn insert(&mut self, attr: String, field: Field) {
        match self.fields.iter_mut().find(|(name, _)| *name == attr) {
            Some((_, existing)) => {
                debug!(schema = %self.name, attr = %attr, "field overridden");
                *existing = field;
            }
            None => self.fields.push((attr, field)),
        }
    }
}
