use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Field, FieldDefault, FieldHooks, Item, Kind};
use crate::schema::{Declaration, Schema, SchemaError};

/// Builder for a [`Field`].
///
/// Conflicting settings are rejected by [`build`](Self::build), never at
/// conversion time:
/// - `outer_name` together with `dump_to` or `load_from`,
/// - `required` together with a default,
/// - an item schema together with an item field on a list,
/// - anything about the input (hooks, default, `required`, absence set) on a
///   constant.
///
/// ## Example
///
/// ```
/// use iko::Field;
///
/// let id = Field::builder().outer_name("id").build()?;
/// assert_eq!(id.dump_to(), Some("id"));
/// assert_eq!(id.load_from(), Some("id"));
///
/// assert!(Field::builder().outer_name("id").dump_to("key").build().is_err());
/// # Ok::<(), iko::SchemaError>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct FieldBuilder {
    draft: Draft,
    hooks: Option<Arc<dyn FieldHooks>>,
    default: FieldDefault,
    required: bool,
    dump_to: Option<String>,
    load_from: Option<String>,
    outer_name: Option<String>,
    absent: Vec<Value>,
}

enum Draft {
    Plain,
    Const(Value),
    Nested(Arc<Schema>),
    List {
        schema: Option<Arc<Schema>>,
        field: Option<Field>,
    },
}

impl FieldBuilder {
    pub(super) fn new() -> Self {
        Self {
            draft: Draft::Plain,
            hooks: None,
            default: FieldDefault::Absent,
            required: false,
            dump_to: None,
            load_from: None,
            outer_name: None,
            absent: Vec::new(),
        }
    }

    pub(super) fn constant(value: Value) -> Self {
        Self {
            draft: Draft::Const(value),
            ..Self::new()
        }
    }

    pub(super) fn nested(schema: Arc<Schema>) -> Self {
        Self {
            draft: Draft::Nested(schema),
            ..Self::new()
        }
    }

    pub(super) fn list() -> Self {
        Self {
            draft: Draft::List {
                schema: None,
                field: None,
            },
            ..Self::new()
        }
    }

    /// Post-processing run on present values. Only plain fields run it; the
    /// absence predicate applies to every kind of field.
    pub fn hooks(mut self, hooks: impl FieldHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn shared_hooks(mut self, hooks: Arc<dyn FieldHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Value used when the key is missing from the source mapping.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Producer invoked each time the key is missing.
    pub fn default_with(mut self, produce: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = FieldDefault::producer(produce);
        self
    }

    /// A missing key fails the conversion with [`Error::MissingKey`](crate::Error::MissingKey).
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn dump_to(mut self, name: impl Into<String>) -> Self {
        self.dump_to = Some(name.into());
        self
    }

    pub fn load_from(mut self, name: impl Into<String>) -> Self {
        self.load_from = Some(name.into());
        self
    }

    /// Sets both the dump and the load name.
    pub fn outer_name(mut self, name: impl Into<String>) -> Self {
        self.outer_name = Some(name.into());
        self
    }

    /// Adds `value` to the absence set: a field holding it is omitted.
    pub fn absent_on(mut self, value: impl Into<Value>) -> Self {
        self.absent.push(value.into());
        self
    }

    /// Item schema of a list field.
    pub fn schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.list_delegates().0.replace(schema.into());
        self
    }

    /// Item field of a list field; its post-processing converts each element.
    /// A bare [`FieldType`] is instantiated with no configuration.
    pub fn item(mut self, declaration: impl Into<Declaration>) -> Self {
        let field = match declaration.into() {
            Declaration::Field(field) => field,
            Declaration::Type(ty) => ty.instantiate(),
        };
        self.list_delegates().1.replace(field);
        self
    }

    fn list_delegates(&mut self) -> (&mut Option<Arc<Schema>>, &mut Option<Field>) {
        if !matches!(self.draft, Draft::List { .. }) {
            self.draft = Draft::List {
                schema: None,
                field: None,
            };
        }
        match &mut self.draft {
            Draft::List { schema, field } => (schema, field),
            Draft::Plain | Draft::Const(_) | Draft::Nested(_) => unreachable!("draft was just made a list"),
        }
    }

    pub fn build(self) -> Result<Field, SchemaError> {
        let (dump_to, load_from) = match self.outer_name {
            Some(name) => {
                if self.dump_to.is_some() || self.load_from.is_some() {
                    return Err(SchemaError::ConflictingNames { outer_name: name });
                }
                (Some(name.clone()), Some(name))
            }
            None => (self.dump_to, self.load_from),
        };

        if self.required && self.default.is_set() {
            return Err(SchemaError::RequiredWithDefault);
        }

        let kind = match self.draft {
            Draft::Plain => Kind::Plain,
            Draft::Const(_)
                if self.hooks.is_some()
                    || self.default.is_set()
                    || self.required
                    || !self.absent.is_empty() =>
            {
                return Err(SchemaError::ConstantWithInputSettings);
            }
            Draft::Const(value) => Kind::Const(value),
            Draft::Nested(schema) => Kind::Nested(schema),
            Draft::List {
                schema: Some(_),
                field: Some(_),
            } => return Err(SchemaError::ConflictingListDelegates),
            Draft::List { schema, field } => Kind::List(
                schema
                    .map(Item::Schema)
                    .or_else(|| field.map(|field| Item::Field(Box::new(field)))),
            ),
        };

        let mut field = Field::new();
        field.kind = kind;
        if let Some(hooks) = self.hooks {
            field.hooks = hooks;
        }
        field.default = self.default;
        field.required = self.required;
        field.dump_to = dump_to;
        field.load_from = load_from;
        field.absent = self.absent;
        Ok(field)
    }
}

/// A named zero-argument field factory.
///
/// Declaring a schema attribute with a field type instead of a field instance
/// instantiates it with no configuration. When the type's name equals the
/// attribute name the declaration is ignored (see
/// [`SchemaBuilder::field`](crate::SchemaBuilder::field)).
#[derive(Clone)]
pub struct FieldType {
    name: Cow<'static, str>,
    make: Arc<dyn Fn() -> Field + Send + Sync>,
}

impl FieldType {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        make: impl Fn() -> Field + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            make: Arc::new(make),
        }
    }

    /// The plain field type, named `Field`.
    pub fn plain() -> Self {
        Self::new("Field", Field::new)
    }

    /// A field type running `H::default()` hooks, named after `H`.
    pub fn of<H: FieldHooks + Default + 'static>() -> Self {
        Self::new(short_type_name::<H>(), || {
            let mut field = Field::new();
            field.hooks = Arc::new(H::default());
            field
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self) -> Field {
        (self.make)()
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldType").field(&self.name).finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Identity;

    #[test]
    fn test_outer_name_sets_both_directions() {
        let field = Field::builder().outer_name("id").build().unwrap();
        assert_eq!(field.dump_to(), Some("id"));
        assert_eq!(field.load_from(), Some("id"));
    }

    #[test]
    fn test_outer_name_conflicts_with_dump_to() {
        let result = Field::builder().outer_name("id").dump_to("key").build();
        assert!(matches!(result, Err(SchemaError::ConflictingNames { .. })));
    }

    #[test]
    fn test_outer_name_conflicts_with_load_from() {
        let result = Field::builder().load_from("key").outer_name("id").build();
        assert!(matches!(result, Err(SchemaError::ConflictingNames { .. })));
    }

    #[test]
    fn test_required_conflicts_with_default() {
        let result = Field::builder().required().default(1).build();
        assert!(matches!(result, Err(SchemaError::RequiredWithDefault)));
    }

    #[test]
    fn test_list_delegates_are_exclusive() {
        let schema = Schema::builder("Named").field("name", Field::new()).build();
        let result = Field::list().schema(schema).item(Field::new()).build();
        assert!(matches!(result, Err(SchemaError::ConflictingListDelegates)));
    }

    #[test]
    fn test_item_on_plain_builder_makes_a_list() {
        let field = Field::builder().item(Field::new()).build().unwrap();
        assert!(format!("{field:?}").contains("list of field"));
    }

    #[test]
    fn test_constant_takes_names() {
        let field = Field::constant("user").dump_to("type").build().unwrap();
        assert_eq!(field.dump_to(), Some("type"));
    }

    #[test]
    fn test_constant_rejects_input_settings() {
        let defaulted = Field::constant(1).default(2).build();
        assert!(matches!(defaulted, Err(SchemaError::ConstantWithInputSettings)));
        let required = Field::constant(1).required().build();
        assert!(matches!(required, Err(SchemaError::ConstantWithInputSettings)));
        let absent = Field::constant(1).absent_on(1).build();
        assert!(matches!(absent, Err(SchemaError::ConstantWithInputSettings)));
        let hooked = Field::constant(1).hooks(Identity).build();
        assert!(matches!(hooked, Err(SchemaError::ConstantWithInputSettings)));
    }

    #[test]
    fn test_item_accepts_field_type() {
        let field = Field::list().item(FieldType::plain()).build().unwrap();
        assert!(format!("{field:?}").contains("list of field"));
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::plain().name(), "Field");
        assert_eq!(FieldType::of::<Identity>().name(), "Identity");
    }
}
