//! Fields: the atomic conversion units of a schema.

mod builder;
mod hooks;
mod slot;

use std::fmt;
use std::sync::Arc;

use futures::future::{self, try_join_all, BoxFuture, FutureExt};
use serde_json::Value;
use tracing::trace;

use crate::schema::{Direction, Schema};
use crate::{Context, Data, Error};

pub use builder::{FieldBuilder, FieldType};
pub use hooks::{FieldHooks, Identity};
pub use slot::{FieldDefault, Slot, ABSENT};

/// Converts one named value between its internal and external form.
///
/// A field is built once and reused across any number of calls. It holds no
/// per-call state: the source mapping and the context are parameters.
///
/// Besides plain fields there are three specializations:
/// - [`Field::constant`] ignores its input and always yields a fixed value,
/// - [`Field::nested`] runs the extracted mapping through a sub-schema,
/// - [`Field::list`] maps a sequence element by element through an item
///   schema or an item field.
///
/// ## Example
///
/// ```
/// use iko::{Context, Field, Slot};
/// use serde_json::json;
///
/// let field = Field::builder().default(42).build()?;
/// let data = serde_json::Map::new();
/// let slot = futures::executor::block_on(field.dump(&data, "answer", &Context::new()))?;
/// assert_eq!(slot, Slot::Present(json!(42)));
/// # Ok::<(), iko::Error>(())
/// ```
#[derive(Clone)]
pub struct Field {
    kind: Kind,
    hooks: Arc<dyn FieldHooks>,
    default: FieldDefault,
    required: bool,
    dump_to: Option<String>,
    load_from: Option<String>,
    absent: Vec<Value>,
}

#[derive(Clone)]
enum Kind {
    Plain,
    Const(Value),
    Nested(Arc<Schema>),
    List(Option<Item>),
}

/// Per-element transform of a list field.
#[derive(Clone)]
enum Item {
    Schema(Arc<Schema>),
    Field(Box<Field>),
}

impl Field {
    /// A plain field with identity hooks and no default.
    pub fn new() -> Self {
        Self {
            kind: Kind::Plain,
            hooks: Arc::new(Identity),
            default: FieldDefault::Absent,
            required: false,
            dump_to: None,
            load_from: None,
            absent: Vec::new(),
        }
    }

    /// Starts configuring a plain field.
    pub fn builder() -> FieldBuilder {
        FieldBuilder::new()
    }

    /// Starts configuring a plain field with custom post-processing.
    pub fn with_hooks(hooks: impl FieldHooks + 'static) -> FieldBuilder {
        FieldBuilder::new().hooks(hooks)
    }

    /// Starts configuring a field that always yields `value`, whatever the
    /// input holds. Only its external names can be configured.
    pub fn constant(value: impl Into<Value>) -> FieldBuilder {
        FieldBuilder::constant(value.into())
    }

    /// Starts configuring a field whose value is converted by `schema`.
    pub fn nested(schema: impl Into<Arc<Schema>>) -> FieldBuilder {
        FieldBuilder::nested(schema.into())
    }

    /// Starts configuring a sequence field. Without an item schema or item
    /// field, elements pass through unchanged.
    pub fn list() -> FieldBuilder {
        FieldBuilder::list()
    }

    /// External key used when dumping, if it differs from the attribute name.
    pub fn dump_to(&self) -> Option<&str> {
        self.dump_to.as_deref()
    }

    /// External key read when loading, if it differs from the attribute name.
    pub fn load_from(&self) -> Option<&str> {
        self.load_from.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn dump_key<'a>(&'a self, attr: &'a str) -> &'a str {
        self.dump_to.as_deref().unwrap_or(attr)
    }

    pub(crate) fn load_key<'a>(&'a self, attr: &'a str) -> &'a str {
        self.load_from.as_deref().unwrap_or(attr)
    }

    /// Extracts `attr` from internal `data` and converts it to its external form.
    pub fn dump<'a>(
        &'a self,
        data: &'a Data,
        attr: &'a str,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Slot, Error>> {
        self.convert(Direction::Dump, data, attr, context)
    }

    /// Extracts the external key `attr` from `data` and converts it to its
    /// internal form. The caller resolves `load_from` before calling.
    pub fn load<'a>(
        &'a self,
        data: &'a Data,
        attr: &'a str,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Slot, Error>> {
        self.convert(Direction::Load, data, attr, context)
    }

    /// Dump post-processing of an already extracted, present value.
    pub fn post_dump<'a>(
        &'a self,
        value: Value,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Value, Error>> {
        self.post(Direction::Dump, value, context)
    }

    /// Load post-processing of an already extracted, present value.
    pub fn post_load<'a>(
        &'a self,
        value: Value,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Value, Error>> {
        self.post(Direction::Load, value, context)
    }

    /// Whether `value` belongs to this field's absence set.
    pub fn is_absent(&self, value: &Value) -> bool {
        self.absent.contains(value) || self.hooks.is_absent(value)
    }

    fn extract(&self, data: &Data, attr: &str) -> Result<Slot, Error> {
        match data.get(attr) {
            Some(value) => Ok(Slot::Present(value.clone())),
            None if self.required => Err(Error::MissingKey {
                key: attr.to_string(),
            }),
            None => Ok(self.default.resolve()),
        }
    }

    fn convert<'a>(
        &'a self,
        direction: Direction,
        data: &'a Data,
        attr: &'a str,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Slot, Error>> {
        Box::pin(async move {
            if let Kind::Const(value) = &self.kind {
                return Ok(Slot::Present(value.clone()));
            }

            let value = match self.extract(data, attr)? {
                Slot::Present(value) if !self.is_absent(&value) => value,
                _ => {
                    trace!(attr, ?direction, "field absent, omitted");
                    return Ok(Slot::Absent);
                }
            };

            self.post(direction, value, context).await.map(Slot::Present)
        })
    }

    fn post<'a>(
        &'a self,
        direction: Direction,
        value: Value,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Value, Error>> {
        match &self.kind {
            Kind::Plain => match direction {
                Direction::Dump => self.hooks.post_dump(value, context),
                Direction::Load => self.hooks.post_load(value, context),
            },
            Kind::Const(_) => future::ready(Ok(value)).boxed(),
            Kind::Nested(schema) => Box::pin(through_schema(schema, direction, value, context)),
            Kind::List(item) => Box::pin(async move {
                let items = match value {
                    Value::Array(items) => items,
                    other => return Err(Error::mismatch("sequence", &other)),
                };
                let converted = try_join_all(
                    items
                        .into_iter()
                        .map(|element| convert_item(item.as_ref(), direction, element, context)),
                )
                .await?;
                Ok(Value::Array(converted))
            }),
        }
    }
}

async fn convert_item(
    item: Option<&Item>,
    direction: Direction,
    value: Value,
    context: &Context,
) -> Result<Value, Error> {
    match item {
        None => Ok(value),
        Some(Item::Field(field)) => field.post(direction, value, context).await,
        Some(Item::Schema(schema)) => through_schema(schema, direction, value, context).await,
    }
}

async fn through_schema(
    schema: &Schema,
    direction: Direction,
    value: Value,
    context: &Context,
) -> Result<Value, Error> {
    let data = match value {
        Value::Object(data) => data,
        other => return Err(Error::mismatch("mapping", &other)),
    };
    let converted = match direction {
        Direction::Dump => schema.dump(&data, context).await?,
        Direction::Load => schema.load(&data, context).await?,
    };
    Ok(Value::Object(converted))
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Plain => "plain".to_string(),
            Kind::Const(value) => format!("const {value}"),
            Kind::Nested(schema) => format!("nested {}", schema.name()),
            Kind::List(None) => "list".to_string(),
            Kind::List(Some(Item::Schema(schema))) => format!("list of {}", schema.name()),
            Kind::List(Some(Item::Field(_))) => "list of field".to_string(),
        };
        f.debug_struct("Field")
            .field("kind", &kind)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("dump_to", &self.dump_to)
            .field("load_from", &self.load_from)
            .field("absent", &self.absent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    fn data(value: Value) -> Data {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn dump(field: &Field, input: Value, attr: &str) -> Result<Slot, Error> {
        block_on(field.dump(&data(input), attr, &Context::new()))
    }

    fn load(field: &Field, input: Value, attr: &str) -> Result<Slot, Error> {
        block_on(field.load(&data(input), attr, &Context::new()))
    }

    #[test]
    fn test_missing_key_without_default_is_absent() {
        let field = Field::new();
        assert_eq!(dump(&field, json!({}), "name").unwrap(), ABSENT);
        assert_eq!(load(&field, json!({}), "name").unwrap(), ABSENT);
    }

    #[test]
    fn test_null_is_present_by_default() {
        let field = Field::new();
        assert_eq!(
            dump(&field, json!({ "name": null }), "name").unwrap(),
            Slot::Present(Value::Null)
        );
    }

    #[test]
    fn test_absent_on_drops_value() {
        let field = Field::builder().absent_on(Value::Null).build().unwrap();
        assert_eq!(dump(&field, json!({ "name": null }), "name").unwrap(), ABSENT);
        assert_eq!(
            dump(&field, json!({ "name": 43 }), "name").unwrap(),
            Slot::Present(json!(43))
        );
    }

    #[test]
    fn test_default_matching_absence_set_is_absent() {
        let field = Field::builder()
            .default("")
            .absent_on("")
            .build()
            .unwrap();
        assert_eq!(dump(&field, json!({}), "note").unwrap(), ABSENT);
    }

    #[test]
    fn test_producer_default_runs_per_access() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let field = Field::builder()
            .default_with(move || json!(counter.fetch_add(1, Ordering::SeqCst)))
            .build()
            .unwrap();

        assert_eq!(dump(&field, json!({}), "n").unwrap(), Slot::Present(json!(0)));
        assert_eq!(dump(&field, json!({}), "n").unwrap(), Slot::Present(json!(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_required_missing_key_fails() {
        let field = Field::builder().required().build().unwrap();
        let err = dump(&field, json!({}), "id").unwrap_err();
        assert!(matches!(err, Error::MissingKey { key } if key == "id"));
    }

    #[test]
    fn test_constant_ignores_input() {
        let field = Field::constant(42).build().unwrap();
        assert_eq!(
            dump(&field, json!({ "field": 43 }), "field").unwrap(),
            Slot::Present(json!(42))
        );
        assert_eq!(load(&field, json!({}), "field").unwrap(), Slot::Present(json!(42)));
    }

    #[test]
    fn test_list_passes_items_through() {
        let field = Field::list().build().unwrap();
        assert_eq!(
            dump(&field, json!({ "tags": ["a", "b"] }), "tags").unwrap(),
            Slot::Present(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_list_rejects_non_sequence() {
        let field = Field::list().build().unwrap();
        let err = dump(&field, json!({ "tags": "a" }), "tags").unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "sequence",
                found: "string"
            }
        ));
    }

    #[test]
    fn test_hooks_absence_predicate() {
        struct SkipZero;

        impl FieldHooks for SkipZero {
            fn is_absent(&self, value: &Value) -> bool {
                value == &json!(0)
            }
        }

        let field = Field::with_hooks(SkipZero).build().unwrap();
        assert_eq!(dump(&field, json!({ "n": 0 }), "n").unwrap(), ABSENT);
        assert_eq!(dump(&field, json!({ "n": 1 }), "n").unwrap(), Slot::Present(json!(1)));
    }
}
