//! Dump and load orchestration.
//!
//! Every active field of a call converts concurrently against the same
//! source mapping and context; the join completes when all fields have, or
//! as soon as one fails. Batches fan out the same way, one level up.

use std::borrow::Cow;

use futures::future::try_join_all;
use tracing::trace;

use super::{Direction, Schema, Selection, Unknown};
use crate::{Context, Data, Error, Slot};

impl Schema {
    /// Converts internal `data` to its external form.
    pub async fn dump(&self, data: &Data, context: &Context) -> Result<Data, Error> {
        self.convert(Direction::Dump, data, context, &Selection::all()).await
    }

    /// Like [`dump`](Self::dump), restricted to the fields of `selection`.
    pub async fn dump_with(
        &self,
        data: &Data,
        context: &Context,
        selection: &Selection,
    ) -> Result<Data, Error> {
        self.convert(Direction::Dump, data, context, selection).await
    }

    /// Converts external `data` to its internal form.
    pub async fn load(&self, data: &Data, context: &Context) -> Result<Data, Error> {
        self.convert(Direction::Load, data, context, &Selection::all()).await
    }

    /// Like [`load`](Self::load), restricted to the fields of `selection`.
    pub async fn load_with(
        &self,
        data: &Data,
        context: &Context,
        selection: &Selection,
    ) -> Result<Data, Error> {
        self.convert(Direction::Load, data, context, selection).await
    }

    /// Dumps every item concurrently; results keep the input order.
    pub async fn dump_many(&self, items: &[Data], context: &Context) -> Result<Vec<Data>, Error> {
        self.convert_many(Direction::Dump, items, context, &Selection::all())
            .await
    }

    pub async fn dump_many_with(
        &self,
        items: &[Data],
        context: &Context,
        selection: &Selection,
    ) -> Result<Vec<Data>, Error> {
        self.convert_many(Direction::Dump, items, context, selection)
            .await
    }

    /// Loads every item concurrently; results keep the input order.
    pub async fn load_many(&self, items: &[Data], context: &Context) -> Result<Vec<Data>, Error> {
        self.convert_many(Direction::Load, items, context, &Selection::all())
            .await
    }

    pub async fn load_many_with(
        &self,
        items: &[Data],
        context: &Context,
        selection: &Selection,
    ) -> Result<Vec<Data>, Error> {
        self.convert_many(Direction::Load, items, context, selection)
            .await
    }

    async fn convert_many(
        &self,
        direction: Direction,
        items: &[Data],
        context: &Context,
        selection: &Selection,
    ) -> Result<Vec<Data>, Error> {
        try_join_all(
            items
                .iter()
                .map(|data| self.convert(direction, data, context, selection)),
        )
        .await
    }

    async fn convert(
        &self,
        direction: Direction,
        data: &Data,
        context: &Context,
        selection: &Selection,
    ) -> Result<Data, Error> {
        let prepared = match (&self.hooks, direction) {
            (Some(hooks), Direction::Dump) => Cow::Owned(hooks.pre_dump(data.clone(), context).await?),
            (Some(hooks), Direction::Load) => Cow::Owned(hooks.pre_load(data.clone(), context).await?),
            (None, _) => Cow::Borrowed(data),
        };
        let source: &Data = &prepared;

        let active = self
            .fields
            .iter()
            .filter(|(attr, _)| selection.admits(attr, &self.options));
        let conversions = active.map(|(attr, field)| async move {
            let slot = match direction {
                Direction::Dump => field.dump(source, attr, context).await?,
                Direction::Load => field.load(source, field.load_key(attr), context).await?,
            };
            let key = match direction {
                Direction::Dump => field.dump_key(attr),
                Direction::Load => attr.as_str(),
            };
            Ok::<_, Error>((key, slot))
        });
        let converted = try_join_all(conversions).await?;
        trace!(schema = %self.name, ?direction, fields = converted.len(), "fields converted");

        let mut result = Data::new();
        for (key, slot) in converted {
            if let Slot::Present(value) = slot {
                result.insert(key.to_string(), value);
            }
        }

        if self.options.unknown == Unknown::Include {
            self.pass_through(direction, data, selection, &mut result);
        }

        match (&self.hooks, direction) {
            (Some(hooks), Direction::Dump) => hooks.post_dump(result, context).await,
            (Some(hooks), Direction::Load) => hooks.post_load(result, context).await,
            (None, _) => Ok(result),
        }
    }

    /// Copies the keys of `data` no field models into `result`, untouched.
    /// Keys a field already produced are left alone.
    fn pass_through(&self, direction: Direction, data: &Data, selection: &Selection, result: &mut Data) {
        for (key, value) in data {
            let modeled = self.fields.iter().any(|(attr, field)| match direction {
                Direction::Dump => attr == key,
                Direction::Load => field.load_key(attr) == key.as_str(),
            });
            if modeled || selection.excludes(key, &self.options) || result.contains_key(key) {
                continue;
            }
            result.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::executor::block_on;
    use futures::future::{self, BoxFuture, FutureExt};
    use serde_json::{json, Value};

    use crate::{Field, FieldHooks, SchemaHooks};

    use super::*;

    fn data(value: Value) -> Data {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn user() -> Schema {
        Schema::builder("User")
            .field("_id", Field::builder().outer_name("id").build().unwrap())
            .field("name", Field::new())
            .field("password", Field::new())
            .build()
    }

    #[test]
    fn test_only_restricts_active_fields() {
        let selection = Selection::all().only(["name"]);
        let dumped = block_on(user().dump_with(
            &data(json!({ "_id": 1, "name": "Eve", "password": "x" })),
            &Context::new(),
            &selection,
        ))
        .unwrap();
        assert_eq!(dumped, data(json!({ "name": "Eve" })));
    }

    #[test]
    fn test_exclude_unions_with_static_exclusions() {
        let schema = Schema::builder("Public").extend(&user()).exclude(["password"]).build();
        let loaded = block_on(schema.load_with(
            &data(json!({ "id": 1, "name": "Eve", "password": "x" })),
            &Context::new(),
            &Selection::all().exclude(["name"]),
        ))
        .unwrap();
        assert_eq!(loaded, data(json!({ "_id": 1 })));
    }

    #[test]
    fn test_unknown_include_dump() {
        let schema = Schema::builder("Open")
            .extend(&user())
            .unknown(Unknown::Include)
            .exclude(["password"])
            .build();
        let dumped = block_on(schema.dump(
            &data(json!({ "_id": 1, "extra": [1, 2], "password": "x" })),
            &Context::new(),
        ))
        .unwrap();
        assert_eq!(dumped, data(json!({ "id": 1, "extra": [1, 2] })));
    }

    #[test]
    fn test_unknown_include_load_compares_external_names() {
        let schema = Schema::builder("Open")
            .extend(&user())
            .unknown(Unknown::Include)
            .build();
        let loaded = block_on(schema.load(
            &data(json!({ "id": 1, "_id": 2, "extra": true })),
            &Context::new(),
        ))
        .unwrap();
        assert_eq!(loaded, data(json!({ "_id": 1, "extra": true })));
    }

    #[test]
    fn test_unknown_exclude_drops_keys() {
        let dumped = block_on(user().dump(&data(json!({ "extra": 1 })), &Context::new())).unwrap();
        assert!(dumped.is_empty());
    }

    #[test]
    fn test_result_keys_follow_declaration_order() {
        let dumped = block_on(user().dump(
            &data(json!({ "password": "x", "name": "Eve", "_id": 1 })),
            &Context::new(),
        ))
        .unwrap();
        let keys: Vec<_> = dumped.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "name", "password"]);
    }

    struct Stamp;

    impl SchemaHooks for Stamp {
        fn pre_dump<'a>(&'a self, mut data: Data, _: &'a Context) -> BoxFuture<'a, Result<Data, Error>> {
            data.entry("name").or_insert_with(|| json!("anonymous"));
            future::ready(Ok(data)).boxed()
        }

        fn post_dump<'a>(&'a self, mut data: Data, context: &'a Context) -> BoxFuture<'a, Result<Data, Error>> {
            if let Some(version) = context.get("version") {
                data.insert("version".into(), version.clone());
            }
            future::ready(Ok(data)).boxed()
        }
    }

    #[test]
    fn test_schema_hooks_wrap_field_conversions() {
        let schema = Schema::builder("Stamped").extend(&user()).hooks(Stamp).build();
        let ctx = Context::new().with("version", 2);
        let dumped = block_on(schema.dump(&data(json!({ "_id": 1 })), &ctx)).unwrap();
        assert_eq!(dumped, data(json!({ "id": 1, "name": "anonymous", "version": 2 })));

        let loaded = block_on(schema.load(&data(json!({ "id": 1 })), &ctx)).unwrap();
        assert_eq!(loaded, data(json!({ "_id": 1 })));
    }

    struct Failing(Arc<AtomicUsize>);

    impl FieldHooks for Failing {
        fn post_dump<'a>(&'a self, _: Value, _: &'a Context) -> BoxFuture<'a, Result<Value, Error>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            future::ready(Err(Error::hook("refused"))).boxed()
        }
    }

    #[test]
    fn test_failing_field_aborts_the_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let schema = Schema::builder("Broken")
            .field("ok", Field::new())
            .field("bad", Field::with_hooks(Failing(Arc::clone(&calls))).build().unwrap())
            .build();

        let result = block_on(schema.dump(&data(json!({ "ok": 1, "bad": 2 })), &Context::new()));
        assert!(matches!(result, Err(Error::Hook(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let items = [data(json!({ "ok": 1 })), data(json!({ "bad": 2 }))];
        let result = block_on(schema.dump_many(&items, &Context::new()));
        assert!(matches!(result, Err(Error::Hook(_))));
    }

    #[test]
    fn test_many_keeps_input_order() {
        let items = [
            data(json!({ "_id": 1 })),
            data(json!({ "_id": 2, "name": "Bob" })),
            data(json!({})),
        ];
        let dumped = block_on(user().dump_many(&items, &Context::new())).unwrap();
        assert_eq!(
            dumped,
            [
                data(json!({ "id": 1 })),
                data(json!({ "id": 2, "name": "Bob" })),
                Data::new(),
            ]
        );
    }
}
