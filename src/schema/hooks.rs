use futures::future::{self, BoxFuture, FutureExt};

use crate::{Context, Data, Error};

/// Whole-mapping hooks run around a schema's field conversions.
///
/// `pre_*` receives the source mapping before any field runs; `post_*`
/// receives the assembled result. All four default to the identity.
pub trait SchemaHooks: Send + Sync {
    fn pre_dump<'a>(&'a self, data: Data, context: &'a Context) -> BoxFuture<'a, Result<Data, Error>> {
        let _ = context;
        future::ready(Ok(data)).boxed()
    }

    fn post_dump<'a>(&'a self, data: Data, context: &'a Context) -> BoxFuture<'a, Result<Data, Error>> {
        let _ = context;
        future::ready(Ok(data)).boxed()
    }

    fn pre_load<'a>(&'a self, data: Data, context: &'a Context) -> BoxFuture<'a, Result<Data, Error>> {
        let _ = context;
        future::ready(Ok(data)).boxed()
    }

    fn post_load<'a>(&'a self, data: Data, context: &'a Context) -> BoxFuture<'a, Result<Data, Error>> {
        let _ = context;
        future::ready(Ok(data)).boxed()
    }
}
