use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::{Context, Error};

/// Post-processing applied by a plain field once a value has been extracted
/// and found present.
///
/// Both directions default to the identity. Hooks are the only place where a
/// conversion may suspend, so they return boxed futures; a hook that does no
/// asynchronous work can answer with `future::ready(..).boxed()`.
///
/// Hooks must not mutate the context or the source mapping. Sibling fields run
/// concurrently against the same data.
///
/// ## Example
///
/// ```
/// use futures::future::{self, BoxFuture, FutureExt};
/// use iko::{Context, Error, FieldHooks};
/// use serde_json::Value;
///
/// struct Upper;
///
/// impl FieldHooks for Upper {
///     fn post_dump<'a>(&'a self, value: Value, _: &'a Context) -> BoxFuture<'a, Result<Value, Error>> {
///         let upper = value.as_str().map(|s| Value::from(s.to_uppercase())).unwrap_or(value);
///         future::ready(Ok(upper)).boxed()
///     }
/// }
/// ```
pub trait FieldHooks: Send + Sync {
    /// Transforms a present value in the dump direction.
    fn post_dump<'a>(
        &'a self,
        value: Value,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Value, Error>> {
        let _ = context;
        future::ready(Ok(value)).boxed()
    }

    /// Transforms a present value in the load direction.
    fn post_load<'a>(
        &'a self,
        value: Value,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<Value, Error>> {
        let _ = context;
        future::ready(Ok(value)).boxed()
    }

    /// Extends the field's absence set. A value for which this returns `true`
    /// is dropped from the result before any post-processing runs.
    fn is_absent(&self, value: &Value) -> bool {
        let _ = value;
        false
    }
}

/// Hooks of a field with no custom post-processing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl FieldHooks for Identity {}
