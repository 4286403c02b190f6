//! Per-call context threaded through every field conversion.

use serde_json::{Map, Value};

/// Call-scoped parameters shared by every hook of one `dump`/`load` call.
///
/// The context is handed to hooks by shared reference, so all fields of a
/// call observe the exact same values, through any depth of nesting. Use it
/// to pass things like an encoding offset or the current user without
/// global state.
///
/// ## Example
///
/// ```
/// use iko::Context;
///
/// let ctx = Context::new().with("private_offset", 1);
/// assert_eq!(ctx.get("private_offset"), Some(&1.into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
