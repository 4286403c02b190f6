use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Outcome of a single field conversion.
///
/// `Absent` is distinct from every data value, `null` included. A field that
/// yields it is omitted from the result mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Absent,
    Present(Value),
}

/// The omission marker.
pub const ABSENT: Slot = Slot::Absent;

impl Slot {
    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Slot::Absent => None,
            Slot::Present(value) => Some(value),
        }
    }
}

impl From<Option<Value>> for Slot {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Slot::Absent, Slot::Present)
    }
}

/// What a field yields when its key is missing from the source mapping.
#[derive(Clone, Default)]
pub enum FieldDefault {
    /// The field is omitted.
    #[default]
    Absent,
    Value(Value),
    /// Invoked on every access, so each call gets a fresh value.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    pub fn producer(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        FieldDefault::Producer(Arc::new(f))
    }

    pub(crate) fn is_set(&self) -> bool {
        !matches!(self, FieldDefault::Absent)
    }

    pub(crate) fn resolve(&self) -> Slot {
        match self {
            FieldDefault::Absent => Slot::Absent,
            FieldDefault::Value(value) => Slot::Present(value.clone()),
            FieldDefault::Producer(produce) => Slot::Present(produce()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Absent => f.write_str("Absent"),
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}
