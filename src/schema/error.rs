use thiserror::Error;

/// Misconfiguration detected while building a field or a schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("outer_name '{outer_name}' cannot be combined with dump_to or load_from")]
    ConflictingNames { outer_name: String },

    #[error("a required field cannot have a default")]
    RequiredWithDefault,

    #[error("a list field takes an item schema or an item field, not both")]
    ConflictingListDelegates,

    #[error("a constant field ignores its input and takes no hooks, default, required flag or absence set")]
    ConstantWithInputSettings,
}
