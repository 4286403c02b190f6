use std::collections::HashSet;

use serde::Deserialize;

/// What happens to source keys that no field models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unknown {
    /// Unmodeled keys are dropped.
    #[default]
    Exclude,
    /// Unmodeled keys are copied into the result untouched.
    Include,
}

/// Static options of a schema, usually read from a `meta` table.
///
/// ```toml
/// unknown = "include"
/// exclude = ["password"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaOptions {
    pub unknown: Unknown,
    /// Field names removed from every call's active field set.
    pub exclude: Vec<String>,
}

/// Per-call restriction of a schema's field set.
///
/// The active fields are the declared ones that are in `only` (all of them
/// when unset) and in neither `exclude` nor the schema's static exclusions.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    only: Option<HashSet<String>>,
    exclude: HashSet<String>,
}

impl Selection {
    /// Selects every declared field.
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub(crate) fn admits(&self, attr: &str, options: &SchemaOptions) -> bool {
        self.only.as_ref().map_or(true, |only| only.contains(attr)) && !self.excludes(attr, options)
    }

    pub(crate) fn excludes(&self, attr: &str, options: &SchemaOptions) -> bool {
        self.exclude.contains(attr) || options.exclude.iter().any(|name| name == attr)
    }
}
