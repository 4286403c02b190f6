//! Serde model of definition documents.

use serde::Deserialize;
use serde_json::Value;

use crate::Unknown;

/// Root of a merged definition document. Schemas stay raw tables so that
/// each one can be parsed, with its own error, when it is first referenced.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct Document {
    pub schema: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct SchemaDef {
    pub extends: Vec<String>,
    pub meta: Option<MetaDef>,
    pub hooks: Option<String>,
    /// Raw table so the document order of fields is the declaration order.
    pub fields: toml::Table,
}

/// Options set by a `meta` table. A key left out keeps the inherited value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct MetaDef {
    pub unknown: Option<Unknown>,
    pub exclude: Option<Vec<String>>,
}

/// A field is either a bare field type name or a table of settings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum FieldDecl {
    Type(String),
    Def(Box<FieldDef>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FieldDef {
    pub hooks: Option<String>,
    pub required: bool,
    pub default: Option<Value>,
    pub dump_to: Option<String>,
    pub load_from: Option<String>,
    pub outer_name: Option<String>,
    pub absent: Vec<Value>,
    #[serde(rename = "const")]
    pub constant: Option<Value>,
    pub nested: Option<String>,
    pub list: Option<String>,
    pub list_field: Option<Box<FieldDecl>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_decl_forms() {
        let table: toml::Table = toml::from_str(
            r#"
            plain = "Field"
            renamed = { outer_name = "id", absent = [""] }
            "#,
        )
        .unwrap();

        let plain: FieldDecl = table["plain"].clone().try_into().unwrap();
        assert!(matches!(plain, FieldDecl::Type(name) if name == "Field"));

        let renamed: FieldDecl = table["renamed"].clone().try_into().unwrap();
        let FieldDecl::Def(def) = renamed else {
            panic!("expected a field table")
        };
        assert_eq!(def.outer_name.as_deref(), Some("id"));
        assert_eq!(def.absent, vec![json!("")]);
    }

    #[test]
    fn test_schema_def_keeps_field_order() {
        let def: SchemaDef = toml::from_str(
            r#"
            extends = ["Base"]
            [fields]
            zeta = {}
            alpha = {}
            "#,
        )
        .unwrap();
        let names: Vec<_> = def.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(def.extends, ["Base"]);
    }

    #[test]
    fn test_default_values_become_json() {
        let def: FieldDef = toml::from_str("default = { tags = [1, 2] }").unwrap();
        assert_eq!(def.default, Some(json!({ "tags": [1, 2] })));
    }
}
