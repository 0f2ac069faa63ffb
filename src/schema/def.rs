//! Schema definition files: a JSON description of a [`Schema`], so the CLI
//! can decode against schemas that were never compiled into the binary.
//!
//! ```json
//! { "type": "object", "name": "Person", "fields": [
//!     { "name": "name", "schema": { "type": "string" } },
//!     { "name": "job", "schema": { "type": "string" }, "default": "Developer" },
//!     { "name": "hobbies", "schema": { "type": "list", "item": { "type": "string" } }, "default": [] }
//! ] }
//! ```
use serde::Deserialize;
use serde_json::Value;

use super::{Field, ObjectSchema, Schema, UnionSchema, Variant};
use crate::error::SchemaError;
use crate::key::FormPath;
use crate::path_de;
use crate::tree::Node;
use crate::validate;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaDef {
    String,
    #[serde(rename = "uint", alias = "integer")]
    UInt,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "date-time")]
    Timestamp,
    Object(ObjectDef),
    List { item: Box<SchemaDef> },
    Optional { inner: Box<SchemaDef> },
    Union(UnionDef),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    pub schema: SchemaDef,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnionDef {
    #[serde(default = "default_tag_field")]
    pub tag_field: String,
    pub variants: Vec<VariantDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantDef {
    /// Defaults to the object's name.
    #[serde(default)]
    pub tag: Option<String>,
    pub object: ObjectDef,
}

fn default_tag_field() -> String { "_type".to_string() }

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

pub fn from_str(src: &str) -> Result<Schema, SchemaError> {
    let def: SchemaDef = path_de::from_str_with_path(src).map_err(|e| SchemaError::Definition {
        path: e.json_path,
        message: e.message,
    })?;
    def.compile()
}

impl SchemaDef {
    pub fn compile(&self) -> Result<Schema, SchemaError> {
        Ok(match self {
            SchemaDef::String => Schema::String,
            SchemaDef::UInt => Schema::UInt,
            SchemaDef::Bool => Schema::Bool,
            SchemaDef::Timestamp => Schema::Timestamp,
            SchemaDef::Object(o) => Schema::Object(o.compile()?),
            SchemaDef::List { item } => Schema::list(item.compile()?),
            SchemaDef::Optional { inner } => Schema::optional(inner.compile()?),
            SchemaDef::Union(u) => Schema::Union(u.compile()?),
        })
    }
}

impl ObjectDef {
    fn compile(&self) -> Result<ObjectSchema, SchemaError> {
        let mut out = ObjectSchema::new(self.name.as_str());
        if let Some(d) = &self.description {
            out = out.describe(d.as_str());
        }
        for f in &self.fields {
            out.fields.push(f.compile()?);
        }
        Ok(out)
    }
}

impl FieldDef {
    /// Defaults go through the same validator as submitted forms, so a file
    /// cannot declare a default the decoder would itself reject.
    fn compile(&self) -> Result<Field, SchemaError> {
        let schema = self.schema.compile()?;
        let default = match &self.default {
            None => None,
            Some(doc) => {
                let node = Node::from_json(doc);
                let value = validate::validate(&node, &schema, &FormPath::root(self.name.as_str()))
                    .map_err(|report| SchemaError::InvalidDefault { field: self.name.clone(), report })?;
                Some(value)
            }
        };
        Ok(Field { name: self.name.clone(), schema, default })
    }
}

impl UnionDef {
    fn compile(&self) -> Result<UnionSchema, SchemaError> {
        let variants = self
            .variants
            .iter()
            .map(|v| {
                let object = v.object.compile()?;
                Ok(match &v.tag {
                    Some(tag) => Variant::tagged(tag.as_str(), object),
                    None => Variant::of(object),
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        UnionSchema::new(self.tag_field.as_str(), variants)
    }
}
