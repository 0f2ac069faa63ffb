//! Typed schemas the decoded tree is validated against.
//!
//! Unions are closed: every accepted variant is listed when the schema is
//! built, so the set of tags a form may select is part of the schema value
//! itself rather than something discovered at decode time.
pub mod def;
pub mod export;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::typed::Typed;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String,
    /// Integer ≥ 0.
    UInt,
    Bool,
    Timestamp,
    Object(ObjectSchema),
    List(Box<Schema>),
    /// Nullable; absent means `null` unless the field declares a default.
    Optional(Box<Schema>),
    Union(UnionSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub default: Option<Typed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    tag_field: String,
    variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub tag: String,
    pub object: ObjectSchema,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    pub fn list(item: Schema) -> Self { Schema::List(Box::new(item)) }

    pub fn optional(inner: Schema) -> Self { Schema::Optional(Box::new(inner)) }

    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::String => "string",
            Schema::UInt => "non-negative integer",
            Schema::Bool => "boolean",
            Schema::Timestamp => "timestamp",
            Schema::Object(_) => "object",
            Schema::List(_) => "list",
            Schema::Optional(inner) => inner.type_name(),
            Schema::Union(_) => "union",
        }
    }

    /// What a form that submits no key at all for this schema stands for.
    /// An empty list, a `null` or an object holding only such fields has no
    /// flat spelling, so absence is the only way to send one.
    pub fn empty_value(&self) -> Option<Typed> {
        match self {
            Schema::List(_) => Some(Typed::List(Vec::new())),
            Schema::Optional(_) => Some(Typed::Null),
            Schema::Object(object) => object
                .fields
                .iter()
                .map(|f| f.absent_value().map(|v| (f.name.clone(), v)))
                .collect::<Option<IndexMap<_, _>>>()
                .map(Typed::Object),
            _ => None,
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(o: ObjectSchema) -> Self { Schema::Object(o) }
}

impl From<UnionSchema> for Schema {
    fn from(u: UnionSchema) -> Self { Schema::Union(u) }
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, fields: Vec::new() }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Required unless `schema` is optional.
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.push(Field { name: name.into(), schema, default: None });
        self
    }

    pub fn field_default(mut self, name: impl Into<String>, schema: Schema, default: impl Into<Typed>) -> Self {
        self.fields.push(Field { name: name.into(), schema, default: Some(default.into()) });
        self
    }

    pub fn optional(self, name: impl Into<String>, inner: Schema) -> Self {
        self.field(name, Schema::optional(inner))
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn description(&self) -> Option<&str> { self.description.as_deref() }

    pub fn fields(&self) -> &[Field] { &self.fields }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Field {
    /// What an absent field decodes to, if it may be absent at all.
    pub fn absent_value(&self) -> Option<Typed> {
        self.default.clone().or_else(|| self.schema.empty_value())
    }

    pub fn is_required(&self) -> bool { self.absent_value().is_none() }
}

impl UnionSchema {
    /// Builds the variant registry. Tags must be unique and no variant may
    /// declare a field under the tag name.
    pub fn new(tag_field: impl Into<String>, variants: Vec<Variant>) -> Result<Self, SchemaError> {
        let tag_field = tag_field.into();
        if variants.is_empty() {
            return Err(SchemaError::EmptyUnion { tag_field });
        }
        for (i, v) in variants.iter().enumerate() {
            if variants[..i].iter().any(|w| w.tag == v.tag) {
                return Err(SchemaError::DuplicateVariant { tag_field, tag: v.tag.clone() });
            }
            if v.object.get(&tag_field).is_some() {
                return Err(SchemaError::TagFieldCollision { tag_field, tag: v.tag.clone() });
            }
        }
        Ok(Self { tag_field, variants })
    }

    pub fn tag_field(&self) -> &str { &self.tag_field }

    pub fn variants(&self) -> &[Variant] { &self.variants }

    pub fn variant(&self, tag: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.tag.as_str())
    }
}

impl Variant {
    /// Tagged with the object's own name.
    pub fn of(object: ObjectSchema) -> Self {
        Self { tag: object.name.clone(), object }
    }

    pub fn tagged(tag: impl Into<String>, object: ObjectSchema) -> Self {
        Self { tag: tag.into(), object }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> ObjectSchema {
        ObjectSchema::new(name).field("name", Schema::String)
    }

    #[test]
    fn absent_values() {
        let o = ObjectSchema::new("Person")
            .field("name", Schema::String)
            .field_default("job", Schema::String, "Developer")
            .optional("nickname", Schema::String)
            .field_default("hobbies", Schema::list(Schema::String), Vec::<String>::new());
        assert_eq!(o.get("name").unwrap().absent_value(), None);
        assert_eq!(o.get("job").unwrap().absent_value(), Some(Typed::from("Developer")));
        assert_eq!(o.get("nickname").unwrap().absent_value(), Some(Typed::Null));
        assert_eq!(o.get("hobbies").unwrap().absent_value(), Some(Typed::List(vec![])));
    }

    #[test]
    fn containers_without_keys_are_implied_by_absence() {
        let meta = ObjectSchema::new("Meta").optional("note", Schema::String).field("tags", Schema::list(Schema::String));
        let o = ObjectSchema::new("Post")
            .field("tags", Schema::list(Schema::String))
            .field("meta", meta.into())
            .field("author", named("Author").into())
            .field("kind", UnionSchema::new("_type", vec![Variant::of(named("A"))]).unwrap().into());

        assert_eq!(o.get("tags").unwrap().absent_value(), Some(Typed::List(vec![])));
        let Some(Typed::Object(meta)) = o.get("meta").unwrap().absent_value() else { panic!("expected an object") };
        assert_eq!(meta.get("note"), Some(&Typed::Null));
        assert_eq!(meta.get("tags"), Some(&Typed::List(vec![])));
        assert!(o.get("author").unwrap().is_required());
        assert!(o.get("kind").unwrap().is_required());
    }

    #[test]
    fn union_rejects_duplicate_tags() {
        let err = UnionSchema::new("_type", vec![Variant::of(named("A")), Variant::of(named("A"))]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateVariant { ref tag, .. } if tag == "A"));
    }

    #[test]
    fn union_rejects_tag_field_collision() {
        let bad = ObjectSchema::new("A").field("_type", Schema::String);
        assert!(matches!(
            UnionSchema::new("_type", vec![Variant::of(bad)]),
            Err(SchemaError::TagFieldCollision { .. })
        ));
    }

    #[test]
    fn union_rejects_empty() {
        assert!(matches!(UnionSchema::new("kind", vec![]), Err(SchemaError::EmptyUnion { .. })));
    }

    #[test]
    fn variant_lookup() {
        let u = UnionSchema::new("_type", vec![Variant::of(named("A")), Variant::tagged("b", named("B"))]).unwrap();
        assert_eq!(u.tags().collect::<Vec<_>>(), vec!["A", "b"]);
        assert_eq!(u.variant("b").map(|v| v.object.name()), Some("B"));
        assert!(u.variant("B").is_none());
    }
}
