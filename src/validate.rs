//! Walk a normalized tree and a schema in lockstep, producing a [`Typed`]
//! value or every problem found on the way.
//!
//! Nothing short-circuits: a bad field records its error and yields a
//! placeholder so its siblings are still checked.
pub mod scalar;

use indexmap::IndexMap;

use crate::error::{ErrorKind, ErrorReport, FieldError};
use crate::key::FormPath;
use crate::schema::{ObjectSchema, Schema, UnionSchema};
use crate::tree::Node;
use crate::typed::{Typed, VariantValue};

pub fn validate(node: &Node, schema: &Schema, path: &FormPath) -> Result<Typed, ErrorReport> {
    let mut v = Validator::default();
    let value = v.value(node, schema, path);
    v.errors.into_result(value)
}

#[derive(Debug, Default)]
struct Validator {
    errors: ErrorReport,
}

impl Validator {
    fn fail(&mut self, path: &FormPath, kind: ErrorKind, message: impl Into<String>) -> Typed {
        self.errors.push(FieldError::new(path, kind, message));
        Typed::Null
    }

    fn mismatch(&mut self, path: &FormPath, schema: &Schema, found: &Node) -> Typed {
        let message = format!("expected {}, found {}", scalar::article(schema), found.kind_name());
        self.fail(path, ErrorKind::TypeMismatch, message)
    }

    fn value(&mut self, node: &Node, schema: &Schema, path: &FormPath) -> Typed {
        match schema {
            Schema::Optional(inner) => match node {
                Node::Unresolved => Typed::Null,
                // an empty control for anything but text means "no value"
                Node::Scalar(s) if s.trim().is_empty() && !matches!(**inner, Schema::String) => Typed::Null,
                _ => self.value(node, inner, path),
            },

            Schema::String | Schema::UInt | Schema::Bool | Schema::Timestamp => match node {
                Node::Scalar(text) => match scalar::parse(text, schema) {
                    Ok(v) => v,
                    Err(message) => self.fail(path, ErrorKind::TypeMismatch, message),
                },
                Node::Unresolved => match scalar::zero(schema) {
                    Some(v) => v,
                    None => self.fail(path, ErrorKind::TypeMismatch, format!("expected {}, found no value", scalar::article(schema))),
                },
                other => self.mismatch(path, schema, other),
            },

            Schema::Object(object) => match node {
                Node::Object(map) => Typed::Object(self.fields(map, object, path)),
                Node::Unresolved => Typed::Object(self.fields(&IndexMap::new(), object, path)),
                other => self.mismatch(path, schema, other),
            },

            Schema::List(item) => match node {
                Node::Array(items) => Typed::List(
                    items.iter().enumerate().map(|(i, el)| self.value(el, item, &path.index(i))).collect(),
                ),
                Node::Unresolved => Typed::List(Vec::new()),
                other => self.mismatch(path, schema, other),
            },

            Schema::Union(union) => match node {
                Node::Object(map) => self.variant(map, union, path),
                Node::Unresolved => self.missing_tag(path, union),
                other => self.mismatch(path, schema, other),
            },
        }
    }

    /// Declared fields in declaration order; anything else in `map` is ignored.
    fn fields(&mut self, map: &IndexMap<String, Node>, object: &ObjectSchema, path: &FormPath) -> IndexMap<String, Typed> {
        let mut out = IndexMap::with_capacity(object.fields().len());
        for field in object.fields() {
            let at = path.field(&field.name);
            let value = match (map.get(&field.name), field.absent_value()) {
                (Some(child), _) => self.value(child, &field.schema, &at),
                (None, Some(default)) => default,
                (None, None) => self.fail(&at, ErrorKind::MissingField, "field required"),
            };
            out.insert(field.name.clone(), value);
        }
        out
    }

    /// The tag only picks the variant; the rest of the object fills it.
    fn variant(&mut self, map: &IndexMap<String, Node>, union: &UnionSchema, path: &FormPath) -> Typed {
        let tag = match map.get(union.tag_field()) {
            None | Some(Node::Unresolved) => return self.missing_tag(path, union),
            Some(Node::Scalar(tag)) => tag,
            Some(other) => {
                let message = format!("expected a variant name, found {}", other.kind_name());
                return self.fail(&path.field(union.tag_field()), ErrorKind::TypeMismatch, message);
            }
        };
        let Some(variant) = union.variant(tag) else {
            let message = format!("`{tag}` is not one of: {}", known_tags(union));
            return self.fail(path, ErrorKind::UnknownVariant, message);
        };
        let fields = self.fields(map, &variant.object, path);
        Typed::Variant(VariantValue::from_parts(union.tag_field(), &variant.tag, fields))
    }

    fn missing_tag(&mut self, path: &FormPath, union: &UnionSchema) -> Typed {
        let message = format!("`{}` is required to select one of: {}", union.tag_field(), known_tags(union));
        self.fail(path, ErrorKind::MissingDiscriminator, message)
    }
}

fn known_tags(union: &UnionSchema) -> String {
    union.tags().collect::<Vec<_>>().join(", ")
}

// ------------------------------- Tests ------------------------------------ //
