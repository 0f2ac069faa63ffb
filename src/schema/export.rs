//! JSON Schema projection of a [`Schema`], for form renderers.
//!
//! Kept structurally in step with the validator: whatever this describes as
//! accepted is exactly what `validate` accepts, including one enumerated tag
//! property per union variant.
use serde_json::{json, Map, Value};

use super::{ObjectSchema, Schema, UnionSchema};

/// Build a JSON Schema (draft-ish) directly from the typed schema.
pub fn json_schema(schema: &Schema) -> Value {
    match schema {
        Schema::String => json!({ "type": "string" }),
        Schema::UInt => json!({ "type": "integer", "minimum": 0 }),
        Schema::Bool => json!({ "type": "boolean" }),
        Schema::Timestamp => json!({ "type": "string", "format": "date-time" }),

        Schema::Object(object) => object_schema(object, None),

        Schema::List(item) => json!({
            "type": "array",
            "items": json_schema(item),
        }),

        Schema::Optional(inner) => nullable(json_schema(inner)),

        Schema::Union(union) => union_schema(union),
    }
}

fn nullable(inner: Value) -> Value {
    json!({ "oneOf": [inner, { "type": "null" }] })
}

/// `tag` injects the discriminator property of a union member. It stays an
/// ordinary submitted control: the validator needs it back to pick the variant.
fn object_schema(object: &ObjectSchema, tag: Option<(&str, &str)>) -> Value {
    let mut props = Map::new();
    let mut required: Vec<Value> = Vec::new();

    if let Some((tag_field, tag)) = tag {
        props.insert(tag_field.to_string(), json!({
            "type": "string",
            "enum": [tag],
            "default": tag,
            "title": title_case(tag_field),
        }));
        required.push(Value::from(tag_field));
    }

    for field in object.fields() {
        let mut prop = json_schema(&field.schema);
        prop["title"] = Value::from(title_case(&field.name));
        if let Some(default) = &field.default {
            prop["default"] = default.to_json();
        }
        props.insert(field.name.clone(), prop);
        if field.is_required() {
            required.push(Value::from(field.name.clone()));
        }
    }

    let mut o = json!({
        "type": "object",
        "title": object.name(),
        "properties": props,
    });
    if let Some(d) = object.description() {
        o["description"] = Value::from(d);
    }
    if !required.is_empty() {
        o["required"] = Value::Array(required);
    }
    o
}

fn union_schema(union: &UnionSchema) -> Value {
    let arms = union
        .variants()
        .iter()
        .map(|v| object_schema(&v.object, Some((union.tag_field(), &v.tag))))
        .collect::<Vec<_>>();
    json!({
        "oneOf": arms,
        "discriminator": { "propertyName": union.tag_field() },
    })
}

/// `house_number` → `House Number`, `_type` → `Type`.
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(c) => c.to_uppercase().chain(cs).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
