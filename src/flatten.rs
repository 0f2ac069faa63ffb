//! The inverse of decoding: nested values → bracket-indexed keys.
//!
//! `null` and empty containers produce no keys at all, just as an unfilled
//! form control submits nothing. The validator reads an absent list as `[]`
//! and an absent optional as `null`, so decoding gives the value back. The one
//! shape that is lost is a list whose trailing elements flatten to nothing
//! (`[x, null]`): the form has no key left to say it was longer.
use serde_json::Value;

use crate::form::FlatForm;
use crate::key::FormPath;
use crate::typed::{format_timestamp, Typed};

pub fn flatten(value: &Typed, root: &str) -> FlatForm {
    let mut out = FlatForm::new();
    walk_typed(value, &FormPath::root(root), &mut out);
    out
}

/// Same for an arbitrary JSON document (e.g. a saved prefill document).
pub fn flatten_json(value: &Value, root: &str) -> FlatForm {
    let mut out = FlatForm::new();
    walk_json(value, &FormPath::root(root), &mut out);
    out
}

fn walk_typed(value: &Typed, path: &FormPath, out: &mut FlatForm) {
    match value {
        Typed::Null => {}
        Typed::Bool(b) => { out.insert(path.to_string(), b.to_string()); }
        Typed::UInt(n) => { out.insert(path.to_string(), n.to_string()); }
        Typed::String(s) => { out.insert(path.to_string(), s.clone()); }
        Typed::Timestamp(t) => { out.insert(path.to_string(), format_timestamp(t)); }
        Typed::List(xs) => {
            for (i, x) in xs.iter().enumerate() {
                walk_typed(x, &path.index(i), out);
            }
        }
        Typed::Object(fields) => {
            for (k, v) in fields {
                walk_typed(v, &path.field(k), out);
            }
        }
        Typed::Variant(v) => {
            out.insert(path.field(v.tag_field()).to_string(), v.tag().to_string());
            for (k, x) in v.fields() {
                walk_typed(x, &path.field(k), out);
            }
        }
    }
}

fn walk_json(value: &Value, path: &FormPath, out: &mut FlatForm) {
    match value {
        Value::Null => {}
        Value::Bool(b) => { out.insert(path.to_string(), b.to_string()); }
        Value::Number(n) => { out.insert(path.to_string(), n.to_string()); }
        Value::String(s) => { out.insert(path.to_string(), s.clone()); }
        Value::Array(xs) => {
            for (i, x) in xs.iter().enumerate() {
                walk_json(x, &path.index(i), out);
            }
        }
        Value::Object(m) => {
            for (k, v) in m {
                walk_json(v, &path.field(k), out);
            }
        }
    }
}
