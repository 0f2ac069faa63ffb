//! Values produced by the validator, shaped by the schema they passed.
use std::fmt;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    Null,
    Bool(bool),
    UInt(u64),
    String(String),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<Typed>),
    /// Fields in schema declaration order.
    Object(IndexMap<String, Typed>),
    Variant(VariantValue),
}

/// A member of a discriminated union. The tag is fixed at construction and
/// only ever re-emitted, never taken from the caller after that.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantValue {
    tag_field: String,
    tag: String,
    fields: IndexMap<String, Typed>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{tag_field}` is derived from the variant ({tag}) and cannot be set")]
pub struct ReadOnlyTag {
    pub tag_field: String,
    pub tag: String,
}

impl Typed {
    pub fn is_null(&self) -> bool { matches!(self, Typed::Null) }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Typed::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Typed::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Typed]> {
        match self {
            Typed::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&VariantValue> {
        match self {
            Typed::Variant(v) => Some(v),
            _ => None,
        }
    }

    /// Field lookup on objects and variants. The tag of a variant is not a field.
    pub fn get(&self, name: &str) -> Option<&Typed> {
        match self {
            Typed::Object(fields) => fields.get(name),
            Typed::Variant(v) => v.fields.get(name),
            _ => None,
        }
    }

    /// The nested document used to pre-fill a form.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl VariantValue {
    pub fn new(tag_field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self { tag_field: tag_field.into(), tag: tag.into(), fields: IndexMap::new() }
    }

    /// Caller guarantees `fields` has no entry named `tag_field`.
    pub(crate) fn from_parts(tag_field: &str, tag: &str, fields: IndexMap<String, Typed>) -> Self {
        Self { tag_field: tag_field.to_string(), tag: tag.to_string(), fields }
    }

    pub fn tag_field(&self) -> &str { &self.tag_field }

    pub fn tag(&self) -> &str { &self.tag }

    pub fn fields(&self) -> &IndexMap<String, Typed> { &self.fields }

    pub fn get(&self, name: &str) -> Option<&Typed> { self.fields.get(name) }

    pub fn insert(&mut self, name: impl Into<String>, value: Typed) -> Result<Option<Typed>, ReadOnlyTag> {
        let name = name.into();
        if name == self.tag_field {
            return Err(ReadOnlyTag { tag_field: self.tag_field.clone(), tag: self.tag.clone() });
        }
        Ok(self.fields.insert(name, value))
    }

    pub fn with(mut self, name: impl Into<String>, value: Typed) -> Result<Self, ReadOnlyTag> {
        self.insert(name, value)?;
        Ok(self)
    }
}

// ------------------------------ Conversions ------------------------------- //

impl From<&str> for Typed {
    fn from(s: &str) -> Self { Typed::String(s.to_string()) }
}

impl From<String> for Typed {
    fn from(s: String) -> Self { Typed::String(s) }
}

impl From<u64> for Typed {
    fn from(n: u64) -> Self { Typed::UInt(n) }
}

impl From<bool> for Typed {
    fn from(b: bool) -> Self { Typed::Bool(b) }
}

impl From<DateTime<FixedOffset>> for Typed {
    fn from(t: DateTime<FixedOffset>) -> Self { Typed::Timestamp(t) }
}

impl From<VariantValue> for Typed {
    fn from(v: VariantValue) -> Self { Typed::Variant(v) }
}

impl<T: Into<Typed>> From<Option<T>> for Typed {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Typed::Null) }
}

impl<T: Into<Typed>> From<Vec<T>> for Typed {
    fn from(xs: Vec<T>) -> Self { Typed::List(xs.into_iter().map(Into::into).collect()) }
}

/// Timestamps are written in RFC 3339, `Z` for UTC.
pub fn format_timestamp(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ----------------------------- Serialization ------------------------------ //

impl Serialize for Typed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Typed::Null => serializer.serialize_unit(),
            Typed::Bool(b) => serializer.serialize_bool(*b),
            Typed::UInt(n) => serializer.serialize_u64(*n),
            Typed::String(s) => serializer.serialize_str(s),
            Typed::Timestamp(t) => serializer.serialize_str(&format_timestamp(t)),
            Typed::List(xs) => serializer.collect_seq(xs),
            Typed::Object(fields) => serializer.collect_map(fields),
            Typed::Variant(v) => v.serialize(serializer),
        }
    }
}

impl Serialize for VariantValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(&self.tag_field, &self.tag)?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for Typed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
