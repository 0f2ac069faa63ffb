//! The flat `key → value` mapping a browser form submits.
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys are unique; iteration is in key order so decoding and error reporting
/// never depend on how the caller happened to collect the pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatForm(BTreeMap<String, String>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("a flat form must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("value of `{0}` is nested; flat forms hold scalars only")]
    NestedValue(String),
}

impl FlatForm {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> { self.0.get(key).map(String::as_str) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Accept the JSON shape most form captures come in: an object of scalars.
    /// Numbers and booleans are kept in their textual form; `null` means the
    /// control was not submitted.
    pub fn from_json(value: &Value) -> Result<Self, FormError> {
        let Value::Object(map) = value else {
            return Err(FormError::NotAnObject(json_kind(value)));
        };
        let mut out = Self::new();
        for (k, v) in map {
            match v {
                Value::Null => {}
                Value::String(s) => { out.insert(k.clone(), s.clone()); }
                Value::Bool(b) => { out.insert(k.clone(), b.to_string()); }
                Value::Number(n) => { out.insert(k.clone(), n.to_string()); }
                Value::Array(_) | Value::Object(_) => return Err(FormError::NestedValue(k.clone())),
            }
        }
        Ok(out)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatForm {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for FlatForm {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
