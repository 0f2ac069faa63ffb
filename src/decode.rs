//! The pipeline: flat form → tree → normalized tree → typed value.
//!
//! Pure and synchronous. Every call builds and drops its own tree, so a
//! [`Decoder`] can be shared across threads as-is.
use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, ErrorReport, FieldError};
use crate::form::FlatForm;
use crate::key::FormPath;
use crate::normalize::normalize;
use crate::path_de;
use crate::schema::Schema;
use crate::tree;
use crate::typed::Typed;
use crate::validate::validate;

pub const DEFAULT_ROOT: &str = "root";
pub const DEFAULT_MAX_INDEX: usize = 10_000;
/// Hard upper bound on `max_index`, whatever the caller configures.
pub const INDEX_CEILING: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Literal every bracketed key starts with.
    pub root: String,
    /// Largest list index a key may address. Lists are padded up to the
    /// index, so this bounds the memory a single key can claim.
    pub max_index: usize,
}

impl DecodeOptions {
    /// The index bound actually enforced: `max_index`, clamped to [`INDEX_CEILING`].
    pub fn index_limit(&self) -> usize { self.max_index.min(INDEX_CEILING) }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { root: DEFAULT_ROOT.to_string(), max_index: DEFAULT_MAX_INDEX }
    }
}

/// Decode with default options.
pub fn decode(form: &FlatForm, schema: &Schema) -> Result<Typed, ErrorReport> {
    decode_with(form, schema, &DecodeOptions::default())
}

pub fn decode_with(form: &FlatForm, schema: &Schema, options: &DecodeOptions) -> Result<Typed, ErrorReport> {
    let tree = tree::build(form, options)?;
    let tree = normalize(tree);
    validate(&tree, schema, &FormPath::root(options.root.as_str()))
}

#[derive(Debug, Clone)]
pub struct Decoder {
    schema: Schema,
    options: DecodeOptions,
}

impl Decoder {
    pub fn new(schema: Schema) -> Self {
        Self { schema, options: DecodeOptions::default() }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn options(&self) -> &DecodeOptions { &self.options }

    pub fn decode(&self, form: &FlatForm) -> Result<Typed, ErrorReport> {
        decode_with(form, &self.schema, &self.options)
    }

    /// Validate, then deserialize the prefill document into `T`. A `T` that
    /// disagrees with the schema shows up as a `TypeMismatch` at the field
    /// serde stopped on.
    pub fn decode_into<T: DeserializeOwned>(&self, form: &FlatForm) -> Result<T, ErrorReport> {
        let value = self.decode(form)?;
        path_de::from_value_with_path(value.to_json()).map_err(|e| {
            let path = e.form_path(&self.options.root);
            FieldError::new(path, ErrorKind::TypeMismatch, e.message).into()
        })
    }

    pub fn json_schema(&self) -> serde_json::Value {
        crate::schema::export::json_schema(&self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectSchema;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet { name: String, legs: u64 }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Strict { name: String, legs: u8 }

    fn pet_schema() -> Schema {
        ObjectSchema::new("Pet").field("name", Schema::String).field_default("legs", Schema::UInt, 4u64).into()
    }

    #[test]
    fn decodes_into_user_type() {
        let form: FlatForm = [("root[name]", "Rex")].into_iter().collect();
        let pet: Pet = Decoder::new(pet_schema()).decode_into(&form).unwrap();
        assert_eq!(pet, Pet { name: "Rex".into(), legs: 4 });
    }

    #[test]
    fn serde_mismatch_is_reported_with_form_path() {
        let form: FlatForm = [("root[name]", "Rex"), ("root[legs]", "1000")].into_iter().collect();
        let report = Decoder::new(pet_schema()).decode_into::<Strict>(&form).unwrap_err();
        assert_eq!(report.errors()[0].path, "root[legs]");
        assert_eq!(report.errors()[0].kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn decode_errors_short_circuit_validation() {
        let form: FlatForm = [("root[name", "Rex")].into_iter().collect();
        let report = decode(&form, &pet_schema()).unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].kind, ErrorKind::MalformedKey);
    }

    #[test]
    fn huge_index_is_rejected_even_without_a_limit() {
        let schema: Schema = ObjectSchema::new("P").field("tags", Schema::list(Schema::String)).into();
        let options = DecodeOptions { max_index: usize::MAX, ..DecodeOptions::default() };
        let key = format!("root[tags][{}]", usize::MAX);
        let form: FlatForm = [(key.as_str(), "x")].into_iter().collect();
        let report = decode_with(&form, &schema, &options).unwrap_err();
        assert_eq!(report.errors()[0].kind, ErrorKind::MalformedKey);
    }

    #[test]
    fn custom_root() {
        let options = DecodeOptions { root: "pet".into(), ..DecodeOptions::default() };
        let form: FlatForm = [("pet[name]", "Rex")].into_iter().collect();
        let value = decode_with(&form, &pet_schema(), &options).unwrap();
        assert_eq!(value.get("name"), Some(&Typed::from("Rex")));

        let report = decode_with(&FlatForm::new(), &pet_schema(), &options).unwrap_err();
        assert_eq!(report.errors()[0].path, "pet[name]");
    }
}
