//! Decode flat, bracket-indexed HTML form submissions (`root[a][0][b]=...`)
//! into typed, validated documents, and describe those documents back to a
//! form renderer as JSON Schema.
//!
//! ```text
//! FlatForm ─tokenize─▶ segments ─build─▶ Node tree ─normalize─▶ Node tree ─validate─▶ Typed
//! ```
pub mod cli;
pub mod decode;
pub mod error;
pub mod flatten;
pub mod form;
pub mod jq_exec;
pub mod key;
pub mod model;
pub mod normalize;
pub mod path_de;
pub mod schema;
pub mod store;
pub mod tree;
pub mod typed;
pub mod validate;

pub use decode::{decode, decode_with, DecodeOptions, Decoder};
pub use error::{ErrorKind, ErrorReport, FieldError, SchemaError};
pub use flatten::flatten;
pub use form::FlatForm;
pub use schema::{ObjectSchema, Schema, UnionSchema, Variant};
pub use store::Store;
pub use typed::{Typed, VariantValue};
