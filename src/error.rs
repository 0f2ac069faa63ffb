//! Error taxonomy for the decode pipeline.
//!
//! Two phases, two policies:
//! - decode phase (`key`, `tree`): the first problem is fatal → [`DecodeError`].
//! - validate phase: every problem is collected → [`ErrorReport`].
use std::fmt;
use serde::Serialize;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingField,
    MissingDiscriminator,
    UnknownVariant,
    TypeMismatch,
    MalformedKey,
    PathKindConflict,
}

/// One `{path, kind, message}` record. `path` uses the same bracket syntax as
/// the submitted keys, so `root[contacts][0]` points back at the control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Ordered batch of field errors. Never empty when returned as an `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorReport(Vec<FieldError>);

/// Fatal decode-phase errors: the tree shape is unknowable past these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed key `{key}`: {reason}")]
    MalformedKey { key: String, reason: String },
    #[error("conflicting use of `{path}`: {reason}")]
    PathKindConflict { path: String, reason: String },
}

/// Problems building a schema (in code or from a definition file).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("at JSON path {path} → {message}")]
    Definition { path: String, message: String },
    #[error("union on `{tag_field}` declares variant `{tag}` twice")]
    DuplicateVariant { tag_field: String, tag: String },
    #[error("union on `{tag_field}` has no variants")]
    EmptyUnion { tag_field: String },
    #[error("variant `{tag}` declares a field named like the tag field `{tag_field}`")]
    TagFieldCollision { tag_field: String, tag: String },
    #[error("invalid default for field `{field}`: {report}")]
    InvalidDefault { field: String, report: ErrorReport },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingField => "MissingField",
            ErrorKind::MissingDiscriminator => "MissingDiscriminator",
            ErrorKind::UnknownVariant => "UnknownVariant",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::MalformedKey => "MalformedKey",
            ErrorKind::PathKindConflict => "PathKindConflict",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldError {
    pub fn new(path: impl fmt::Display, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { path: path.to_string(), kind, message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path, self.kind, self.message)
    }
}

impl ErrorReport {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, error: FieldError) { self.0.push(error); }

    pub fn extend(&mut self, other: ErrorReport) { self.0.extend(other.0); }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn errors(&self) -> &[FieldError] { &self.0 }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> { self.0.iter() }

    /// Errors recorded against exactly `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.path == path)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ErrorReport> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("no errors"),
            [one] => write!(f, "{one}"),
            many => {
                write!(f, "{} errors", many.len())?;
                for e in many {
                    write!(f, "; {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorReport {}

impl IntoIterator for ErrorReport {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl From<FieldError> for ErrorReport {
    fn from(error: FieldError) -> Self { Self(vec![error]) }
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MalformedKey { .. } => ErrorKind::MalformedKey,
            DecodeError::PathKindConflict { .. } => ErrorKind::PathKindConflict,
        }
    }
}

impl From<DecodeError> for FieldError {
    fn from(error: DecodeError) -> Self {
        let kind = error.kind();
        match error {
            DecodeError::MalformedKey { key, reason } => FieldError { path: key, kind, message: reason },
            DecodeError::PathKindConflict { path, reason } => FieldError { path, kind, message: reason },
        }
    }
}

impl From<DecodeError> for ErrorReport {
    fn from(error: DecodeError) -> Self { FieldError::from(error).into() }
}

// ------------------------------- Tests ------------------------------------ //
