use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::key::{FormPath, Segment};

/// A serde failure plus the location it happened at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at JSON path {json_path} → {message}")]
pub struct PathError {
    pub json_path: String,
    pub segments: Vec<Segment>,
    pub message: String,
}

impl PathError {
    fn from_serde(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        use serde_path_to_error::Segment as S;
        let json_path = err.path().to_string();
        let segments = err
            .path()
            .iter()
            .filter_map(|seg| match seg {
                S::Seq { index } => Some(Segment::Index(*index)),
                S::Map { key } => Some(Segment::Field(key.clone())),
                _ => None,
            })
            .collect();
        Self { json_path, segments, message: err.into_inner().to_string() }
    }

    /// The same location spelled as a form key.
    pub fn form_path(&self, root: &str) -> FormPath {
        let mut path = FormPath::root(root);
        for seg in &self.segments {
            path.push(seg.clone());
        }
        path
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(PathError::from_serde)
}

pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, PathError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(PathError::from_serde)
}
