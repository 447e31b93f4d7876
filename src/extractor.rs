//! Field path extraction from JSON documents
//!
//! Paths are slash-delimited (`outer/inner/leaf`). Every segment but the last
//! descends one object level; the last one is read as the requested
//! [`FieldKind`].

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    RawObject,
    /// Any JSON value, returned untouched
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Object(Map<String, Value>),
    Raw(Value),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("not a valid JSON object: {0}")]
    Malformed(String),

    #[error("path `{0}` not found")]
    NotFound(String),

    #[error("field `{path}` is not of kind {expected:?}")]
    WrongKind { path: String, expected: FieldKind },
}

impl ExtractError {
    /// Missing data, as opposed to a broken document or a caller error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Stateless JSON field resolver
pub struct FieldExtractor;

impl FieldExtractor {
    /// Parse `document` and resolve `path` to a value of `kind`
    pub fn extract(document: &str, path: &str, kind: FieldKind) -> Result<FieldValue, ExtractError> {
        if document.is_empty() {
            return Err(ExtractError::InvalidArgument("document is empty"));
        }
        if path.is_empty() {
            return Err(ExtractError::InvalidArgument("path is empty"));
        }

        let root: Value =
            serde_json::from_str(document).map_err(|e| ExtractError::Malformed(e.to_string()))?;

        Self::extract_value(&root, path, kind)
    }

    /// Resolve `path` against an already parsed document
    pub fn extract_value(root: &Value, path: &str, kind: FieldKind) -> Result<FieldValue, ExtractError> {
        if path.is_empty() {
            return Err(ExtractError::InvalidArgument("path is empty"));
        }

        let mut current = root
            .as_object()
            .ok_or_else(|| ExtractError::Malformed("top-level value is not an object".to_string()))?;

        let (parents, leaf) = match path.rsplit_once('/') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, path),
        };

        if let Some(parents) = parents {
            for segment in parents.split('/') {
                current = match current.get(segment) {
                    Some(Value::Object(inner)) => inner,
                    _ => return Err(ExtractError::NotFound(path.to_string())),
                };
            }
        }

        let value = current
            .get(leaf)
            .ok_or_else(|| ExtractError::NotFound(path.to_string()))?;

        let wrong_kind = || ExtractError::WrongKind {
            path: path.to_string(),
            expected: kind,
        };

        match (kind, value) {
            (FieldKind::String, Value::String(s)) => Ok(FieldValue::String(s.clone())),
            (FieldKind::Number, Value::Number(n)) => {
                n.as_f64().map(FieldValue::Number).ok_or_else(wrong_kind)
            }
            (FieldKind::Boolean, Value::Bool(b)) => Ok(FieldValue::Boolean(*b)),
            (FieldKind::RawObject, Value::Object(map)) => Ok(FieldValue::Object(map.clone())),
            (FieldKind::Any, other) => Ok(FieldValue::Raw(other.clone())),
            _ => Err(wrong_kind()),
        }
    }
}
