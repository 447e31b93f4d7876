//! Line to [`EventRecord`] decoding
//!
//! Every line must be a JSON object carrying four fields:
//!
//! | path        | kind   | record field     |
//! |-------------|--------|------------------|
//! | `event_id`  | String | `id`             |
//! | `source`    | String | `product_name`   |
//! | `timestamp` | Number | `timestamp`      |
//! | `type`      | String | `action_type`    |
//!
//! Any failure is a [`DecodeError`]; the caller skips the line and carries on.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::extractor::{ExtractError, FieldExtractor, FieldKind};
use crate::models::{ActionType, EventRecord};
use crate::timestamp_parser::TimestampParser;

pub const EVENT_ID_PATH: &str = "event_id";
pub const SOURCE_PATH: &str = "source";
pub const TIMESTAMP_PATH: &str = "timestamp";
pub const TYPE_PATH: &str = "type";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("empty line")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("field `{field}`: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: ExtractError,
    },

    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RecordDecoder;

impl RecordDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, line: &str) -> Result<EventRecord, DecodeError> {
        if line.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let document: Value =
            serde_json::from_str(line).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
        if !document.is_object() {
            return Err(DecodeError::InvalidJson("top-level value is not an object".to_string()));
        }

        let id = Self::string_field(&document, EVENT_ID_PATH)?;
        let product_name = Self::string_field(&document, SOURCE_PATH)?;
        let millis = Self::number_field(&document, TIMESTAMP_PATH)?;
        let tag = Self::string_field(&document, TYPE_PATH)?;

        let timestamp = TimestampParser::from_epoch_millis(millis)
            .map_err(|e| DecodeError::Timestamp(e.to_string()))?;

        let record = EventRecord::new(id, product_name, timestamp, tag);
        if record.action_type == ActionType::Unrecognized {
            debug!(
                event_id = %record.id,
                tag = %record.action_tag,
                "Unrecognized action type"
            );
        }

        Ok(record)
    }

    fn string_field(document: &Value, field: &'static str) -> Result<String, DecodeError> {
        FieldExtractor::extract_value(document, field, FieldKind::String)
            .map_err(|source| DecodeError::Field { field, source })?
            .into_string()
            .ok_or(DecodeError::Field {
                field,
                source: ExtractError::WrongKind {
                    path: field.to_string(),
                    expected: FieldKind::String,
                },
            })
    }

    fn number_field(document: &Value, field: &'static str) -> Result<f64, DecodeError> {
        FieldExtractor::extract_value(document, field, FieldKind::Number)
            .map_err(|source| DecodeError::Field { field, source })?
            .as_f64()
            .ok_or(DecodeError::Field {
                field,
                source: ExtractError::WrongKind {
                    path: field.to_string(),
                    expected: FieldKind::Number,
                },
            })
    }
}
