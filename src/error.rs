//! Error taxonomy for the ingestion pipeline
//!
//! Only [`IngestError::Io`] raised during an active run is fatal. A
//! [`IngestError::Malformed`] line is skipped by the driver and never reaches
//! a consumer as an error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::decoder::DecodeError;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Caller misuse, detected before any processing starts
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("malformed line: {0}")]
    Malformed(#[from] DecodeError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the conditions the driver recovers from locally
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
