//! Event Analytics Library
//!
//! Streaming ingestion of JSON Lines event logs. Each line becomes a typed
//! [`EventRecord`], duplicates are filtered out by event id, and progress is
//! reported incrementally so a host can interleave ingestion with other work.
//!
//! ## Architecture Overview
//!
//! Leaves first:
//!
//! - [`extractor`] - Slash-delimited field path lookup in a JSON document
//! - [`line_source`] - Restartable, byte-position-tracked line reader
//! - [`decoder`] - Line to [`EventRecord`] conversion
//! - [`dedup`] - Per-run set of seen event ids
//! - [`driver`] - One-line-per-step state machine emitting [`Outcome`]s
//! - [`scheduler`] - Cooperative tokio host loop with cancellation
//! - [`report`] - Outcome consumer aggregating counts for display
//! - [`config`] / [`logging`] - Ambient configuration and structured logging
//!
//! ## Main Entry Point
//!
//! ```rust,no_run
//! use event_analytics::{IngestionDriver, LineSource, Outcome};
//!
//! # fn example() -> Result<(), event_analytics::IngestError> {
//! let source = LineSource::open("events.jsonl")?;
//! let mut driver = IngestionDriver::new(source, 1000, Vec::<Outcome>::new())?;
//!
//! // One line per call; the host decides when to call again
//! while !driver.step()?.is_terminal() {}
//!
//! println!("{} unique events", driver.stats().processed_count);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod dedup;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod line_source;
pub mod logging;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod timestamp_parser;

pub use decoder::{DecodeError, RecordDecoder};
pub use dedup::{Deduplicator, Observation};
pub use driver::{FnSink, IngestionDriver, IngestionStats, Outcome, OutcomeSink, RunState};
pub use error::{IngestError, IngestResult};
pub use extractor::{ExtractError, FieldExtractor, FieldKind, FieldValue};
pub use line_source::LineSource;
pub use models::*;
pub use report::ActivityReport;
pub use scheduler::CancelHandle;
