//! Incremental ingestion driver
//!
//! [`IngestionDriver`] pulls one line per [`step`](IngestionDriver::step)
//! through [`LineSource`] → [`RecordDecoder`] → [`Deduplicator`] and hands the
//! resulting [`Outcome`]s to an [`OutcomeSink`]. The host decides when to call
//! `step` again, so a long file never holds the caller for more than one line.
//!
//! ## States
//!
//! ```text
//! Idle ──step──▶ Running ──exhausted──▶ Completed
//!   │               ├──cancel──────────▶ Cancelled
//!   └──cancel───────┤
//!                   └──read error──────▶ Failed
//! ```
//!
//! ## Ordering guarantees
//!
//! - malformed lines produce no outcome and only bump `malformed_count`
//! - `ThresholdReached` is emitted once, right before the `NewRecord` that
//!   brings `processed_count` to the threshold
//! - `RunComplete` is the last outcome of a completed run; cancelled and
//!   failed runs emit nothing after the transition

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::decoder::RecordDecoder;
use crate::dedup::{Deduplicator, Observation};
use crate::error::{IngestError, IngestResult};
use crate::line_source::LineSource;
use crate::models::EventRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    NewRecord { record: EventRecord, progress: f64 },
    Duplicate { progress: f64 },
    ThresholdReached,
    RunComplete { progress: f64 },
}

/// Receiver of driver outcomes
pub trait OutcomeSink {
    fn emit(&mut self, outcome: Outcome);
}

impl OutcomeSink for Vec<Outcome> {
    fn emit(&mut self, outcome: Outcome) {
        self.push(outcome);
    }
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for &mut S {
    fn emit(&mut self, outcome: Outcome) {
        (**self).emit(outcome);
    }
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for Box<S> {
    fn emit(&mut self, outcome: Outcome) {
        (**self).emit(outcome);
    }
}

impl OutcomeSink for mpsc::UnboundedSender<Outcome> {
    fn emit(&mut self, outcome: Outcome) {
        if self.send(outcome).is_err() {
            warn!("Outcome receiver dropped, discarding outcome");
        }
    }
}

/// Adapts a closure into an [`OutcomeSink`]
pub struct FnSink<F>(pub F);

impl<F: FnMut(Outcome)> OutcomeSink for FnSink<F> {
    fn emit(&mut self, outcome: Outcome) {
        (self.0)(outcome);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionStats {
    #[serde(rename = "processedCount")]
    pub processed_count: u64,
    #[serde(rename = "duplicateCount")]
    pub duplicate_count: u64,
    #[serde(rename = "malformedCount")]
    pub malformed_count: u64,
    #[serde(rename = "linesRead")]
    pub lines_read: u64,
    #[serde(rename = "thresholdReached")]
    pub threshold_reached: bool,
    #[serde(rename = "totalBytes")]
    pub total_bytes: u64,
    #[serde(rename = "bytesConsumed")]
    pub bytes_consumed: u64,
    pub progress: f64,
}

pub struct IngestionDriver<S> {
    run_id: Uuid,
    source: Option<LineSource>,
    decoder: RecordDecoder,
    dedup: Deduplicator,
    sink: S,
    threshold: u64,
    state: RunState,
    stats: IngestionStats,
}

impl<S: OutcomeSink> IngestionDriver<S> {
    /// Build a driver for one run over `source`. `threshold` must be at least 1.
    pub fn new(source: LineSource, threshold: u64, sink: S) -> IngestResult<Self> {
        if threshold == 0 {
            return Err(IngestError::InvalidArgument(
                "threshold must be at least 1".to_string(),
            ));
        }
        if !source.is_open() {
            return Err(IngestError::InvalidArgument(format!(
                "{} is closed",
                source.path().display()
            )));
        }

        let stats = IngestionStats {
            total_bytes: source.total_length().max(0) as u64,
            ..IngestionStats::default()
        };

        Ok(Self {
            run_id: Uuid::new_v4(),
            source: Some(source),
            decoder: RecordDecoder::new(),
            dedup: Deduplicator::new(),
            sink,
            threshold,
            state: RunState::Idle,
            stats,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stats(&self) -> &IngestionStats {
        &self.stats
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Share of the threshold reached so far, capped at 1.0
    pub fn loading_percentage(&self) -> f64 {
        (self.stats.processed_count as f64 / self.threshold as f64).min(1.0)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Consume exactly one line. Returns the state after the step; terminal
    /// states are sticky and further calls do nothing.
    pub fn step(&mut self) -> IngestResult<RunState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let span = info_span!("ingest_run", run_id = %self.run_id);
        let _enter = span.enter();

        let Some(source) = self.source.as_mut() else {
            self.state = RunState::Failed;
            return Err(IngestError::InvalidArgument("line source already released".to_string()));
        };

        if self.state == RunState::Idle {
            info!(
                path = %source.path().display(),
                total_bytes = self.stats.total_bytes,
                threshold = self.threshold,
                "Starting ingestion run"
            );
            self.state = RunState::Running;
        }

        let line = match source.next_line() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                let path = source.path().to_path_buf();
                self.fail();
                return Err(IngestError::io(path, e));
            }
            None => {
                let progress = source.progress();
                self.stats.bytes_consumed = source.bytes_consumed();
                self.complete(progress);
                return Ok(self.state);
            }
        };

        let line_number = source.line_number();
        let progress = source.progress();
        self.stats.lines_read += 1;
        self.stats.bytes_consumed = source.bytes_consumed();
        self.stats.progress = progress;

        let record = match self.decoder.decode(&line).map_err(IngestError::from) {
            Ok(record) => record,
            Err(e) if e.is_recoverable() => {
                self.stats.malformed_count += 1;
                debug!(line_number, error = %e, "Skipping malformed line");
                return Ok(self.state);
            }
            Err(e) => return Err(e),
        };

        match self.dedup.observe(&record.id) {
            Observation::Duplicate => {
                self.stats.duplicate_count += 1;
                debug!(line_number, event_id = %record.id, "Duplicate event");
                self.sink.emit(Outcome::Duplicate { progress });
            }
            Observation::New => {
                self.stats.processed_count += 1;
                if !self.stats.threshold_reached && self.stats.processed_count == self.threshold {
                    self.stats.threshold_reached = true;
                    info!(threshold = self.threshold, line_number, "Event threshold reached");
                    self.sink.emit(Outcome::ThresholdReached);
                }
                self.sink.emit(Outcome::NewRecord { record, progress });
            }
        }

        Ok(self.state)
    }

    /// Stop the run between steps. Releases the source; no further outcomes.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        let _span = info_span!("ingest_run", run_id = %self.run_id).entered();

        self.state = RunState::Cancelled;
        self.release_source();
        info!(
            processed = self.stats.processed_count,
            duplicates = self.stats.duplicate_count,
            progress = self.stats.progress,
            "Ingestion run cancelled"
        );
    }

    /// Step until a terminal state is reached
    pub fn run_to_completion(&mut self) -> IngestResult<IngestionStats> {
        while !self.step()?.is_terminal() {}
        Ok(self.stats.clone())
    }

    fn complete(&mut self, progress: f64) {
        self.state = RunState::Completed;
        self.stats.progress = progress;
        self.release_source();
        info!(
            processed = self.stats.processed_count,
            duplicates = self.stats.duplicate_count,
            malformed = self.stats.malformed_count,
            lines = self.stats.lines_read,
            "Ingestion run completed"
        );
        self.sink.emit(Outcome::RunComplete { progress });
    }

    fn fail(&mut self) {
        self.state = RunState::Failed;
        self.release_source();
        warn!(
            processed = self.stats.processed_count,
            lines = self.stats.lines_read,
            "Ingestion run failed"
        );
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn line(id: &str, product: &str, ts: u64, kind: &str) -> String {
        format!(
            r#"{{"event_id":"{}","source":"{}","timestamp":{},"type":"{}"}}"#,
            id, product, ts, kind
        )
    }

    #[test]
    fn test_reference_sequence() {
        let a = line("a", "product-a", 0, "view");
        let b = line("b", "product-b", 86_400_000, "purchase");
        let file = temp_file(&[&a, &a, &b]);

        let source = LineSource::open(file.path()).unwrap();
        let mut driver = IngestionDriver::new(source, 2, Vec::<Outcome>::new()).unwrap();
        let stats = driver.run_to_completion().unwrap();
        let outcomes = driver.into_sink();

        assert_eq!(outcomes.len(), 5);
        match &outcomes[0] {
            Outcome::NewRecord { record, .. } => {
                assert_eq!(record.id, "a");
                assert_eq!(record.action_type, ActionType::View);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(outcomes[1], Outcome::Duplicate { .. }));
        assert_eq!(outcomes[2], Outcome::ThresholdReached);
        match &outcomes[3] {
            Outcome::NewRecord { record, progress } => {
                assert_eq!(record.id, "b");
                assert_eq!(record.action_type, ActionType::Purchase);
                assert_eq!(*progress, 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(outcomes[4], Outcome::RunComplete { progress: 1.0 });

        assert_eq!(stats.processed_count, 2);
        assert_eq!(stats.duplicate_count, 1);
        assert!(stats.threshold_reached);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let ok = line("a", "product-a", 0, "view");
        let file = temp_file(&[
            r#"{"source":"product-a","timestamp":0,"type":"view"}"#,
            "{broken json}",
            "",
            &ok,
        ]);

        let source = LineSource::open(file.path()).unwrap();
        let mut driver = IngestionDriver::new(source, 10, Vec::<Outcome>::new()).unwrap();

        // Three skipped lines produce no outcomes
        for _ in 0..3 {
            assert_eq!(driver.step().unwrap(), RunState::Running);
            assert!(driver.sink().is_empty());
        }
        assert_eq!(driver.stats().malformed_count, 3);
        assert_eq!(driver.stats().processed_count, 0);
        assert_eq!(driver.stats().duplicate_count, 0);

        let stats = driver.run_to_completion().unwrap();
        assert_eq!(stats.processed_count, 1);
        assert!(!stats.threshold_reached);
        assert_eq!(driver.sink().len(), 2);
    }

    #[test]
    fn test_threshold_fires_once() {
        let lines: Vec<String> = (0..5).map(|i| line(&format!("e{}", i), "p", 0, "launch")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = temp_file(&refs);

        let source = LineSource::open(file.path()).unwrap();
        let mut driver = IngestionDriver::new(source, 1, Vec::<Outcome>::new()).unwrap();
        driver.run_to_completion().unwrap();

        let outcomes = driver.into_sink();
        let thresholds = outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::ThresholdReached))
            .count();
        assert_eq!(thresholds, 1);
        assert_eq!(outcomes[0], Outcome::ThresholdReached);
    }

    #[test]
    fn test_cancel_stops_outcomes() {
        let lines: Vec<String> = (0..4).map(|i| line(&format!("e{}", i), "p", 0, "view")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = temp_file(&refs);

        let source = LineSource::open(file.path()).unwrap();
        let mut driver = IngestionDriver::new(source, 100, Vec::<Outcome>::new()).unwrap();
        driver.step().unwrap();
        driver.cancel();

        assert_eq!(driver.state(), RunState::Cancelled);
        assert_eq!(driver.step().unwrap(), RunState::Cancelled);
        assert_eq!(driver.sink().len(), 1);
        assert_eq!(driver.stats().processed_count, 1);
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let file = temp_file(&[]);
        let source = LineSource::open(file.path()).unwrap();
        assert!(matches!(
            IngestionDriver::new(source, 0, Vec::<Outcome>::new()),
            Err(IngestError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_file_completes() {
        let file = temp_file(&[]);
        let source = LineSource::open(file.path()).unwrap();
        let mut driver = IngestionDriver::new(source, 1, Vec::<Outcome>::new()).unwrap();

        assert_eq!(driver.state(), RunState::Idle);
        assert_eq!(driver.step().unwrap(), RunState::Completed);
        assert_eq!(driver.sink(), &vec![Outcome::RunComplete { progress: 1.0 }]);
    }

    #[test]
    fn test_closure_sink_and_loading_percentage() {
        let lines: Vec<String> = (0..3).map(|i| line(&format!("e{}", i), "p", 0, "rating")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = temp_file(&refs);

        let mut seen = 0;
        let source = LineSource::open(file.path()).unwrap();
        let mut driver = IngestionDriver::new(
            source,
            4,
            FnSink(|outcome: Outcome| {
                if matches!(outcome, Outcome::NewRecord { .. }) {
                    seen += 1;
                }
            }),
        )
        .unwrap();
        driver.run_to_completion().unwrap();
        assert_eq!(driver.loading_percentage(), 0.75);
        drop(driver);
        assert_eq!(seen, 3);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_error_fails_run() {
        // Reading the process's own memory at offset 0 fails with EIO
        let source = LineSource::open("/proc/self/mem").unwrap();
        let mut driver = IngestionDriver::new(source, 1, Vec::<Outcome>::new()).unwrap();

        let err = driver.step().unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }), "unexpected error: {err}");
        assert!(!err.is_recoverable());
        assert_eq!(driver.state(), RunState::Failed);
        assert!(driver.sink().is_empty());

        assert_eq!(driver.step().unwrap(), RunState::Failed);
        assert!(driver.sink().is_empty());
    }
}
