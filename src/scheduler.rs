//! Cooperative host loop for an [`IngestionDriver`]
//!
//! [`drive`] calls `step` once per scheduler tick and gives control back to the
//! tokio runtime in between, so other tasks keep running while a large file is
//! ingested. Cancellation is checked between steps, never in the middle of one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::driver::{IngestionDriver, IngestionStats, OutcomeSink, RunState};

/// Shared cancellation flag for one run
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Step `driver` until it reaches a terminal state.
///
/// With a zero `tick` the loop only yields to the runtime between steps;
/// otherwise one step runs per tick of a `tick`-period interval.
pub async fn drive<S: OutcomeSink>(
    driver: &mut IngestionDriver<S>,
    cancel: &CancelHandle,
    tick: Duration,
) -> Result<IngestionStats> {
    let mut ticker = if tick.is_zero() {
        None
    } else {
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(ticker)
    };

    loop {
        if cancel.is_cancelled() {
            driver.cancel();
            break;
        }

        let state = driver
            .step()
            .with_context(|| format!("Ingestion run {} failed", driver.run_id()))?;
        if state.is_terminal() {
            break;
        }

        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
    }

    debug!(run_id = %driver.run_id(), state = ?driver.state(), "Host loop finished");
    Ok(driver.stats().clone())
}

/// Convenience wrapper reporting whether the run completed or was cancelled
pub async fn drive_to_end<S: OutcomeSink>(
    driver: &mut IngestionDriver<S>,
    cancel: &CancelHandle,
    tick: Duration,
) -> Result<(RunState, IngestionStats)> {
    let stats = drive(driver, cancel, tick).await?;
    Ok((driver.state(), stats))
}
