use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{info, warn};

use event_analytics::config::Config;
use event_analytics::driver::{IngestionDriver, Outcome, OutcomeSink, RunState};
use event_analytics::line_source::LineSource;
use event_analytics::logging;
use event_analytics::report::ActivityReport;
use event_analytics::scheduler::{self, CancelHandle};
use event_analytics::IngestError;

#[derive(Parser)]
#[command(name = "event-analytics")]
#[command(about = "Streaming ingestion and activity report for JSON Lines event logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a JSON Lines event log and print an activity report
    Ingest {
        /// Path to the event log
        path: PathBuf,
        /// Unique events needed before the threshold notice
        #[arg(long)]
        threshold: Option<u64>,
        /// Output the report in JSON format
        #[arg(long)]
        json: bool,
        /// Milliseconds between steps (0 = as fast as possible)
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Suppress progress output
        #[arg(long, short)]
        quiet: bool,
    },
}

/// Forwards outcomes to the report and prints progress on stderr
struct ProgressPrinter {
    report: ActivityReport,
    threshold: u64,
    show_progress: bool,
    last_percent: i64,
}

impl ProgressPrinter {
    fn new(threshold: u64, show_progress: bool) -> Self {
        Self {
            report: ActivityReport::new(),
            threshold,
            show_progress,
            last_percent: -1,
        }
    }

    fn print_progress(&mut self, progress: f64) {
        let percent = (progress * 100.0).floor() as i64;
        if !self.show_progress || percent == self.last_percent {
            return;
        }
        self.last_percent = percent;
        eprint!(
            "\r{} {:>3}%  events: {}  duplicates: {}",
            "Loading".cyan(),
            percent,
            self.report.events_processed,
            self.report.duplicates
        );
    }
}

impl OutcomeSink for ProgressPrinter {
    fn emit(&mut self, outcome: Outcome) {
        let progress = match &outcome {
            Outcome::NewRecord { progress, .. }
            | Outcome::Duplicate { progress }
            | Outcome::RunComplete { progress } => Some(*progress),
            Outcome::ThresholdReached => None,
        };
        let finished = matches!(outcome, Outcome::RunComplete { .. });
        let threshold_reached = matches!(outcome, Outcome::ThresholdReached);

        self.report.emit(outcome);

        if threshold_reached && self.show_progress {
            eprintln!(
                "\r{}",
                format!("{} unique events loaded", self.threshold).green()
            );
        }
        if let Some(progress) = progress {
            self.print_progress(progress);
        }
        if finished && self.show_progress {
            eprintln!();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let _log_guard = match logging::init_logging(&config.logging, &config.paths.log_directory) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Ingest {
            path,
            threshold,
            json,
            tick_ms,
            quiet,
        } => {
            let json = json || config.output.json;
            match run_ingest(&config, path, threshold, json, tick_ms, quiet).await {
                Ok(_) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
    }
}

async fn run_ingest(
    config: &Config,
    path: PathBuf,
    threshold: Option<u64>,
    json: bool,
    tick_ms: Option<u64>,
    quiet: bool,
) -> Result<()> {
    let threshold = threshold.unwrap_or(config.ingestion.threshold);
    let tick = Duration::from_millis(tick_ms.unwrap_or(config.ingestion.tick_interval_ms));

    let source = LineSource::with_capacity(&path, config.buffer_size_bytes()).map_err(|e| match e {
        IngestError::NotFound { path } => {
            anyhow::anyhow!("File does not exist: {}", path.display())
        }
        other => anyhow::Error::new(other),
    })?;

    let printer = ProgressPrinter::new(threshold, !quiet && !json);
    let mut driver = IngestionDriver::new(source, threshold, printer)
        .context("Failed to start ingestion")?;

    let cancel = CancelHandle::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling ingestion");
            signal_cancel.cancel();
        }
    });

    info!(path = %path.display(), threshold, run_id = %driver.run_id(), "Ingesting event log");
    let (state, stats) = scheduler::drive_to_end(&mut driver, &cancel, tick).await?;

    let report = &driver.sink().report;
    if json {
        let output = serde_json::json!({
            "state": state,
            "stats": stats,
            "report": report,
        });
        let rendered = if config.output.json_pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{}", rendered);
    } else {
        if state == RunState::Cancelled {
            eprintln!("{}", "Ingestion cancelled, partial results below".yellow());
        }
        print!("{}", report.render_text());
        println!(
            "Lines read: {}  malformed: {}",
            stats.lines_read, stats.malformed_count
        );
    }

    Ok(())
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<(), anyhow::Error> {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("{} {:#}", "Error:".red(), e);
    }
    process::exit(1);
}
