//! Activity report built from driver outcomes
//!
//! [`ActivityReport`] is a plain [`OutcomeSink`]: it folds every outcome into
//! counters that a host can render as text or serialize as JSON.
//!
//! ## Tracked figures
//!
//! - events processed and duplicates seen (with duplicate percentage)
//! - latest progress fraction and whether the threshold was reached
//! - events per hour of day (UTC)
//! - events per product, keyed by the raw product name
//! - events per product and action type
//!
//! Products are kept under their own names. Any mapping onto fixed display
//! slots belongs to the renderer.

use std::collections::BTreeMap;

use colored::Colorize;
use serde::Serialize;

use crate::driver::{Outcome, OutcomeSink};
use crate::models::ActionType;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductActivity {
    pub events: u64,
    pub actions: BTreeMap<ActionType, u64>,
}

impl ProductActivity {
    /// Most frequent action for this product; ties go to the lower ordinal
    pub fn top_action(&self) -> Option<(ActionType, u64)> {
        self.actions
            .iter()
            .fold(None, |best: Option<(ActionType, u64)>, (action, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((*action, *count)),
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    #[serde(rename = "eventsProcessed")]
    pub events_processed: u64,
    pub duplicates: u64,
    pub progress: f64,
    #[serde(rename = "thresholdReached")]
    pub threshold_reached: bool,
    pub completed: bool,
    #[serde(rename = "eventsPerHour")]
    pub events_per_hour: [u64; 24],
    pub products: BTreeMap<String, ProductActivity>,
}

impl Default for ActivityReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityReport {
    pub fn new() -> Self {
        Self {
            events_processed: 0,
            duplicates: 0,
            progress: 0.0,
            threshold_reached: false,
            completed: false,
            events_per_hour: [0; 24],
            products: BTreeMap::new(),
        }
    }

    /// Duplicates as a percentage of unique events
    pub fn duplicate_percentage(&self) -> f64 {
        if self.events_processed == 0 {
            return 0.0;
        }
        self.duplicates as f64 / self.events_processed as f64 * 100.0
    }

    pub fn busiest_hour(&self) -> Option<(usize, u64)> {
        self.events_per_hour
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .fold(None, |best: Option<(usize, u64)>, (hour, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((hour, *count)),
            })
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}\n", "Event Activity Report".bold().blue()));
        out.push_str(&format!("{}\n", "=".repeat(40)));
        out.push_str(&format!(
            "Events processed: {}\n",
            self.events_processed.to_string().green()
        ));
        out.push_str(&format!(
            "Duplicates:       {} ({:.2}%)\n",
            self.duplicates.to_string().yellow(),
            self.duplicate_percentage()
        ));
        out.push_str(&format!("Progress:         {:.1}%\n", self.progress * 100.0));
        if self.threshold_reached {
            out.push_str(&format!("{}\n", "Threshold reached".green()));
        }

        out.push_str(&format!("\n{}\n", "Events per hour (UTC)".bold()));
        let max = self.events_per_hour.iter().copied().max().unwrap_or(0);
        for (hour, count) in self.events_per_hour.iter().enumerate() {
            let width = if max == 0 { 0 } else { (*count * 30 / max) as usize };
            out.push_str(&format!("{:02}h {:>8} {}\n", hour, count, "#".repeat(width).cyan()));
        }

        out.push_str(&format!("\n{}\n", "Products".bold()));
        for (name, activity) in &self.products {
            let share = if self.events_processed == 0 {
                0.0
            } else {
                activity.events as f64 / self.events_processed as f64 * 100.0
            };
            out.push_str(&format!(
                "  {:<20} {:>8} ({:.1}%)",
                name.magenta(),
                activity.events,
                share
            ));
            if let Some((action, count)) = activity.top_action() {
                out.push_str(&format!("  top: {} ({})", action.tag(), count));
            }
            out.push('\n');
        }

        out
    }
}

impl OutcomeSink for ActivityReport {
    fn emit(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::NewRecord { record, progress } => {
                self.events_processed += 1;
                self.progress = progress;
                self.events_per_hour[record.hour_of_day() as usize] += 1;

                let product = self.products.entry(record.product_name).or_default();
                product.events += 1;
                *product.actions.entry(record.action_type).or_insert(0) += 1;
            }
            Outcome::Duplicate { progress } => {
                self.duplicates += 1;
                self.progress = progress;
            }
            Outcome::ThresholdReached => {
                self.threshold_reached = true;
            }
            Outcome::RunComplete { progress } => {
                self.progress = progress;
                self.completed = true;
            }
        }
    }
}
