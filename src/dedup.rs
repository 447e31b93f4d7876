//! Deduplication of event identifiers
//!
//! A [`Deduplicator`] belongs to exactly one ingestion run. Its set of seen
//! identifiers only grows; a fresh run starts from a fresh instance.
//! Identifiers are compared byte for byte, with no normalization.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    New,
    Duplicate,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, reporting whether it had been seen before in this run
    pub fn observe(&mut self, id: &str) -> Observation {
        if self.seen.contains(id) {
            return Observation::Duplicate;
        }
        self.seen.insert(id.to_owned());
        Observation::New
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of distinct identifiers observed
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
