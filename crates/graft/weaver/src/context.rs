//! Batch-wide weaving state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a weaving batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one job at the engine boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    /// Not attempted because the batch had already failed.
    Skipped,
    /// Stopped by the terminate strategy.
    Aborted,
    /// Stopped by an unexpected error.
    Faulted,
}

/// Per-outcome job counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub completed: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub faulted: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.aborted + self.faulted
    }
}

/// State shared by every job of one batch.
///
/// The errored flag is sticky: once a job aborts or faults, every later
/// job is skipped.
#[derive(Debug)]
pub struct BatchContext {
    id: BatchId,
    started_at: DateTime<Utc>,
    errored: bool,
    stats: BatchStats,
}

impl BatchContext {
    pub fn new() -> Self {
        Self {
            id: BatchId::new(),
            started_at: Utc::now(),
            errored: false,
            stats: BatchStats::default(),
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Mark the batch as failed.
    pub fn fail(&mut self) {
        self.errored = true;
    }

    pub fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Completed => self.stats.completed += 1,
            JobOutcome::Skipped => self.stats.skipped += 1,
            JobOutcome::Aborted => {
                self.stats.aborted += 1;
                self.errored = true;
            }
            JobOutcome::Faulted => {
                self.stats.faulted += 1;
                self.errored = true;
            }
        }
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }
}

impl Default for BatchContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errored_flag_is_sticky() {
        let mut ctx = BatchContext::new();
        ctx.record(JobOutcome::Completed);
        assert!(!ctx.is_errored());

        ctx.record(JobOutcome::Aborted);
        assert!(ctx.is_errored());
        ctx.record(JobOutcome::Completed);
        assert!(ctx.is_errored());

        assert_eq!(ctx.stats().completed, 2);
        assert_eq!(ctx.stats().aborted, 1);
        assert_eq!(ctx.stats().total(), 3);
    }

    #[test]
    fn batch_ids_are_unique() {
        assert_ne!(BatchContext::new().id(), BatchContext::new().id());
    }

    #[test]
    fn outcome_serde() {
        let json = serde_json::to_string(&JobOutcome::Aborted).unwrap();
        assert_eq!(json, "\"aborted\"");
    }
}
