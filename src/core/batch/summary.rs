//! Batch summary and reporting

use crate::domain::TaskResult;
use serde::Serialize;
use std::time::Duration;

/// An operation dropped before the first row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedOperation {
    /// Position in the strategy, 1-based
    pub position: usize,
    pub target_path: String,
    pub reason: String,
}

/// Outcome of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Rows in the input table
    pub total: usize,

    /// Rows whose atomic call succeeded
    pub succeeded: usize,

    /// Rows that failed, timeouts included
    pub failed: usize,

    /// One result per dispatched row, in row order
    pub results: Vec<TaskResult>,

    /// Operations dropped during resolution
    pub skipped_operations: Vec<SkippedOperation>,

    /// Whether a stop signal truncated the queue
    pub cancelled: bool,

    /// Wall time of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl BatchSummary {
    /// Create an empty summary for `total` rows
    pub fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            failed: 0,
            results: Vec::new(),
            skipped_operations: Vec::new(),
            cancelled: false,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a row result
    pub fn record(&mut self, result: TaskResult) {
        if result.is_ok() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Record a dropped operation
    pub fn add_skipped(&mut self, skipped: SkippedOperation) {
        self.skipped_operations.push(skipped);
    }

    /// Rows never dispatched because of a stop signal
    pub fn not_started(&self) -> usize {
        self.total - self.results.len()
    }

    /// Every row ran and succeeded
    pub fn is_successful(&self) -> bool {
        self.succeeded == self.total
    }

    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.total as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failed,
            not_started = self.not_started(),
            skipped_operations = self.skipped_operations.len(),
            cancelled = self.cancelled,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        for result in self.results.iter().filter(|r| !r.is_ok()) {
            tracing::warn!(
                row = result.index,
                error = result.error.as_deref().unwrap_or_default(),
                "Row failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new(3);
        summary.record(TaskResult::ok(1));
        summary.record(TaskResult::error(2, "boom"));

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.not_started(), 1);
        assert!(!summary.is_successful());
        assert!((summary.success_rate() - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_empty_summary_is_successful() {
        let summary = BatchSummary::new(0).with_duration(Duration::from_secs(1));
        assert!(summary.is_successful());
        assert_eq!(summary.success_rate(), 100.0);
        assert_eq!(summary.duration, Duration::from_secs(1));
    }
}
