//! Batch progress reporting

use serde::Serialize;
use std::fmt;

/// Status tag of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Started,
    Processing,
    Success,
    Error,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Started => "started",
            ProgressStatus::Processing => "processing",
            ProgressStatus::Success => "success",
            ProgressStatus::Error => "error",
            ProgressStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Current row (0 before the first row)
    pub current: usize,
    pub total: usize,
    pub status: ProgressStatus,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize, status: ProgressStatus, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            status,
            message: message.into(),
        }
    }
}

/// Receiver of batch progress
///
/// Implemented for any `Fn(&ProgressEvent)`, so closures can be passed
/// directly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, event: &ProgressEvent) {
        tracing::info!(
            current = event.current,
            total = event.total,
            status = %event.status,
            "{}",
            event.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: &ProgressEvent| seen.lock().unwrap().push(event.status);
        sink.report(&ProgressEvent::new(0, 2, ProgressStatus::Started, "go"));
        sink.report(&ProgressEvent::new(2, 2, ProgressStatus::Completed, "done"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ProgressStatus::Started, ProgressStatus::Completed]
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let event = ProgressEvent::new(1, 2, ProgressStatus::Processing, "row 1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "processing");
    }
}
