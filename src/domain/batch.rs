//! Data rows and per-row results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Row key carrying an explicit output filename
pub const OUTPUT_FILENAME_KEY: &str = "output_filename";

/// One row of the data table
///
/// On the wire a row is a flat JSON object mapping group-index strings to
/// values, e.g. `{"1": "Hello", "2": "C:/img/a.png", "output_filename": "a"}`.
/// Non-string scalars are stringified; nulls are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct BatchRow {
    values: BTreeMap<String, String>,
    output_filename: Option<String>,
}

impl BatchRow {
    /// Creates an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for a group key
    pub fn with_value(mut self, group: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(group.into(), value.into());
        self
    }

    /// Sets an explicit output filename
    pub fn with_output_filename(mut self, filename: impl Into<String>) -> Self {
        self.output_filename = Some(filename.into());
        self
    }

    /// Value bound to a group key
    pub fn value(&self, group: &str) -> Option<&str> {
        self.values.get(group).map(String::as_str)
    }

    /// Explicit filename override, if non-empty
    pub fn output_filename(&self) -> Option<&str> {
        self.output_filename.as_deref().filter(|name| !name.is_empty())
    }

    /// All group values
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl From<BTreeMap<String, Value>> for BatchRow {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut row = BatchRow::new();
        for (key, value) in raw {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            if key == OUTPUT_FILENAME_KEY {
                row.output_filename = Some(text);
            } else {
                row.values.insert(key, text);
            }
        }
        row
    }
}

impl From<BatchRow> for BTreeMap<String, Value> {
    fn from(row: BatchRow) -> Self {
        let mut map: BTreeMap<String, Value> = row
            .values
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        if let Some(filename) = row.output_filename {
            map.insert(OUTPUT_FILENAME_KEY.to_string(), Value::String(filename));
        }
        map
    }
}

/// Outcome of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Atomic unit and every export succeeded
    Ok,
    /// Anything else, timeouts included
    Error,
}

/// Result recorded for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// 1-based row index
    pub index: usize,
    /// Outcome
    pub status: TaskStatus,
    /// Error text when the row failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    /// Successful row
    pub fn ok(index: usize) -> Self {
        Self {
            index,
            status: TaskStatus::Ok,
            error: None,
        }
    }

    /// Failed row
    pub fn error(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            status: TaskStatus::Error,
            error: Some(error.into()),
        }
    }

    /// Whether the row succeeded
    pub fn is_ok(&self) -> bool {
        self.status == TaskStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_json_object() {
        let row: BatchRow =
            serde_json::from_str(r#"{"1": "Hello", "2": 42, "3": null, "output_filename": "card_a"}"#)
                .unwrap();

        assert_eq!(row.value("1"), Some("Hello"));
        assert_eq!(row.value("2"), Some("42"));
        assert_eq!(row.value("3"), None);
        assert_eq!(row.output_filename(), Some("card_a"));
        assert_eq!(row.values().len(), 2);
    }

    #[test]
    fn test_empty_output_filename_is_ignored() {
        let row: BatchRow = serde_json::from_str(r#"{"1": "x", "output_filename": ""}"#).unwrap();
        assert_eq!(row.output_filename(), None);
    }

    #[test]
    fn test_row_serializes_flat() {
        let row = BatchRow::new()
            .with_value("1", "Hello")
            .with_output_filename("out");
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, serde_json::json!({"1": "Hello", "output_filename": "out"}));
    }

    #[test]
    fn test_task_result_serialization() {
        let ok = serde_json::to_value(TaskResult::ok(1)).unwrap();
        assert_eq!(ok, serde_json::json!({"index": 1, "status": "ok"}));

        let err = TaskResult::error(2, "Request timeout: execute_atomic");
        assert!(!err.is_ok());
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "Request timeout: execute_atomic");
    }
}
