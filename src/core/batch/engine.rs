//! Batch data engine
//!
//! Replays a strategy over a table of rows. One layer tree is fetched per
//! batch and every operation path is resolved once against it; rows are then
//! dispatched strictly one after another, each as a single atomic unit.

use super::progress::{ProgressEvent, ProgressSink, ProgressStatus};
use super::substitute::{
    document_stem, render_filename, substitute_image_path, substitute_text,
    DEFAULT_DOCUMENT_NAME, TIMESTAMP_FORMAT,
};
use super::summary::{BatchSummary, SkippedOperation};
use crate::adapters::host::DocumentHost;
use crate::adapters::peer::client::{normalize_format, normalize_path};
use crate::config::BatchConfig;
use crate::core::atomic::AtomicExecutor;
use crate::core::resolve::{TreeSnapshot, DEFAULT_MAX_DEPTH};
use crate::domain::{
    AtomicRequest, BatchRow, BridgeError, LayerId, LayerKind, OperationAction, OperationPayload,
    OperationSpec, PeerError, RenderPreset, RenderSpec, Result, StrategyDocument, TaskResult,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Settings for one batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Literal first segment of every path
    pub root_token: String,
    /// Depth bound for path resolution
    pub max_depth: usize,
    /// Upper bound for one row's atomic call
    pub row_timeout: Duration,
    /// Upper bound for the tree fetch
    pub tree_timeout: Duration,
    /// Ask the peer to keep working copies
    pub debug: bool,
    /// Name used for `{doc}` in filename templates
    pub document_name: Option<String>,
    /// Document the peer should activate before each row
    pub target_document: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            root_token: "Root".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            row_timeout: Duration::from_secs(120),
            tree_timeout: Duration::from_secs(10),
            debug: false,
            document_name: None,
            target_document: None,
        }
    }
}

impl BatchOptions {
    /// Options from the `[batch]` section
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            root_token: config.root_token.clone(),
            max_depth: config.max_depth,
            row_timeout: Duration::from_secs(config.row_timeout_secs),
            tree_timeout: Duration::from_secs(config.tree_timeout_secs),
            debug: config.debug,
            document_name: None,
            target_document: None,
        }
    }

    /// Sets the `{doc}` name
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }

    /// Sets the target document hint
    pub fn with_target_document(mut self, name: impl Into<String>) -> Self {
        self.target_document = Some(name.into());
        self
    }
}

/// An operation whose path resolved against the batch tree
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedOperation {
    pub layer_id: LayerId,
    pub parent_chain: Vec<LayerId>,
    pub group: Option<u32>,
    pub payload: OperationPayload,
}

impl PreparedOperation {
    /// Concrete operation for one row
    pub fn for_row(&self, row: &BatchRow) -> OperationSpec {
        let action = match &self.payload {
            OperationPayload::UpdateTextLayer { text, regex_steps } => {
                OperationAction::UpdateTextLayer {
                    text: substitute_text(text, self.group, regex_steps, row),
                }
            }
            OperationPayload::ReplaceImage { image_path } => OperationAction::ReplaceImage {
                image_path: substitute_image_path(image_path, self.group, row),
            },
            OperationPayload::ApplyFilter {
                filter_type,
                params,
            } => OperationAction::ApplyFilter {
                filter_type: filter_type.clone(),
                params: params.clone(),
            },
            OperationPayload::BatchPlay { descriptors } => OperationAction::BatchPlay {
                descriptors: descriptors.clone(),
            },
        };

        OperationSpec {
            layer_id: self.layer_id,
            parent_chain: self.parent_chain.clone(),
            group: self.group,
            action,
        }
    }
}

/// Resolves every operation of `strategy` against `snapshot`
///
/// Unresolvable paths and `apply_filter` on anything but a smart object are
/// dropped and reported; the remaining operations keep strategy order.
pub fn prepare_operations(
    strategy: &StrategyDocument,
    snapshot: &mut TreeSnapshot,
) -> (Vec<PreparedOperation>, Vec<SkippedOperation>) {
    let mut prepared = Vec::new();
    let mut skipped = Vec::new();

    for (index, op) in strategy.operations.iter().enumerate() {
        let position = index + 1;
        if op.target_path.trim().is_empty() {
            tracing::debug!(position, "Skipping operation without a target path");
            skipped.push(SkippedOperation {
                position,
                target_path: String::new(),
                reason: "empty target path".to_string(),
            });
            continue;
        }
        let resolution = snapshot.resolve(&op.target_path);

        let (Some(layer_id), Some(kind)) = (resolution.layer_id, resolution.kind) else {
            let err = BridgeError::PathResolution(format!(
                "'{}' not found in the layer tree",
                op.target_path
            ));
            tracing::warn!(
                position,
                target_path = %op.target_path,
                operation = op.payload.type_name(),
                "Dropping operation: {err}"
            );
            skipped.push(SkippedOperation {
                position,
                target_path: op.target_path.clone(),
                reason: err.to_string(),
            });
            continue;
        };

        if matches!(op.payload, OperationPayload::ApplyFilter { .. })
            && kind != LayerKind::SmartObject
        {
            let err = BridgeError::SafetyViolation(format!(
                "apply_filter needs a SMARTOBJECT, '{}' is {kind}",
                op.target_path
            ));
            tracing::warn!(position, target_path = %op.target_path, "Dropping operation: {err}");
            skipped.push(SkippedOperation {
                position,
                target_path: op.target_path.clone(),
                reason: err.to_string(),
            });
            continue;
        }

        prepared.push(PreparedOperation {
            layer_id,
            parent_chain: resolution.parent_chain,
            group: op.group,
            payload: op.payload.clone(),
        });
    }

    (prepared, skipped)
}

/// Export requests of one row
pub fn build_renders(
    presets: &[RenderPreset],
    snapshot: &mut TreeSnapshot,
    row: &BatchRow,
    index: usize,
    document_name: &str,
    timestamp: &str,
) -> Vec<RenderSpec> {
    presets
        .iter()
        .map(|preset| {
            let root_ids = preset
                .root_layers
                .iter()
                .filter_map(|path| {
                    let id = snapshot.resolve(path).layer_id;
                    if id.is_none() {
                        tracing::warn!(path = %path, "Render root layer not found; ignored");
                    }
                    id
                })
                .collect();

            RenderSpec {
                folder: normalize_path(&preset.output_path),
                file_name: render_filename(&preset.filename, row, index, document_name, timestamp),
                format: normalize_format(&preset.format),
                root_ids,
                tiling: preset.tiling.enabled,
                width: preset.tiling.width,
                height: preset.tiling.height,
                resolution: preset.tiling.ppi,
                filters: preset.filters.clone(),
            }
        })
        .collect()
}

/// Drives a strategy over a row table
pub struct BatchEngine {
    host: Arc<dyn DocumentHost>,
    executor: AtomicExecutor,
    options: BatchOptions,
    stop: Option<watch::Receiver<bool>>,
}

impl BatchEngine {
    /// Create a new engine
    pub fn new(host: Arc<dyn DocumentHost>, options: BatchOptions) -> Self {
        Self {
            executor: AtomicExecutor::new(host.clone()),
            host,
            options,
            stop: None,
        }
    }

    /// Attach a stop signal
    ///
    /// Once the signal reads `true`, no further rows are dispatched; a row
    /// already sent to the peer always runs to completion.
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Settings in use
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Fetches the layer tree used by a whole batch
    pub async fn fetch_snapshot(&self) -> Result<TreeSnapshot> {
        if !self.host.is_connected() {
            return Err(PeerError::NotConnected.into());
        }
        let tree = tokio::time::timeout(self.options.tree_timeout, self.host.fetch_tree())
            .await
            .map_err(|_| PeerError::Timeout("get_layers".to_string()))??;
        tracing::debug!(roots = tree.len(), "Fetched layer tree");
        Ok(TreeSnapshot::new(
            tree,
            self.options.root_token.clone(),
            self.options.max_depth,
        ))
    }

    /// Runs `strategy` over `rows`
    ///
    /// # Errors
    ///
    /// Fails before any row runs if the strategy is invalid, no peer is
    /// connected or the tree cannot be fetched. Row failures never fail the
    /// batch; they are recorded in the summary.
    pub async fn run(
        &self,
        strategy: &StrategyDocument,
        rows: &[BatchRow],
        progress: &dyn ProgressSink,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();
        strategy.validate()?;

        let mut snapshot = self.fetch_snapshot().await?;
        let (operations, skipped) = prepare_operations(strategy, &mut snapshot);

        let total = rows.len();
        let mut summary = BatchSummary::new(total);
        for skip in skipped {
            summary.add_skipped(skip);
        }

        let document_name = self
            .options
            .document_name
            .as_deref()
            .map(document_stem)
            .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string());

        tracing::info!(
            rows = total,
            operations = operations.len(),
            skipped_operations = summary.skipped_operations.len(),
            renders = strategy.renders.len(),
            "Starting batch"
        );
        progress.report(&ProgressEvent::new(
            0,
            total,
            ProgressStatus::Started,
            "Batch started",
        ));

        for (offset, row) in rows.iter().enumerate() {
            let index = offset + 1;

            if self.stop_requested() {
                summary.cancelled = true;
                tracing::warn!(
                    next_row = index,
                    remaining = total - offset,
                    "Stop requested; remaining rows not scheduled"
                );
                break;
            }

            progress.report(&ProgressEvent::new(
                index,
                total,
                ProgressStatus::Processing,
                format!("Processing row {index}/{total}"),
            ));

            let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
            let request = AtomicRequest {
                operations: operations.iter().map(|op| op.for_row(row)).collect(),
                renders: build_renders(
                    &strategy.renders,
                    &mut snapshot,
                    row,
                    index,
                    &document_name,
                    &timestamp,
                ),
                debug: self.options.debug,
                target_document: self.options.target_document.clone(),
            };

            let outcome =
                match tokio::time::timeout(self.options.row_timeout, self.executor.execute(request))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(PeerError::Timeout(format!("execute_atomic (row {index})"))),
                };

            match outcome {
                Ok(exports) => {
                    tracing::info!(row = index, exports = exports.len(), "Row succeeded");
                    summary.record(TaskResult::ok(index));
                    progress.report(&ProgressEvent::new(
                        index,
                        total,
                        ProgressStatus::Success,
                        format!("Row {index} succeeded"),
                    ));
                }
                Err(e) => {
                    tracing::warn!(row = index, error = %e, "Row failed");
                    summary.record(TaskResult::error(index, e.to_string()));
                    progress.report(&ProgressEvent::new(
                        index,
                        total,
                        ProgressStatus::Error,
                        format!("Row {index} failed: {e}"),
                    ));
                }
            }
        }

        progress.report(&ProgressEvent::new(
            total,
            total,
            ProgressStatus::Completed,
            format!("Completed: {}/{} succeeded", summary.succeeded, total),
        ));

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LayerNode, OperationTemplate, RegexStep};
    use serde_json::json;

    fn tree() -> Vec<LayerNode> {
        vec![
            LayerNode::text(1, "T1", "a"),
            LayerNode::text(2, "T2", "b"),
            LayerNode::new(3, "Photo", LayerKind::Pixel),
            LayerNode::smart_object(10, "Card", vec![LayerNode::text(44, "Title", "c")]),
        ]
    }

    fn op(path: &str, group: Option<u32>, payload: OperationPayload) -> OperationTemplate {
        OperationTemplate {
            target_path: path.to_string(),
            group,
            payload,
        }
    }

    #[test]
    fn test_prepare_drops_unresolved_and_unsafe_filters() {
        let mut strategy = StrategyDocument::new();
        strategy.operations = vec![
            op(
                "Root > T1",
                Some(1),
                OperationPayload::UpdateTextLayer {
                    text: String::new(),
                    regex_steps: vec![],
                },
            ),
            op(
                "Root > Missing",
                Some(1),
                OperationPayload::UpdateTextLayer {
                    text: String::new(),
                    regex_steps: vec![],
                },
            ),
            op(
                "Root > Photo",
                None,
                OperationPayload::ApplyFilter {
                    filter_type: "gaussianBlur".to_string(),
                    params: json!({"radius": 2}),
                },
            ),
            op(
                "Root > Card",
                None,
                OperationPayload::ApplyFilter {
                    filter_type: "gaussianBlur".to_string(),
                    params: json!({"radius": 2}),
                },
            ),
        ];

        let mut snapshot = TreeSnapshot::new(tree(), "Root", 16);
        let (prepared, skipped) = prepare_operations(&strategy, &mut snapshot);

        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].layer_id, LayerId::new(1));
        assert_eq!(prepared[1].layer_id, LayerId::new(10));

        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].position, 2);
        assert!(skipped[0].reason.starts_with("Path resolution failed"));
        assert_eq!(skipped[1].position, 3);
        assert!(skipped[1].reason.starts_with("Safety violation"));
    }

    #[test]
    fn test_shared_group_operations_each_apply_own_steps() {
        let mut strategy = StrategyDocument::new();
        strategy.operations = vec![
            op(
                "Root > T1",
                Some(1),
                OperationPayload::UpdateTextLayer {
                    text: String::new(),
                    regex_steps: vec![RegexStep {
                        find: "X".to_string(),
                        replace: "x!".to_string(),
                    }],
                },
            ),
            op(
                "Root > T2",
                Some(1),
                OperationPayload::UpdateTextLayer {
                    text: String::new(),
                    regex_steps: vec![RegexStep {
                        find: "^(.*)$".to_string(),
                        replace: "[$1]".to_string(),
                    }],
                },
            ),
        ];

        let mut snapshot = TreeSnapshot::new(tree(), "Root", 16);
        let (prepared, _) = prepare_operations(&strategy, &mut snapshot);
        let row = BatchRow::new().with_value("1", "X");
        let specs: Vec<OperationSpec> = prepared.iter().map(|p| p.for_row(&row)).collect();

        assert_eq!(
            specs[0].action,
            OperationAction::UpdateTextLayer {
                text: "x!".to_string()
            }
        );
        assert_eq!(
            specs[1].action,
            OperationAction::UpdateTextLayer {
                text: "[X]".to_string()
            }
        );
    }

    #[test]
    fn test_same_path_operations_kept_in_order() {
        let mut strategy = StrategyDocument::new();
        strategy.operations = vec![
            op(
                "Root > Card",
                None,
                OperationPayload::ApplyFilter {
                    filter_type: "emboss".to_string(),
                    params: json!({}),
                },
            ),
            op(
                "Root > Card",
                None,
                OperationPayload::BatchPlay {
                    descriptors: vec![json!({"_obj": "flattenImage"})],
                },
            ),
        ];

        let mut snapshot = TreeSnapshot::new(tree(), "Root", 16);
        let (prepared, skipped) = prepare_operations(&strategy, &mut snapshot);
        assert!(skipped.is_empty());
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].payload.type_name(), "apply_filter");
        assert_eq!(prepared[1].payload.type_name(), "batch_play");
        assert_eq!(snapshot.cached_paths(), 1);
    }

    #[test]
    fn test_build_renders_resolves_roots_and_names() {
        let preset: RenderPreset = serde_json::from_value(json!({
            "filename": "{doc}_{index}",
            "output_path": "D:\\out",
            "format": "JPEG",
            "root_layers": ["Root > Card", "Root > Gone"],
            "tiling": {"enabled": true, "width": 800, "height": 600, "ppi": 72}
        }))
        .unwrap();

        let mut snapshot = TreeSnapshot::new(tree(), "Root", 16);
        let row = BatchRow::new();
        let renders = build_renders(&[preset], &mut snapshot, &row, 2, "poster", "01010000");

        assert_eq!(renders.len(), 1);
        let render = &renders[0];
        assert_eq!(render.folder, "D:/out");
        assert_eq!(render.file_name, "poster_2");
        assert_eq!(render.format, "jpg");
        assert_eq!(render.root_ids, vec![LayerId::new(10)]);
        assert!(render.tiling);
        assert_eq!((render.width, render.height, render.resolution), (800, 600, 72));
    }
}
