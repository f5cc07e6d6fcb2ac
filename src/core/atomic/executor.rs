//! Atomic strategy executor
//!
//! Sends one bundle of edits plus exports to the host, which applies it to an
//! isolated working copy. The source document is never touched.

use crate::adapters::host::DocumentHost;
use crate::domain::{AtomicRequest, AtomicResponse, ExportResult, PeerError};
use std::sync::Arc;

/// Runs atomic units against a [`DocumentHost`]
#[derive(Clone)]
pub struct AtomicExecutor {
    host: Arc<dyn DocumentHost>,
}

impl AtomicExecutor {
    pub fn new(host: Arc<dyn DocumentHost>) -> Self {
        Self { host }
    }

    /// Executes one atomic unit
    ///
    /// Succeeds only when the overall status is success and every export
    /// reported success.
    ///
    /// # Errors
    ///
    /// Returns transport failures as-is, [`PeerError::Remote`] for an overall
    /// failure and [`PeerError::ExportFailed`] when any export failed.
    pub async fn execute(&self, request: AtomicRequest) -> Result<Vec<ExportResult>, PeerError> {
        tracing::debug!(
            operations = request.operations.len(),
            renders = request.renders.len(),
            debug = request.debug,
            target_document = request.target_document.as_deref().unwrap_or("<active>"),
            "Dispatching atomic unit"
        );
        let response = self.host.execute_atomic(request).await?;
        check_response(response)
    }
}

/// Applies the failure policy to a raw answer
pub fn check_response(response: AtomicResponse) -> Result<Vec<ExportResult>, PeerError> {
    if !response.is_success() {
        return Err(PeerError::Remote(
            response
                .error
                .unwrap_or_else(|| format!("atomic execution returned status '{}'", response.status)),
        ));
    }

    let failed: Vec<&ExportResult> = response.failed_exports().collect();
    if !failed.is_empty() {
        let detail = failed
            .iter()
            .map(|r| {
                format!(
                    "{}: {}",
                    r.name,
                    r.error.as_deref().unwrap_or(r.status.as_str())
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PeerError::ExportFailed {
            failed: failed.len(),
            total: response.rendered_files.len(),
            detail,
        });
    }

    Ok(response.rendered_files)
}
