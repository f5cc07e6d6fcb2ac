//! Batch command implementation
//!
//! Waits for the plugin, then replays a strategy over a row table against the
//! active document.

use super::{connect_peer, load_or_report, print_progress, read_input};
use crate::adapters::host::DocumentHost;
use crate::core::batch::{BatchEngine, BatchOptions, BatchSummary};
use crate::domain::{BatchRow, BridgeError, StrategyDocument};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Strategy document (JSON)
    #[arg(short, long)]
    pub strategy: PathBuf,

    /// Row table (JSON array of objects keyed by group number)
    #[arg(short, long)]
    pub rows: PathBuf,

    /// Document name used for `{doc}` in filenames
    #[arg(long)]
    pub document_name: Option<String>,

    /// Keep the plugin's working copies for inspection
    #[arg(long)]
    pub debug: bool,

    /// Seconds to wait for the plugin to connect
    #[arg(long, default_value_t = 60)]
    pub connect_timeout_secs: u64,

    /// Write the summary as JSON to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl BatchArgs {
    /// Execute the batch command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            strategy = %self.strategy.display(),
            rows = %self.rows.display(),
            "Starting batch command"
        );

        let Some(mut config) = load_or_report(config_path) else {
            return Ok(2);
        };
        if self.debug {
            config.batch.debug = true;
        }

        let (strategy, rows) = match self.load_inputs() {
            Ok(inputs) => inputs,
            Err(e) => {
                println!("❌ {e}");
                return Ok(2);
            }
        };
        if let Err(e) = strategy.validate() {
            println!("❌ {e}");
            return Ok(2);
        }

        let Some(session) = connect_peer(
            &config,
            Duration::from_secs(self.connect_timeout_secs),
            shutdown_signal.clone(),
        )
        .await
        else {
            return Ok(if *shutdown_signal.borrow() { 130 } else { 4 });
        };

        let mut options = BatchOptions::from_config(&config.batch);
        if let Some(name) = &self.document_name {
            options = options.with_document_name(name.clone());
        }

        let host: Arc<dyn DocumentHost> = Arc::new(session.client.clone());
        let engine = BatchEngine::new(host, options).with_stop_signal(shutdown_signal);

        println!();
        let outcome = engine.run(&strategy, &rows, &print_progress).await;
        session.close().await;

        let summary = match outcome {
            Ok(summary) => summary,
            Err(e @ BridgeError::Peer(_)) => {
                tracing::error!(error = %e, "Batch could not start");
                println!("❌ Batch could not start: {e}");
                return Ok(4);
            }
            Err(e) => {
                tracing::error!(error = %e, "Batch could not start");
                println!("❌ Batch could not start: {e}");
                return Ok(2);
            }
        };

        print_summary(&summary);
        if let Some(path) = &self.summary {
            std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
            println!("📄 Summary written to {}", path.display());
        }

        Ok(exit_code(&summary))
    }

    fn load_inputs(&self) -> Result<(StrategyDocument, Vec<BatchRow>), String> {
        let strategy_json = read_input(&self.strategy, "strategy")
            .ok_or_else(|| "Cannot continue without a strategy".to_string())?;
        let strategy = StrategyDocument::from_json(&strategy_json).map_err(|e| e.to_string())?;

        let rows_json = read_input(&self.rows, "row table")
            .ok_or_else(|| "Cannot continue without rows".to_string())?;
        let rows: Vec<BatchRow> = serde_json::from_str(&rows_json)
            .map_err(|e| format!("Invalid row table {}: {e}", self.rows.display()))?;

        Ok((strategy, rows))
    }
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("📊 Batch Summary");
    println!("  Rows: {}", summary.total);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    if summary.cancelled {
        println!("  Not started: {}", summary.not_started());
    }
    if !summary.skipped_operations.is_empty() {
        println!("  Skipped operations: {}", summary.skipped_operations.len());
        for skipped in &summary.skipped_operations {
            println!(
                "    #{} {}: {}",
                skipped.position, skipped.target_path, skipped.reason
            );
        }
    }
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
    println!("  Success rate: {:.1}%", summary.success_rate());

    for result in summary.results.iter().filter(|r| !r.is_ok()) {
        println!(
            "  ❌ Row {}: {}",
            result.index,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

/// Exit code for a finished batch
pub fn exit_code(summary: &BatchSummary) -> i32 {
    if summary.cancelled {
        130
    } else if summary.is_successful() {
        0
    } else {
        1
    }
}
