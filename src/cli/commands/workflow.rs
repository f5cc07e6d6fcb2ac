//! Workflow command implementation
//!
//! Runs a batch against each document of a task file, opening and closing the
//! documents through the plugin.

use super::{connect_peer, load_or_report, print_progress, read_input};
use crate::adapters::host::DocumentHost;
use crate::core::workflow::{
    DocumentStatus, WorkflowOptions, WorkflowOrchestrator, WorkflowSummary, WorkflowTask,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the workflow command
#[derive(Args, Debug)]
pub struct WorkflowArgs {
    /// Task file: JSON array of {document_path, strategy, rows}
    #[arg(short, long)]
    pub tasks: PathBuf,

    /// Seconds to wait for the plugin to connect
    #[arg(long, default_value_t = 60)]
    pub connect_timeout_secs: u64,
}

impl WorkflowArgs {
    /// Execute the workflow command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(tasks = %self.tasks.display(), "Starting workflow command");

        let Some(config) = load_or_report(config_path) else {
            return Ok(2);
        };

        let Some(json) = read_input(&self.tasks, "task file") else {
            return Ok(2);
        };
        let tasks = match WorkflowTask::list_from_json(&json) {
            Ok(tasks) => tasks,
            Err(e) => {
                println!("❌ {e}");
                return Ok(2);
            }
        };
        for task in &tasks {
            if let Err(e) = task.strategy.validate() {
                println!("❌ {}: {e}", task.document_path);
                return Ok(2);
            }
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

        let host: Arc<dyn DocumentHost> = Arc::new(session.client.clone());
        let orchestrator = WorkflowOrchestrator::new(
            host,
            WorkflowOptions::from_config(&config.workflow, &config.batch),
        )
        .with_stop_signal(shutdown_signal);

        println!();
        let summary = orchestrator.run(&tasks, &print_progress).await;
        session.close().await;

        print_summary(&summary);
        Ok(exit_code(&summary))
    }
}

fn print_summary(summary: &WorkflowSummary) {
    println!();
    println!("📊 Workflow Summary");
    println!("  Documents: {}", summary.documents.len());
    println!("  Completed: {}", summary.completed());
    println!("  Failed: {}", summary.failed());
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());

    for document in &summary.documents {
        match (document.status, &document.summary, &document.error) {
            (DocumentStatus::Completed, Some(batch), _) => println!(
                "  ✅ {}: {}/{} rows",
                document.document, batch.succeeded, batch.total
            ),
            (DocumentStatus::Skipped, _, _) => println!("  ⏭️  {}: not started", document.document),
            (_, _, error) => println!(
                "  ❌ {}: {}",
                document.document,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Exit code for a finished workflow
pub fn exit_code(summary: &WorkflowSummary) -> i32 {
    if summary.cancelled {
        130
    } else if summary.is_successful() {
        0
    } else {
        1
    }
}
