//! Strategy command implementation
//!
//! Reads, writes or clears the strategy document stored inside the active
//! document.

use super::{connect_peer, load_or_report, read_input};
use crate::domain::StrategyDocument;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the strategy command
#[derive(Args, Debug)]
pub struct StrategyArgs {
    #[command(subcommand)]
    pub action: StrategyAction,

    /// Seconds to wait for the plugin to connect
    #[arg(long, default_value_t = 60, global = true)]
    pub connect_timeout_secs: u64,
}

/// Strategy operations
#[derive(Subcommand, Debug)]
pub enum StrategyAction {
    /// Print the stored strategy, or write it to a file
    Read {
        /// Output file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Store a strategy document
    Write {
        /// Strategy document (JSON)
        file: PathBuf,
    },

    /// Remove the stored strategy
    Clear,
}

impl StrategyArgs {
    /// Execute the strategy command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let Some(config) = load_or_report(config_path) else {
            return Ok(2);
        };

        let to_write = match &self.action {
            StrategyAction::Write { file } => {
                let Some(json) = read_input(file, "strategy") else {
                    return Ok(2);
                };
                match StrategyDocument::from_json(&json).and_then(|s| s.validate().map(|_| s)) {
                    Ok(strategy) => Some(strategy),
                    Err(e) => {
                        println!("❌ {e}");
                        return Ok(2);
                    }
                }
            }
            _ => None,
        };

        let Some(session) = connect_peer(
            &config,
            Duration::from_secs(self.connect_timeout_secs),
            shutdown_signal.clone(),
        )
        .await
        else {
            return Ok(if *shutdown_signal.borrow() { 130 } else { 4 });
        };

        let outcome = match &self.action {
            StrategyAction::Read { output } => match session.client.read_strategy().await {
                Ok(Some(strategy)) => {
                    let json = serde_json::to_string_pretty(&strategy)?;
                    match output {
                        Some(path) => {
                            std::fs::write(path, json)?;
                            println!("✅ Strategy written to {}", path.display());
                        }
                        None => println!("{json}"),
                    }
                    Ok(())
                }
                Ok(None) => {
                    println!("ℹ️  The active document has no stored strategy");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            StrategyAction::Write { .. } => {
                let result = session.client.write_strategy(to_write).await;
                if result.is_ok() {
                    println!("✅ Strategy stored in the active document");
                }
                result
            }
            StrategyAction::Clear => {
                let result = session.client.write_strategy(None).await;
                if result.is_ok() {
                    println!("✅ Stored strategy cleared");
                }
                result
            }
        };
        session.close().await;

        match outcome {
            Ok(()) => Ok(0),
            Err(e) => {
                tracing::error!(error = %e, "Strategy command failed");
                println!("❌ {e}");
                Ok(1)
            }
        }
    }
}
