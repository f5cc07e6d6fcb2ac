//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for layerbridge using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// layerbridge - batch automation for a connected document editor
#[derive(Parser, Debug)]
#[command(name = "layerbridge")]
#[command(version, about, long_about = None)]
#[command(author = "Layerbridge Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "layerbridge.toml", env = "LAYERBRIDGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LAYERBRIDGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Accept plugin connections and log their activity
    Serve(commands::serve::ServeArgs),

    /// Replay a strategy over a row table on the active document
    Batch(commands::batch::BatchArgs),

    /// Run batches across several documents
    Workflow(commands::workflow::WorkflowArgs),

    /// Read or write the strategy stored in the active document
    Strategy(commands::strategy::StrategyArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
