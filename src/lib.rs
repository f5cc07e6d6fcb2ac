// Layerbridge - Batch automation bridge for a connected document editor
// Copyright (c) 2025 Layerbridge Contributors
// Licensed under the MIT License

//! # layerbridge
//!
//! layerbridge drives a document editor plugin over a single WebSocket
//! connection. The plugin dials in; layerbridge correlates requests with
//! replies, resolves human-readable layer paths against the live layer tree
//! and replays a saved strategy over a data table, one atomic unit per row.
//!
//! ## Overview
//!
//! - **Connection**: one active plugin session; a new one supersedes the old
//! - **Correlation**: every request carries an id; its handler fires exactly
//!   once, with the reply or a synthesized failure
//! - **Resolution**: `Root > Card > Title` paths become a layer id plus the
//!   chain of enclosing smart objects
//! - **Atomic execution**: edits and exports run on an isolated working copy
//! - **Batches and workflows**: rows run strictly in order; documents are
//!   opened, processed and closed without saving
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Path resolution, atomic execution, batches and workflows
//! - [`adapters`] - The plugin connection and the host abstraction
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use layerbridge::adapters::peer::{ConnectionManager, PeerClient, PeerServer};
//! use layerbridge::config::load_config_or_default;
//! use layerbridge::core::batch::{BatchEngine, BatchOptions, LogProgress};
//! use layerbridge::domain::{BatchRow, StrategyDocument};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config_or_default("layerbridge.toml")?;
//!     let manager = ConnectionManager::from_config(&config.server);
//!     let server = PeerServer::start(&config.server, manager.clone()).await?;
//!
//!     manager.wait_for_peer(Duration::from_secs(60)).await;
//!
//!     let strategy = StrategyDocument::from_json(&std::fs::read_to_string("strategy.json")?)?;
//!     let rows = vec![BatchRow::new().with_value("1", "Hello")];
//!
//!     let engine = BatchEngine::new(
//!         Arc::new(PeerClient::new(manager)),
//!         BatchOptions::from_config(&config.batch),
//!     );
//!     let summary = engine.run(&strategy, &rows, &LogProgress).await?;
//!     println!("{}/{} rows succeeded", summary.succeeded, summary.total);
//!
//!     server.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`], whose error is
//! [`domain::BridgeError`]. Transport failures are [`domain::PeerError`] and
//! convert with `?`.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
