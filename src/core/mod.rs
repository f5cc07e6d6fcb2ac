//! Core business logic for layerbridge.
//!
//! # Modules
//!
//! - [`resolve`] - Layer path resolution against a fetched tree
//! - [`atomic`] - Atomic execution of edit-and-export bundles
//! - [`batch`] - Row-by-row replay of a strategy document
//! - [`workflow`] - Sequencing batches across documents
//!
//! # Batch Workflow
//!
//! 1. **Validate**: Check the strategy's group numbering
//! 2. **Fetch**: Read one fresh layer tree from the peer
//! 3. **Resolve**: Turn every operation path into a layer id and container chain
//! 4. **Dispatch**: Send one atomic unit per row, strictly in order
//! 5. **Report**: Emit progress events and a batch summary
//!
//! # Example
//!
//! ```rust,no_run
//! use layerbridge::adapters::peer::{ConnectionManager, PeerClient};
//! use layerbridge::core::batch::{BatchEngine, BatchOptions, LogProgress};
//! use layerbridge::domain::{BatchRow, StrategyDocument};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(strategy: StrategyDocument) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConnectionManager::new(Duration::from_secs(10), true);
//! let client = PeerClient::new(manager);
//!
//! let engine = BatchEngine::new(Arc::new(client), BatchOptions::default());
//! let rows = vec![BatchRow::new().with_value("1", "Hello")];
//! let summary = engine.run(&strategy, &rows, &LogProgress).await?;
//!
//! println!("{}/{} rows succeeded", summary.succeeded, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod batch;
pub mod resolve;
pub mod workflow;
