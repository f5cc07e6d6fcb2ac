//! Domain models and types for layerbridge.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`RequestId`], [`LayerId`], [`SessionId`])
//! - **Layer tree** ([`LayerNode`], [`LayerKind`])
//! - **Strategy documents** ([`StrategyDocument`], [`OperationTemplate`], [`RenderPreset`])
//! - **Atomic units** ([`AtomicRequest`], [`OperationSpec`], [`RenderSpec`], [`AtomicResponse`])
//! - **Rows and results** ([`BatchRow`], [`TaskResult`])
//! - **Error types** ([`BridgeError`], [`PeerError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, BridgeError>`](Result):
//!
//! ```rust
//! use layerbridge::domain::{Result, StrategyDocument};
//!
//! fn example() -> Result<()> {
//!     let strategy = StrategyDocument::from_json(r#"{"version": "1.1.0"}"#)?;
//!     strategy.validate()?;
//!     Ok(())
//! }
//! ```

pub mod atomic;
pub mod batch;
pub mod errors;
pub mod ids;
pub mod layer;
pub mod result;
pub mod strategy;

// Re-export commonly used types for convenience
pub use atomic::{
    AtomicRequest, AtomicResponse, ExportResult, OpenDocument, OperationAction, OperationSpec,
    RenderSpec,
};
pub use batch::{BatchRow, TaskResult, TaskStatus};
pub use errors::{BridgeError, PeerError};
pub use ids::{LayerId, RequestId, SessionId};
pub use layer::{EditableText, LayerKind, LayerNode};
pub use result::Result;
pub use strategy::{
    DataRequirements, FilterSpec, GroupKind, OperationPayload, OperationTemplate, RegexStep,
    RenderPreset, StrategyDocument, TilingPreset, STRATEGY_VERSION,
};
