//! Configuration management for layerbridge.
//!
//! # Overview
//!
//! layerbridge uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `LAYERBRIDGE_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use layerbridge::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("layerbridge.toml")?;
//!
//! println!("Listening on {}", config.server.bind_address());
//! println!("Row timeout: {}s", config.batch.row_timeout_secs);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ServerConfig`] - WebSocket listener and request timeouts
//! - [`BatchConfig`] - Batch engine settings
//! - [`WorkflowConfig`] - Multi-document workflow timeouts
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8765
//! request_timeout_secs = 10
//! fail_pending_on_disconnect = true
//!
//! [batch]
//! root_token = "Root"
//! row_timeout_secs = 120
//!
//! [workflow]
//! open_timeout_secs = 30
//! document_timeout_secs = 600
//!
//! [logging]
//! local_enabled = true
//! local_path = "${LAYERBRIDGE_LOG_DIR}"
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_or_default, parse_config};
pub use schema::{
    ApplicationConfig, BatchConfig, LayerbridgeConfig, LoggingConfig, ServerConfig, WorkflowConfig,
};
