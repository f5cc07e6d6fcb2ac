//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Console output on stderr
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use layerbridge::logging::init_logging;
//! use layerbridge::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard, LOG_FILE_NAME};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use layerbridge::log_error_with_context;
/// use layerbridge::domain::BridgeError;
///
/// let error = BridgeError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log an inbound peer session change
///
/// # Example
///
/// ```no_run
/// use layerbridge::log_session_event;
/// use layerbridge::domain::SessionId;
///
/// log_session_event!(SessionId::new(1), "attached");
/// ```
#[macro_export]
macro_rules! log_session_event {
    ($session:expr, $event:expr) => {
        tracing::info!(
            session = %$session,
            event = $event,
            "Peer session event"
        );
    };
}
