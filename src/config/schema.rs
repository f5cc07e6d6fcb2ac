//! Configuration schema types
//!
//! Every section carries defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Main layerbridge configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerbridgeConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// WebSocket listener and request correlation
    #[serde(default)]
    pub server: ServerConfig,

    /// Batch data engine
    #[serde(default)]
    pub batch: BatchConfig,

    /// Multi-document workflows
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LayerbridgeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate()?;
        self.batch.validate()?;
        self.workflow.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// WebSocket server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port; 0 picks a free port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default response window for correlated requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fail a session's pending requests as soon as it ends
    ///
    /// With `false`, they linger until their own timeout fires.
    #[serde(default = "default_true")]
    pub fail_pending_on_disconnect: bool,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("server.host cannot be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("server.request_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }

    /// `host:port` string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            fail_pending_on_disconnect: true,
        }
    }
}

/// Batch data engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Literal first segment of every layer path
    #[serde(default = "default_root_token")]
    pub root_token: String,

    /// Upper bound for one row's atomic call
    #[serde(default = "default_row_timeout_secs")]
    pub row_timeout_secs: u64,

    /// Upper bound for the layer tree fetch
    #[serde(default = "default_tree_timeout_secs")]
    pub tree_timeout_secs: u64,

    /// Ask the peer to keep its working copies
    #[serde(default)]
    pub debug: bool,

    /// Maximum nesting walked by path resolution
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl BatchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.root_token.trim().is_empty() {
            return Err("batch.root_token cannot be empty".to_string());
        }
        if self.row_timeout_secs == 0 {
            return Err("batch.row_timeout_secs must be > 0".to_string());
        }
        if self.tree_timeout_secs == 0 {
            return Err("batch.tree_timeout_secs must be > 0".to_string());
        }
        if self.max_depth == 0 || self.max_depth > 256 {
            return Err(format!(
                "batch.max_depth must be between 1 and 256, got {}",
                self.max_depth
            ));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root_token: default_root_token(),
            row_timeout_secs: default_row_timeout_secs(),
            tree_timeout_secs: default_tree_timeout_secs(),
            debug: false,
            max_depth: default_max_depth(),
        }
    }
}

/// Workflow orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Upper bound for opening one document
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,

    /// Upper bound for one document's whole batch
    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,
}

impl WorkflowConfig {
    fn validate(&self) -> Result<(), String> {
        if self.open_timeout_secs == 0 {
            return Err("workflow.open_timeout_secs must be > 0".to_string());
        }
        if self.document_timeout_secs == 0 {
            return Err("workflow.document_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            open_timeout_secs: default_open_timeout_secs(),
            document_timeout_secs: default_document_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_root_token() -> String {
    "Root".to_string()
}

fn default_row_timeout_secs() -> u64 {
    120
}

fn default_tree_timeout_secs() -> u64 {
    10
}

fn default_max_depth() -> usize {
    16
}

fn default_open_timeout_secs() -> u64 {
    30
}

fn default_document_timeout_secs() -> u64 {
    600
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
