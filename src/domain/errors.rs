//! Domain error types
//!
//! This module defines the error hierarchy for layerbridge. Peer-facing
//! failures live in [`PeerError`]; everything else is a [`BridgeError`].
//! Third-party error types are converted to strings at the boundary.

use thiserror::Error;

/// Main layerbridge error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors raised while talking to the connected peer
    #[error("Peer error: {0}")]
    Peer(#[from] PeerError),

    /// A hierarchical layer path did not resolve against the live tree
    #[error("Path resolution failed: {0}")]
    PathResolution(String),

    /// An operation is not allowed for the resolved layer kind
    #[error("Safety violation: {0}")]
    SafetyViolation(String),

    /// Validation errors (strategy documents, rows, task files)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors produced by the peer connection
///
/// Every completion handler receives either a reply or one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// No peer is attached; synthesized locally, never sent on the wire
    #[error("Peer not connected")]
    NotConnected,

    /// No response arrived inside the request window
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The peer answered with an explicit error
    #[error("Peer reported error: {0}")]
    Remote(String),

    /// The session carrying the request ended before a response arrived
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The response arrived but carried the wrong payload for the request
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The atomic unit succeeded overall but one or more exports failed
    #[error("Export failed: {failed}/{total} exports failed ({detail})")]
    ExportFailed {
        failed: usize,
        total: usize,
        detail: String,
    },

    /// Frames that could not be encoded
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl PeerError {
    /// Whether the failure came from a missing or vanished connection
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, PeerError::NotConnected | PeerError::ConnectionLost(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_display() {
        let err = BridgeError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_peer_error_conversion() {
        let bridge_err: BridgeError = PeerError::NotConnected.into();
        assert!(matches!(bridge_err, BridgeError::Peer(PeerError::NotConnected)));
        assert_eq!(bridge_err.to_string(), "Peer error: Peer not connected");
    }

    #[test]
    fn test_export_failed_display() {
        let err = PeerError::ExportFailed {
            failed: 1,
            total: 3,
            detail: "banner: disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Export failed: 1/3 exports failed (banner: disk full)"
        );
    }

    #[test]
    fn test_connection_failure_classification() {
        assert!(PeerError::NotConnected.is_connection_failure());
        assert!(PeerError::ConnectionLost("closed".into()).is_connection_failure());
        assert!(!PeerError::Timeout("get_layers".into()).is_connection_failure());
        assert!(!PeerError::Remote("boom".into()).is_connection_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: BridgeError = io_err.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: BridgeError = json_err.into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: BridgeError = toml_err.into();
        assert!(matches!(err, BridgeError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
