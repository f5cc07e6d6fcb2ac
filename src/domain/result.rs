//! Result type alias for layerbridge

use super::errors::BridgeError;

/// Result type alias for layerbridge operations
///
/// # Examples
///
/// ```
/// use layerbridge::domain::result::Result;
/// use layerbridge::domain::errors::BridgeError;
///
/// fn failing_function() -> Result<()> {
///     Err(BridgeError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, BridgeError>;
