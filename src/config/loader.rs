//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::LayerbridgeConfig;
use crate::domain::errors::BridgeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into LayerbridgeConfig
/// 4. Applies environment variable overrides (LAYERBRIDGE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use layerbridge::config::loader::load_config;
///
/// let config = load_config("layerbridge.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LayerbridgeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BridgeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BridgeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Loads the file if it exists, otherwise starts from defaults
///
/// Environment overrides and validation apply either way.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<LayerbridgeConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "No configuration file; using defaults");
    let mut config = LayerbridgeConfig::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<LayerbridgeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: LayerbridgeConfig = toml::from_str(&contents)
        .map_err(|e| BridgeError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &LayerbridgeConfig) -> Result<()> {
    config.validate().map_err(|e| {
        BridgeError::Configuration(format!("Configuration validation failed: {}", e))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid"));

    let mut missing: Vec<String> = Vec::new();
    let substituted: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            placeholder
                .replace_all(line, |caps: &regex::Captures<'_>| match std::env::var(&caps[1]) {
                    Ok(value) => value,
                    Err(_) => {
                        if !missing.iter().any(|name| name == &caps[1]) {
                            missing.push(caps[1].to_string());
                        }
                        caps[0].to_string()
                    }
                })
                .into_owned()
        })
        .collect();

    if !missing.is_empty() {
        return Err(BridgeError::Configuration(format!(
            "Environment variables referenced by the config are not set: {}",
            missing.join(", ")
        )));
    }

    let mut output = substituted.join("\n");
    output.push('\n');
    Ok(output)
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            BridgeError::Configuration(format!("Invalid value '{}' for {}", val, name))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using LAYERBRIDGE_* prefix
///
/// Environment variables follow the pattern: LAYERBRIDGE_<SECTION>_<KEY>
/// For example: LAYERBRIDGE_SERVER_PORT, LAYERBRIDGE_BATCH_ROW_TIMEOUT_SECS
fn apply_env_overrides(config: &mut LayerbridgeConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("LAYERBRIDGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Server overrides
    if let Ok(val) = std::env::var("LAYERBRIDGE_SERVER_HOST") {
        config.server.host = val;
    }
    if let Some(port) = env_parsed("LAYERBRIDGE_SERVER_PORT")? {
        config.server.port = port;
    }
    if let Some(secs) = env_parsed("LAYERBRIDGE_SERVER_REQUEST_TIMEOUT_SECS")? {
        config.server.request_timeout_secs = secs;
    }
    if let Some(flag) = env_parsed("LAYERBRIDGE_SERVER_FAIL_PENDING_ON_DISCONNECT")? {
        config.server.fail_pending_on_disconnect = flag;
    }

    // Batch overrides
    if let Ok(val) = std::env::var("LAYERBRIDGE_BATCH_ROOT_TOKEN") {
        config.batch.root_token = val;
    }
    if let Some(secs) = env_parsed("LAYERBRIDGE_BATCH_ROW_TIMEOUT_SECS")? {
        config.batch.row_timeout_secs = secs;
    }
    if let Some(secs) = env_parsed("LAYERBRIDGE_BATCH_TREE_TIMEOUT_SECS")? {
        config.batch.tree_timeout_secs = secs;
    }
    if let Some(flag) = env_parsed("LAYERBRIDGE_BATCH_DEBUG")? {
        config.batch.debug = flag;
    }
    if let Some(depth) = env_parsed("LAYERBRIDGE_BATCH_MAX_DEPTH")? {
        config.batch.max_depth = depth;
    }

    // Workflow overrides
    if let Some(secs) = env_parsed("LAYERBRIDGE_WORKFLOW_OPEN_TIMEOUT_SECS")? {
        config.workflow.open_timeout_secs = secs;
    }
    if let Some(secs) = env_parsed("LAYERBRIDGE_WORKFLOW_DOCUMENT_TIMEOUT_SECS")? {
        config.workflow.document_timeout_secs = secs;
    }

    // Logging overrides
    if let Some(flag) = env_parsed("LAYERBRIDGE_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = flag;
    }
    if let Ok(val) = std::env::var("LAYERBRIDGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("LAYERBRIDGE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("LB_LOADER_TEST_HOST", "0.0.0.0");
        let input = "host = \"${LB_LOADER_TEST_HOST}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "host = \"0.0.0.0\"\n");
        std::env::remove_var("LB_LOADER_TEST_HOST");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("LB_LOADER_MISSING_VAR");
        let input = "host = \"${LB_LOADER_MISSING_VAR}\"";
        assert!(substitute_env_vars(input).is_err());
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("LB_LOADER_COMMENTED");
        let input = "# host = \"${LB_LOADER_COMMENTED}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[server]
host = "0.0.0.0"
port = 9001

[batch]
root_token = "Canvas"
row_timeout_secs = 60
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.batch.root_token, "Canvas");
        assert_eq!(config.batch.row_timeout_secs, 60);
        assert_eq!(config.workflow.open_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = parse_config("[batch]\nmax_depth = 0\n");
        assert!(matches!(result, Err(BridgeError::Configuration(_))));
    }
}
