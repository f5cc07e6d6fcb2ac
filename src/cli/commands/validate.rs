//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after parsing and applying overrides
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Listen Address: {}", config.server.bind_address());
        println!("  Request Timeout: {}s", config.server.request_timeout_secs);
        println!(
            "  Fail Pending On Disconnect: {}",
            config.server.fail_pending_on_disconnect
        );
        println!("  Root Token: {}", config.batch.root_token);
        println!("  Row Timeout: {}s", config.batch.row_timeout_secs);
        println!("  Tree Timeout: {}s", config.batch.tree_timeout_secs);
        println!("  Max Depth: {}", config.batch.max_depth);
        println!("  Open Timeout: {}s", config.workflow.open_timeout_secs);
        println!("  Document Timeout: {}s", config.workflow.document_timeout_secs);
        if config.logging.local_enabled {
            println!(
                "  File Logging: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        } else {
            println!("  File Logging: disabled");
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_file_exits_zero() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[server]\nport = 9100\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert_eq!(ValidateArgs {}.execute(&path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_exits_two() {
        let code = ValidateArgs {}
            .execute("does-not-exist.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
