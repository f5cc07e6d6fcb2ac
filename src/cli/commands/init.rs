//! Init command implementation
//!
//! Generates a sample configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "layerbridge.toml")]
    pub output: String,

    /// Include comments for every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing layerbridge configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: layerbridge validate-config");
                println!("  3. Start the server and connect the plugin: layerbridge serve");
                println!("  4. Run a batch: layerbridge batch --strategy s.json --rows rows.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# layerbridge configuration

[application]
log_level = "info"

[server]
host = "127.0.0.1"
port = 8765
request_timeout_secs = 10
fail_pending_on_disconnect = true

[batch]
root_token = "Root"
row_timeout_secs = 120
tree_timeout_secs = 10
debug = false
max_depth = 16

[workflow]
open_timeout_secs = 30
document_timeout_secs = 600

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# layerbridge configuration
#
# Every setting has a default; delete what you do not need to change.
# Values may reference environment variables with ${VAR_NAME}, and any
# setting can be overridden with LAYERBRIDGE_<SECTION>_<KEY>.

# --- Application Settings ---
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# --- Plugin Connection ---
[server]
# Address the plugin dials (ws://host:port)
host = "127.0.0.1"
port = 8765

# Seconds to wait for a reply to an ordinary request
request_timeout_secs = 10

# Fail in-flight requests as soon as the plugin disconnects.
# With false they wait for their own timeout instead.
fail_pending_on_disconnect = true

# --- Batch Engine ---
[batch]
# First segment of every layer path ("Root > Card > Title")
root_token = "Root"

# Seconds one row (edits plus exports) may take
row_timeout_secs = 120

# Seconds to wait for the layer tree
tree_timeout_secs = 10

# Keep the plugin's working copies open for inspection
debug = false

# Deepest layer nesting that paths may address
max_depth = 16

# --- Multi-document Workflows ---
[workflow]
# Seconds to wait for a document to open
open_timeout_secs = 30

# Seconds one document's whole batch may take
document_timeout_secs = 600

# --- Logging Configuration ---
[logging]
# Write JSON logs to local_path
local_enabled = false
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_generated_configs_are_valid() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = parse_config(&content).unwrap();
            assert_eq!(config.server.port, 8765);
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("layerbridge.toml");
        std::fs::write(&path, "").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(std::fs::read_to_string(&path).unwrap().contains("[batch]"));
    }
}
