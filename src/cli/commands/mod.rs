//! CLI command implementations
//!
//! Exit codes shared by all commands:
//! - 0: success
//! - 1: partial failure (some rows or documents failed)
//! - 2: configuration or input error
//! - 4: peer never connected, or the layer tree could not be fetched
//! - 5: fatal error
//! - 130: interrupted

pub mod batch;
pub mod init;
pub mod serve;
pub mod strategy;
pub mod validate;
pub mod workflow;

use crate::adapters::peer::{ConnectionManager, PeerClient, PeerServer};
use crate::config::{load_config_or_default, LayerbridgeConfig};
use crate::core::batch::{ProgressEvent, ProgressStatus};
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

/// A bound server with a connected peer
pub(crate) struct PeerSession {
    pub server: PeerServer,
    pub client: PeerClient,
}

impl PeerSession {
    pub async fn close(self) {
        self.server.stop().await;
    }
}

/// Loads the configuration file, falling back to defaults when it is absent
///
/// Prints the failure and returns `None` on an invalid file.
pub(crate) fn load_or_report(config_path: &str) -> Option<LayerbridgeConfig> {
    match load_config_or_default(config_path) {
        Ok(config) => Some(config),
        Err(e) => {
            crate::log_error_with_context!(&e, "Failed to load configuration");
            println!("❌ Failed to load configuration: {e}");
            None
        }
    }
}

/// Reads a JSON input file
pub(crate) fn read_input(path: &Path, what: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read {what}");
            println!("❌ Failed to read {what} {}: {e}", path.display());
            None
        }
    }
}

/// Starts the listener and waits for the peer to dial in
///
/// Returns `None` (after printing why) when binding fails, the peer does not
/// connect in time, or a stop signal arrives first.
pub(crate) async fn connect_peer(
    config: &LayerbridgeConfig,
    connect_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Option<PeerSession> {
    let manager = ConnectionManager::from_config(&config.server);
    let server = match PeerServer::start(&config.server, manager.clone()).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start peer server");
            println!("❌ Failed to start server: {e}");
            return None;
        }
    };

    println!(
        "🔌 Waiting for the plugin to connect on ws://{} ...",
        server.local_addr()
    );

    let connected = tokio::select! {
        connected = manager.wait_for_peer(connect_timeout) => connected,
        _ = shutdown.wait_for(|stop| *stop) => false,
    };

    if !connected {
        tracing::error!(
            timeout_secs = connect_timeout.as_secs(),
            "Peer did not connect"
        );
        println!("❌ Plugin did not connect");
        server.stop().await;
        return None;
    }

    println!("✅ Plugin connected");
    let client = PeerClient::new(manager)
        .with_atomic_timeout(Duration::from_secs(config.batch.row_timeout_secs))
        .with_open_timeout(Duration::from_secs(config.workflow.open_timeout_secs));

    Some(PeerSession { server, client })
}

/// Console progress line
pub(crate) fn print_progress(event: &ProgressEvent) {
    let icon = match event.status {
        ProgressStatus::Started => "🚀",
        ProgressStatus::Processing => "⏳",
        ProgressStatus::Success => "✅",
        ProgressStatus::Error => "❌",
        ProgressStatus::Completed => "🏁",
    };
    println!("{icon} [{}/{}] {}", event.current, event.total, event.message);
}
