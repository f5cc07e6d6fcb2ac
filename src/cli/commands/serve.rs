//! Serve command implementation
//!
//! Runs the listener on its own and logs sessions and atomic progress until
//! interrupted. Useful to check that the plugin can reach the service.

use super::load_or_report;
use crate::adapters::peer::{ConnectionManager, PeerServer};
use clap::Args;
use tokio::sync::{broadcast, watch};

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let Some(mut config) = load_or_report(config_path) else {
            return Ok(2);
        };
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let manager = ConnectionManager::from_config(&config.server);
        let server = match PeerServer::start(&config.server, manager.clone()).await {
            Ok(server) => server,
            Err(e) => {
                println!("❌ Failed to start server: {e}");
                return Ok(2);
            }
        };

        println!("🔌 Listening on ws://{}", server.local_addr());
        println!("   Press Ctrl+C to stop");

        let mut progress = manager.subscribe_progress();
        loop {
            tokio::select! {
                _ = shutdown_signal.wait_for(|stop| *stop) => break,
                event = progress.recv() => match event {
                    Ok(event) => println!(
                        "⏳ {} [{}/{}] {}",
                        event.step, event.current, event.total, event.message
                    ),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "Progress subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        server.stop().await;
        println!("👋 Server stopped");
        Ok(0)
    }
}
