//! External system integrations for layerbridge.
//!
//! - [`peer`] - The WebSocket channel to the document-editing peer
//! - [`host`] - Trait-based abstraction over the peer used by the core
//!
//! # Design Pattern
//!
//! Adapters isolate the wire protocol from the orchestration logic. The core
//! only sees [`host::DocumentHost`], which keeps it testable with scripted
//! hosts.
//!
//! ```rust,no_run
//! use layerbridge::adapters::peer::{ConnectionManager, PeerClient, PeerServer};
//! use layerbridge::config::ServerConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let manager = ConnectionManager::from_config(&config);
//! let server = PeerServer::start(&config, manager.clone()).await?;
//!
//! let client = PeerClient::new(manager);
//! let documents = client.get_open_docs().await?;
//! println!("{} documents open", documents.len());
//!
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod host;
pub mod peer;
