//! Peer channel
//!
//! - [`protocol`] - Wire envelope: outbound requests and inbound classification
//! - [`registry`] - Correlation of responses to pending requests, with timeouts
//! - [`connection`] - The single active session and inbound dispatch
//! - [`client`] - Typed request methods
//! - [`server`] - WebSocket listener with explicit start/stop

pub mod client;
pub mod connection;
pub mod protocol;
pub mod registry;
pub mod server;

pub use client::{OpenedDocument, PeerClient};
pub use connection::ConnectionManager;
pub use protocol::{AtomicProgress, Inbound, OutboundRequest, PeerReply, TextUpdate, UpdateResult};
pub use registry::{Completion, CorrelationRegistry, Deadline};
pub use server::{routes, PeerServer};
