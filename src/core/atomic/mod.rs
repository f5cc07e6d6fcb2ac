//! Atomic execution of edit-and-export bundles

pub mod executor;

pub use executor::{check_response, AtomicExecutor};
