// src/network/mod.rs
//! Network communication components
//!
//! This module handles all network interactions with the pool:
//! - `PoolLocator`: resolves the best pool node once at startup
//! - `PoolSession`: one worker's TCP session speaking the line protocol

/// Mining pool session implementation
///
/// Handles the version handshake, job requests and result submission over
/// one exclusively owned TCP connection.
pub mod pool;

/// Pool directory lookup
///
/// Resolves the pool endpoint over HTTP, retrying on a fixed delay.
pub mod locator;

// Re-export main components for cleaner imports
pub use locator::{Endpoint, PoolInfo, PoolLocator};
pub use pool::{Connector, Feedback, PoolProtocol, PoolSession, Submission, TcpConnector};
