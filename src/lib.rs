//! Duino-Coin PC miner
//!
//! This crate provides a multi-threaded CPU miner for the Duino-Coin pool with:
//! - Two proof-of-work search variants (DUCO-S1 and XXHASH)
//! - CPU intensity throttling
//! - A per-worker TCP session with automatic reconnection
//! - Structured events for share verdicts and periodic reports
//! - Local benchmarking

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation including algorithms and scheduling
pub mod miner;

/// Network communication components for the pool directory and pool nodes
pub mod network;

/// Statistics collection and reporting functionality
pub mod stats;

/// Structured events emitted by the workers
pub mod events;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use events::MinerEvent;
pub use miner::{MiningContext, Scheduler, Worker, WorkerSettings};
pub use network::{Endpoint, PoolLocator, PoolSession, TcpConnector};
pub use stats::{MiningStats, SharedStats, StatsReporter};
pub use types::{AlgorithmType, DifficultyTier, Job, SearchResult};
pub use utils::{MinerError, init_logging};
