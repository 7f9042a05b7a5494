// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the mining process:
//! - Search variants (DUCO-S1, XXHASH) and the CPU throttle
//! - The per-worker connect/mine state machine
//! - Worker thread management

/// Mining algorithm implementations
///
/// Contains the two supported search variants:
/// - DUCO-S1 (SHA-1 over the previous hash and a decimal nonce)
/// - XXHASH (seeded XXH64 over the same input)
pub mod algorithm;

/// Worker thread management
///
/// Spawns the workers, staggers their start and stops them.
pub mod scheduler;

/// Worker state machine
///
/// Each worker owns one pool session: it requests jobs, searches them and
/// submits the results, reconnecting whenever the session fails.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::algorithm::{Algorithm, Throttle};
pub use self::scheduler::Scheduler;
pub use self::worker::{MiningContext, Worker, WorkerSettings, WorkerState};
