// src/events.rs
//! Structured progress events
//!
//! Workers never format console text themselves. Every state transition and
//! every pool verdict becomes exactly one [`MinerEvent`] sent over a
//! crossbeam channel; presentation happens in [`crate::stats::StatsReporter`].

use crossbeam_channel::Sender;
use std::time::Duration;

/// Sending half of the event channel, cloned into every worker
pub type EventSender = Sender<MinerEvent>;

/// Details attached to every share verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ShareOutcome {
    /// Worker that submitted the share
    pub worker: usize,
    /// Process-wide accepted count after this verdict
    pub accepted: u64,
    /// Process-wide rejected count after this verdict
    pub rejected: u64,
    /// This worker's measured hashrate for the share
    pub hashrate: f64,
    /// Sum of every worker's latest hashrate
    pub total_hashrate: f64,
    /// Wall-clock time spent searching
    pub compute_time: Duration,
    /// Difficulty of the job
    pub difficulty: u64,
    /// Client-side round trip of the submission
    pub ping: Duration,
}

/// Aggregate throughput over one reporting interval
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicReport {
    /// Length of the interval
    pub period: Duration,
    /// Shares accepted during the interval
    pub shares: u64,
    /// `shares / period`
    pub shares_per_sec: f64,
    /// Sum of every worker's latest hashrate
    pub total_hashrate: f64,
    /// Hashes estimated from the total hashrate over the interval
    pub estimated_hashes: u64,
    /// Time since mining started
    pub uptime: Duration,
}

/// Everything the mining core reports
#[derive(Debug, Clone, PartialEq)]
pub enum MinerEvent {
    /// A session was opened and the version handshake read
    Connected {
        /// Worker id
        worker: usize,
        /// Version token sent by the server
        server_version: String,
        /// Whether the server is newer than this client
        outdated: bool,
    },
    /// Message of the day (worker 0, first session only)
    Motd {
        /// Worker id
        worker: usize,
        /// Free text from the pool
        message: String,
    },
    /// `GOOD` verdict
    ShareAccepted(ShareOutcome),
    /// `BAD` verdict
    ShareRejected(ShareOutcome),
    /// `BLOCK` verdict (counted with the rejected shares)
    BlockFound(ShareOutcome),
    /// Periodic aggregate from the reporting worker
    PeriodicReport(PeriodicReport),
    /// Connect failed or a live session was dropped
    ConnectionError {
        /// Worker id
        worker: usize,
        /// Error description
        error: String,
    },
    /// Unrecognised verdict, passed on verbatim
    Diagnostic {
        /// Worker id
        worker: usize,
        /// Raw verdict text
        message: String,
    },
}

impl MinerEvent {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            MinerEvent::Connected { .. } => "connected",
            MinerEvent::Motd { .. } => "motd",
            MinerEvent::ShareAccepted(_) => "share_accepted",
            MinerEvent::ShareRejected(_) => "share_rejected",
            MinerEvent::BlockFound(_) => "block_found",
            MinerEvent::PeriodicReport(_) => "periodic_report",
            MinerEvent::ConnectionError { .. } => "connection_error",
            MinerEvent::Diagnostic { .. } => "diagnostic",
        }
    }
}
