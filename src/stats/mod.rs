//! Statistics collection and reporting module
//!
//! This module holds the only mutable state shared between workers:
//! - Share acceptance/rejection counters
//! - The per-worker hashrate registry
//!
//! It also owns the console side of the event stream: [`StatsReporter`]
//! turns [`crate::events::MinerEvent`]s into log lines, and [`ReportClock`]
//! paces the periodic aggregate report.

/// Per-worker hashrate slots summed for aggregate reporting
pub mod registry;

/// Submodule containing the shared counters and the event reporter
///
/// The reporter handles:
/// - Atomic share counters
/// - Periodic aggregate reports
/// - Rendering events to the log on a background thread
pub mod reporter;

// Re-export main components
pub use registry::HashrateRegistry;
pub use reporter::{MiningStats, ReportClock, ShareCounters, SharedStats, StatsReporter};
