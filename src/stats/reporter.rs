// src/stats/reporter.rs
use crate::events::{MinerEvent, PeriodicReport, ShareOutcome};
use crate::stats::registry::HashrateRegistry;
use crate::utils::format::{format_hashrate, format_si, format_uptime};
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Snapshot of the process-wide mining statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiningStats {
    /// Shares accepted by the pool
    pub shares_accepted: u64,
    /// Shares rejected by the pool, including `BLOCK` verdicts
    pub shares_rejected: u64,
    /// Sum of every worker's latest hashrate
    pub total_hashrate: f64,
    /// Time since mining started
    pub uptime: Duration,
}

/// Accepted/rejected share counters shared by all workers
///
/// Only ever incremented, so `accepted + rejected` never decreases.
#[derive(Debug, Default)]
pub struct ShareCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl ShareCounters {
    /// Counts an accepted share and returns `(accepted, rejected)` afterwards
    pub fn record_accepted(&self) -> (u64, u64) {
        let accepted = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        (accepted, self.rejected.load(Ordering::Relaxed))
    }

    /// Counts a rejected share and returns `(accepted, rejected)` afterwards
    pub fn record_rejected(&self) -> (u64, u64) {
        let rejected = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
        (self.accepted.load(Ordering::Relaxed), rejected)
    }

    /// Accepted shares so far
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Rejected shares so far
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Mutable state shared across workers: share counters and hashrates
///
/// Workers receive it as an `Arc`; nothing here coordinates which job a
/// worker mines.
#[derive(Debug)]
pub struct SharedStats {
    /// Process-wide share counters
    pub shares: ShareCounters,
    /// Per-worker latest hashrate
    pub hashrates: HashrateRegistry,
    started: Instant,
}

impl SharedStats {
    /// Creates zeroed statistics for `workers` workers, starting the uptime clock
    pub fn new(workers: usize) -> Self {
        SharedStats {
            shares: ShareCounters::default(),
            hashrates: HashrateRegistry::new(workers),
            started: Instant::now(),
        }
    }

    /// Time since the statistics were created
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Gets the current mining statistics
    pub fn get_stats(&self) -> MiningStats {
        MiningStats {
            shares_accepted: self.shares.accepted(),
            shares_rejected: self.shares.rejected(),
            total_hashrate: self.hashrates.sum(),
            uptime: self.uptime(),
        }
    }
}

/// Interval clock of the reporting worker
pub struct ReportClock {
    interval: Duration,
    last_report: Instant,
    last_accepted: u64,
}

impl ReportClock {
    /// Starts a clock that fires every `interval`
    pub fn new(interval: Duration) -> Self {
        ReportClock {
            interval,
            last_report: Instant::now(),
            last_accepted: 0,
        }
    }

    /// Builds a report if the interval has elapsed, then restarts the interval
    pub fn poll(&mut self, stats: &SharedStats) -> Option<PeriodicReport> {
        self.poll_at(Instant::now(), stats)
    }

    pub(crate) fn poll_at(&mut self, now: Instant, stats: &SharedStats) -> Option<PeriodicReport> {
        let period = now.saturating_duration_since(self.last_report);
        if period < self.interval || period.is_zero() {
            return None;
        }

        let accepted = stats.shares.accepted();
        let shares = accepted.saturating_sub(self.last_accepted);
        let secs = period.as_secs_f64();
        let total_hashrate = stats.hashrates.sum();

        self.last_report = now;
        self.last_accepted = accepted;

        Some(PeriodicReport {
            period,
            shares,
            shares_per_sec: shares as f64 / secs,
            total_hashrate,
            estimated_hashes: (total_hashrate * secs) as u64,
            uptime: stats.uptime(),
        })
    }
}

/// Console consumer of [`MinerEvent`]s
///
/// Renders every event as one log line on a background thread.
pub struct StatsReporter {
    events: Receiver<MinerEvent>,
}

impl StatsReporter {
    /// Creates a reporter draining `events`
    pub fn new(events: Receiver<MinerEvent>) -> Self {
        StatsReporter { events }
    }

    /// Starts logging events on a background thread
    ///
    /// The thread ends once every sender has been dropped.
    pub fn start_reporting(self) -> JoinHandle<()> {
        thread::spawn(move || {
            for event in self.events {
                log_event(&event);
            }
        })
    }
}

fn share_line(verdict: &str, share: &ShareOutcome) -> String {
    let total = share.accepted + share.rejected;
    let ratio = if total == 0 {
        0
    } else {
        share.accepted * 100 / total
    };

    format!(
        "cpu{} {} {}/{} ({}%) - {:.1}s - {} - diff {} - ping {}ms",
        share.worker,
        verdict,
        share.accepted,
        total,
        ratio,
        share.compute_time.as_secs_f64(),
        format_hashrate(share.total_hashrate),
        format_si(share.difficulty as f64, "", 0).trim_end(),
        share.ping.as_millis()
    )
}

/// Renders one event as a log line
pub fn log_event(event: &MinerEvent) {
    match event {
        MinerEvent::Connected {
            worker,
            server_version,
            outdated,
        } => {
            if *outdated {
                log::warn!(
                    "net{} connected to a newer server (v{}), this miner may be outdated",
                    worker,
                    server_version
                );
            } else {
                log::info!("net{} connected to server v{}", worker, server_version);
            }
        }
        MinerEvent::Motd { worker, message } => log::info!("net{} MOTD: {}", worker, message),
        MinerEvent::ShareAccepted(share) => log::info!("{}", share_line("Accepted", share)),
        MinerEvent::ShareRejected(share) => log::warn!("{}", share_line("Rejected", share)),
        MinerEvent::BlockFound(share) => log::info!("{}", share_line("Block found", share)),
        MinerEvent::PeriodicReport(report) => log::info!(
            "Periodic mining report: last {}s, {} shares ({:.1} shares/s), {} ({} hashes), total mining time {}",
            report.period.as_secs(),
            report.shares,
            report.shares_per_sec,
            format_hashrate(report.total_hashrate),
            report.estimated_hashes,
            format_uptime(report.uptime)
        ),
        MinerEvent::ConnectionError { worker, error } => {
            log::error!("net{} error, restarting: {}", worker, error)
        }
        MinerEvent::Diagnostic { worker, message } => {
            log::warn!("cpu{} node message: {}", worker, message)
        }
    }
}
