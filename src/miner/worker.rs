// src/miner/worker.rs
//! Worker state machine
//!
//! Each worker owns one pool session and one throttle, and cycles
//! `Connecting -> Mining -> Connecting` until the process stops. A failure in
//! any session operation drops the session and starts over with a fresh
//! connection; failed connects are retried without limit after a fixed
//! pause.

use crate::config::Config;
use crate::events::{EventSender, MinerEvent, ShareOutcome};
use crate::miner::algorithm::Throttle;
use crate::network::locator::Endpoint;
use crate::network::pool::{self, Connector, Feedback, PoolProtocol, Submission};
use crate::stats::{ReportClock, SharedStats};
use crate::types::{AlgorithmType, DifficultyTier, Job, SearchResult};
use crate::utils::error::MinerError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Id of the worker that shows the MOTD and emits periodic reports
pub const REPORTING_WORKER: usize = 0;

/// Fixed pause after a failed connect before the next attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Longest uninterrupted sleep while waiting to reconnect
const STOP_POLL: Duration = Duration::from_millis(100);

/// Per-worker mining parameters, fixed at startup
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// Account the shares are credited to
    pub username: String,
    /// Search variant
    pub algorithm: AlgorithmType,
    /// Requested difficulty tier
    pub tier: DifficultyTier,
    /// CPU intensity in percent
    pub intensity: u8,
    /// Rig identifier sent with every share
    pub identifier: String,
    /// Client tag sent with every share
    pub client_tag: String,
    /// Interval between periodic reports
    pub report_interval: Duration,
    /// Pause after a failed connect
    pub reconnect_delay: Duration,
}

impl From<&Config> for WorkerSettings {
    fn from(config: &Config) -> Self {
        WorkerSettings {
            username: config.username.clone(),
            algorithm: config.algorithm,
            tier: config.start_diff,
            intensity: config.intensity,
            identifier: config.identifier.clone(),
            client_tag: pool::client_tag(config.algorithm),
            report_interval: config.report_interval(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

/// Everything workers share: settings, endpoint, connector, statistics,
/// the event channel and the run flag
pub struct MiningContext<C> {
    /// Mining parameters
    pub settings: WorkerSettings,
    /// Pool node every worker connects to
    pub endpoint: Endpoint,
    /// Opens pool sessions
    pub connector: C,
    /// Share counters and hashrate registry
    pub stats: Arc<SharedStats>,
    /// Event channel to the presentation layer
    pub events: EventSender,
    /// Cleared to stop every worker
    pub active: Arc<AtomicBool>,
}

/// Where a worker is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Opening a session
    Connecting,
    /// Fetching, searching and submitting jobs on a live session
    Mining,
    /// The run flag was cleared
    Stopped,
}

/// One mining worker
pub struct Worker<C: Connector> {
    id: usize,
    context: Arc<MiningContext<C>>,
    throttle: Throttle,
    state: WorkerState,
    motd_pending: bool,
    report: Option<ReportClock>,
}

impl<C: Connector> Worker<C> {
    /// Creates worker `id`; worker [`REPORTING_WORKER`] also reports
    pub fn new(id: usize, context: Arc<MiningContext<C>>) -> Self {
        let is_reporter = id == REPORTING_WORKER;
        let report = is_reporter.then(|| ReportClock::new(context.settings.report_interval));

        Worker {
            id,
            throttle: Throttle::new(context.settings.intensity),
            context,
            state: WorkerState::Connecting,
            motd_pending: is_reporter,
            report,
        }
    }

    /// Current state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn is_active(&self) -> bool {
        self.context.active.load(Ordering::Relaxed)
    }

    fn emit(&self, event: MinerEvent) {
        if let Err(e) = self.context.events.send(event) {
            log::trace!("Worker {} dropped {} event, no listener", self.id, e.0.name());
        }
    }

    /// Sleeps `reconnect_delay`, waking early once the worker is stopped
    fn pause_before_reconnect(&self) {
        let deadline = Instant::now() + self.context.settings.reconnect_delay;
        while self.is_active() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            thread::sleep(left.min(STOP_POLL));
        }
    }

    /// Runs the state machine until the run flag is cleared
    pub fn run(mut self) {
        let settings = &self.context.settings;
        log::info!(
            "Mining thread {} starting, using {} at {}% intensity",
            self.id,
            settings.algorithm,
            settings.intensity
        );

        while self.is_active() {
            self.state = WorkerState::Connecting;
            let mut session = match self.context.connector.connect(&self.context.endpoint) {
                Ok(session) => session,
                Err(e) => {
                    log::debug!("Worker {} failed to connect: {}", self.id, e);
                    self.emit(MinerEvent::ConnectionError {
                        worker: self.id,
                        error: e.to_string(),
                    });
                    self.pause_before_reconnect();
                    continue;
                }
            };

            self.state = WorkerState::Mining;
            self.emit(MinerEvent::Connected {
                worker: self.id,
                server_version: session.server_version().to_string(),
                outdated: pool::server_is_newer(session.server_version()).unwrap_or(false),
            });

            if let Err(e) = self.mine(&mut session) {
                log::debug!("Worker {} dropped its session: {}", self.id, e);
                self.emit(MinerEvent::ConnectionError {
                    worker: self.id,
                    error: e.to_string(),
                });
            }
        }

        self.state = WorkerState::Stopped;
        log::debug!("Worker {} stopped", self.id);
    }

    /// Mines on a live session until it fails or the worker is stopped
    fn mine(&mut self, session: &mut C::Session) -> Result<(), MinerError> {
        if self.motd_pending {
            let message = session.request_motd()?;
            self.motd_pending = false;
            self.emit(MinerEvent::Motd {
                worker: self.id,
                message,
            });
        }

        while self.is_active() {
            self.mine_once(session)?;
        }
        Ok(())
    }

    /// One job: request, search, submit, classify, record, report
    fn mine_once(&mut self, session: &mut C::Session) -> Result<(), MinerError> {
        let context = Arc::clone(&self.context);
        let settings = &context.settings;

        let job = session.request_job(&settings.username, settings.tier, settings.algorithm)?;

        let started = Instant::now();
        let result = settings.algorithm.search(&job, &mut self.throttle);
        let compute_time = started.elapsed();
        context.stats.hashrates.set(self.id, result.hashrate);

        let submission = session.submit_result(&result, &settings.client_tag, &settings.identifier)?;
        self.record_verdict(&job, &result, compute_time, submission);

        if let Some(report) = self.report.as_mut().and_then(|clock| clock.poll(&context.stats)) {
            self.emit(MinerEvent::PeriodicReport(report));
        }
        Ok(())
    }

    /// Updates the share counters and emits one event for the verdict
    fn record_verdict(
        &self,
        job: &Job,
        result: &SearchResult,
        compute_time: Duration,
        submission: Submission,
    ) {
        let shares = &self.context.stats.shares;
        let outcome = |(accepted, rejected): (u64, u64)| ShareOutcome {
            worker: self.id,
            accepted,
            rejected,
            hashrate: result.hashrate,
            total_hashrate: self.context.stats.hashrates.sum(),
            compute_time,
            difficulty: job.difficulty,
            ping: submission.ping,
        };

        let event = match submission.feedback {
            Feedback::Good => MinerEvent::ShareAccepted(outcome(shares.record_accepted())),
            // BLOCK is counted with the rejected shares, as the pool's own
            // miners have always done.
            Feedback::Block => MinerEvent::BlockFound(outcome(shares.record_rejected())),
            Feedback::Bad => MinerEvent::ShareRejected(outcome(shares.record_rejected())),
            Feedback::Other(message) => MinerEvent::Diagnostic {
                worker: self.id,
                message,
            },
        };
        self.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    struct ScriptedSession {
        jobs: VecDeque<Result<Job, MinerError>>,
        verdicts: VecDeque<&'static str>,
        calls: CallLog,
    }

    impl PoolProtocol for ScriptedSession {
        fn server_version(&self) -> &str {
            "2.7"
        }

        fn request_motd(&mut self) -> Result<String, MinerError> {
            self.calls.lock().unwrap().push("motd");
            Ok("hello miners".into())
        }

        fn request_job(
            &mut self,
            _username: &str,
            _tier: DifficultyTier,
            _algorithm: AlgorithmType,
        ) -> Result<Job, MinerError> {
            self.calls.lock().unwrap().push("job");
            self.jobs
                .pop_front()
                .unwrap_or_else(|| Err(MinerError::ConnectionError("script ended".into())))
        }

        fn submit_result(
            &mut self,
            _result: &SearchResult,
            _client_tag: &str,
            _rig_identifier: &str,
        ) -> Result<Submission, MinerError> {
            self.calls.lock().unwrap().push("submit");
            let verdict = self
                .verdicts
                .pop_front()
                .ok_or_else(|| MinerError::ConnectionError("script ended".into()))?;
            Ok(Submission {
                feedback: Feedback::parse(verdict),
                ping: Duration::from_millis(5),
            })
        }
    }

    type Script = Vec<(Vec<Result<Job, MinerError>>, Vec<&'static str>)>;

    /// Hands out scripted sessions, then refuses; stops the worker unless
    /// `keep_refusing` is set
    struct ScriptedConnector {
        sessions: Mutex<VecDeque<(Vec<Result<Job, MinerError>>, Vec<&'static str>)>>,
        calls: CallLog,
        active: Arc<AtomicBool>,
        keep_refusing: bool,
    }

    impl Connector for ScriptedConnector {
        type Session = ScriptedSession;

        fn connect(&self, _endpoint: &Endpoint) -> Result<ScriptedSession, MinerError> {
            self.calls.lock().unwrap().push("connect");
            match self.sessions.lock().unwrap().pop_front() {
                Some((jobs, verdicts)) => Ok(ScriptedSession {
                    jobs: jobs.into(),
                    verdicts: verdicts.into(),
                    calls: Arc::clone(&self.calls),
                }),
                None => {
                    if !self.keep_refusing {
                        self.active.store(false, Ordering::Relaxed);
                    }
                    Err(MinerError::ConnectionError("connection refused".into()))
                }
            }
        }
    }

    struct Harness {
        context: Arc<MiningContext<ScriptedConnector>>,
        events: Receiver<MinerEvent>,
        calls: CallLog,
    }

    impl Harness {
        fn new(sessions: Script) -> Self {
            Self::build(sessions, Duration::from_secs(3600), Duration::ZERO, false)
        }

        /// Worker 0 reports after every share
        fn reporting_every_share(sessions: Script) -> Self {
            Self::build(sessions, Duration::ZERO, Duration::ZERO, false)
        }

        /// Every connect is refused until the worker is stopped
        fn refusing(reconnect_delay: Duration) -> Self {
            Self::build(Vec::new(), Duration::from_secs(3600), reconnect_delay, true)
        }

        fn build(
            sessions: Script,
            report_interval: Duration,
            reconnect_delay: Duration,
            keep_refusing: bool,
        ) -> Self {
            let calls: CallLog = Arc::default();
            let active = Arc::new(AtomicBool::new(true));
            let (events_tx, events) = crossbeam_channel::unbounded();
            let mut settings = WorkerSettings::from(&Config::with_username("tester"));
            settings.intensity = 100;
            settings.report_interval = report_interval;
            settings.reconnect_delay = reconnect_delay;

            let context = Arc::new(MiningContext {
                settings,
                endpoint: "127.0.0.1:9999".parse().unwrap(),
                connector: ScriptedConnector {
                    sessions: Mutex::new(sessions.into()),
                    calls: Arc::clone(&calls),
                    active: Arc::clone(&active),
                    keep_refusing,
                },
                stats: Arc::new(SharedStats::new(2)),
                events: events_tx,
                active,
            });

            Harness {
                context,
                events,
                calls,
            }
        }

        fn run_worker(&self, id: usize) -> Vec<MinerEvent> {
            let worker = Worker::new(id, Arc::clone(&self.context));
            worker.run();
            self.events.try_iter().collect()
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        /// Runs worker `id` on its own thread for `runtime`, then stops it
        /// and returns how long the stop took
        fn run_worker_for(&self, id: usize, runtime: Duration) -> Duration {
            let worker = Worker::new(id, Arc::clone(&self.context));
            let handle = thread::spawn(move || worker.run());
            thread::sleep(runtime);

            let stopping = Instant::now();
            self.context.active.store(false, Ordering::Relaxed);
            handle.join().unwrap();
            stopping.elapsed()
        }
    }

    fn job() -> Job {
        AlgorithmType::DucoS1.synthetic_job("worker-test", 77, 1)
    }

    fn names(events: &[MinerEvent]) -> Vec<&'static str> {
        events.iter().map(MinerEvent::name).collect()
    }

    #[test]
    fn good_verdict_counts_one_accepted_share() {
        let harness = Harness::new(vec![(vec![Ok(job())], vec!["GOOD"])]);
        let events = harness.run_worker(1);

        let stats = harness.context.stats.get_stats();
        assert_eq!(stats.shares_accepted, 1);
        assert_eq!(stats.shares_rejected, 0);
        assert_eq!(
            names(&events),
            vec!["connected", "share_accepted", "connection_error", "connection_error"]
        );
    }

    #[test]
    fn block_verdict_counts_as_rejected_but_reports_block() {
        let harness = Harness::new(vec![(vec![Ok(job())], vec!["BLOCK"])]);
        let events = harness.run_worker(1);

        let stats = harness.context.stats.get_stats();
        assert_eq!(stats.shares_accepted, 0);
        assert_eq!(stats.shares_rejected, 1);
        assert!(events.iter().any(|e| matches!(e, MinerEvent::BlockFound(_))));
        assert!(!events.iter().any(|e| matches!(e, MinerEvent::ShareRejected(_))));
    }

    #[test]
    fn bad_and_unknown_verdicts() {
        let harness = Harness::new(vec![(vec![Ok(job()), Ok(job())], vec!["BAD", "HUH"])]);
        let events = harness.run_worker(1);

        let stats = harness.context.stats.get_stats();
        assert_eq!(stats.shares_accepted, 0);
        assert_eq!(stats.shares_rejected, 1);
        assert!(events.contains(&MinerEvent::Diagnostic {
            worker: 1,
            message: "HUH".into(),
        }));
        match events.iter().find(|e| matches!(e, MinerEvent::ShareRejected(_))) {
            Some(MinerEvent::ShareRejected(share)) => {
                assert_eq!((share.accepted, share.rejected), (0, 1));
                assert_eq!(share.difficulty, 1);
                assert_eq!(share.ping, Duration::from_millis(5));
            }
            other => panic!("expected a rejected share, got {:?}", other),
        }
    }

    #[test]
    fn io_failure_reconnects_before_next_job() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let harness = Harness::new(vec![
            (vec![Err(reset.into())], vec![]),
            (vec![Ok(job())], vec!["GOOD"]),
        ]);
        harness.run_worker(1);

        assert_eq!(
            harness.calls(),
            vec!["connect", "job", "connect", "job", "submit", "job", "connect"]
        );
        assert_eq!(harness.context.stats.shares.accepted(), 1);
    }

    #[test]
    fn reporting_worker_shows_motd_once() {
        let harness = Harness::new(vec![
            (vec![Ok(job())], vec!["GOOD"]),
            (vec![Ok(job())], vec!["GOOD"]),
        ]);
        let events = harness.run_worker(REPORTING_WORKER);

        let motds = harness.calls().iter().filter(|c| **c == "motd").count();
        assert_eq!(motds, 1);
        assert!(events.contains(&MinerEvent::Motd {
            worker: REPORTING_WORKER,
            message: "hello miners".into(),
        }));
    }

    #[test]
    fn other_workers_skip_motd() {
        let harness = Harness::new(vec![(vec![Ok(job())], vec!["GOOD"])]);
        harness.run_worker(1);
        assert!(!harness.calls().contains(&"motd"));
    }

    #[test]
    fn hashrate_slot_tracks_last_search() {
        let harness = Harness::new(vec![(vec![Ok(job())], vec!["GOOD"])]);
        harness.run_worker(1);

        let hashrate = harness.context.stats.hashrates.get(1).unwrap();
        assert!(hashrate > 0.0);
        assert_eq!(harness.context.stats.hashrates.get(0), Some(0.0));
    }

    #[test]
    fn stopped_worker_does_not_connect() {
        let harness = Harness::new(vec![(vec![Ok(job())], vec!["GOOD"])]);
        harness.context.active.store(false, Ordering::Relaxed);
        let worker = Worker::new(1, Arc::clone(&harness.context));
        assert_eq!(worker.state(), WorkerState::Connecting);
        worker.run();
        assert!(harness.calls().is_empty());
    }

    #[test]
    fn refused_connects_are_paced() {
        let harness = Harness::refusing(Duration::from_millis(50));
        harness.run_worker_for(1, Duration::from_millis(500));

        let attempts = harness.calls().len();
        assert!(attempts >= 2, "only {} connect attempts", attempts);
        assert!(attempts <= 12, "{} connect attempts in 500ms", attempts);

        let errors: Vec<_> = harness.events.try_iter().collect();
        assert_eq!(errors.len(), attempts);
        assert!(errors.iter().all(|e| e.name() == "connection_error"));
    }

    #[test]
    fn stop_interrupts_the_reconnect_pause() {
        let harness = Harness::refusing(Duration::from_secs(30));
        let stop_took = harness.run_worker_for(1, Duration::from_millis(50));

        assert_eq!(harness.calls(), vec!["connect"]);
        assert!(stop_took < Duration::from_secs(2), "stop took {:?}", stop_took);
    }

    #[test]
    fn only_reporting_worker_emits_periodic_reports() {
        let reporter = Harness::reporting_every_share(vec![(vec![Ok(job())], vec!["GOOD"])]);
        let events = reporter.run_worker(REPORTING_WORKER);
        let reports: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                MinerEvent::PeriodicReport(report) => Some(report),
                _ => None,
            })
            .collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].shares, 1);

        let other = Harness::reporting_every_share(vec![(vec![Ok(job())], vec!["GOOD"])]);
        let events = other.run_worker(1);
        assert!(events.iter().any(|e| e.name() == "share_accepted"));
        assert!(!events.iter().any(|e| e.name() == "periodic_report"));
    }

    #[test]
    fn events_without_listener_are_dropped_quietly() {
        let harness = Harness::new(vec![(vec![Ok(job())], vec!["GOOD"])]);
        let Harness { context, events, .. } = harness;
        drop(events);

        Worker::new(1, Arc::clone(&context)).run();
        assert_eq!(context.stats.shares.accepted(), 1);
    }
}
