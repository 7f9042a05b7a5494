// src/miner/scheduler.rs
//! Worker thread management
//!
//! Spawns one OS thread per worker, staggered so the pool does not see every
//! connection at once, and owns the flag that stops them. Workers share
//! nothing but the [`MiningContext`]; each mines its own jobs.

use crate::miner::worker::{MiningContext, Worker};
use crate::network::pool::Connector;
use crate::stats::SharedStats;
use crate::utils::error::MinerError;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Delay between consecutive worker starts
pub const START_STAGGER: Duration = Duration::from_millis(50);

/// Coordinates the lifetime of the mining workers
pub struct Scheduler<C> {
    context: Arc<MiningContext<C>>,
    handles: Vec<JoinHandle<()>>,
}

impl<C> Scheduler<C>
where
    C: Connector + Send + Sync + 'static,
{
    /// Creates a scheduler; no worker runs until [`Self::start_mining`]
    pub fn new(context: MiningContext<C>) -> Self {
        Scheduler {
            context: Arc::new(context),
            handles: Vec::new(),
        }
    }

    /// Shared statistics the workers update
    pub fn stats(&self) -> Arc<SharedStats> {
        Arc::clone(&self.context.stats)
    }

    /// Whether the workers have been told to keep running
    pub fn is_active(&self) -> bool {
        self.context.active.load(Ordering::Relaxed)
    }

    /// Spawns `workers` mining threads with ids `0..workers`
    ///
    /// # Errors
    /// Returns `MinerError::IoError` if the OS refuses to spawn a thread;
    /// already started workers keep running.
    pub fn start_mining(&mut self, workers: usize) -> Result<(), MinerError> {
        for id in 0..workers {
            if id > 0 {
                thread::sleep(START_STAGGER);
            }
            let context = Arc::clone(&self.context);
            let handle = thread::Builder::new()
                .name(format!("cpu{}", id))
                .spawn(move || Worker::new(id, context).run())?;
            self.handles.push(handle);
        }

        log::info!("Started {} mining thread(s)", self.handles.len());
        Ok(())
    }

    /// Stops all mining workers
    ///
    /// Workers notice at their next connect attempt or job boundary.
    pub fn stop(&self) {
        self.context.active.store(false, Ordering::SeqCst);
    }

    /// Waits for every worker thread to finish
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                log::error!("A mining thread panicked");
            }
        }
    }
}
