//! CPU-usage throttle for the nonce scan
//!
//! When the configured intensity is below 100%, the scan samples overall CPU
//! usage every `1000 * intensity` candidates and pauses for
//! `1 / intensity` seconds whenever usage is above the intensity. The pause
//! only stretches wall-clock time; it never changes which nonce is found.

use std::thread;
use std::time::Duration;
use sysinfo::System;

/// Source of overall CPU utilisation, in percent
pub trait CpuMonitor {
    /// Current system-wide CPU usage (0-100)
    fn cpu_usage(&mut self) -> f32;
}

/// [`CpuMonitor`] backed by `sysinfo`
pub struct SystemCpu {
    system: System,
}

impl SystemCpu {
    /// Creates a monitor and takes the baseline sample usage is measured against
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self { system }
    }
}

impl Default for SystemCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuMonitor for SystemCpu {
    fn cpu_usage(&mut self) -> f32 {
        self.system.refresh_cpu_all();
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return 0.0;
        }
        cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
    }
}

/// Intensity-bounded pacing for one worker's searches
pub struct Throttle<M = SystemCpu> {
    percent: u8,
    /// Candidates between two CPU samples
    interval: u64,
    monitor: M,
    samples: u64,
    pauses: u64,
}

impl Throttle<SystemCpu> {
    /// Creates a throttle that samples the real system CPU usage
    pub fn new(percent: u8) -> Self {
        Self::with_monitor(percent, SystemCpu::new())
    }
}

impl<M: CpuMonitor> Throttle<M> {
    /// Creates a throttle over an arbitrary CPU monitor
    ///
    /// `percent` is clamped to `1..=100`.
    pub fn with_monitor(percent: u8, monitor: M) -> Self {
        let percent = percent.clamp(1, 100);
        Self {
            percent,
            interval: 1_000 * u64::from(percent),
            monitor,
            samples: 0,
            pauses: 0,
        }
    }

    /// Configured intensity in percent
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// How long one pause lasts
    pub fn pause_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.percent))
    }

    /// Called for every nonce candidate before it is hashed
    #[inline]
    pub fn check(&mut self, nonce: u64) {
        if self.percent == 100 || nonce % self.interval != 0 {
            return;
        }

        self.samples += 1;
        if self.monitor.cpu_usage() > f32::from(self.percent) {
            self.pauses += 1;
            thread::sleep(self.pause_duration());
        }
    }

    /// Number of CPU samples taken so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Number of pauses taken so far
    pub fn pauses(&self) -> u64 {
        self.pauses
    }
}
