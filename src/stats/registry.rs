// src/stats/registry.rs
use std::sync::atomic::{AtomicU64, Ordering};

/// Latest measured hashrate of every worker
///
/// One slot per worker id (`0..workers`), each holding the bits of an `f64`.
/// A slot is only written by its owning worker; any worker may read the sum.
/// Reads can be up to one mining cycle stale, which is fine for reporting.
#[derive(Debug)]
pub struct HashrateRegistry {
    slots: Vec<AtomicU64>,
}

impl HashrateRegistry {
    /// Creates a registry with `workers` zeroed slots
    pub fn new(workers: usize) -> Self {
        HashrateRegistry {
            slots: (0..workers).map(|_| AtomicU64::new(0f64.to_bits())).collect(),
        }
    }

    /// Overwrites the slot of `worker`
    pub fn set(&self, worker: usize, hashrate: f64) {
        match self.slots.get(worker) {
            Some(slot) => slot.store(hashrate.to_bits(), Ordering::Relaxed),
            None => log::warn!("Hashrate update for unknown worker {}", worker),
        }
    }

    /// Last value written by `worker`
    pub fn get(&self, worker: usize) -> Option<f64> {
        self.slots
            .get(worker)
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
    }

    /// Sum of every worker's latest hashrate
    pub fn sum(&self) -> f64 {
        self.slots
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .sum()
    }

    /// Number of worker slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
