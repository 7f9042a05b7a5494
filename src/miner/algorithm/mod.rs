//! Proof-of-work search implementations
//!
//! Both variants scan the nonce range `0..=100 * difficulty` sequentially and
//! stop at the first nonce whose digest equals the job's target digest:
//! - DUCO-S1 (SHA-1, primary)
//! - XXHASH (seeded XXH64, alternate)
//!
//! The variant is a closed set ([`AlgorithmType`]) chosen once per worker.

/// DUCO-S1 digest state
pub mod ducos1;

/// XXHASH digest state
pub mod xxhash;

/// CPU-usage throttle applied while scanning
pub mod throttle;

pub use ducos1::DucoS1;
pub use throttle::{CpuMonitor, SystemCpu, Throttle};
pub use xxhash::XxHash;

use crate::types::{AlgorithmType, Job, SearchResult};
use std::time::Instant;

/// Lower bound on the elapsed time used for the hashrate, in seconds
const MIN_ELAPSED_SECS: f64 = 1e-9;

/// Per-job digest state shared by both search variants
///
/// Implementations precompute whatever part of the digest does not depend
/// on the nonce, then answer one nonce at a time.
pub trait Algorithm: Sized {
    /// Builds the state for `job`
    ///
    /// Returns `None` when the target digest can never be produced by this
    /// variant (wrong length, not lowercase hex).
    fn prepare(job: &Job) -> Option<Self>;

    /// Whether `nonce` reproduces the job's target digest
    fn matches(&mut self, nonce: u64) -> bool;
}

impl AlgorithmType {
    /// Searches `job` for the smallest matching nonce
    ///
    /// Never fails: a job without a match in range yields
    /// [`SearchResult::NOT_FOUND`].
    pub fn search<M: CpuMonitor>(self, job: &Job, throttle: &mut Throttle<M>) -> SearchResult {
        match self {
            AlgorithmType::DucoS1 => scan::<DucoS1, M>(job, throttle),
            AlgorithmType::XxHash => scan::<XxHash, M>(job, throttle),
        }
    }

    /// Hex digest this variant produces for `last_hash` and `nonce`
    ///
    /// Used to build local jobs for benchmarks and tests.
    pub fn digest_hex(self, last_hash: &str, nonce: u64) -> String {
        match self {
            AlgorithmType::DucoS1 => ducos1::digest_hex(last_hash, nonce),
            AlgorithmType::XxHash => xxhash::digest_hex(last_hash, nonce),
        }
    }

    /// Builds a job whose only match is `nonce`, at the given difficulty
    pub fn synthetic_job(self, last_hash: &str, nonce: u64, difficulty: u64) -> Job {
        Job {
            last_hash: last_hash.to_string(),
            target_digest: self.digest_hex(last_hash, nonce),
            difficulty,
        }
    }
}

fn scan<A: Algorithm, M: CpuMonitor>(job: &Job, throttle: &mut Throttle<M>) -> SearchResult {
    let started = Instant::now();
    let Some(mut state) = A::prepare(job) else {
        log::debug!("Target digest {:?} cannot match, skipping search", job.target_digest);
        return SearchResult::NOT_FOUND;
    };

    for nonce in 0..=job.max_nonce() {
        throttle.check(nonce);

        if state.matches(nonce) {
            let elapsed = started.elapsed().as_secs_f64().max(MIN_ELAPSED_SECS);
            return SearchResult {
                nonce,
                hashrate: nonce as f64 / elapsed,
            };
        }
    }

    SearchResult::NOT_FOUND
}

/// Renders `nonce` in decimal into `buf`, returning the written digits
pub(crate) fn decimal(nonce: u64, buf: &mut [u8; 20]) -> &[u8] {
    let mut n = nonce;
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[pos..]
}

/// Decodes a lowercase hex target of exactly `N` bytes
///
/// Digests are compared as case-sensitive strings, and both variants only
/// ever render lowercase hex, so an uppercase target can never match.
pub(crate) fn decode_target<const N: usize>(target: &str) -> Option<[u8; N]> {
    if target.len() != N * 2 || target.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(target, &mut out).ok()?;
    Some(out)
}
