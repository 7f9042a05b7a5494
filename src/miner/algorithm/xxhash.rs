//! XXHASH algorithm implementation
//!
//! Seeded XXH64 over the job's `last_hash` followed by the decimal nonce,
//! rendered as 16 big-endian hex digits.

use crate::miner::algorithm::{Algorithm, decimal, decode_target};
use crate::types::Job;
use xxhash_rust::xxh64::xxh64;

/// Seed the pool uses for XXHASH jobs
pub const SEED: u64 = 2811;

/// Per-job XXHASH search state
pub struct XxHash {
    /// `last_hash` bytes followed by the digits of the current candidate
    input: Vec<u8>,
    /// Length of the `last_hash` prefix inside `input`
    prefix_len: usize,
    target: u64,
}

impl Algorithm for XxHash {
    fn prepare(job: &Job) -> Option<Self> {
        let target = u64::from_be_bytes(decode_target::<8>(&job.target_digest)?);
        let mut input = Vec::with_capacity(job.last_hash.len() + 20);
        input.extend_from_slice(job.last_hash.as_bytes());

        Some(Self {
            prefix_len: input.len(),
            input,
            target,
        })
    }

    fn matches(&mut self, nonce: u64) -> bool {
        let mut digits = [0u8; 20];
        self.input.truncate(self.prefix_len);
        self.input.extend_from_slice(decimal(nonce, &mut digits));
        xxh64(&self.input, SEED) == self.target
    }
}

/// Lowercase hex XXH64 of `last_hash` followed by the decimal `nonce`
pub fn digest_hex(last_hash: &str, nonce: u64) -> String {
    let input = format!("{}{}", last_hash, nonce);
    format!("{:016x}", xxh64(input.as_bytes(), SEED))
}
