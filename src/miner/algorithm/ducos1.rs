//! DUCO-S1 algorithm implementation
//!
//! SHA-1 over the job's `last_hash` immediately followed by the decimal
//! nonce. The `last_hash` prefix is absorbed once per job and the hasher
//! state is cloned for every candidate.

use crate::miner::algorithm::{Algorithm, decimal, decode_target};
use crate::types::Job;
use sha1::{Digest, Sha1};

/// Length of a SHA-1 digest in bytes
const DIGEST_LEN: usize = 20;

/// Per-job DUCO-S1 search state
#[derive(Clone)]
pub struct DucoS1 {
    /// Hasher that has already absorbed `last_hash`
    base: Sha1,
    /// Decoded target digest
    target: [u8; DIGEST_LEN],
    /// Scratch space for the nonce digits
    digits: [u8; 20],
}

impl Algorithm for DucoS1 {
    fn prepare(job: &Job) -> Option<Self> {
        let target = decode_target::<DIGEST_LEN>(&job.target_digest)?;
        let mut base = Sha1::new();
        base.update(job.last_hash.as_bytes());

        Some(Self {
            base,
            target,
            digits: [0u8; 20],
        })
    }

    fn matches(&mut self, nonce: u64) -> bool {
        let mut hasher = self.base.clone();
        hasher.update(decimal(nonce, &mut self.digits));
        hasher.finalize().as_slice() == self.target
    }
}

/// Lowercase hex SHA-1 of `last_hash` followed by the decimal `nonce`
pub fn digest_hex(last_hash: &str, nonce: u64) -> String {
    let mut hasher = Sha1::new();
    hasher.update(last_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
