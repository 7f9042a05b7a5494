// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proof-of-work search variants understood by the pool
///
/// The variant is chosen once per worker at startup. It decides both the
/// digest computed for every nonce candidate and the job request tag sent
/// to the pool, so that the issued target digest is compatible.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum AlgorithmType {
    /// DUCO-S1: SHA-1 over `last_hash` followed by the decimal nonce
    ///
    /// The primary algorithm, requested with the `JOB` tag.
    #[default]
    #[clap(name = "duco-s1")]
    #[serde(rename = "DUCO-S1")]
    DucoS1,

    /// XXHASH: seeded XXH64 over `last_hash` followed by the decimal nonce
    ///
    /// Faster, non-cryptographic alternative, requested with `JOBXX`.
    #[clap(name = "xxhash")]
    #[serde(rename = "XXHASH")]
    XxHash,
}

impl AlgorithmType {
    /// Tag placed in the first field of a job request
    pub fn job_request_tag(self) -> &'static str {
        match self {
            AlgorithmType::DucoS1 => "JOB",
            AlgorithmType::XxHash => "JOBXX",
        }
    }

    /// Name the pool uses for this algorithm (also part of the client tag)
    pub fn pool_name(self) -> &'static str {
        match self {
            AlgorithmType::DucoS1 => "DUCO-S1",
            AlgorithmType::XxHash => "XXHASH",
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pool_name())
    }
}

impl FromStr for AlgorithmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duco-s1" | "ducos1" => Ok(AlgorithmType::DucoS1),
            "xxhash" | "xxh" => Ok(AlgorithmType::XxHash),
            _ => Err(format!("Unknown algorithm: {}", s)),
        }
    }
}

/// Starting difficulty tier requested from the pool
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DifficultyTier {
    /// Low difficulty, for slow machines
    Low,
    /// Medium difficulty (default)
    #[default]
    Medium,
    /// Network difficulty
    Net,
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyTier::Low => write!(f, "LOW"),
            DifficultyTier::Medium => write!(f, "MEDIUM"),
            DifficultyTier::Net => write!(f, "NET"),
        }
    }
}

impl FromStr for DifficultyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(DifficultyTier::Low),
            "MEDIUM" => Ok(DifficultyTier::Medium),
            "NET" => Ok(DifficultyTier::Net),
            _ => Err(format!("Unknown difficulty tier: {}", s)),
        }
    }
}

/// One unit of work issued by the pool
///
/// A job is consumed by exactly one search and never resubmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Seed hash the nonce is appended to
    pub last_hash: String,
    /// Hex digest a matching nonce must reproduce
    pub target_digest: String,
    /// Scales the search space to `100 * difficulty + 1` candidates
    pub difficulty: u64,
}

impl Job {
    /// Largest nonce candidate for this job (inclusive)
    pub fn max_nonce(&self) -> u64 {
        self.difficulty.saturating_mul(100)
    }
}

/// Outcome of one search over a job's nonce range
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchResult {
    /// Matching nonce, or 0 when nothing matched
    pub nonce: u64,
    /// Hashes per second at the moment of the match, or 0 when nothing matched
    pub hashrate: f64,
}

impl SearchResult {
    /// The "no match in range" outcome, still submitted to the pool
    pub const NOT_FOUND: SearchResult = SearchResult {
        nonce: 0,
        hashrate: 0.0,
    };

    /// Whether this is the `{0, 0}` sentinel
    pub fn is_not_found(&self) -> bool {
        self.nonce == 0 && self.hashrate == 0.0
    }
}
