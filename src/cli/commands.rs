// src/cli/commands.rs
use crate::config::Config;
use crate::types::{AlgorithmType, DifficultyTier};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Duino-Coin PC miner
#[derive(Parser, Debug)]
#[command(name = "duco-miner")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (start mining, run benchmarks, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start mining operation with specified options
    Start(StartOptions),

    /// Measure local hashrate without contacting the pool
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of worker threads to use (overrides config)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Mining algorithm to use (overrides config)
    #[arg(short, long, value_enum)]
    pub algorithm: Option<AlgorithmType>,

    /// CPU intensity in percent (overrides config)
    #[arg(short, long)]
    pub intensity: Option<u8>,

    /// Starting difficulty tier: LOW, MEDIUM or NET (overrides config)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub difficulty: Option<DifficultyTier>,

    /// Fixed pool node as host:port, skipping the pool directory
    #[arg(short, long)]
    pub pool: Option<String>,

    /// Account to mine for (overrides config)
    #[arg(short, long)]
    pub username: Option<String>,
}

impl StartOptions {
    /// Applies every override given on the command line to `config`
    ///
    /// Call before [`Config::validated`], so overrides can repair values the
    /// file gets wrong.
    pub fn apply_overrides(self, config: &mut Config) {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(intensity) = self.intensity {
            config.intensity = intensity;
        }
        if let Some(tier) = self.difficulty {
            config.start_diff = tier;
        }
        if let Some(pool) = self.pool {
            config.pool = Some(pool);
        }
        if let Some(username) = self.username {
            config.username = username;
        }
    }
}

/// Options for running mining benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Algorithm to benchmark
    #[arg(short, long, value_enum, default_value_t = AlgorithmType::DucoS1)]
    pub algorithm: AlgorithmType,

    /// Job difficulty; each job scans 100 * difficulty + 1 nonces
    #[arg(short, long, default_value_t = 10_000)]
    pub difficulty: u64,

    /// Jobs each thread searches
    #[arg(short, long, default_value_t = 5)]
    pub rounds: u32,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Account name to pre-fill
    #[arg(short, long, default_value = "my_username")]
    pub username: String,
}
