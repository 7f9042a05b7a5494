// src/config/config.rs
use crate::network::locator::{DEFAULT_LOCATOR_URL, Endpoint};
use crate::types::{AlgorithmType, DifficultyTier};
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the mining application
///
/// Supplied once before any worker starts and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Account the shares are credited to
    pub username: String,

    /// Search variant (default: DUCO-S1)
    #[serde(default)]
    pub algorithm: AlgorithmType,

    /// CPU intensity in percent, 1-100 (default: 95)
    #[serde(default = "default_intensity")]
    pub intensity: u8,

    /// Number of mining workers (default: number of CPU cores)
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Starting difficulty tier (default: MEDIUM)
    #[serde(default)]
    pub start_diff: DifficultyTier,

    /// Rig identifier sent with every share (default: "None")
    #[serde(default = "default_identifier")]
    pub identifier: String,

    /// Socket timeout in seconds (default: 15)
    #[serde(default = "default_soc_timeout")]
    pub soc_timeout: u64,

    /// Seconds between periodic reports (default: 50)
    #[serde(default = "default_report_sec")]
    pub report_sec: u64,

    /// Fixed pool node as `host:port`, bypassing the pool locator
    #[serde(default)]
    pub pool: Option<String>,

    /// Pool directory URL
    #[serde(default = "default_pool_locator")]
    pub pool_locator: String,
}

fn default_intensity() -> u8 {
    95
}

fn default_threads() -> usize {
    num_cpus::get()
}

fn default_identifier() -> String {
    "None".into()
}

fn default_soc_timeout() -> u64 {
    15
}

fn default_report_sec() -> u64 {
    50
}

fn default_pool_locator() -> String {
    DEFAULT_LOCATOR_URL.into()
}

impl Config {
    /// Creates a configuration with every default and the given username
    pub fn with_username(username: impl Into<String>) -> Self {
        Config {
            username: username.into(),
            algorithm: AlgorithmType::default(),
            intensity: default_intensity(),
            threads: default_threads(),
            start_diff: DifficultyTier::default(),
            identifier: default_identifier(),
            soc_timeout: default_soc_timeout(),
            report_sec: default_report_sec(),
            pool: None,
            pool_locator: default_pool_locator(),
        }
    }

    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded and validated configuration
    /// * `Err(MinerError)` - If file couldn't be read, parsed or validated
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        Self::read(path)?.validated()
    }

    /// Reads and parses a configuration file without validating it
    ///
    /// Lets callers apply overrides first and validate once with
    /// [`Config::validated`].
    ///
    /// # Errors
    /// Returns `MinerError::ConfigError` if the file couldn't be read or parsed.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&config_str)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Checks required fields and clamps out-of-range values
    ///
    /// # Errors
    /// Returns `MinerError::ConfigError` if the username is empty or the
    /// fixed pool address is not `host:port`.
    pub fn validated(mut self) -> Result<Self, MinerError> {
        self.username = self.username.trim().to_string();
        if self.username.is_empty() {
            return Err(MinerError::ConfigError("username must not be empty".into()));
        }

        if !(1..=100).contains(&self.intensity) {
            let clamped = self.intensity.clamp(1, 100);
            log::warn!("intensity {} out of range, using {}", self.intensity, clamped);
            self.intensity = clamped;
        }
        if self.threads == 0 {
            log::warn!("threads must be at least 1, using 1");
            self.threads = 1;
        }
        if self.soc_timeout == 0 {
            log::warn!("soc_timeout must be at least 1 second, using {}", default_soc_timeout());
            self.soc_timeout = default_soc_timeout();
        }
        if self.identifier.trim().is_empty() {
            self.identifier = default_identifier();
        }
        if let Some(pool) = &self.pool {
            pool.parse::<Endpoint>()?;
        }

        Ok(self)
    }

    /// Fixed pool endpoint, if configured
    pub fn pool_endpoint(&self) -> Result<Option<Endpoint>, MinerError> {
        self.pool.as_deref().map(str::parse).transpose()
    }

    /// Socket timeout as a duration
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.soc_timeout)
    }

    /// Periodic report interval as a duration
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_sec)
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `username` - Account name to pre-fill
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template(username: &str) -> String {
        let mut template = String::new();
        template.push_str("# Duino-Coin PC miner configuration\n\n");
        template.push_str(&format!("username = \"{}\"\n", username));
        template.push_str("# Supported algorithms: DUCO-S1, XXHASH\n");
        template.push_str("algorithm = \"DUCO-S1\"\n");
        template.push_str("# CPU intensity in percent (1-100)\n");
        template.push_str("intensity = 95\n");
        template.push_str(&format!("# Number of mining threads\nthreads = {}\n", default_threads()));
        template.push_str("# Starting difficulty: LOW, MEDIUM or NET\n");
        template.push_str("start_diff = \"MEDIUM\"\n");
        template.push_str("# Rig identifier shown in the wallet (\"None\" for no identifier)\n");
        template.push_str("identifier = \"None\"\n");
        template.push_str("# Socket timeout in seconds\n");
        template.push_str("soc_timeout = 15\n");
        template.push_str("# Seconds between periodic mining reports\n");
        template.push_str("report_sec = 50\n\n");
        template.push_str("# Mine on a fixed node instead of asking the pool directory\n");
        template.push_str("# pool = \"127.0.0.1:2811\"\n");
        template.push_str(&format!("pool_locator = \"{}\"\n", DEFAULT_LOCATOR_URL));

        template
    }
}
