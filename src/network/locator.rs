// src/network/locator.rs

//! Pool endpoint discovery
//!
//! Asks the pool directory service for the best node to mine on. The answer
//! is fetched once at startup and shared read-only by every worker.
use crate::utils::error::MinerError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default directory endpoint returning the best pool node
pub const DEFAULT_LOCATOR_URL: &str = "https://server.duinocoin.com/getPool";

/// Delay between two failed directory lookups
pub const RETRY_DELAY: Duration = Duration::from_secs(15);

/// Address of a pool node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = MinerError;

    /// Parses `host:port`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| MinerError::ConfigError(format!("Expected host:port, got {:?}", s)))?;
        if host.is_empty() {
            return Err(MinerError::ConfigError(format!("Missing host in {:?}", s)));
        }
        let port = port
            .parse()
            .map_err(|_| MinerError::ConfigError(format!("Invalid port in {:?}", s)))?;

        Ok(Endpoint {
            host: host.to_string(),
            port,
        })
    }
}

/// Directory answer: `{ "name": ..., "ip": ..., "port": ... }`
#[derive(Debug, Clone, Deserialize)]
pub struct PoolInfo {
    /// Human-readable node name
    pub name: String,
    /// Node address
    pub ip: String,
    /// Node port
    pub port: u16,
}

impl From<PoolInfo> for Endpoint {
    fn from(info: PoolInfo) -> Self {
        Endpoint {
            host: info.ip,
            port: info.port,
        }
    }
}

/// Client for the pool directory service
pub struct PoolLocator {
    client: Client,
    url: String,
    retry_delay: Duration,
}

impl PoolLocator {
    /// Creates a locator querying `url`
    pub fn new(url: impl Into<String>) -> Self {
        PoolLocator {
            client: Client::new(),
            url: url.into(),
            retry_delay: RETRY_DELAY,
        }
    }

    /// Overrides the delay between failed lookups
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Performs one directory lookup
    ///
    /// # Errors
    /// Returns `MinerError::HttpError` if the request fails or the status is
    /// not a success, `MinerError::JsonError` if the body is not the expected
    /// JSON object.
    pub async fn fetch(&self) -> Result<PoolInfo, MinerError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let info: PoolInfo = serde_json::from_str(&body)?;
        Ok(info)
    }

    /// Looks up the best pool, retrying every `retry_delay` until it succeeds
    pub async fn locate(&self) -> Endpoint {
        loop {
            log::info!("Searching for the fastest pool node");
            match self.fetch().await {
                Ok(info) => {
                    log::info!("Connecting to node {} ({}:{})", info.name, info.ip, info.port);
                    return info.into();
                }
                Err(e) => {
                    log::error!(
                        "Error retrieving mining node: {}, retrying in {}s",
                        e,
                        self.retry_delay.as_secs()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}
