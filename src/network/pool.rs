// src/network/pool.rs

//! Mining pool session implementation
//!
//! One session owns one TCP stream to the pool and drives the line-based
//! protocol over it: version handshake, MOTD, job requests and result
//! submission. Fields are separated by `,`; replies are newline terminated.
//! Any failure ends the session; the owning worker reconnects from scratch.
use crate::network::locator::Endpoint;
use crate::types::{AlgorithmType, DifficultyTier, Job, SearchResult};
use crate::utils::error::MinerError;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Protocol version this client speaks
pub const CLIENT_VERSION: &str = "2.7";

/// Field separator used in every message
pub const SEPARATOR: char = ',';

/// Maximum number of bytes read for the version handshake
const HANDSHAKE_LEN: usize = 5;

/// Name reported to the pool in the client tag
const MINER_NAME: &str = "Official PC Miner";

/// Pool verdict on a submitted result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Share accepted
    Good,
    /// Share solved a block
    Block,
    /// Share rejected
    Bad,
    /// Any other first field, kept verbatim
    Other(String),
}

impl Feedback {
    /// Classifies the first field of a submission reply
    pub fn parse(verdict: &str) -> Self {
        match verdict {
            "GOOD" => Feedback::Good,
            "BLOCK" => Feedback::Block,
            "BAD" => Feedback::Bad,
            other => Feedback::Other(other.to_string()),
        }
    }
}

/// Verdict and client-side round-trip time of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The pool's verdict
    pub feedback: Feedback,
    /// Time from sending the result to receiving the full reply
    pub ping: Duration,
}

/// Client tag sent with every result, e.g. `Official PC Miner (DUCO-S1) v2.7`
pub fn client_tag(algorithm: AlgorithmType) -> String {
    format!("{} ({}) v{}", MINER_NAME, algorithm.pool_name(), CLIENT_VERSION)
}

/// Whether the server's protocol version is newer than ours
///
/// # Errors
/// Returns `MinerError::ProtocolError` if the version is not a number.
pub fn server_is_newer(server_version: &str) -> Result<bool, MinerError> {
    let server: f64 = server_version.parse().map_err(|_| {
        MinerError::ProtocolError(format!("Invalid server version {:?}", server_version))
    })?;
    let client: f64 = CLIENT_VERSION.parse().unwrap_or(0.0);
    Ok(server > client)
}

/// Sequential operations on one exclusively owned pool connection
///
/// Implemented by [`PoolSession`]; workers are written against this trait so
/// that their state machine can be driven by scripted sessions.
pub trait PoolProtocol {
    /// Version token the server sent on connect
    fn server_version(&self) -> &str;

    /// Asks for the message of the day
    fn request_motd(&mut self) -> Result<String, MinerError>;

    /// Asks for a fresh job compatible with `algorithm`
    fn request_job(
        &mut self,
        username: &str,
        tier: DifficultyTier,
        algorithm: AlgorithmType,
    ) -> Result<Job, MinerError>;

    /// Submits a search result and waits for the verdict
    fn submit_result(
        &mut self,
        result: &SearchResult,
        client_tag: &str,
        rig_identifier: &str,
    ) -> Result<Submission, MinerError>;
}

/// Opens pool sessions
pub trait Connector {
    /// Session type produced by this connector
    type Session: PoolProtocol;

    /// Opens a session against `endpoint`, including the version handshake
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Session, MinerError>;
}

/// Opens [`PoolSession`]s over TCP with a socket timeout
#[derive(Debug, Clone)]
pub struct TcpConnector {
    /// Bounds connect, read and write calls
    timeout: Duration,
}

impl TcpConnector {
    /// Creates a connector whose sockets time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for TcpConnector {
    type Session = PoolSession<TcpStream>;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Session, MinerError> {
        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| MinerError::ConnectionError(format!("Cannot resolve {}: {}", endpoint, e)))?
            .next()
            .ok_or_else(|| MinerError::ConnectionError(format!("No address for {}", endpoint)))?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| MinerError::ConnectionError(format!("Connection to {} failed: {}", endpoint, e)))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;

        PoolSession::handshake(stream)
    }
}

/// One live connection to the pool
pub struct PoolSession<S: Read + Write> {
    stream: BufReader<S>,
    server_version: String,
    /// The version token arrived without its newline
    newline_pending: bool,
}

impl<S: Read + Write> PoolSession<S> {
    /// Reads the server's version token from a freshly opened stream
    ///
    /// A newer server version only produces a warning; mining goes on.
    ///
    /// # Errors
    /// `ConnectionError` if the stream closes before the handshake,
    /// `ProtocolError` if the token is not a version number.
    pub fn handshake(stream: S) -> Result<Self, MinerError> {
        let mut stream = BufReader::new(stream);
        // One read, like a plain recv: take at most HANDSHAKE_LEN bytes, up
        // to and including a newline, and leave the rest buffered.
        let available = stream.fill_buf()?;
        if available.is_empty() {
            return Err(MinerError::ConnectionError(
                "Connection closed before handshake".into(),
            ));
        }
        let len = available
            .iter()
            .take(HANDSHAKE_LEN)
            .position(|&b| b == b'\n')
            .map_or(available.len().min(HANDSHAKE_LEN), |i| i + 1);
        let token = available[..len].to_vec();
        stream.consume(len);
        let newline_pending = !token.ends_with(b"\n");

        let server_version = String::from_utf8_lossy(&token).trim().to_string();
        if server_is_newer(&server_version)? {
            log::warn!(
                "Miner is outdated (v{}), server is on v{}; consider updating",
                CLIENT_VERSION,
                server_version
            );
        } else {
            log::debug!("Pool handshake ok, server v{}", server_version);
        }

        Ok(Self {
            stream,
            server_version,
            newline_pending,
        })
    }

    fn send(&mut self, message: &str) -> Result<(), MinerError> {
        let stream = self.stream.get_mut();
        stream.write_all(message.as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<String, MinerError> {
        let mut line = self.read_raw_line()?;
        // The handshake's newline may trail in its own segment.
        if std::mem::take(&mut self.newline_pending) && matches!(line.as_str(), "\n" | "\r\n") {
            log::trace!("Skipping the handshake's late newline");
            line = self.read_raw_line()?;
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_raw_line(&mut self) -> Result<String, MinerError> {
        let mut line = String::new();
        if self.stream.read_line(&mut line)? == 0 {
            return Err(MinerError::ConnectionError(
                "Connection closed by pool".into(),
            ));
        }
        Ok(line)
    }
}

impl<S: Read + Write> PoolProtocol for PoolSession<S> {
    fn server_version(&self) -> &str {
        &self.server_version
    }

    fn request_motd(&mut self) -> Result<String, MinerError> {
        self.send("MOTD")?;
        self.recv_line()
    }

    fn request_job(
        &mut self,
        username: &str,
        tier: DifficultyTier,
        algorithm: AlgorithmType,
    ) -> Result<Job, MinerError> {
        let request = format!(
            "{tag}{sep}{username}{sep}{tier}",
            tag = algorithm.job_request_tag(),
            sep = SEPARATOR,
        );
        self.send(&request)?;

        let reply = self.recv_line()?;
        parse_job(&reply)
    }

    fn submit_result(
        &mut self,
        result: &SearchResult,
        client_tag: &str,
        rig_identifier: &str,
    ) -> Result<Submission, MinerError> {
        let message = format!(
            "{nonce}{sep}{rate}{sep}{client_tag}{sep}{rig_identifier}",
            nonce = result.nonce,
            rate = result.hashrate,
            sep = SEPARATOR,
        );

        let sent_at = Instant::now();
        self.send(&message)?;
        let reply = self.recv_line()?;
        let ping = sent_at.elapsed();

        let verdict = reply.split(SEPARATOR).next().unwrap_or_default();
        Ok(Submission {
            feedback: Feedback::parse(verdict),
            ping,
        })
    }
}

/// Parses a `<last_hash>,<target_digest>,<difficulty>` job reply
///
/// # Errors
/// Returns `MinerError::ProtocolError` if fields are missing or the
/// difficulty is not an unsigned integer.
pub fn parse_job(reply: &str) -> Result<Job, MinerError> {
    let mut fields = reply.split(SEPARATOR);
    let (Some(last_hash), Some(target_digest), Some(difficulty)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Err(MinerError::ProtocolError(format!(
            "Incomplete job reply: {:?}",
            reply
        )));
    };

    let difficulty = difficulty.trim().parse().map_err(|_| {
        MinerError::ProtocolError(format!("Invalid job difficulty: {:?}", difficulty))
    })?;

    Ok(Job {
        last_hash: last_hash.to_string(),
        target_digest: target_digest.to_string(),
        difficulty,
    })
}
