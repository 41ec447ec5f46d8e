//! Client configuration.
//!
//! Defaults suit a backend on the local network. Hosts that keep settings in a
//! file can deserialize [`ClientConfig`] (durations use humantime strings such
//! as `"5s"` or `"1m 30s"`); [`ClientConfig::from_env`] overlays environment
//! variables on top of the defaults.

use std::time::Duration;

use fskitty_proto::DEFAULT_MAX_FRAME_LEN;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default time allowed for the TCP connect plus handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time allowed for a single request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default chunk size for reads and writes (1 MiB).
pub const DEFAULT_IO_CHUNK_SIZE: usize = 1024 * 1024;

/// Default number of runtime worker threads.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Overrides `connect_timeout` (humantime, e.g. `10s`).
pub const ENV_CONNECT_TIMEOUT: &str = "FSKITTY_CONNECT_TIMEOUT";
/// Overrides `request_timeout` (humantime).
pub const ENV_REQUEST_TIMEOUT: &str = "FSKITTY_REQUEST_TIMEOUT";
/// Overrides `io_chunk_size` (bytes).
pub const ENV_IO_CHUNK_SIZE: &str = "FSKITTY_IO_CHUNK_SIZE";

/// Bytes reserved in each frame for the request header around a data chunk.
const FRAME_OVERHEAD: usize = 64;

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A duration variable could not be parsed.
    #[error("{var}: invalid duration '{value}': {source}")]
    InvalidDuration {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
        /// Parser error.
        #[source]
        source: humantime::DurationError,
    },
    /// A numeric variable could not be parsed or is zero.
    #[error("{var}: expected a positive integer, got '{value}'")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Settings for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Time allowed to open the transport and complete the handshake.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Time allowed for each request. Expiry surfaces as a connection error;
    /// the request is not retried.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Largest frame sent or accepted.
    pub max_frame_len: usize,

    /// Largest single read or write sent to the backend. Longer reads are
    /// clamped and longer writes are sent short; `read_to_end` and `write_all`
    /// loop in chunks of this size.
    pub io_chunk_size: usize,

    /// Worker threads for the connection's runtime.
    pub worker_threads: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            io_chunk_size: DEFAULT_IO_CHUNK_SIZE,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `FSKITTY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT) {
            self.connect_timeout = parse_duration(ENV_CONNECT_TIMEOUT, value)?;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout = parse_duration(ENV_REQUEST_TIMEOUT, value)?;
        }
        if let Some(value) = lookup(ENV_IO_CHUNK_SIZE) {
            self.io_chunk_size = match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: ENV_IO_CHUNK_SIZE,
                        value,
                    });
                }
            };
        }
        Ok(self)
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum frame length.
    #[must_use]
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Sets the I/O chunk size.
    #[must_use]
    pub fn io_chunk_size(mut self, size: usize) -> Self {
        self.io_chunk_size = size;
        self
    }

    /// Sets the number of runtime worker threads.
    #[must_use]
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Chunk size actually used: at least one byte, and small enough that a
    /// full write request still fits in a frame.
    pub(crate) fn chunk_size(&self) -> usize {
        let ceiling = self.max_frame_len.saturating_sub(FRAME_OVERHEAD).max(1);
        self.io_chunk_size.clamp(1, ceiling)
    }
}

fn parse_duration(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim())
        .map_err(|source| ConfigError::InvalidDuration { var, value, source })
}
