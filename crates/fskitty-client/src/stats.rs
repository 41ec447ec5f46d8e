//! Per-connection counters.
//!
//! Lock-free `AtomicU64` counters with relaxed ordering; values read through
//! [`ConnectionStats::snapshot`] may be slightly stale under concurrency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Serialize;

#[derive(Debug)]
pub(crate) struct ConnectionStats {
    requests: AtomicU64,
    errors: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    sessions: AtomicU64,
    created: SystemTime,
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStats {
    pub(crate) fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            sessions: AtomicU64::new(0),
            created: SystemTime::now(),
        }
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ConnectionStatsSnapshot {
        ConnectionStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            sessions: self.sessions.load(Ordering::Relaxed),
            created: self.created,
        }
    }
}

/// Point-in-time copy of a connection's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatsSnapshot {
    /// Requests sent to the backend.
    pub requests: u64,
    /// Operations that returned an error, including ones rejected locally.
    pub errors: u64,
    /// Payload bytes received by reads.
    pub bytes_read: u64,
    /// Bytes the backend reported as written.
    pub bytes_written: u64,
    /// Sessions established over the connection's lifetime.
    pub sessions: u64,
    /// When the connection object was created.
    #[serde(with = "humantime_serde")]
    pub created: SystemTime,
}
