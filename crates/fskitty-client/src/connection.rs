//! The host-owned connection handle.

use std::sync::Arc;

use fskitty_proto::{Endpoint, Request, Response};
use parking_lot::RwLock;
use tokio::runtime::{self, Runtime};
use tracing::{debug, info};

use crate::session::Session;
use crate::stats::{ConnectionStats, ConnectionStatsSnapshot};
use crate::{ClientConfig, VfsError};

/// A blocking handle to a VFS backend.
///
/// The connection is either *disconnected* (every operation fails with
/// [`NotConnected`](crate::VfsErrorKind::NotConnected) without touching the
/// network) or holds one session. A session whose transport failed stays
/// installed and answers every operation with
/// [`ConnectionError`](crate::VfsErrorKind::ConnectionError) until the host
/// calls [`reconnect`](Self::reconnect) or [`disconnect`](Self::disconnect).
///
/// `Connection` is `Send + Sync`; concurrent calls share the session and are
/// multiplexed by request ID. Its methods block, so they must not be called
/// from inside an async runtime.
pub struct Connection {
    runtime: Runtime,
    config: ClientConfig,
    session: RwLock<Option<Arc<Session>>>,
    stats: ConnectionStats,
}

impl Connection {
    /// Creates a disconnected handle.
    pub fn new(config: ClientConfig) -> Result<Self, VfsError> {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("fskitty-client")
            .enable_all()
            .build()
            .map_err(|e| VfsError::io(format!("failed to start client runtime: {e}")))?;

        Ok(Self {
            runtime,
            config,
            session: RwLock::new(None),
            stats: ConnectionStats::new(),
        })
    }

    /// Connects to `address` with the default configuration.
    pub fn connect(address: &str) -> Result<Self, VfsError> {
        Self::connect_with_config(address, ClientConfig::default())
    }

    /// Connects to `address` with a custom configuration.
    pub fn connect_with_config(address: &str, config: ClientConfig) -> Result<Self, VfsError> {
        let connection = Self::new(config)?;
        connection.reconnect(address)?;
        Ok(connection)
    }

    /// Replaces the current session (if any) with a new one to `address`.
    ///
    /// The old session is shut down first. If the new connection cannot be
    /// established the handle is left disconnected.
    pub fn reconnect(&self, address: &str) -> Result<(), VfsError> {
        let endpoint = Endpoint::parse(address)?;
        self.disconnect();

        let session = self
            .runtime
            .block_on(Session::open(&endpoint, &self.config))?;
        info!(%endpoint, server = session.server(), "Connected to VFS backend");

        let previous = self.session.write().replace(Arc::new(session));
        if let Some(previous) = previous {
            // Another thread connected concurrently; keep the newest session.
            self.runtime.block_on(previous.close());
        }
        self.stats.record_session();
        Ok(())
    }

    /// Shuts down the current session. Does nothing when already disconnected.
    pub fn disconnect(&self) {
        let previous = self.session.write().take();
        if let Some(session) = previous {
            debug!(server = session.server(), "Disconnecting");
            self.runtime.block_on(session.close());
        }
    }

    /// Whether a session is installed and its transport has not failed.
    /// Never contacts the backend.
    pub fn is_connected(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .is_some_and(|session| !session.is_failed())
    }

    /// Name the backend announced, if connected.
    pub fn server_name(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|session| session.server().to_string())
    }

    /// Round-trips a ping and returns the backend's banner.
    pub fn ping(&self) -> Result<String, VfsError> {
        let session = self.session()?;
        match self.send(&session, Request::Ping)? {
            Response::Pong(banner) => Ok(banner),
            other => Err(unexpected_reply("ping", &other)),
        }
    }

    /// The configuration this connection was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current counters.
    pub fn stats(&self) -> ConnectionStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the installed session or `NotConnected`.
    pub(crate) fn session(&self) -> Result<Arc<Session>, VfsError> {
        match self.session.read().as_ref() {
            Some(session) => Ok(Arc::clone(session)),
            None => {
                self.stats.record_error();
                Err(VfsError::not_connected())
            }
        }
    }

    /// Sends `request` on `session` and waits for the reply.
    pub(crate) fn send(&self, session: &Session, request: Request) -> Result<Response, VfsError> {
        self.stats.record_request();
        self.track(self.runtime.block_on(session.call(request)))
    }

    /// Counts errors produced outside the transport (argument checks, reply validation).
    pub(crate) fn track<T>(&self, result: Result<T, VfsError>) -> Result<T, VfsError> {
        if let Err(e) = &result {
            self.stats.record_error();
            debug!(kind = ?e.kind(), error = %e, "Operation failed");
        }
        result
    }

    pub(crate) fn chunk_size(&self) -> usize {
        self.config.chunk_size()
    }

    pub(crate) fn stats_handle(&self) -> &ConnectionStats {
        &self.stats
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("server", &self.server_name())
            .field("connected", &self.is_connected())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Error for a reply whose variant does not match the request.
pub(crate) fn unexpected_reply(op: &str, response: &Response) -> VfsError {
    VfsError::io(format!("backend sent a mismatched reply to {op}: {response:?}"))
}
