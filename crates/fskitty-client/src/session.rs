//! One live protocol session.
//!
//! Requests from any number of threads share a single stream. Each request gets
//! a fresh ID and a oneshot slot in `pending`; writes are serialized by the
//! writer mutex; a background reader routes every reply to the slot with the
//! matching ID. When the transport fails, the reader records the reason and
//! drops all slots so every waiter fails at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use fskitty_proto::{
    ClientHello, Endpoint, PROTOCOL_VERSION, ProtoError, Request, RequestFrame, Response,
    ResponseFrame, ServerHello, decode, encode, frame_codec,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, trace, warn};

use crate::{ClientConfig, VfsError};

trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Transport for T {}

type Wire = Framed<Box<dyn Transport>, LengthDelimitedCodec>;

/// Time allowed to flush and shut down the stream on close.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// State shared with the reader task.
#[derive(Default)]
struct Shared {
    pending: DashMap<u64, oneshot::Sender<Response>>,
    failure: Mutex<Option<String>>,
}

impl Shared {
    fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    /// Marks the session failed and wakes every waiter. The first reason wins.
    fn fail(&self, reason: String) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                *failure = Some(reason);
            }
        }
        self.pending.clear();
    }
}

pub(crate) struct Session {
    writer: AsyncMutex<SplitSink<Wire, Bytes>>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
    request_timeout: Duration,
    max_frame_len: usize,
    server: String,
}

impl Session {
    /// Connects, performs the handshake and starts the reader task.
    pub(crate) async fn open(endpoint: &Endpoint, config: &ClientConfig) -> Result<Self, VfsError> {
        let connect_timeout = config.connect_timeout;
        let (wire, hello) = tokio::time::timeout(connect_timeout, async {
            let stream = open_transport(endpoint).await?;
            let mut wire = Framed::new(stream, frame_codec(config.max_frame_len));
            let hello = handshake(&mut wire).await?;
            Ok::<_, VfsError>((wire, hello))
        })
        .await
        .map_err(|_| {
            VfsError::connection(format!(
                "timed out after {connect_timeout:?} connecting to {endpoint}"
            ))
        })??;

        if hello.protocol_version != PROTOCOL_VERSION {
            return Err(VfsError::connection(format!(
                "backend speaks protocol {}, client speaks {PROTOCOL_VERSION}",
                hello.protocol_version
            )));
        }
        debug!(%endpoint, server = %hello.server, "Session established");

        let (sink, stream) = wire.split();
        let shared = Arc::new(Shared::default());
        let reader = tokio::spawn(read_loop(stream, Arc::clone(&shared)));

        Ok(Self {
            writer: AsyncMutex::new(sink),
            shared,
            next_id: AtomicU64::new(1),
            reader,
            request_timeout: config.request_timeout,
            max_frame_len: config.max_frame_len,
            server: hello.server,
        })
    }

    /// Name the backend announced in its handshake.
    pub(crate) fn server(&self) -> &str {
        &self.server
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.shared.failure.lock().is_some()
    }

    /// Sends one request and waits for its reply.
    ///
    /// `Response::Rejected` is returned as an error; any other reply is handed
    /// back for the caller to match against the request's operation.
    pub(crate) async fn call(&self, request: Request) -> Result<Response, VfsError> {
        if let Some(reason) = self.shared.failure() {
            return Err(VfsError::connection(reason));
        }

        let op = request.op_name();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = encode(&RequestFrame { id, request })?;
        if payload.len() > self.max_frame_len {
            return Err(VfsError::invalid_argument(format!(
                "{op} request of {} bytes exceeds the {}-byte frame limit",
                payload.len(),
                self.max_frame_len
            )));
        }

        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(id, tx);
        // The reader may have failed between the first check and the insert.
        if let Some(reason) = self.shared.failure() {
            self.shared.pending.remove(&id);
            return Err(VfsError::connection(reason));
        }

        // One deadline covers the writer lock, the send and the reply.
        let deadline = Instant::now() + self.request_timeout;
        trace!(request_id = id, op, "Sending request");
        {
            let Ok(mut writer) = tokio::time::timeout_at(deadline, self.writer.lock()).await else {
                self.shared.pending.remove(&id);
                return Err(self.timed_out(id, op));
            };
            if let Some(reason) = self.shared.failure() {
                self.shared.pending.remove(&id);
                return Err(VfsError::connection(reason));
            }
            match tokio::time::timeout_at(deadline, writer.send(payload)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let reason = format!("failed to send {op} request: {e}");
                    warn!(request_id = id, %reason, "Transport failed");
                    self.shared.fail(reason.clone());
                    return Err(VfsError::connection(reason));
                }
                Err(_) => {
                    // A partly written frame leaves the stream unusable.
                    let reason = format!(
                        "{op} request could not be sent within {:?}",
                        self.request_timeout
                    );
                    warn!(request_id = id, %reason, "Transport stalled");
                    self.shared.fail(reason.clone());
                    return Err(VfsError::connection(reason));
                }
            }
        }

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(Response::Rejected(remote))) => Err(remote.into()),
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(VfsError::connection(
                self.shared
                    .failure()
                    .unwrap_or_else(|| "session closed".to_string()),
            )),
            Err(_) => {
                self.shared.pending.remove(&id);
                Err(self.timed_out(id, op))
            }
        }
    }

    fn timed_out(&self, id: u64, op: &str) -> VfsError {
        warn!(request_id = id, op, timeout = ?self.request_timeout, "Request timed out");
        VfsError::connection(format!("{op} timed out after {:?}", self.request_timeout))
    }

    /// Fails outstanding requests and closes the stream.
    ///
    /// Never waits on a request that is stuck writing; in that case the stream
    /// closes once the last reference to the session is dropped.
    pub(crate) async fn close(&self) {
        self.shared.fail("session closed by client".to_string());
        self.reader.abort();
        let Ok(mut writer) = self.writer.try_lock() else {
            debug!("Writer busy, leaving the stream to close on drop");
            return;
        };
        match tokio::time::timeout(CLOSE_GRACE, writer.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Error while closing session"),
            Err(_) => debug!("Backend did not accept the close in time"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn open_transport(endpoint: &Endpoint) -> Result<Box<dyn Transport>, VfsError> {
    let connect_error = |e: std::io::Error| {
        VfsError::connection(format!("failed to connect to {endpoint}: {e}"))
    };

    match endpoint {
        Endpoint::Tcp { .. } => {
            let addr = endpoint.socket_addr_string().unwrap_or_default();
            let stream = TcpStream::connect(&addr).await.map_err(connect_error)?;
            if let Err(e) = stream.set_nodelay(true) {
                debug!(error = %e, "Failed to set TCP_NODELAY");
            }
            Ok(Box::new(stream))
        }
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let stream = UnixStream::connect(path).await.map_err(connect_error)?;
            Ok(Box::new(stream))
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(VfsError::connection(
            "unix socket addresses are not supported on this platform",
        )),
    }
}

async fn handshake(wire: &mut Wire) -> Result<ServerHello, VfsError> {
    let hello = ClientHello {
        protocol_version: PROTOCOL_VERSION,
        client: format!("fskitty-client/{}", env!("CARGO_PKG_VERSION")),
    };
    wire.send(encode(&hello)?)
        .await
        .map_err(|e| VfsError::connection(format!("handshake failed: {e}")))?;

    let payload = wire
        .next()
        .await
        .ok_or(ProtoError::Closed)?
        .map_err(|e| VfsError::connection(format!("handshake failed: {e}")))?;
    Ok(decode(&payload)?)
}

async fn read_loop(mut frames: SplitStream<Wire>, shared: Arc<Shared>) {
    let reason = loop {
        let payload = match frames.next().await {
            Some(Ok(payload)) => payload,
            Some(Err(e)) => break format!("transport error: {e}"),
            None => break "connection closed by backend".to_string(),
        };
        let frame: ResponseFrame = match decode(&payload) {
            Ok(frame) => frame,
            Err(e) => break format!("undecodable reply: {e}"),
        };
        match shared.pending.remove(&frame.id) {
            Some((_, waiter)) => {
                if waiter.send(frame.response).is_err() {
                    trace!(request_id = frame.id, "Waiter gave up before reply arrived");
                }
            }
            None => debug!(request_id = frame.id, "Reply for unknown or abandoned request"),
        }
    };

    warn!(%reason, "VFS session failed");
    shared.fail(reason);
}
