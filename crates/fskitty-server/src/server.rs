//! Listener and per-connection request loop.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use fskitty_proto::{
    ClientHello, DEFAULT_MAX_FRAME_LEN, Endpoint, PROTOCOL_VERSION, ProtoError, RemoteError,
    RequestFrame, Response, ResponseFrame, ServerHello, decode, encode, frame_codec,
    peek_request_id,
};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::{ServerError, Vfs, dispatch};

/// Replies queued per connection before request tasks wait on the writer.
const REPLY_QUEUE_DEPTH: usize = 64;

/// Default cap on requests being handled at once for one connection.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 128;

/// Connection-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Largest frame accepted or sent.
    pub max_frame_len: usize,
    /// Name announced in the handshake.
    pub server_name: String,
    /// Requests handled at once per connection. Further requests stay unread
    /// on the socket until a slot frees up.
    pub max_in_flight: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            server_name: format!("fskitty-server/{}", env!("CARGO_PKG_VERSION")),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// Accepts clients and serves a [`Vfs`] to each of them.
pub struct Server<V: ?Sized> {
    listener: Listener,
    vfs: Arc<V>,
    config: Arc<ServerConfig>,
}

impl<V: Vfs + ?Sized> Server<V> {
    /// Binds a listener on `endpoint`.
    pub async fn bind(
        endpoint: &Endpoint,
        vfs: Arc<V>,
        config: ServerConfig,
    ) -> Result<Self, ServerError> {
        let bind_error = |source| ServerError::Bind {
            addr: endpoint.to_string(),
            source,
        };

        let listener = match endpoint {
            Endpoint::Tcp { .. } => {
                let addr = endpoint.socket_addr_string().unwrap_or_default();
                Listener::Tcp(TcpListener::bind(&addr).await.map_err(bind_error)?)
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => Listener::Unix(UnixListener::bind(path).map_err(bind_error)?),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => {
                return Err(bind_error(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                )));
            }
        };

        info!(%endpoint, "Listening");
        Ok(Self {
            listener,
            vfs,
            config: Arc::new(config),
        })
    }

    /// The bound TCP address (useful after binding port 0). `None` for Unix sockets.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            Listener::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Listener::Unix(_) => None,
        }
    }

    /// Serves clients forever.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves clients until `shutdown` completes. Connections already accepted
    /// keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.accept_one() => {
                    if let Err(e) = accepted {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
        }
    }

    async fn accept_one(&self) -> io::Result<()> {
        match &self.listener {
            Listener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(%peer, error = %e, "Failed to set TCP_NODELAY");
                }
                self.spawn_connection(stream, peer.to_string());
            }
            #[cfg(unix)]
            Listener::Unix(listener) => {
                let (stream, _) = listener.accept().await?;
                self.spawn_connection(stream, "unix".to_string());
            }
        }
        Ok(())
    }

    fn spawn_connection<S>(&self, stream: S, peer: String)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let vfs = Arc::clone(&self.vfs);
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            info!(%peer, "Client connected");
            match serve_connection(stream, vfs, config).await {
                Ok(()) => info!(%peer, "Client disconnected"),
                Err(e) => warn!(%peer, error = %e, "Connection closed with error"),
            }
        });
    }
}

/// Runs the handshake and request loop for one client stream.
///
/// Each request is dispatched on its own task, at most
/// [`ServerConfig::max_in_flight`] at a time; replies are funneled through a
/// single writer so frames never interleave.
pub async fn serve_connection<S, V>(
    stream: S,
    vfs: Arc<V>,
    config: Arc<ServerConfig>,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    V: Vfs + ?Sized,
{
    let mut framed = Framed::new(stream, frame_codec(config.max_frame_len));

    let payload = framed.next().await.ok_or(ProtoError::Closed)??;
    let hello: ClientHello = decode(&payload)?;
    let reply = ServerHello {
        protocol_version: PROTOCOL_VERSION,
        server: config.server_name.clone(),
    };
    framed.send(encode(&reply)?).await?;
    if hello.protocol_version != PROTOCOL_VERSION {
        return Err(ServerError::VersionMismatch {
            client: hello.protocol_version,
            server: PROTOCOL_VERSION,
        });
    }
    debug!(client = %hello.client, "Handshake complete");

    let (mut sink, mut frames) = framed.split();
    let (tx, mut rx) = mpsc::channel::<Bytes>(REPLY_QUEUE_DEPTH);
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            sink.send(frame).await?;
        }
        Ok::<(), io::Error>(())
    });

    let max_frame_len = config.max_frame_len;
    let slots = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let result = loop {
        let payload = match frames.next().await {
            Some(Ok(payload)) => payload,
            Some(Err(e)) => break Err(ServerError::Io(e)),
            None => break Ok(()),
        };

        match decode::<RequestFrame>(&payload) {
            Ok(RequestFrame { id, request }) => {
                let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                    break Ok(());
                };
                let vfs = Arc::clone(&vfs);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = dispatch(vfs.as_ref(), request).await;
                    send_reply(&tx, id, &response, max_frame_len).await;
                    drop(permit);
                });
            }
            Err(e) => match peek_request_id(&payload) {
                Some(id) => {
                    warn!(id, error = %e, "Rejecting undecodable request");
                    let response =
                        Response::Rejected(RemoteError::invalid(format!("undecodable request: {e}")));
                    send_reply(&tx, id, &response, max_frame_len).await;
                }
                None => break Err(e.into()),
            },
        }
    };

    // In-flight request tasks hold their own senders; the writer drains them.
    drop(tx);
    if let Ok(Err(e)) = writer.await {
        debug!(error = %e, "Reply writer stopped");
    }
    result
}

async fn send_reply(tx: &mpsc::Sender<Bytes>, id: u64, response: &Response, max_frame_len: usize) {
    let Some(frame) = encode_reply(id, response, max_frame_len) else {
        return;
    };
    if tx.send(frame).await.is_err() {
        debug!(id, "Connection closed before reply was sent");
    }
}

/// Encodes a reply, substituting an `EIO` rejection when it cannot be sent as is.
fn encode_reply(id: u64, response: &Response, max_frame_len: usize) -> Option<Bytes> {
    let failure = match encode(&ResponseFrame {
        id,
        response: response.clone(),
    }) {
        Ok(frame) if frame.len() <= max_frame_len => return Some(frame),
        Ok(frame) => format!("reply of {} bytes exceeds the frame limit", frame.len()),
        Err(e) => e.to_string(),
    };
    warn!(id, %failure, "Replacing unsendable reply");
    encode(&ResponseFrame {
        id,
        response: Response::Rejected(RemoteError::io(failure)),
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use fskitty_proto::{
        ItemAttributes, ItemId, ItemType, LookupReply, ReadDirReply, Request, SetAttributesParams,
        errno,
    };
    use crate::MemoryVfs;

    /// Holds every ping until the gate opens and records how many ran at once.
    struct GatedVfs {
        inner: MemoryVfs,
        gate: Semaphore,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Vfs for GatedVfs {
        async fn lookup(&self, parent_id: ItemId, name: &str) -> Result<LookupReply, RemoteError> {
            self.inner.lookup(parent_id, name).await
        }

        async fn get_attributes(&self, item_id: ItemId) -> Result<ItemAttributes, RemoteError> {
            self.inner.get_attributes(item_id).await
        }

        async fn read_dir(
            &self,
            item_id: ItemId,
            cursor: u64,
        ) -> Result<ReadDirReply, RemoteError> {
            self.inner.read_dir(item_id, cursor).await
        }

        async fn read(
            &self,
            item_id: ItemId,
            offset: u64,
            len: u64,
        ) -> Result<Vec<u8>, RemoteError> {
            self.inner.read(item_id, offset, len).await
        }

        async fn write(
            &self,
            item_id: ItemId,
            offset: u64,
            data: &[u8],
        ) -> Result<u64, RemoteError> {
            self.inner.write(item_id, offset, data).await
        }

        async fn create(
            &self,
            parent_id: ItemId,
            name: &str,
            item_type: ItemType,
        ) -> Result<ItemId, RemoteError> {
            self.inner.create(parent_id, name, item_type).await
        }

        async fn delete(&self, item_id: ItemId) -> Result<(), RemoteError> {
            self.inner.delete(item_id).await
        }

        async fn rename(
            &self,
            item_id: ItemId,
            new_parent_id: ItemId,
            new_name: &str,
        ) -> Result<(), RemoteError> {
            self.inner.rename(item_id, new_parent_id, new_name).await
        }

        async fn set_attributes(
            &self,
            item_id: ItemId,
            params: SetAttributesParams,
        ) -> Result<(), RemoteError> {
            self.inner.set_attributes(item_id, params).await
        }

        async fn ping(&self) -> String {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            drop(self.gate.acquire().await);
            self.active.fetch_sub(1, Ordering::SeqCst);
            "gated".to_string()
        }
    }

    #[tokio::test]
    async fn test_in_flight_requests_are_capped_per_connection() {
        let vfs = Arc::new(GatedVfs {
            inner: MemoryVfs::new(),
            gate: Semaphore::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let config = Arc::new(ServerConfig {
            max_in_flight: 2,
            ..ServerConfig::default()
        });

        let (client, server) = tokio::io::duplex(64 * 1024);
        let connection = tokio::spawn(serve_connection(server, Arc::clone(&vfs), config));
        let mut wire = Framed::new(client, frame_codec(DEFAULT_MAX_FRAME_LEN));

        let hello = ClientHello {
            protocol_version: PROTOCOL_VERSION,
            client: "test".to_string(),
        };
        wire.send(encode(&hello).unwrap()).await.unwrap();
        let _: ServerHello = decode(&wire.next().await.unwrap().unwrap()).unwrap();

        for id in 1..=6 {
            let frame = RequestFrame {
                id,
                request: Request::Ping,
            };
            wire.send(encode(&frame).unwrap()).await.unwrap();
        }

        while vfs.active.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(vfs.active.load(Ordering::SeqCst), 2);

        vfs.gate.add_permits(1);
        let mut ids = Vec::new();
        for _ in 1..=6 {
            let frame: ResponseFrame = decode(&wire.next().await.unwrap().unwrap()).unwrap();
            assert_eq!(frame.response, Response::Pong("gated".to_string()));
            ids.push(frame.id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=6).collect::<Vec<_>>());
        assert_eq!(vfs.peak.load(Ordering::SeqCst), 2);

        drop(wire);
        connection.await.unwrap().unwrap();
    }

    #[test]
    fn test_oversized_reply_becomes_rejection() {
        let response = Response::Read(Ok(vec![0u8; 4096]));
        let frame = encode_reply(7, &response, 1024).unwrap();
        let decoded: ResponseFrame = decode(&frame).unwrap();
        assert_eq!(decoded.id, 7);
        assert!(matches!(decoded.response, Response::Rejected(e) if e.code == errno::EIO));
    }

    #[test]
    fn test_small_reply_passes_through() {
        let response = Response::Pong("pong".to_string());
        let frame = encode_reply(1, &response, 1024).unwrap();
        let decoded: ResponseFrame = decode(&frame).unwrap();
        assert_eq!(decoded.response, response);
    }
}
