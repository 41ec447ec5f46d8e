//! Test harness for fskitty-client integration tests.
//!
//! [`TestServer`] runs a real `fskitty-server` with a [`MemoryVfs`] on its own
//! thread and Tokio runtime, so tests can drive the blocking client from plain
//! `#[test]` functions. Stopping the server drops its runtime, which tears down
//! every open connection.
//!
//! [`FakeBackend`] speaks the wire protocol but answers each request through a
//! closure, for replies no well-behaved backend would send.
//!
//! # Usage
//!
//! ```ignore
//! use crate::common::TestServer;
//!
//! #[test]
//! fn test_ping() {
//!     let server = TestServer::start();
//!     let conn = server.connect();
//!     assert!(conn.ping().is_ok());
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use fskitty_client::{ClientConfig, Connection};
use fskitty_proto::{
    ClientHello, Endpoint, PROTOCOL_VERSION, Request, RequestFrame, Response, ResponseFrame,
    ServerHello, decode, encode, frame_codec,
};
use fskitty_server::{MemoryVfs, MemoryVfsOptions, Server, ServerConfig};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::codec::Framed;

/// Installs a test-friendly tracing subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Background thread running a Tokio runtime until told to stop.
struct BackgroundRuntime {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl BackgroundRuntime {
    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            thread.join().expect("server thread panicked");
        }
    }
}

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build server runtime")
}

/// A live in-memory backend.
pub struct TestServer {
    address: String,
    runtime: BackgroundRuntime,
}

impl TestServer {
    /// Starts an empty backend on an ephemeral TCP port.
    pub fn start() -> Self {
        Self::with_options(MemoryVfsOptions::default())
    }

    /// Starts an empty backend with custom limits.
    pub fn with_options(options: MemoryVfsOptions) -> Self {
        Self::spawn("127.0.0.1:0", options, false)
    }

    /// Starts a backend pre-populated with the demo files.
    pub fn seeded() -> Self {
        Self::spawn("127.0.0.1:0", MemoryVfsOptions::default(), true)
    }

    /// Starts a backend listening on `address` (for example a `unix://` path).
    pub fn at(address: &str) -> Self {
        Self::spawn(address, MemoryVfsOptions::default(), false)
    }

    fn spawn(address: &str, options: MemoryVfsOptions, seed: bool) -> Self {
        init_tracing();
        let endpoint = Endpoint::parse(address).expect("invalid test address");
        let (ready_tx, ready_rx) = mpsc::channel::<Option<SocketAddr>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = test_runtime();
            runtime.block_on(async move {
                let vfs = MemoryVfs::with_options(options);
                if seed {
                    vfs.seed_demo().expect("failed to seed demo content");
                }
                let server = Server::bind(&endpoint, Arc::new(vfs), ServerConfig::default())
                    .await
                    .expect("failed to bind test server");
                ready_tx.send(server.local_addr()).expect("test thread went away");
                server
                    .run_until(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("server loop failed");
            });
        });

        let bound = ready_rx.recv().expect("test server failed to start");
        let address = match bound {
            Some(addr) => addr.to_string(),
            None => address.to_string(),
        };

        Self {
            address,
            runtime: BackgroundRuntime {
                shutdown: Some(shutdown_tx),
                thread: Some(thread),
            },
        }
    }

    /// Address clients should connect to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Connects with the default configuration.
    pub fn connect(&self) -> Connection {
        Connection::connect(&self.address).expect("failed to connect to test server")
    }

    /// Connects with a custom configuration.
    pub fn connect_with(&self, config: ClientConfig) -> Connection {
        Connection::connect_with_config(&self.address, config)
            .expect("failed to connect to test server")
    }

    /// Stops the server and closes every connection to it.
    pub fn stop(mut self) {
        self.runtime.stop();
    }
}

type Handler = dyn Fn(Request) -> Option<Response> + Send + Sync;

/// A scripted backend. The handler's `None` means "never reply".
pub struct FakeBackend {
    address: String,
    runtime: BackgroundRuntime,
}

impl FakeBackend {
    /// Starts a backend that answers every request through `handler`.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(Request) -> Option<Response> + Send + Sync + 'static,
    {
        Self::with_version(PROTOCOL_VERSION, handler)
    }

    /// Like [`start`](Self::start) but announces `version` in the handshake.
    pub fn with_version<F>(version: u32, handler: F) -> Self
    where
        F: Fn(Request) -> Option<Response> + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);
        Self::launch(version, Some(handler))
    }

    /// Completes the handshake, then never reads from the socket again.
    pub fn stalled() -> Self {
        Self::launch(PROTOCOL_VERSION, None)
    }

    fn launch(version: u32, handler: Option<Arc<Handler>>) -> Self {
        init_tracing();
        let (ready_tx, ready_rx) = mpsc::channel::<SocketAddr>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = test_runtime();
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
                ready_tx
                    .send(listener.local_addr().expect("no local addr"))
                    .expect("test thread went away");

                tokio::pin!(shutdown_rx);
                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => break,
                        accepted = listener.accept() => {
                            let (stream, _) = accepted.expect("accept failed");
                            tokio::spawn(serve_scripted(stream, version, handler.clone()));
                        }
                    }
                }
            });
        });

        let addr = ready_rx.recv().expect("fake backend failed to start");
        Self {
            address: addr.to_string(),
            runtime: BackgroundRuntime {
                shutdown: Some(shutdown_tx),
                thread: Some(thread),
            },
        }
    }

    /// Address clients should connect to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Connects with a custom configuration.
    pub fn connect_with(&self, config: ClientConfig) -> Connection {
        Connection::connect_with_config(&self.address, config)
            .expect("failed to connect to fake backend")
    }

    /// Connects with the default configuration.
    pub fn connect(&self) -> Connection {
        self.connect_with(ClientConfig::default())
    }
}

async fn serve_scripted(
    stream: tokio::net::TcpStream,
    version: u32,
    handler: Option<Arc<Handler>>,
) {
    let mut wire = Framed::new(stream, frame_codec(1 << 24));
    let Some(Ok(payload)) = wire.next().await else {
        return;
    };
    let _hello: ClientHello = decode(&payload).expect("bad client hello");
    let reply = ServerHello {
        protocol_version: version,
        server: "fake".to_string(),
    };
    if wire.send(encode(&reply).expect("encode")).await.is_err() {
        return;
    }

    let Some(handler) = handler else {
        // Hold the socket open without reading until the runtime shuts down.
        std::future::pending::<()>().await;
        return;
    };

    while let Some(Ok(payload)) = wire.next().await {
        let RequestFrame { id, request } = decode(&payload).expect("bad request frame");
        if let Some(response) = handler(request) {
            let frame = ResponseFrame { id, response };
            if wire.send(encode(&frame).expect("encode")).await.is_err() {
                return;
            }
        }
    }
}
