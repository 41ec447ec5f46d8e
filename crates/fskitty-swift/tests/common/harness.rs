//! Test harness driving the FFI surface the way the Swift side does.
//!
//! [`TestBackend`] runs an in-memory `fskitty-server` on its own thread and
//! runtime. [`TestSession`] wraps a [`VfsSession`] connected to it and turns
//! every result wrapper into `Result<T, i32>` carrying the errno FSKit would see.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use fskitty_proto::Endpoint;
use fskitty_server::{MemoryVfs, MemoryVfsOptions, Server, ServerConfig};
use fskitty_swift::{DirectoryPage, ItemAttributes, VfsItem, VfsSession, vfs_connect};
use tokio::sync::oneshot;

/// A live in-memory backend.
pub struct TestBackend {
    address: String,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TestBackend {
    /// Starts an empty backend on an ephemeral port.
    pub fn start() -> Self {
        Self::with_options(MemoryVfsOptions::default())
    }

    /// Starts an empty backend with custom limits.
    pub fn with_options(options: MemoryVfsOptions) -> Self {
        let endpoint = Endpoint::parse("127.0.0.1:0").expect("invalid test address");
        let (ready_tx, ready_rx) = mpsc::channel::<SocketAddr>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("failed to build server runtime");
            runtime.block_on(async move {
                let vfs = Arc::new(MemoryVfs::with_options(options));
                let server = Server::bind(&endpoint, vfs, ServerConfig::default())
                    .await
                    .expect("failed to bind test server");
                ready_tx
                    .send(server.local_addr().expect("tcp server has an address"))
                    .expect("test thread went away");
                server
                    .run_until(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("server loop failed");
            });
        });

        let addr = ready_rx.recv().expect("test server failed to start");
        Self {
            address: addr.to_string(),
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Address sessions should connect to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Connects a new session.
    pub fn session(&self) -> TestSession {
        TestSession::connect(&self.address).expect("failed to connect to test backend")
    }

    /// Stops the server and closes every connection to it.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            thread.join().expect("server thread panicked");
        }
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A [`VfsSession`] with `Result`-returning helpers.
pub struct TestSession {
    session: VfsSession,
}

impl TestSession {
    /// Connects through the FFI entry point.
    pub fn connect(address: &str) -> Result<Self, i32> {
        let result = vfs_connect(address.to_string());
        if result.result_session_is_ok() {
            Ok(Self {
                session: result.result_session_unwrap(),
            })
        } else {
            Err(result.result_session_errno())
        }
    }

    /// The wrapped session.
    pub fn raw(&self) -> &VfsSession {
        &self.session
    }

    pub fn root_id(&self) -> u64 {
        self.session.root_item_id()
    }

    pub fn lookup(&self, parent_id: u64, name: &str) -> Result<VfsItem, i32> {
        let result = self.session.lookup(parent_id, name.to_string());
        if result.result_item_is_ok() {
            Ok(result.result_item_unwrap())
        } else {
            Err(result.result_item_errno())
        }
    }

    pub fn get_attributes(&self, item_id: u64) -> Result<ItemAttributes, i32> {
        let result = self.session.get_attributes(item_id);
        if result.result_attrs_is_ok() {
            Ok(result.result_attrs_unwrap())
        } else {
            Err(result.result_attrs_errno())
        }
    }

    pub fn read_dir(&self, item_id: u64, cursor: u64) -> Result<DirectoryPage, i32> {
        let result = self.session.read_dir(item_id, cursor);
        if result.result_page_is_ok() {
            Ok(result.result_page_unwrap())
        } else {
            Err(result.result_page_errno())
        }
    }

    /// Follows cursors from 0 and collects every name.
    pub fn list_names(&self, item_id: u64) -> Result<Vec<String>, i32> {
        let mut names = Vec::new();
        let mut cursor = 0;
        loop {
            let page = self.read_dir(item_id, cursor)?;
            names.extend((0..page.page_count()).map(|i| page.page_name(i)));
            cursor = page.page_next_cursor();
            if cursor == 0 {
                return Ok(names);
            }
        }
    }

    pub fn read(&self, item_id: u64, offset: u64, length: u64) -> Result<Vec<u8>, i32> {
        let result = self.session.read(item_id, offset, length);
        if result.result_bytes_is_ok() {
            Ok(result.result_bytes_unwrap())
        } else {
            Err(result.result_bytes_errno())
        }
    }

    pub fn write(&self, item_id: u64, offset: u64, data: &[u8]) -> Result<u64, i32> {
        let result = self.session.write(item_id, offset, data.to_vec());
        if result.result_written_is_ok() {
            Ok(result.result_written_unwrap())
        } else {
            Err(result.result_written_errno())
        }
    }

    pub fn create(&self, parent_id: u64, name: &str, item_type: u8) -> Result<u64, i32> {
        let result = self.session.create(parent_id, name.to_string(), item_type);
        if result.result_id_is_ok() {
            Ok(result.result_id_unwrap())
        } else {
            Err(result.result_id_errno())
        }
    }

    pub fn create_file(&self, parent_id: u64, name: &str) -> Result<u64, i32> {
        self.create(parent_id, name, 0)
    }

    pub fn create_dir(&self, parent_id: u64, name: &str) -> Result<u64, i32> {
        self.create(parent_id, name, 1)
    }

    pub fn delete(&self, item_id: u64) -> Result<(), i32> {
        let result = self.session.delete(item_id);
        if result.result_unit_is_ok() {
            Ok(())
        } else {
            Err(result.result_unit_errno())
        }
    }

    pub fn rename(&self, item_id: u64, new_parent_id: u64, new_name: &str) -> Result<(), i32> {
        let result = self
            .session
            .rename(item_id, new_parent_id, new_name.to_string());
        if result.result_unit_is_ok() {
            Ok(())
        } else {
            Err(result.result_unit_errno())
        }
    }

    pub fn set_mode(&self, item_id: u64, mode: u32) -> Result<(), i32> {
        let result = self.session.set_attributes(item_id, true, mode, false, 0);
        if result.result_unit_is_ok() {
            Ok(())
        } else {
            Err(result.result_unit_errno())
        }
    }

    pub fn set_modified_time(&self, item_id: u64, modified_time: u64) -> Result<(), i32> {
        let result = self
            .session
            .set_attributes(item_id, false, 0, true, modified_time);
        if result.result_unit_is_ok() {
            Ok(())
        } else {
            Err(result.result_unit_errno())
        }
    }
}
