//! VFS backends for fskitty.
//!
//! A backend implements [`Vfs`]; [`Server`] exposes it over TCP or a Unix
//! socket using the `fskitty-proto` wire protocol. [`MemoryVfs`] is a small
//! in-memory filesystem used for local development and by the client's
//! integration tests.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fskitty_proto::Endpoint;
//! use fskitty_server::{MemoryVfs, Server, ServerConfig};
//!
//! # async fn run() -> Result<(), fskitty_server::ServerError> {
//! let vfs = Arc::new(MemoryVfs::new());
//! let endpoint = Endpoint::parse("127.0.0.1:10001")?;
//! let server = Server::bind(&endpoint, vfs, ServerConfig::default()).await?;
//! server.run().await
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod memory;
mod server;
mod vfs;

pub use error::ServerError;
pub use memory::{MemoryVfs, MemoryVfsOptions};
pub use server::{DEFAULT_MAX_IN_FLIGHT, Server, ServerConfig, serve_connection};
pub use vfs::{Vfs, dispatch};
