//! Blocking client for fskitty VFS backends.
//!
//! This crate is the part of the FSKit extension that talks to the remote
//! store. A [`Connection`] owns one protocol session and a small Tokio runtime;
//! every operation is a blocking request/response exchange that returns an
//! explicit `Result`.
//!
//! ## Identifiers
//!
//! Item IDs are assigned by the backend and are never invented or cached here.
//! The root directory is always [`ROOT_ITEM_ID`]; ID `0` is never valid.
//!
//! ## Errors
//!
//! Every failure, whether from the backend, the transport or local argument
//! checks, is reported as a [`VfsError`] whose [`VfsErrorKind`] has a stable
//! integer code and a POSIX errno for the host.
//!
//! ## Example
//!
//! ```no_run
//! use fskitty_client::{Connection, ItemType, ROOT_ITEM_ID};
//!
//! # fn main() -> Result<(), fskitty_client::VfsError> {
//! let conn = Connection::connect("127.0.0.1:10001")?;
//! let id = conn.create(ROOT_ITEM_ID, "a.txt", ItemType::File)?;
//! conn.write(id, 0, b"hello")?;
//! assert_eq!(conn.read(id, 0, 5)?, b"hello");
//! conn.delete(id)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod attributes;
mod config;
mod connection;
mod error;
mod ids;
mod io;
mod mutation;
mod pager;
mod session;
mod stats;

pub use attributes::{Attributes, Item};
pub use config::{ClientConfig, ConfigError};
pub use connection::Connection;
pub use error::{VfsError, VfsErrorKind};
pub use ids::validate_name;
pub use pager::{DirectoryListing, DirectoryPage};
pub use stats::ConnectionStatsSnapshot;

pub use fskitty_proto::{DirEntry, ItemId, ItemType, ROOT_ITEM_ID, SetAttributesParams};
