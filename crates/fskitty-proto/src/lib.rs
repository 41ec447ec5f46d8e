//! Wire protocol for fskitty VFS backends.
//!
//! This crate defines the messages exchanged between the client embedded in the
//! FSKit extension (`fskitty-client`) and a VFS backend (such as the in-memory
//! reference server in `fskitty-server`).
//!
//! ## Framing
//!
//! Every message travels in a length-delimited frame (4-byte big-endian length
//! prefix) whose payload is a `postcard`-encoded [`serde`] value. See [`codec`].
//!
//! ## Session
//!
//! 1. Client sends [`ClientHello`], server answers [`ServerHello`].
//! 2. Client sends [`RequestFrame`]s; the server answers each with a
//!    [`ResponseFrame`] carrying the same `id`. Replies may arrive out of order.
//!
//! ## Errors
//!
//! Backends report failures as [`RemoteError`] with an errno-like code from
//! [`errno`]. Codes are part of the protocol and do not depend on the host's libc.

#![warn(missing_docs)]

pub mod codec;
pub mod endpoint;
pub mod errno;
pub mod mode;
pub mod name;

mod message;
mod types;

pub use codec::{ProtoError, decode, encode, frame_codec, peek_request_id};
pub use endpoint::{Endpoint, EndpointError};
pub use errno::RemoteError;
pub use name::NameError;
pub use message::{
    ClientHello, Request, RequestFrame, Response, ResponseFrame, ServerHello,
};
pub use types::{
    DirEntry, ItemAttributes, ItemType, LookupReply, ReadDirReply, SetAttributesParams,
};

/// Item ID type - unique identifier for files and directories.
///
/// IDs are assigned by the backend and never reused while the item exists.
pub type ItemId = u64;

/// Item ID reserved for the root directory.
pub const ROOT_ITEM_ID: ItemId = 1;

/// Item ID that never denotes an item.
pub const INVALID_ITEM_ID: ItemId = 0;

/// Protocol revision spoken by this crate.
pub const PROTOCOL_VERSION: u32 = 1;

/// Port used when an address does not name one.
pub const DEFAULT_PORT: u16 = 10001;

/// Default upper bound for a single frame (16 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
