//! Request and response messages.
//!
//! These mirror the operations of the VFS service one-to-one. Replies carry a
//! `Result` so a backend failure is never confused with a zeroed payload.

use serde::{Deserialize, Serialize};

use crate::errno::RemoteError;
use crate::types::{ItemAttributes, ItemType, LookupReply, ReadDirReply, SetAttributesParams};
use crate::ItemId;

/// First message sent by a client after the transport is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHello {
    /// Protocol revision the client speaks.
    pub protocol_version: u32,
    /// Free-form client identification, for server logs.
    pub client: String,
}

/// Server answer to [`ClientHello`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHello {
    /// Protocol revision the server speaks.
    pub protocol_version: u32,
    /// Free-form server identification.
    pub server: String,
}

/// A VFS operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Look up an item by name in a parent directory.
    Lookup {
        /// Directory to search.
        parent_id: ItemId,
        /// Child name.
        name: String,
    },
    /// Get attributes for an item.
    GetAttributes {
        /// Item to describe.
        item_id: ItemId,
    },
    /// Read one page of directory contents (cursor 0 = first page).
    ReadDir {
        /// Directory to enumerate.
        item_id: ItemId,
        /// Cursor from a previous page, or 0.
        cursor: u64,
    },
    /// Read file contents.
    Read {
        /// File to read.
        item_id: ItemId,
        /// Byte offset.
        offset: u64,
        /// Maximum number of bytes wanted.
        len: u64,
    },
    /// Write file contents.
    Write {
        /// File to write.
        item_id: ItemId,
        /// Byte offset.
        offset: u64,
        /// Bytes to write.
        data: Vec<u8>,
    },
    /// Create a new file or directory.
    Create {
        /// Directory to create the item in.
        parent_id: ItemId,
        /// Name of the new item.
        name: String,
        /// Kind of the new item.
        item_type: ItemType,
    },
    /// Delete an item.
    Delete {
        /// Item to delete.
        item_id: ItemId,
    },
    /// Rename and/or move an item.
    Rename {
        /// Item to move.
        item_id: ItemId,
        /// Destination directory.
        new_parent_id: ItemId,
        /// Name in the destination directory.
        new_name: String,
    },
    /// Change mode and/or modification time.
    SetAttributes {
        /// Item to modify.
        item_id: ItemId,
        /// Fields to change.
        params: SetAttributesParams,
    },
    /// Connectivity check.
    Ping,
}

impl Request {
    /// Operation name, for logs and error messages.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "lookup",
            Self::GetAttributes { .. } => "get_attributes",
            Self::ReadDir { .. } => "read_dir",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
            Self::SetAttributes { .. } => "set_attributes",
            Self::Ping => "ping",
        }
    }
}

/// Reply to a [`Request`]. The variant always matches the request's operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Reply to [`Request::Lookup`].
    Lookup(Result<LookupReply, RemoteError>),
    /// Reply to [`Request::GetAttributes`].
    GetAttributes(Result<ItemAttributes, RemoteError>),
    /// Reply to [`Request::ReadDir`].
    ReadDir(Result<ReadDirReply, RemoteError>),
    /// Reply to [`Request::Read`].
    Read(Result<Vec<u8>, RemoteError>),
    /// Reply to [`Request::Write`] with the number of bytes written.
    Write(Result<u64, RemoteError>),
    /// Reply to [`Request::Create`] with the new item's ID.
    Create(Result<ItemId, RemoteError>),
    /// Reply to [`Request::Delete`].
    Delete(Result<(), RemoteError>),
    /// Reply to [`Request::Rename`].
    Rename(Result<(), RemoteError>),
    /// Reply to [`Request::SetAttributes`].
    SetAttributes(Result<(), RemoteError>),
    /// Reply to [`Request::Ping`].
    Pong(String),
    /// The server could not decode or route the request at all.
    Rejected(RemoteError),
}

/// A request tagged with a client-chosen ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Correlates the reply with this request.
    pub id: u64,
    /// The operation.
    pub request: Request,
}

/// A response tagged with the ID of the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// ID copied from the [`RequestFrame`].
    pub id: u64,
    /// The reply.
    pub response: Response,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_names_are_distinct() {
        let requests = [
            Request::Lookup { parent_id: 1, name: "a".into() },
            Request::GetAttributes { item_id: 1 },
            Request::ReadDir { item_id: 1, cursor: 0 },
            Request::Read { item_id: 2, offset: 0, len: 1 },
            Request::Write { item_id: 2, offset: 0, data: vec![1] },
            Request::Create { parent_id: 1, name: "b".into(), item_type: ItemType::File },
            Request::Delete { item_id: 2 },
            Request::Rename { item_id: 2, new_parent_id: 1, new_name: "c".into() },
            Request::SetAttributes { item_id: 2, params: SetAttributesParams::default() },
            Request::Ping,
        ];
        let names: std::collections::HashSet<_> = requests.iter().map(Request::op_name).collect();
        assert_eq!(names.len(), requests.len());
    }
}
