//! Item metadata types shared by requests and replies.

use serde::{Deserialize, Serialize};

use crate::ItemId;

/// Type of filesystem item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ItemType {
    /// Regular file
    File = 0,
    /// Directory
    Directory = 1,
    /// Symbolic link, or any other non-file non-directory item
    Symlink = 2,
}

impl ItemType {
    /// Numeric discriminant used at foreign-function boundaries.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses a numeric discriminant. Unknown values are rejected.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::File),
            1 => Some(Self::Directory),
            2 => Some(Self::Symlink),
            _ => None,
        }
    }

    /// Returns true for directories.
    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }

    /// Returns true for regular files.
    pub fn is_file(self) -> bool {
        self == Self::File
    }
}

/// File/directory attributes as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    /// Identifier of the item these attributes describe.
    pub item_id: ItemId,
    /// Kind of item.
    pub item_type: ItemType,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Unix timestamp (seconds since epoch)
    pub modified_time: u64,
    /// Unix timestamp (seconds since epoch)
    pub created_time: u64,
    /// Permission bits, see [`crate::mode`]
    pub mode: u32,
}

/// Reply to a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupReply {
    /// Identifier of the child.
    pub item_id: ItemId,
    /// Kind of the child.
    pub item_type: ItemType,
}

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Name within the parent directory.
    pub name: String,
    /// Identifier of the entry.
    pub item_id: ItemId,
    /// Kind of the entry.
    pub item_type: ItemType,
}

/// One page of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadDirReply {
    /// Entries in enumeration order.
    pub entries: Vec<DirEntry>,
    /// Cursor for the next page (0 = no more entries)
    pub next_cursor: u64,
}

/// Attribute changes requested by `set_attributes`. `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAttributesParams {
    /// New permission bits.
    pub mode: Option<u32>,
    /// New modification time (Unix seconds).
    pub modified_time: Option<u64>,
}

impl SetAttributesParams {
    /// Returns true when no field would change.
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.modified_time.is_none()
    }
}
