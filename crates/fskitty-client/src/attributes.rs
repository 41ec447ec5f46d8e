//! Typed metadata snapshots.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fskitty_proto::{ItemAttributes, ItemId, ItemType, LookupReply, mode};

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    /// Identifier assigned by the backend.
    pub item_id: ItemId,
    /// Kind of item.
    pub item_type: ItemType,
}

impl From<LookupReply> for Item {
    fn from(reply: LookupReply) -> Self {
        Self {
            item_id: reply.item_id,
            item_type: reply.item_type,
        }
    }
}

/// Attributes of one item, as reported by the backend at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    /// Identifier the attributes describe.
    pub item_id: ItemId,
    /// Kind of item.
    pub item_type: ItemType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification, Unix seconds.
    pub modified_time: u64,
    /// Creation, Unix seconds.
    pub created_time: u64,
    /// Permission bits.
    pub mode: u32,
}

impl Attributes {
    /// Returns true for directories.
    pub fn is_dir(&self) -> bool {
        self.item_type.is_dir()
    }

    /// Returns true for regular files.
    pub fn is_file(&self) -> bool {
        self.item_type.is_file()
    }

    /// Returns true for symbolic links.
    pub fn is_symlink(&self) -> bool {
        self.item_type == ItemType::Symlink
    }

    /// Whether the owner-write bit is set.
    pub fn is_writable(&self) -> bool {
        mode::owner_can_write(self.mode)
    }

    /// Permission bits without any type or unknown high bits.
    pub fn permissions(&self) -> u32 {
        self.mode & mode::PERMISSION_MASK
    }

    /// Modification time as a [`SystemTime`].
    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.modified_time)
    }

    /// Creation time as a [`SystemTime`].
    pub fn created(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.created_time)
    }
}

impl From<ItemAttributes> for Attributes {
    fn from(attrs: ItemAttributes) -> Self {
        Self {
            item_id: attrs.item_id,
            item_type: attrs.item_type,
            size: attrs.size,
            modified_time: attrs.modified_time,
            created_time: attrs.created_time,
            mode: attrs.mode,
        }
    }
}
