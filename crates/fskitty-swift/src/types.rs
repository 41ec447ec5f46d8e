//! Opaque value types handed to Swift.

use fskitty_client::{Attributes, DirEntry, Item, ItemType};

/// Result of a lookup: the child's ID and type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VfsItem {
    item_id: u64,
    item_type: u8,
}

impl VfsItem {
    /// Item ID.
    pub fn item_item_id(&self) -> u64 {
        self.item_id
    }

    /// Item type as `u8`.
    pub fn item_item_type(&self) -> u8 {
        self.item_type
    }
}

impl From<Item> for VfsItem {
    fn from(item: Item) -> Self {
        Self {
            item_id: item.item_id,
            item_type: item.item_type.as_u8(),
        }
    }
}

/// Attributes of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttributes {
    item_id: u64,
    item_type: u8,
    size: u64,
    modified_time: u64,
    created_time: u64,
    mode: u32,
}

impl ItemAttributes {
    /// Item ID.
    pub fn attr_item_id(&self) -> u64 {
        self.item_id
    }

    /// Item type as `u8`.
    pub fn attr_item_type(&self) -> u8 {
        self.item_type
    }

    /// True for directories.
    pub fn attr_is_directory(&self) -> bool {
        self.item_type == ItemType::Directory.as_u8()
    }

    /// True for regular files.
    pub fn attr_is_file(&self) -> bool {
        self.item_type == ItemType::File.as_u8()
    }

    /// True for symlinks and other special items.
    pub fn attr_is_symlink(&self) -> bool {
        self.item_type == ItemType::Symlink.as_u8()
    }

    /// Size in bytes.
    pub fn attr_size(&self) -> u64 {
        self.size
    }

    /// Modification time, Unix seconds.
    pub fn attr_modified_time(&self) -> u64 {
        self.modified_time
    }

    /// Creation time, Unix seconds.
    pub fn attr_created_time(&self) -> u64 {
        self.created_time
    }

    /// Permission bits.
    pub fn attr_mode(&self) -> u32 {
        self.mode
    }
}

impl From<Attributes> for ItemAttributes {
    fn from(attrs: Attributes) -> Self {
        Self {
            item_id: attrs.item_id,
            item_type: attrs.item_type.as_u8(),
            size: attrs.size,
            modified_time: attrs.modified_time,
            created_time: attrs.created_time,
            mode: attrs.mode,
        }
    }
}

/// One page of a directory listing, flattened into parallel arrays.
///
/// Index `i` of the names, IDs and types describes the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryPage {
    names: Vec<String>,
    item_ids: Vec<u64>,
    item_types: Vec<u8>,
    next_cursor: u64,
}

impl DirectoryPage {
    /// Number of entries on this page.
    pub fn page_count(&self) -> u64 {
        self.names.len() as u64
    }

    /// Name of entry `index`, or an empty string when out of range.
    pub fn page_name(&self, index: u64) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .cloned()
            .unwrap_or_default()
    }

    /// IDs of all entries.
    pub fn page_item_ids(&self) -> Vec<u64> {
        self.item_ids.clone()
    }

    /// Types of all entries.
    pub fn page_item_types(&self) -> Vec<u8> {
        self.item_types.clone()
    }

    /// Cursor for the next page; `0` once the listing is exhausted.
    pub fn page_next_cursor(&self) -> u64 {
        self.next_cursor
    }
}

impl From<fskitty_client::DirectoryPage> for DirectoryPage {
    fn from(page: fskitty_client::DirectoryPage) -> Self {
        let mut names = Vec::with_capacity(page.entries.len());
        let mut item_ids = Vec::with_capacity(page.entries.len());
        let mut item_types = Vec::with_capacity(page.entries.len());
        for DirEntry {
            name,
            item_id,
            item_type,
        } in page.entries
        {
            names.push(name);
            item_ids.push(item_id);
            item_types.push(item_type.as_u8());
        }
        Self {
            names,
            item_ids,
            item_types,
            next_cursor: page.next_cursor.unwrap_or(0),
        }
    }
}
