//! In-memory reference backend.
//!
//! Items live in a single map guarded by a [`parking_lot::RwLock`]. Children
//! are kept in insertion order so pages are stable while a directory is left
//! alone. Each directory carries a generation number that changes on every
//! add, remove or move of a child; cursors embed it, so a cursor handed out
//! before a mutation is refused with `EBADCOOKIE` instead of skipping or
//! repeating entries. Generations come from one tree-wide counter, so no two
//! directories share one and a cursor only works for the directory that
//! issued it.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use fskitty_proto::{
    DirEntry, INVALID_ITEM_ID, ItemAttributes, ItemId, ItemType, LookupReply, ROOT_ITEM_ID,
    ReadDirReply, RemoteError, SetAttributesParams, errno, mode, name,
};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::Vfs;

/// Tuning knobs for [`MemoryVfs`].
#[derive(Debug, Clone)]
pub struct MemoryVfsOptions {
    /// Maximum entries per `read_dir` page (at least 1).
    pub page_size: usize,
    /// Accept at most this many bytes per write, simulating backpressure.
    pub max_write_chunk: Option<usize>,
    /// Return at most this many bytes per read.
    pub max_read_len: Option<u64>,
    /// Writes that would grow a file past this size fail with `ENOSPC`.
    pub max_file_size: u64,
}

impl Default for MemoryVfsOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_write_chunk: None,
            max_read_len: None,
            max_file_size: 1 << 30,
        }
    }
}

#[derive(Debug)]
enum Content {
    File(Vec<u8>),
    Directory { children: Vec<ItemId>, generation: u32 },
    Symlink(Vec<u8>),
}

#[derive(Debug)]
struct Node {
    parent_id: ItemId,
    name: String,
    content: Content,
    mode: u32,
    created_time: u64,
    modified_time: u64,
}

impl Content {
    /// An empty directory. Its generation is assigned when it is inserted.
    fn empty_dir() -> Self {
        Self::Directory {
            children: Vec::new(),
            generation: 0,
        }
    }
}

impl Node {
    fn item_type(&self) -> ItemType {
        match self.content {
            Content::File(_) => ItemType::File,
            Content::Directory { .. } => ItemType::Directory,
            Content::Symlink(_) => ItemType::Symlink,
        }
    }

    fn size(&self) -> u64 {
        match &self.content {
            Content::File(data) | Content::Symlink(data) => data.len() as u64,
            Content::Directory { .. } => 0,
        }
    }
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<ItemId, Node>,
    next_id: ItemId,
    /// Last generation handed to any directory.
    generation: u32,
}

impl Tree {
    fn new() -> Self {
        let now = now_secs();
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ITEM_ID,
            Node {
                parent_id: INVALID_ITEM_ID,
                name: String::new(),
                content: Content::Directory {
                    children: Vec::new(),
                    generation: 1,
                },
                mode: mode::DIRECTORY,
                created_time: now,
                modified_time: now,
            },
        );
        Self {
            nodes,
            next_id: ROOT_ITEM_ID + 1,
            generation: 1,
        }
    }

    fn get(&self, item_id: ItemId) -> Result<&Node, RemoteError> {
        self.nodes
            .get(&item_id)
            .ok_or_else(|| RemoteError::not_found(format!("item {item_id} not found")))
    }

    fn get_mut(&mut self, item_id: ItemId) -> Result<&mut Node, RemoteError> {
        self.nodes
            .get_mut(&item_id)
            .ok_or_else(|| RemoteError::not_found(format!("item {item_id} not found")))
    }

    fn children(&self, dir_id: ItemId) -> Result<&[ItemId], RemoteError> {
        match &self.get(dir_id)?.content {
            Content::Directory { children, .. } => Ok(children),
            _ => Err(RemoteError::not_dir(format!("item {dir_id} is not a directory"))),
        }
    }

    fn find_child(&self, dir_id: ItemId, child: &str) -> Result<Option<ItemId>, RemoteError> {
        Ok(self
            .children(dir_id)?
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|node| node.name == child)))
    }

    fn issue_generation(&mut self) -> u32 {
        self.generation = next_generation(self.generation);
        self.generation
    }

    /// Records a change to a directory's child list.
    fn touch_dir(&mut self, dir_id: ItemId, now: u64) {
        let next = self.issue_generation();
        if let Some(node) = self.nodes.get_mut(&dir_id) {
            if let Content::Directory { generation, .. } = &mut node.content {
                *generation = next;
            }
            node.modified_time = now;
        }
    }

    fn children_mut(&mut self, dir_id: ItemId) -> Option<&mut Vec<ItemId>> {
        match self.nodes.get_mut(&dir_id).map(|node| &mut node.content) {
            Some(Content::Directory { children, .. }) => Some(children),
            _ => None,
        }
    }

    /// Whether `ancestor` is `item_id` or one of its parents.
    fn is_ancestor(&self, ancestor: ItemId, mut item_id: ItemId) -> bool {
        loop {
            if item_id == ancestor {
                return true;
            }
            match self.nodes.get(&item_id) {
                Some(node) if node.parent_id != INVALID_ITEM_ID => item_id = node.parent_id,
                _ => return false,
            }
        }
    }

    fn insert(
        &mut self,
        parent_id: ItemId,
        child: &str,
        mut content: Content,
        mode: u32,
    ) -> Result<ItemId, RemoteError> {
        name::validate(child).map_err(|e| RemoteError::invalid(format!("'{child}': {e}")))?;
        if self.find_child(parent_id, child)?.is_some() {
            return Err(RemoteError::exists(format!("'{child}' already exists")));
        }
        if let Content::Directory { generation, .. } = &mut content {
            *generation = self.issue_generation();
        }

        let item_id = self.next_id;
        self.next_id += 1;
        let now = now_secs();
        self.nodes.insert(
            item_id,
            Node {
                parent_id,
                name: child.to_string(),
                content,
                mode,
                created_time: now,
                modified_time: now,
            },
        );
        if let Some(children) = self.children_mut(parent_id) {
            children.push(item_id);
        }
        self.touch_dir(parent_id, now);
        Ok(item_id)
    }
}

fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

fn encode_cursor(generation: u32, position: usize) -> u64 {
    (u64::from(generation) << 32) | position as u64
}

fn decode_cursor(cursor: u64) -> (u32, usize) {
    ((cursor >> 32) as u32, (cursor & 0xffff_ffff) as usize)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn stale_cursor(cursor: u64) -> RemoteError {
    RemoteError::new(
        errno::EBADCOOKIE,
        format!("cursor {cursor:#x} is stale or was not issued for this directory"),
    )
}

/// An in-memory filesystem implementing [`Vfs`].
#[derive(Debug)]
pub struct MemoryVfs {
    tree: RwLock<Tree>,
    options: MemoryVfsOptions,
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVfs {
    /// Creates an empty filesystem containing only the root directory.
    pub fn new() -> Self {
        Self::with_options(MemoryVfsOptions::default())
    }

    /// Creates an empty filesystem with custom limits.
    pub fn with_options(mut options: MemoryVfsOptions) -> Self {
        options.page_size = options.page_size.max(1);
        if let Some(chunk) = &mut options.max_write_chunk {
            *chunk = (*chunk).max(1);
        }
        Self {
            tree: RwLock::new(Tree::new()),
            options,
        }
    }

    /// Populates the root with a few sample items:
    /// `hello.txt`, `documents/readme.md` and the executable `test.sh`.
    pub fn seed_demo(&self) -> Result<(), RemoteError> {
        let mut tree = self.tree.write();
        tree.insert(
            ROOT_ITEM_ID,
            "hello.txt",
            Content::File(b"Hello, World!\n".to_vec()),
            mode::FILE_REGULAR,
        )?;
        let documents = tree.insert(
            ROOT_ITEM_ID,
            "documents",
            Content::empty_dir(),
            mode::DIRECTORY,
        )?;
        tree.insert(
            documents,
            "readme.md",
            Content::File(b"# README\n\nThis is a test file.\n".to_vec()),
            mode::FILE_REGULAR,
        )?;
        tree.insert(
            ROOT_ITEM_ID,
            "test.sh",
            Content::File(b"#!/bin/bash\necho \"Hello from executable!\"\n".to_vec()),
            mode::FILE_EXECUTABLE,
        )?;
        debug!(items = tree.nodes.len(), "Seeded demo content");
        Ok(())
    }

    /// Number of live items, root included.
    pub fn item_count(&self) -> usize {
        self.tree.read().nodes.len()
    }
}

#[async_trait]
impl Vfs for MemoryVfs {
    async fn lookup(&self, parent_id: ItemId, child: &str) -> Result<LookupReply, RemoteError> {
        name::validate(child).map_err(|e| RemoteError::invalid(format!("'{child}': {e}")))?;
        let tree = self.tree.read();
        let item_id = tree
            .find_child(parent_id, child)?
            .ok_or_else(|| RemoteError::not_found(format!("'{child}' not found in {parent_id}")))?;
        let item_type = tree.get(item_id)?.item_type();
        trace!(parent_id, name = child, item_id, "lookup");
        Ok(LookupReply { item_id, item_type })
    }

    async fn get_attributes(&self, item_id: ItemId) -> Result<ItemAttributes, RemoteError> {
        let tree = self.tree.read();
        let node = tree.get(item_id)?;
        Ok(ItemAttributes {
            item_id,
            item_type: node.item_type(),
            size: node.size(),
            modified_time: node.modified_time,
            created_time: node.created_time,
            mode: node.mode,
        })
    }

    async fn read_dir(&self, item_id: ItemId, cursor: u64) -> Result<ReadDirReply, RemoteError> {
        let tree = self.tree.read();
        let Content::Directory {
            children,
            generation,
        } = &tree.get(item_id)?.content
        else {
            return Err(RemoteError::not_dir(format!("item {item_id} is not a directory")));
        };

        let start = if cursor == 0 {
            0
        } else {
            let (cursor_generation, position) = decode_cursor(cursor);
            if cursor_generation != *generation || position > children.len() {
                return Err(stale_cursor(cursor));
            }
            position
        };
        let end = start.saturating_add(self.options.page_size).min(children.len());

        let entries: Vec<DirEntry> = children[start..end]
            .iter()
            .filter_map(|id| {
                tree.nodes.get(id).map(|child| DirEntry {
                    name: child.name.clone(),
                    item_id: *id,
                    item_type: child.item_type(),
                })
            })
            .collect();
        let next_cursor = if end < children.len() {
            encode_cursor(*generation, end)
        } else {
            0
        };

        trace!(item_id, cursor, entries = entries.len(), next_cursor, "read_dir");
        Ok(ReadDirReply {
            entries,
            next_cursor,
        })
    }

    async fn read(&self, item_id: ItemId, offset: u64, len: u64) -> Result<Vec<u8>, RemoteError> {
        let tree = self.tree.read();
        let data = match &tree.get(item_id)?.content {
            Content::File(data) => data,
            Content::Directory { .. } => {
                return Err(RemoteError::is_dir(format!("item {item_id} is a directory")));
            }
            Content::Symlink(_) => {
                return Err(RemoteError::invalid(format!("item {item_id} is not a regular file")));
            }
        };

        let len = self.options.max_read_len.map_or(len, |max| len.min(max));
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let end = start
            .saturating_add(usize::try_from(len).unwrap_or(usize::MAX))
            .min(data.len());
        Ok(data[start..end].to_vec())
    }

    async fn write(&self, item_id: ItemId, offset: u64, data: &[u8]) -> Result<u64, RemoteError> {
        let accepted = self
            .options
            .max_write_chunk
            .map_or(data.len(), |max| data.len().min(max));
        let max_file_size = self.options.max_file_size;

        let mut tree = self.tree.write();
        let node = tree.get_mut(item_id)?;
        let file_mode = node.mode;
        let contents = match &mut node.content {
            Content::File(contents) => contents,
            Content::Directory { .. } => {
                return Err(RemoteError::is_dir(format!("item {item_id} is a directory")));
            }
            Content::Symlink(_) => {
                return Err(RemoteError::invalid(format!("item {item_id} is not a regular file")));
            }
        };
        if !mode::owner_can_write(file_mode) {
            return Err(RemoteError::access(format!("item {item_id} is read-only")));
        }

        let end = offset
            .checked_add(accepted as u64)
            .ok_or_else(|| RemoteError::invalid("write range overflows"))?;
        if end > max_file_size {
            return Err(RemoteError::new(
                errno::ENOSPC,
                format!("file would grow to {end} bytes (limit {max_file_size})"),
            ));
        }
        if accepted == 0 {
            return Ok(0);
        }

        let start = offset as usize;
        let end = end as usize;
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[start..end].copy_from_slice(&data[..accepted]);
        node.modified_time = now_secs();

        trace!(item_id, offset, requested = data.len(), accepted, "write");
        Ok(accepted as u64)
    }

    async fn create(
        &self,
        parent_id: ItemId,
        child: &str,
        item_type: ItemType,
    ) -> Result<ItemId, RemoteError> {
        let (content, item_mode) = match item_type {
            ItemType::File => (Content::File(Vec::new()), mode::FILE_REGULAR),
            ItemType::Directory => (Content::empty_dir(), mode::DIRECTORY),
            ItemType::Symlink => (Content::Symlink(Vec::new()), mode::SYMLINK),
        };
        let item_id = self.tree.write().insert(parent_id, child, content, item_mode)?;
        debug!(parent_id, name = child, ?item_type, item_id, "Created item");
        Ok(item_id)
    }

    async fn delete(&self, item_id: ItemId) -> Result<(), RemoteError> {
        if item_id == ROOT_ITEM_ID {
            return Err(RemoteError::access("cannot delete the root directory"));
        }

        let mut tree = self.tree.write();
        let node = tree.get(item_id)?;
        if let Content::Directory { children, .. } = &node.content
            && !children.is_empty()
        {
            return Err(RemoteError::new(
                errno::ENOTEMPTY,
                format!("directory {item_id} is not empty"),
            ));
        }
        let parent_id = node.parent_id;

        tree.nodes.remove(&item_id);
        if let Some(children) = tree.children_mut(parent_id) {
            children.retain(|id| *id != item_id);
        }
        tree.touch_dir(parent_id, now_secs());
        debug!(item_id, parent_id, "Deleted item");
        Ok(())
    }

    async fn rename(
        &self,
        item_id: ItemId,
        new_parent_id: ItemId,
        new_name: &str,
    ) -> Result<(), RemoteError> {
        if item_id == ROOT_ITEM_ID {
            return Err(RemoteError::access("cannot rename the root directory"));
        }
        name::validate(new_name)
            .map_err(|e| RemoteError::invalid(format!("'{new_name}': {e}")))?;

        let mut tree = self.tree.write();
        let node = tree.get(item_id)?;
        let old_parent_id = node.parent_id;
        let is_dir = node.item_type().is_dir();

        // Resolves the destination and fails with ENOENT/ENOTDIR as appropriate.
        match tree.find_child(new_parent_id, new_name)? {
            Some(existing) if existing == item_id => return Ok(()),
            Some(_) => {
                return Err(RemoteError::exists(format!("'{new_name}' already exists")));
            }
            None => {}
        }
        if is_dir && tree.is_ancestor(item_id, new_parent_id) {
            return Err(RemoteError::invalid(format!(
                "cannot move directory {item_id} into itself"
            )));
        }

        if let Some(children) = tree.children_mut(old_parent_id) {
            children.retain(|id| *id != item_id);
        }
        if let Some(children) = tree.children_mut(new_parent_id) {
            children.push(item_id);
        }
        let node = tree.get_mut(item_id)?;
        node.parent_id = new_parent_id;
        node.name = new_name.to_string();

        let now = now_secs();
        tree.touch_dir(old_parent_id, now);
        if new_parent_id != old_parent_id {
            tree.touch_dir(new_parent_id, now);
        }
        debug!(item_id, old_parent_id, new_parent_id, new_name, "Renamed item");
        Ok(())
    }

    async fn set_attributes(
        &self,
        item_id: ItemId,
        params: SetAttributesParams,
    ) -> Result<(), RemoteError> {
        let mut tree = self.tree.write();
        let node = tree.get_mut(item_id)?;
        if let Some(new_mode) = params.mode {
            node.mode = new_mode & mode::PERMISSION_MASK;
        }
        if let Some(modified_time) = params.modified_time {
            node.modified_time = modified_time;
        }
        trace!(item_id, ?params, "set_attributes");
        Ok(())
    }

    async fn ping(&self) -> String {
        "pong from memory VFS".to_string()
    }
}
