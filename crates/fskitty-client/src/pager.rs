//! Cursor-based directory enumeration.

use std::collections::HashSet;

use fskitty_proto::{DirEntry, INVALID_ITEM_ID, ItemId, Request, Response};
use tracing::trace;

use crate::connection::unexpected_reply;
use crate::ids::check_item_id;
use crate::{Connection, VfsError};

/// One page of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPage {
    /// Entries in the backend's enumeration order.
    pub entries: Vec<DirEntry>,
    /// Cursor for the following page, or `None` once the listing is exhausted.
    pub next_cursor: Option<u64>,
}

impl DirectoryPage {
    /// Whether this is the last page.
    pub fn is_exhausted(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Iterator over the pages of one directory, starting at cursor `0`.
///
/// Stops after the last page or after the first error.
#[derive(Debug)]
pub struct DirectoryListing<'a> {
    connection: &'a Connection,
    item_id: ItemId,
    cursor: Option<u64>,
    seen_cursors: HashSet<u64>,
}

impl Iterator for DirectoryListing<'_> {
    type Item = Result<DirectoryPage, VfsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        let page = match self.connection.read_dir(self.item_id, cursor) {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };
        if let Some(next) = page.next_cursor
            && !self.seen_cursors.insert(next)
        {
            return Some(Err(VfsError::io(format!(
                "backend repeated cursor {next:#x} while listing directory {}",
                self.item_id
            ))));
        }
        self.cursor = page.next_cursor;
        Some(Ok(page))
    }
}

impl Connection {
    /// Reads one page of directory `item_id` starting at `cursor` (`0` = first page).
    ///
    /// Cursors are issued by the backend. A cursor that predates a change to
    /// the directory fails with [`InvalidCursor`](crate::VfsErrorKind::InvalidCursor);
    /// restart from `0` in that case.
    pub fn read_dir(&self, item_id: ItemId, cursor: u64) -> Result<DirectoryPage, VfsError> {
        let session = self.session()?;
        self.track(check_item_id(item_id))?;

        let response = self.send(&session, Request::ReadDir { item_id, cursor })?;
        let reply = self.track(match response {
            Response::ReadDir(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("read_dir", &other)),
        })?;

        if let Some(bad) = reply.entries.iter().find(|e| e.item_id == INVALID_ITEM_ID) {
            return self.track(Err(VfsError::io(format!(
                "backend listed {:?} in directory {item_id} with item id 0",
                bad.name
            ))));
        }

        // An empty page always ends the listing, whatever cursor came with it.
        let next_cursor = match reply.next_cursor {
            0 => None,
            _ if reply.entries.is_empty() => None,
            next => Some(next),
        };
        trace!(item_id, cursor, entries = reply.entries.len(), ?next_cursor, "read_dir");
        Ok(DirectoryPage {
            entries: reply.entries,
            next_cursor,
        })
    }

    /// Iterates over every page of directory `item_id`.
    pub fn pages(&self, item_id: ItemId) -> DirectoryListing<'_> {
        DirectoryListing {
            connection: self,
            item_id,
            cursor: Some(0),
            seen_cursors: HashSet::new(),
        }
    }

    /// Lists the whole directory by following cursors from `0` until exhaustion.
    pub fn list_dir(&self, item_id: ItemId) -> Result<Vec<DirEntry>, VfsError> {
        let mut entries = Vec::new();
        for page in self.pages(item_id) {
            entries.extend(page?.entries);
        }
        Ok(entries)
    }
}
