//! The backend trait and request dispatch.

use async_trait::async_trait;
use fskitty_proto::{
    ItemAttributes, ItemId, ItemType, LookupReply, ReadDirReply, RemoteError, Request, Response,
    SetAttributesParams,
};
use tracing::debug;

/// A virtual filesystem that can be served to fskitty clients.
///
/// Every method reports failures as a [`RemoteError`] carrying a code from
/// [`fskitty_proto::errno`]. Implementations must never reuse an [`ItemId`]
/// while the item it named still exists, and must treat directory cursors as
/// opaque values they issued themselves (cursor `0` always means "start").
#[async_trait]
pub trait Vfs: Send + Sync + 'static {
    /// Finds `name` in directory `parent_id`.
    async fn lookup(&self, parent_id: ItemId, name: &str) -> Result<LookupReply, RemoteError>;

    /// Returns the attributes of `item_id`.
    async fn get_attributes(&self, item_id: ItemId) -> Result<ItemAttributes, RemoteError>;

    /// Returns one page of the directory `item_id`, starting at `cursor`.
    async fn read_dir(&self, item_id: ItemId, cursor: u64) -> Result<ReadDirReply, RemoteError>;

    /// Reads up to `len` bytes at `offset`. Short reads at end of file are not errors.
    async fn read(&self, item_id: ItemId, offset: u64, len: u64) -> Result<Vec<u8>, RemoteError>;

    /// Writes `data` at `offset`, returning how many bytes were accepted.
    async fn write(&self, item_id: ItemId, offset: u64, data: &[u8]) -> Result<u64, RemoteError>;

    /// Creates `name` in `parent_id` and returns the new item's ID.
    async fn create(
        &self,
        parent_id: ItemId,
        name: &str,
        item_type: ItemType,
    ) -> Result<ItemId, RemoteError>;

    /// Removes an item. Directories must be empty.
    async fn delete(&self, item_id: ItemId) -> Result<(), RemoteError>;

    /// Moves `item_id` to `new_parent_id` under `new_name`.
    async fn rename(
        &self,
        item_id: ItemId,
        new_parent_id: ItemId,
        new_name: &str,
    ) -> Result<(), RemoteError>;

    /// Applies the fields present in `params`.
    async fn set_attributes(
        &self,
        item_id: ItemId,
        params: SetAttributesParams,
    ) -> Result<(), RemoteError>;

    /// Liveness banner.
    async fn ping(&self) -> String {
        "pong".to_string()
    }
}

/// Runs one request against `vfs` and wraps the outcome in the matching [`Response`].
pub async fn dispatch<V: Vfs + ?Sized>(vfs: &V, request: Request) -> Response {
    debug!(op = request.op_name(), "dispatch");
    match request {
        Request::Lookup { parent_id, name } => Response::Lookup(vfs.lookup(parent_id, &name).await),
        Request::GetAttributes { item_id } => {
            Response::GetAttributes(vfs.get_attributes(item_id).await)
        }
        Request::ReadDir { item_id, cursor } => {
            Response::ReadDir(vfs.read_dir(item_id, cursor).await)
        }
        Request::Read {
            item_id,
            offset,
            len,
        } => Response::Read(vfs.read(item_id, offset, len).await),
        Request::Write {
            item_id,
            offset,
            data,
        } => Response::Write(vfs.write(item_id, offset, &data).await),
        Request::Create {
            parent_id,
            name,
            item_type,
        } => Response::Create(vfs.create(parent_id, &name, item_type).await),
        Request::Delete { item_id } => Response::Delete(vfs.delete(item_id).await),
        Request::Rename {
            item_id,
            new_parent_id,
            new_name,
        } => Response::Rename(vfs.rename(item_id, new_parent_id, &new_name).await),
        Request::SetAttributes { item_id, params } => {
            Response::SetAttributes(vfs.set_attributes(item_id, params).await)
        }
        Request::Ping => Response::Pong(vfs.ping().await),
    }
}
