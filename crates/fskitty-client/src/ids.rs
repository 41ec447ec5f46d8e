//! Item identifiers and name rules: lookup and attribute retrieval.

use fskitty_proto::name::validate as validate_component;
use fskitty_proto::{INVALID_ITEM_ID, ItemId, ROOT_ITEM_ID, Request, Response};
use tracing::debug;

use crate::connection::unexpected_reply;
use crate::{Attributes, Connection, Item, VfsError};

/// Checks that `name` can be used as a single path component.
///
/// Rejects empty names, `.` and `..`, names containing `/` or NUL, and names
/// longer than 255 bytes.
pub fn validate_name(name: &str) -> Result<(), VfsError> {
    validate_component(name)
        .map_err(|e| VfsError::invalid_argument(format!("invalid name {name:?}: {e}")))
}

/// Rejects the reserved ID `0` before it reaches the backend.
pub(crate) fn check_item_id(item_id: ItemId) -> Result<(), VfsError> {
    if item_id == INVALID_ITEM_ID {
        return Err(VfsError::invalid_argument("item id 0 is never valid"));
    }
    Ok(())
}

impl Connection {
    /// ID of the root directory.
    pub fn root_id(&self) -> ItemId {
        ROOT_ITEM_ID
    }

    /// Resolves `name` inside directory `parent_id`.
    pub fn lookup(&self, parent_id: ItemId, name: &str) -> Result<Item, VfsError> {
        let session = self.session()?;
        self.track(check_item_id(parent_id).and_then(|()| validate_name(name)))?;

        let response = self.send(
            &session,
            Request::Lookup {
                parent_id,
                name: name.to_string(),
            },
        )?;
        let item = self.track(match response {
            Response::Lookup(Ok(reply)) if reply.item_id == INVALID_ITEM_ID => Err(VfsError::io(
                format!("backend returned item id 0 for {name:?}"),
            )),
            Response::Lookup(result) => result.map(Item::from).map_err(VfsError::from),
            other => Err(unexpected_reply("lookup", &other)),
        })?;

        debug!(parent_id, name, item_id = item.item_id, item_type = ?item.item_type, "lookup");
        Ok(item)
    }

    /// Fetches the current attributes of `item_id`. Nothing is cached.
    pub fn get_attributes(&self, item_id: ItemId) -> Result<Attributes, VfsError> {
        let session = self.session()?;
        self.track(check_item_id(item_id))?;

        let response = self.send(&session, Request::GetAttributes { item_id })?;
        self.track(match response {
            Response::GetAttributes(Ok(attrs)) if attrs.item_id != item_id => {
                Err(VfsError::io(format!(
                    "backend returned attributes of item {} for item {item_id}",
                    attrs.item_id
                )))
            }
            Response::GetAttributes(result) => result.map(Attributes::from).map_err(VfsError::from),
            other => Err(unexpected_reply("get_attributes", &other)),
        })
    }
}
