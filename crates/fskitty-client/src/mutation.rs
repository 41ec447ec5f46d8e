//! Create, delete, rename and attribute changes.

use fskitty_proto::{INVALID_ITEM_ID, ItemId, ItemType, Request, Response, SetAttributesParams};
use tracing::debug;

use crate::connection::unexpected_reply;
use crate::ids::check_item_id;
use crate::{Connection, VfsError, validate_name};

impl Connection {
    /// Creates `name` of kind `item_type` inside directory `parent_id` and
    /// returns the ID the backend assigned.
    pub fn create(
        &self,
        parent_id: ItemId,
        name: &str,
        item_type: ItemType,
    ) -> Result<ItemId, VfsError> {
        let session = self.session()?;
        self.track(check_item_id(parent_id).and_then(|()| validate_name(name)))?;

        let response = self.send(
            &session,
            Request::Create {
                parent_id,
                name: name.to_string(),
                item_type,
            },
        )?;
        let item_id = self.track(match response {
            Response::Create(Ok(INVALID_ITEM_ID)) => {
                Err(VfsError::io(format!("backend assigned item id 0 to {name:?}")))
            }
            Response::Create(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("create", &other)),
        })?;

        debug!(parent_id, name, ?item_type, item_id, "create");
        Ok(item_id)
    }

    /// Deletes `item_id`. Directories must be empty; the root cannot be deleted.
    pub fn delete(&self, item_id: ItemId) -> Result<(), VfsError> {
        let session = self.session()?;
        self.track(check_item_id(item_id))?;

        let response = self.send(&session, Request::Delete { item_id })?;
        self.track(match response {
            Response::Delete(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("delete", &other)),
        })?;
        debug!(item_id, "delete");
        Ok(())
    }

    /// Moves `item_id` into `new_parent_id` under `new_name`.
    pub fn rename(
        &self,
        item_id: ItemId,
        new_parent_id: ItemId,
        new_name: &str,
    ) -> Result<(), VfsError> {
        let session = self.session()?;
        self.track(
            check_item_id(item_id)
                .and_then(|()| check_item_id(new_parent_id))
                .and_then(|()| validate_name(new_name)),
        )?;

        let response = self.send(
            &session,
            Request::Rename {
                item_id,
                new_parent_id,
                new_name: new_name.to_string(),
            },
        )?;
        self.track(match response {
            Response::Rename(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("rename", &other)),
        })?;
        debug!(item_id, new_parent_id, new_name, "rename");
        Ok(())
    }

    /// Changes the mode and/or modification time of `item_id`.
    pub fn set_attributes(
        &self,
        item_id: ItemId,
        params: SetAttributesParams,
    ) -> Result<(), VfsError> {
        let session = self.session()?;
        self.track(check_item_id(item_id))?;

        let response = self.send(&session, Request::SetAttributes { item_id, params })?;
        self.track(match response {
            Response::SetAttributes(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("set_attributes", &other)),
        })
    }
}
