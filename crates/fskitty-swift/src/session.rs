//! The session object FSKit holds for a mounted volume.

use fskitty_client::{
    ClientConfig, ConfigError, Connection, ItemType, ROOT_ITEM_ID, SetAttributesParams, VfsError,
    VfsErrorKind,
};
use tracing::{debug, info};

use crate::result::{
    VfsResultAttrs, VfsResultBytes, VfsResultId, VfsResultItem, VfsResultPage, VfsResultSession,
    VfsResultString, VfsResultUnit, VfsResultWritten,
};

/// A connection to one VFS backend.
///
/// All methods take `&self` and may be called from any thread.
#[derive(Debug)]
pub struct VfsSession {
    connection: Connection,
}

/// Connects to the backend at `address`.
///
/// Timeouts and chunk sizes come from the `FSKITTY_*` environment variables
/// when set, otherwise from the defaults of [`ClientConfig`]. An unparsable
/// variable fails the connect with `ConnectionError`, like any other
/// connection setup failure.
pub fn vfs_connect(address: String) -> VfsResultSession {
    VfsResultSession::new(connect_internal(&address, ClientConfig::from_env()))
}

fn connect_internal(
    address: &str,
    config: Result<ClientConfig, ConfigError>,
) -> Result<VfsSession, VfsError> {
    let config = config.map_err(|e| {
        VfsError::new(
            VfsErrorKind::ConnectionError,
            format!("invalid client configuration: {e}"),
        )
    })?;
    let connection = Connection::connect_with_config(address, config)?;
    info!(address, server = ?connection.server_name(), "VfsSession connected");
    Ok(VfsSession::from_connection(connection))
}

impl VfsSession {
    pub(crate) fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Replaces the current connection with one to `address`. On failure the
    /// session is left disconnected.
    pub fn reconnect(&self, address: String) -> VfsResultUnit {
        VfsResultUnit::new(self.connection.reconnect(&address))
    }

    /// Closes the connection. Later calls fail with `NotConnected` until
    /// [`reconnect`](Self::reconnect).
    pub fn disconnect(&self) {
        debug!("VfsSession disconnect");
        self.connection.disconnect();
    }

    /// Whether the session has a live connection.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Name the backend announced, or an empty string when disconnected.
    pub fn server_name(&self) -> String {
        self.connection.server_name().unwrap_or_default()
    }

    /// ID of the root directory.
    pub fn root_item_id(&self) -> u64 {
        ROOT_ITEM_ID
    }

    /// Round-trips a ping.
    pub fn ping(&self) -> VfsResultString {
        VfsResultString::new(self.connection.ping())
    }

    /// Resolves `name` inside `parent_id`.
    pub fn lookup(&self, parent_id: u64, name: String) -> VfsResultItem {
        VfsResultItem::new(self.connection.lookup(parent_id, &name).map(Into::into))
    }

    /// Fetches the attributes of `item_id`.
    pub fn get_attributes(&self, item_id: u64) -> VfsResultAttrs {
        VfsResultAttrs::new(self.connection.get_attributes(item_id).map(Into::into))
    }

    /// Reads one page of directory `item_id` starting at `cursor` (0 = first page).
    pub fn read_dir(&self, item_id: u64, cursor: u64) -> VfsResultPage {
        VfsResultPage::new(self.connection.read_dir(item_id, cursor).map(Into::into))
    }

    /// Reads up to `length` bytes at `offset`. Short reads are not errors.
    pub fn read(&self, item_id: u64, offset: u64, length: u64) -> VfsResultBytes {
        VfsResultBytes::new(self.connection.read(item_id, offset, length))
    }

    /// Writes `data` at `offset` and reports how many bytes were accepted.
    pub fn write(&self, item_id: u64, offset: u64, data: Vec<u8>) -> VfsResultWritten {
        VfsResultWritten::new(self.connection.write(item_id, offset, &data))
    }

    /// Creates `name` in `parent_id`. `item_type` is 0 (file), 1 (directory)
    /// or 2 (symlink).
    pub fn create(&self, parent_id: u64, name: String, item_type: u8) -> VfsResultId {
        VfsResultId::new(self.create_internal(parent_id, &name, item_type))
    }

    fn create_internal(&self, parent_id: u64, name: &str, item_type: u8) -> Result<u64, VfsError> {
        let Some(item_type) = ItemType::from_u8(item_type) else {
            self.require_session()?;
            return Err(VfsError::new(
                VfsErrorKind::InvalidArgument,
                format!("unknown item type {item_type}"),
            ));
        };
        self.connection.create(parent_id, name, item_type)
    }

    /// Deletes `item_id`.
    pub fn delete(&self, item_id: u64) -> VfsResultUnit {
        VfsResultUnit::new(self.connection.delete(item_id))
    }

    /// Moves `item_id` to `new_name` inside `new_parent_id`.
    pub fn rename(&self, item_id: u64, new_parent_id: u64, new_name: String) -> VfsResultUnit {
        VfsResultUnit::new(self.connection.rename(item_id, new_parent_id, &new_name))
    }

    /// Changes the mode and/or modification time. Each `has_*` flag says
    /// whether the matching value should be applied.
    pub fn set_attributes(
        &self,
        item_id: u64,
        has_mode: bool,
        mode: u32,
        has_modified_time: bool,
        modified_time: u64,
    ) -> VfsResultUnit {
        let params = SetAttributesParams {
            mode: has_mode.then_some(mode),
            modified_time: has_modified_time.then_some(modified_time),
        };
        VfsResultUnit::new(self.connection.set_attributes(item_id, params))
    }

    /// `NotConnected` when no connection is installed.
    fn require_session(&self) -> Result<(), VfsError> {
        match self.connection.server_name() {
            Some(_) => Ok(()),
            None => Err(VfsError::new(VfsErrorKind::NotConnected, "not connected")),
        }
    }
}
