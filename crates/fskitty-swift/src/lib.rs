//! Swift FFI bindings for the fskitty VFS client.
//!
//! The FSKit extension holds one [`VfsSession`] per mounted volume and calls
//! its methods from FSKit's worker threads. Each call blocks until the backend
//! answers.
//!
//! ## Error Handling
//!
//! Every fallible call returns an opaque `VfsResult*` wrapper with `isOk()`,
//! `getErrorCode()` (the stable code of [`fskitty_client::VfsErrorKind`], `0`
//! on success), `getErrno()` (POSIX errno for FSKit), `getMessage()` and,
//! where there is a payload, `unwrap()`.
//!
//! Always check `isOk()` before `unwrap()`. On a failed result, `unwrap()` on
//! the session wrapper panics; every other wrapper returns a zeroed value
//! (item ID `0`, empty bytes, an exhausted empty page). Item ID `0` never
//! names a real item, so a zeroed item or attribute set is recognizable, but
//! it carries no information about the failure.
//!
//! ## Item types
//!
//! Item types cross the boundary as `u8`: `0` file, `1` directory, `2`
//! symlink (or anything else that is neither).

#![warn(missing_docs)]
#![warn(clippy::all)]
// swift_bridge generates code with unnecessary casts that we can't control
#![allow(clippy::unnecessary_cast)]

mod logging;
mod result;
mod session;
mod types;

pub use logging::init_logging;
pub use result::{
    VfsResultAttrs, VfsResultBytes, VfsResultId, VfsResultItem, VfsResultPage, VfsResultSession,
    VfsResultString, VfsResultUnit, VfsResultWritten,
};
pub use session::{VfsSession, vfs_connect};
pub use types::{DirectoryPage, ItemAttributes, VfsItem};

#[swift_bridge::bridge]
mod ffi {
    // VfsSession - one connection to a VFS backend
    extern "Rust" {
        type VfsSession;

        #[swift_bridge(swift_name = "connect")]
        fn vfs_connect(address: String) -> VfsResultSession;

        fn reconnect(&self, address: String) -> VfsResultUnit;

        fn disconnect(&self);

        #[swift_bridge(swift_name = "isConnected")]
        fn is_connected(&self) -> bool;

        #[swift_bridge(swift_name = "serverName")]
        fn server_name(&self) -> String;

        #[swift_bridge(swift_name = "rootItemId")]
        fn root_item_id(&self) -> u64;

        fn ping(&self) -> VfsResultString;

        fn lookup(&self, parent_id: u64, name: String) -> VfsResultItem;

        #[swift_bridge(swift_name = "getAttributes")]
        fn get_attributes(&self, item_id: u64) -> VfsResultAttrs;

        #[swift_bridge(swift_name = "readDir")]
        fn read_dir(&self, item_id: u64, cursor: u64) -> VfsResultPage;

        fn read(&self, item_id: u64, offset: u64, length: u64) -> VfsResultBytes;

        fn write(&self, item_id: u64, offset: u64, data: Vec<u8>) -> VfsResultWritten;

        fn create(&self, parent_id: u64, name: String, item_type: u8) -> VfsResultId;

        fn delete(&self, item_id: u64) -> VfsResultUnit;

        fn rename(&self, item_id: u64, new_parent_id: u64, new_name: String) -> VfsResultUnit;

        #[swift_bridge(swift_name = "setAttributes")]
        fn set_attributes(
            &self,
            item_id: u64,
            has_mode: bool,
            mode: u32,
            has_modified_time: bool,
            modified_time: u64,
        ) -> VfsResultUnit;
    }

    // Process-wide logging
    extern "Rust" {
        #[swift_bridge(swift_name = "initLogging")]
        fn init_logging(filter: String) -> bool;
    }

    // Result wrapper for VfsSession creation
    extern "Rust" {
        type VfsResultSession;

        #[swift_bridge(swift_name = "isOk")]
        fn result_session_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_session_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_session_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_session_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_session_unwrap(self) -> VfsSession;
    }

    // Result wrapper for operations without a payload
    extern "Rust" {
        type VfsResultUnit;

        #[swift_bridge(swift_name = "isOk")]
        fn result_unit_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_unit_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_unit_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_unit_message(&self) -> String;
    }

    // Result wrapper for ping banners
    extern "Rust" {
        type VfsResultString;

        #[swift_bridge(swift_name = "isOk")]
        fn result_string_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_string_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_string_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_string_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_string_unwrap(self) -> String;
    }

    // Result wrapper for lookups
    extern "Rust" {
        type VfsResultItem;

        #[swift_bridge(swift_name = "isOk")]
        fn result_item_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_item_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_item_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_item_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_item_unwrap(self) -> VfsItem;
    }

    // Result wrapper for ItemAttributes
    extern "Rust" {
        type VfsResultAttrs;

        #[swift_bridge(swift_name = "isOk")]
        fn result_attrs_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_attrs_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_attrs_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_attrs_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_attrs_unwrap(self) -> ItemAttributes;
    }

    // Result wrapper for DirectoryPage
    extern "Rust" {
        type VfsResultPage;

        #[swift_bridge(swift_name = "isOk")]
        fn result_page_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_page_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_page_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_page_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_page_unwrap(self) -> DirectoryPage;
    }

    // Result wrapper for byte data
    extern "Rust" {
        type VfsResultBytes;

        #[swift_bridge(swift_name = "isOk")]
        fn result_bytes_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_bytes_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_bytes_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_bytes_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_bytes_unwrap(self) -> Vec<u8>;
    }

    // Result wrapper for bytes written
    extern "Rust" {
        type VfsResultWritten;

        #[swift_bridge(swift_name = "isOk")]
        fn result_written_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_written_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_written_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_written_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_written_unwrap(&self) -> u64;
    }

    // Result wrapper for item IDs from create
    extern "Rust" {
        type VfsResultId;

        #[swift_bridge(swift_name = "isOk")]
        fn result_id_is_ok(&self) -> bool;

        #[swift_bridge(swift_name = "getErrorCode")]
        fn result_id_error_code(&self) -> i32;

        #[swift_bridge(swift_name = "getErrno")]
        fn result_id_errno(&self) -> i32;

        #[swift_bridge(swift_name = "getMessage")]
        fn result_id_message(&self) -> String;

        #[swift_bridge(swift_name = "unwrap")]
        fn result_id_unwrap(&self) -> u64;
    }

    // VfsItem - lookup result
    extern "Rust" {
        type VfsItem;

        #[swift_bridge(swift_name = "getItemId")]
        fn item_item_id(&self) -> u64;

        #[swift_bridge(swift_name = "getItemType")]
        fn item_item_type(&self) -> u8;
    }

    // ItemAttributes - opaque attribute container
    extern "Rust" {
        type ItemAttributes;

        #[swift_bridge(swift_name = "getItemId")]
        fn attr_item_id(&self) -> u64;

        #[swift_bridge(swift_name = "getItemType")]
        fn attr_item_type(&self) -> u8;

        #[swift_bridge(swift_name = "isDirectory")]
        fn attr_is_directory(&self) -> bool;

        #[swift_bridge(swift_name = "isFile")]
        fn attr_is_file(&self) -> bool;

        #[swift_bridge(swift_name = "isSymlink")]
        fn attr_is_symlink(&self) -> bool;

        #[swift_bridge(swift_name = "getSize")]
        fn attr_size(&self) -> u64;

        #[swift_bridge(swift_name = "getModifiedTime")]
        fn attr_modified_time(&self) -> u64;

        #[swift_bridge(swift_name = "getCreatedTime")]
        fn attr_created_time(&self) -> u64;

        #[swift_bridge(swift_name = "getMode")]
        fn attr_mode(&self) -> u32;
    }

    // DirectoryPage - one page of a listing, as parallel arrays
    extern "Rust" {
        type DirectoryPage;

        #[swift_bridge(swift_name = "count")]
        fn page_count(&self) -> u64;

        #[swift_bridge(swift_name = "getName")]
        fn page_name(&self, index: u64) -> String;

        #[swift_bridge(swift_name = "getItemIds")]
        fn page_item_ids(&self) -> Vec<u64>;

        #[swift_bridge(swift_name = "getItemTypes")]
        fn page_item_types(&self) -> Vec<u8>;

        #[swift_bridge(swift_name = "getNextCursor")]
        fn page_next_cursor(&self) -> u64;
    }
}
