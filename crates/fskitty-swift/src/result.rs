//! Result wrappers handed across the FFI boundary.
//!
//! swift-bridge cannot carry a Rust `Result`, so each operation returns an
//! opaque wrapper. All of them share [`Outcome`] for the error accessors.

use fskitty_client::VfsError;

use crate::session::VfsSession;
use crate::types::{DirectoryPage, ItemAttributes, VfsItem};

/// A `Result` with the error accessors every wrapper exposes.
#[derive(Debug)]
struct Outcome<T>(Result<T, VfsError>);

impl<T> Outcome<T> {
    fn is_ok(&self) -> bool {
        self.0.is_ok()
    }

    fn error_code(&self) -> i32 {
        self.0.as_ref().err().map_or(0, VfsError::code)
    }

    fn errno(&self) -> i32 {
        self.0.as_ref().err().map_or(0, VfsError::to_errno)
    }

    fn message(&self) -> String {
        self.0
            .as_ref()
            .err()
            .map_or_else(String::new, ToString::to_string)
    }
}

impl<T: Default> Outcome<T> {
    fn value_or_default(self) -> T {
        self.0.unwrap_or_default()
    }
}

impl<T: Copy + Default> Outcome<T> {
    fn copied_or_default(&self) -> T {
        self.0.as_ref().ok().copied().unwrap_or_default()
    }
}

/// Result wrapper for session creation.
#[derive(Debug)]
pub struct VfsResultSession(Outcome<VfsSession>);

impl VfsResultSession {
    pub(crate) fn new(result: Result<VfsSession, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_session_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_session_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_session_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_session_message(&self) -> String {
        self.0.message()
    }

    /// Unwraps the session.
    ///
    /// # Panics
    ///
    /// Panics if the connection failed. Check `isOk()` first.
    pub fn result_session_unwrap(self) -> VfsSession {
        let Outcome(result) = self.0;
        result.expect("VfsResultSession unwrap called on error")
    }
}

/// Result wrapper for operations without a payload.
#[derive(Debug)]
pub struct VfsResultUnit(Outcome<()>);

impl VfsResultUnit {
    pub(crate) fn new(result: Result<(), VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_unit_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_unit_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_unit_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_unit_message(&self) -> String {
        self.0.message()
    }
}

/// Result wrapper for ping banners.
#[derive(Debug)]
pub struct VfsResultString(Outcome<String>);

impl VfsResultString {
    pub(crate) fn new(result: Result<String, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_string_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_string_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_string_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_string_message(&self) -> String {
        self.0.message()
    }

    /// Unwraps the banner (empty string on error).
    pub fn result_string_unwrap(self) -> String {
        self.0.value_or_default()
    }
}

/// Result wrapper for lookups.
#[derive(Debug)]
pub struct VfsResultItem(Outcome<VfsItem>);

impl VfsResultItem {
    pub(crate) fn new(result: Result<VfsItem, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_item_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_item_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_item_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_item_message(&self) -> String {
        self.0.message()
    }

    /// Unwraps the item.
    ///
    /// On error this is an all-zero [`VfsItem`]; its item ID `0` is never
    /// valid. Check `isOk()` first.
    pub fn result_item_unwrap(self) -> VfsItem {
        self.0.value_or_default()
    }
}

/// Result wrapper for [`ItemAttributes`].
#[derive(Debug)]
pub struct VfsResultAttrs(Outcome<ItemAttributes>);

impl VfsResultAttrs {
    pub(crate) fn new(result: Result<ItemAttributes, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_attrs_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_attrs_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_attrs_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_attrs_message(&self) -> String {
        self.0.message()
    }

    /// Unwraps the attributes.
    ///
    /// On error every field is zero, including the item ID, which never names
    /// a real item. Check `isOk()` first.
    pub fn result_attrs_unwrap(self) -> ItemAttributes {
        self.0.value_or_default()
    }
}

/// Result wrapper for [`DirectoryPage`].
#[derive(Debug)]
pub struct VfsResultPage(Outcome<DirectoryPage>);

impl VfsResultPage {
    pub(crate) fn new(result: Result<DirectoryPage, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_page_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_page_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_page_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_page_message(&self) -> String {
        self.0.message()
    }

    /// Unwraps the page (empty and exhausted on error).
    pub fn result_page_unwrap(self) -> DirectoryPage {
        self.0.value_or_default()
    }
}

/// Result wrapper for byte data.
#[derive(Debug)]
pub struct VfsResultBytes(Outcome<Vec<u8>>);

impl VfsResultBytes {
    pub(crate) fn new(result: Result<Vec<u8>, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_bytes_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_bytes_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_bytes_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_bytes_message(&self) -> String {
        self.0.message()
    }

    /// Unwraps the bytes (empty on error).
    pub fn result_bytes_unwrap(self) -> Vec<u8> {
        self.0.value_or_default()
    }
}

/// Result wrapper for bytes written.
#[derive(Debug)]
pub struct VfsResultWritten(Outcome<u64>);

impl VfsResultWritten {
    pub(crate) fn new(result: Result<u64, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_written_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_written_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_written_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_written_message(&self) -> String {
        self.0.message()
    }

    /// Number of bytes the backend accepted (0 on error).
    pub fn result_written_unwrap(&self) -> u64 {
        self.0.copied_or_default()
    }
}

/// Result wrapper for the item ID returned by create.
#[derive(Debug)]
pub struct VfsResultId(Outcome<u64>);

impl VfsResultId {
    pub(crate) fn new(result: Result<u64, VfsError>) -> Self {
        Self(Outcome(result))
    }

    /// Checks if the result is successful.
    pub fn result_id_is_ok(&self) -> bool {
        self.0.is_ok()
    }

    /// Gets the error code (0 if success).
    pub fn result_id_error_code(&self) -> i32 {
        self.0.error_code()
    }

    /// Gets the POSIX errno (0 if success).
    pub fn result_id_errno(&self) -> i32 {
        self.0.errno()
    }

    /// Gets the error description (empty if success).
    pub fn result_id_message(&self) -> String {
        self.0.message()
    }

    /// The new item's ID (0, never a valid ID, on error).
    pub fn result_id_unwrap(&self) -> u64 {
        self.0.copied_or_default()
    }
}
