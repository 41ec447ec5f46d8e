//! Errno-like error codes carried on the wire.
//!
//! These values are fixed by the protocol. Hosts translate them into their own
//! error representation; they are not `libc` constants.

use serde::{Deserialize, Serialize};

/// No error
pub const OK: i32 = 0;
/// No such file or directory
pub const ENOENT: i32 = 2;
/// I/O error
pub const EIO: i32 = 5;
/// Permission denied
pub const EACCES: i32 = 13;
/// File exists
pub const EEXIST: i32 = 17;
/// Cross-device link
pub const EXDEV: i32 = 18;
/// Not a directory
pub const ENOTDIR: i32 = 20;
/// Is a directory
pub const EISDIR: i32 = 21;
/// Invalid argument
pub const EINVAL: i32 = 22;
/// No space left on device
pub const ENOSPC: i32 = 28;
/// Directory not empty
pub const ENOTEMPTY: i32 = 66;
/// Directory cursor is stale or was never issued
pub const EBADCOOKIE: i32 = 523;

/// Error reported by a backend for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("remote error {code}: {message}")]
pub struct RemoteError {
    /// Errno-like code (see the constants in this module).
    pub code: i32,
    /// Backend-provided description.
    pub message: String,
}

impl RemoteError {
    /// Creates an error with the given code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `ENOENT` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ENOENT, message)
    }

    /// `EEXIST` error.
    pub fn exists(message: impl Into<String>) -> Self {
        Self::new(EEXIST, message)
    }

    /// `ENOTDIR` error.
    pub fn not_dir(message: impl Into<String>) -> Self {
        Self::new(ENOTDIR, message)
    }

    /// `EISDIR` error.
    pub fn is_dir(message: impl Into<String>) -> Self {
        Self::new(EISDIR, message)
    }

    /// `EINVAL` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(EINVAL, message)
    }

    /// `EACCES` error.
    pub fn access(message: impl Into<String>) -> Self {
        Self::new(EACCES, message)
    }

    /// `EIO` error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EIO, message)
    }
}

/// Returns the symbolic name of a wire code, if it is one this crate defines.
pub fn name(code: i32) -> Option<&'static str> {
    Some(match code {
        OK => "OK",
        ENOENT => "ENOENT",
        EIO => "EIO",
        EACCES => "EACCES",
        EEXIST => "EEXIST",
        EXDEV => "EXDEV",
        ENOTDIR => "ENOTDIR",
        EISDIR => "EISDIR",
        EINVAL => "EINVAL",
        ENOSPC => "ENOSPC",
        ENOTEMPTY => "ENOTEMPTY",
        EBADCOOKIE => "EBADCOOKIE",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_codes() {
        assert_eq!(RemoteError::not_found("x").code, ENOENT);
        assert_eq!(RemoteError::exists("x").code, EEXIST);
        assert_eq!(RemoteError::not_dir("x").code, ENOTDIR);
        assert_eq!(RemoteError::is_dir("x").code, EISDIR);
        assert_eq!(RemoteError::invalid("x").code, EINVAL);
        assert_eq!(RemoteError::access("x").code, EACCES);
        assert_eq!(RemoteError::io("x").code, EIO);
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = RemoteError::new(ENOTEMPTY, "directory has 3 children");
        assert_eq!(err.to_string(), "remote error 66: directory has 3 children");
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(name(EBADCOOKIE), Some("EBADCOOKIE"));
        assert_eq!(name(ENOTEMPTY), Some("ENOTEMPTY"));
        assert_eq!(name(9999), None);
    }
}
