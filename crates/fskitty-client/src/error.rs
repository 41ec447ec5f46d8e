//! Error taxonomy shared by every client operation.
//!
//! Backends and transports can fail in open-ended ways; the host only needs a
//! small, stable set of outcomes. [`VfsErrorKind`] is that set. Each kind has a
//! fixed integer code (part of the foreign-function contract) and a POSIX
//! errno, and [`VfsError`] pairs the kind with a human-readable message.

use std::fmt;

use fskitty_proto::{EndpointError, ProtoError, RemoteError, errno};
use thiserror::Error;

/// Stable classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VfsErrorKind {
    /// No session is installed.
    NotConnected,
    /// The address, transport or handshake failed, or a request timed out.
    ConnectionError,
    /// The item does not exist.
    NotFound,
    /// An item with that name already exists.
    AlreadyExists,
    /// A directory was required.
    NotADirectory,
    /// A regular file was required.
    NotAFile,
    /// The directory still has children.
    NotEmpty,
    /// An argument was rejected locally or by the backend.
    InvalidArgument,
    /// A directory cursor is stale or was never issued.
    InvalidCursor,
    /// The backend refused the operation.
    PermissionDenied,
    /// The backend failed, replied inconsistently, or reported an unknown code.
    IoError,
    /// The backend cannot move the item across devices.
    CrossDeviceNotSupported,
}

impl VfsErrorKind {
    /// Every kind, in code order.
    pub const ALL: [Self; 12] = [
        Self::NotConnected,
        Self::ConnectionError,
        Self::NotFound,
        Self::AlreadyExists,
        Self::NotADirectory,
        Self::NotAFile,
        Self::NotEmpty,
        Self::InvalidArgument,
        Self::InvalidCursor,
        Self::PermissionDenied,
        Self::IoError,
        Self::CrossDeviceNotSupported,
    ];

    /// Stable integer code. `0` is reserved for success at the FFI edge.
    pub fn code(self) -> i32 {
        match self {
            Self::NotConnected => 1,
            Self::ConnectionError => 2,
            Self::NotFound => 3,
            Self::AlreadyExists => 4,
            Self::NotADirectory => 5,
            Self::NotAFile => 6,
            Self::NotEmpty => 7,
            Self::InvalidArgument => 8,
            Self::InvalidCursor => 9,
            Self::PermissionDenied => 10,
            Self::IoError => 11,
            Self::CrossDeviceNotSupported => 12,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Converts to the host's POSIX errno value.
    pub fn to_errno(self) -> i32 {
        match self {
            Self::NotConnected => libc::ENOTCONN,
            Self::ConnectionError => libc::ECONNRESET,
            Self::NotFound => libc::ENOENT,
            Self::AlreadyExists => libc::EEXIST,
            Self::NotADirectory => libc::ENOTDIR,
            Self::NotAFile => libc::EISDIR,
            Self::NotEmpty => libc::ENOTEMPTY,
            Self::InvalidArgument | Self::InvalidCursor => libc::EINVAL,
            Self::PermissionDenied => libc::EACCES,
            Self::IoError => libc::EIO,
            Self::CrossDeviceNotSupported => libc::EXDEV,
        }
    }

    /// Maps a wire error code to a kind. Unknown codes become [`IoError`](Self::IoError).
    pub fn from_remote_code(code: i32) -> Self {
        match code {
            errno::ENOENT => Self::NotFound,
            errno::EEXIST => Self::AlreadyExists,
            errno::ENOTDIR => Self::NotADirectory,
            errno::EISDIR => Self::NotAFile,
            errno::ENOTEMPTY => Self::NotEmpty,
            errno::EINVAL => Self::InvalidArgument,
            errno::EBADCOOKIE => Self::InvalidCursor,
            errno::EACCES => Self::PermissionDenied,
            errno::EXDEV => Self::CrossDeviceNotSupported,
            _ => Self::IoError,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::NotConnected => "not connected",
            Self::ConnectionError => "connection error",
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::NotADirectory => "not a directory",
            Self::NotAFile => "not a file",
            Self::NotEmpty => "directory not empty",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidCursor => "invalid directory cursor",
            Self::PermissionDenied => "permission denied",
            Self::IoError => "I/O error",
            Self::CrossDeviceNotSupported => "cross-device move not supported",
        }
    }
}

impl fmt::Display for VfsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A failed client operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct VfsError {
    kind: VfsErrorKind,
    message: String,
}

impl VfsError {
    /// Creates an error of the given kind.
    pub fn new(kind: VfsErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error's classification.
    pub fn kind(&self) -> VfsErrorKind {
        self.kind
    }

    /// Human-readable detail.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stable integer code, see [`VfsErrorKind::code`].
    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    /// POSIX errno for the host, see [`VfsErrorKind::to_errno`].
    pub fn to_errno(&self) -> i32 {
        self.kind.to_errno()
    }

    /// Returns true if reconnecting and repeating the operation may succeed.
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, VfsErrorKind::ConnectionError)
    }

    pub(crate) fn not_connected() -> Self {
        Self::new(VfsErrorKind::NotConnected, "no active connection")
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::ConnectionError, message)
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::InvalidArgument, message)
    }

    pub(crate) fn io(message: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::IoError, message)
    }
}

impl From<RemoteError> for VfsError {
    fn from(e: RemoteError) -> Self {
        let kind = VfsErrorKind::from_remote_code(e.code);
        match errno::name(e.code) {
            Some(_) if kind != VfsErrorKind::IoError || e.code == errno::EIO => {
                Self::new(kind, e.message)
            }
            Some(name) => Self::new(kind, format!("backend error {name} ({}): {}", e.code, e.message)),
            None => Self::new(
                kind,
                format!("unrecognized backend error {}: {}", e.code, e.message),
            ),
        }
    }
}

impl From<ProtoError> for VfsError {
    fn from(e: ProtoError) -> Self {
        Self::connection(e.to_string())
    }
}

impl From<EndpointError> for VfsError {
    fn from(e: EndpointError) -> Self {
        Self::connection(format!("malformed address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable_and_distinct() {
        let codes: Vec<i32> = VfsErrorKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes, (1..=12).collect::<Vec<_>>());
        for kind in VfsErrorKind::ALL {
            assert_eq!(VfsErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(VfsErrorKind::from_code(0), None);
        assert_eq!(VfsErrorKind::from_code(13), None);
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(VfsErrorKind::NotFound.to_errno(), libc::ENOENT);
        assert_eq!(VfsErrorKind::NotAFile.to_errno(), libc::EISDIR);
        assert_eq!(VfsErrorKind::InvalidCursor.to_errno(), libc::EINVAL);
        assert_eq!(VfsErrorKind::NotConnected.to_errno(), libc::ENOTCONN);
        assert_eq!(VfsErrorKind::CrossDeviceNotSupported.to_errno(), libc::EXDEV);
    }

    #[test]
    fn test_remote_codes_map_to_kinds() {
        let kind = |code| VfsError::from(RemoteError::new(code, "x")).kind();
        assert_eq!(kind(errno::ENOENT), VfsErrorKind::NotFound);
        assert_eq!(kind(errno::EEXIST), VfsErrorKind::AlreadyExists);
        assert_eq!(kind(errno::ENOTDIR), VfsErrorKind::NotADirectory);
        assert_eq!(kind(errno::EISDIR), VfsErrorKind::NotAFile);
        assert_eq!(kind(errno::ENOTEMPTY), VfsErrorKind::NotEmpty);
        assert_eq!(kind(errno::EINVAL), VfsErrorKind::InvalidArgument);
        assert_eq!(kind(errno::EBADCOOKIE), VfsErrorKind::InvalidCursor);
        assert_eq!(kind(errno::EACCES), VfsErrorKind::PermissionDenied);
        assert_eq!(kind(errno::EXDEV), VfsErrorKind::CrossDeviceNotSupported);
        assert_eq!(kind(errno::EIO), VfsErrorKind::IoError);
        assert_eq!(kind(errno::ENOSPC), VfsErrorKind::IoError);
    }

    #[test]
    fn test_unknown_remote_code_keeps_detail() {
        let err = VfsError::from(RemoteError::new(4242, "quota exploded"));
        assert_eq!(err.kind(), VfsErrorKind::IoError);
        assert!(err.message().contains("4242"));
        assert!(err.message().contains("quota exploded"));

        let err = VfsError::from(RemoteError::new(errno::ENOSPC, "disk full"));
        assert!(err.message().contains("ENOSPC"));
        assert!(err.message().contains("disk full"));

        let err = VfsError::from(RemoteError::new(errno::ENOENT, "no such item"));
        assert_eq!(err.message(), "no such item");
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = VfsError::new(VfsErrorKind::NotEmpty, "directory 7 is not empty");
        assert_eq!(err.to_string(), "directory not empty: directory 7 is not empty");
    }

    #[test]
    fn test_is_retryable() {
        assert!(VfsError::connection("reset").is_retryable());
        assert!(!VfsError::not_connected().is_retryable());
        assert!(!VfsError::io("boom").is_retryable());
    }

    #[test]
    fn test_malformed_address_is_connection_error() {
        let err = VfsError::from(EndpointError::Empty);
        assert_eq!(err.kind(), VfsErrorKind::ConnectionError);
    }
}
