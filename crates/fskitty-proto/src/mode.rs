//! Permission bits used in [`ItemAttributes::mode`](crate::ItemAttributes).
//!
//! Only the low twelve bits (permissions plus setuid/setgid/sticky) travel on
//! the wire. The item type is carried separately.

/// Default mode for directories (rwxr-xr-x).
pub const DIRECTORY: u32 = 0o755;
/// Default mode for regular files (rw-r--r--).
pub const FILE_REGULAR: u32 = 0o644;
/// Mode for executable files (rwxr-xr-x).
pub const FILE_EXECUTABLE: u32 = 0o755;
/// Mode for symbolic links.
pub const SYMLINK: u32 = 0o777;

/// Mask of the bits that are meaningful on the wire.
pub const PERMISSION_MASK: u32 = 0o7777;

const OWNER_READ: u32 = 0o400;
const OWNER_WRITE: u32 = 0o200;
const OWNER_EXEC: u32 = 0o100;

/// Whether the owner may read the item.
pub fn owner_can_read(mode: u32) -> bool {
    mode & OWNER_READ != 0
}

/// Whether the owner may write the item.
pub fn owner_can_write(mode: u32) -> bool {
    mode & OWNER_WRITE != 0
}

/// Whether the owner may execute (or, for directories, search) the item.
pub fn owner_can_exec(mode: u32) -> bool {
    mode & OWNER_EXEC != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_modes() {
        assert!(owner_can_write(FILE_REGULAR));
        assert!(!owner_can_exec(FILE_REGULAR));
        assert!(owner_can_exec(FILE_EXECUTABLE));
        assert!(owner_can_exec(DIRECTORY));
    }

    #[test]
    fn test_read_only_file() {
        let mode = 0o444;
        assert!(owner_can_read(mode));
        assert!(!owner_can_write(mode));
    }
}
