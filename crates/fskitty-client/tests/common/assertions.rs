//! Custom assertions for client integration tests.

use std::collections::HashSet;

use fskitty_client::{Connection, ItemId, VfsError, VfsErrorKind};

/// Assert that `result` failed with `kind`.
#[track_caller]
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, VfsError>, kind: VfsErrorKind) {
    match result {
        Ok(value) => panic!("expected {kind:?}, got Ok({value:?})"),
        Err(e) => assert_eq!(e.kind(), kind, "unexpected error: {e}"),
    }
}

/// Assert that a directory lists exactly `expected` (in any order, no duplicates).
#[track_caller]
pub fn assert_dir_names(conn: &Connection, dir: ItemId, expected: &[&str]) {
    let entries = conn
        .list_dir(dir)
        .unwrap_or_else(|e| panic!("failed to list {dir}: {e}"));
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len(), "duplicate entries in {names:?}");

    let expected: HashSet<&str> = expected.iter().copied().collect();
    assert_eq!(unique, expected, "directory {dir} entries mismatch");
}

/// Assert that a file contains exactly `expected`.
#[track_caller]
pub fn assert_file_content(conn: &Connection, item_id: ItemId, expected: &[u8]) {
    let actual = conn
        .read_to_end(item_id)
        .unwrap_or_else(|e| panic!("failed to read {item_id}: {e}"));
    assert_eq!(
        actual.len(),
        expected.len(),
        "length mismatch for item {item_id}"
    );
    assert_eq!(actual, expected, "content mismatch for item {item_id}");
}
