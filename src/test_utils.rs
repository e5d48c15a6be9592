//! Shared test utilities for apptally.

#![cfg(test)]

use crate::store::DurationStore;
use tempfile::{tempdir, TempDir};

/// Create a duration store rooted in a fresh temporary directory.
///
/// Returns a tuple of (DurationStore, TempDir). The TempDir must be kept alive
/// for the duration of the test to prevent the directory from being deleted.
pub fn setup_test_store() -> (DurationStore, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory for test store");
    let store = DurationStore::new(dir.path());
    (store, dir)
}
