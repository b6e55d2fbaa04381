//! Shared test utilities.
//!
//! Only compiled for test builds.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Creates a temporary project directory for testing.
///
/// Returns `(TempDir, PathBuf)`; keep the `TempDir` handle alive for the
/// test duration. Document discovery skips hidden directories, and temp
/// directories can land under hidden paths like `/tmp/.tmpXXXXX`, so the
/// project lives in a non-hidden `project` subdirectory.
pub fn create_test_project_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project_dir = temp_dir.path().join("project");
    fs::create_dir(&project_dir).expect("Failed to create project subdirectory");
    (temp_dir, project_dir)
}
