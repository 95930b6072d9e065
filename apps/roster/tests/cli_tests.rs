//! Integration tests for Roster CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use roster::cli::{CliError, cmd_init, cmd_status};
use roster::roster_core::storage::Store;
use roster::roster_core::{CompanyRepository, UserRepository};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("roster.redb");

    let added = cmd_init(&db_path, false, false).unwrap();
    assert_eq!(added, 0);
    assert!(db_path.exists());
}

#[test]
fn test_init_creates_parent_directories() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("nested").join("dir").join("roster.redb");

    assert!(cmd_init(&db_path, false, false).is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_with_seed_loads_sample_data() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("roster.redb");

    assert_eq!(cmd_init(&db_path, false, true).unwrap(), 2);

    let store = Store::open(&db_path).unwrap();
    assert_eq!(store.all_companies().unwrap().len(), 2);
    assert!(store.role_exists("Manager").unwrap());
    assert!(store.role_exists("Administrator").unwrap());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("roster.redb");

    // First init
    cmd_init(&db_path, false, false).unwrap();

    // Second init should fail
    let result = cmd_init(&db_path, false, false);
    assert!(matches!(result, Err(CliError::Exists(_))));
}

#[test]
fn test_init_succeeds_with_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("roster.redb");

    cmd_init(&db_path, false, true).unwrap();

    // Force replaces the seeded file with an empty one
    cmd_init(&db_path, true, false).unwrap();
    let stats = cmd_status(&db_path, false).unwrap();
    assert_eq!(stats.companies, 0);
}

// =============================================================================
// STATUS COMMAND TESTS
// =============================================================================

#[test]
fn test_status_counts_records() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("roster.redb");
    cmd_init(&db_path, false, true).unwrap();

    let stats = cmd_status(&db_path, false).unwrap();
    assert_eq!(stats.companies, 2);
    assert_eq!(stats.employees, 3);
    assert_eq!(stats.users, 0);
}

#[test]
fn test_status_json_mode() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("roster.redb");
    cmd_init(&db_path, false, false).unwrap();

    let result = cmd_status(&db_path, true);
    assert!(result.is_ok());
}

#[test]
fn test_status_missing_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("absent.redb");

    let result = cmd_status(&db_path, false);
    assert!(matches!(result, Err(CliError::Missing(_))));
    assert!(!db_path.exists());
}
