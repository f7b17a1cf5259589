//! Test data fixtures
//!
//! Creates isolated temporary user databases seeded with test users.

use super::constants::{TEST_PASS, TEST_USER};
use anyhow::Result;
use promptify_server::user::{SqliteUserStore, UserManager};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Creates a temporary user database seeded with the standard test user.
///
/// Returns the temp dir (keep it alive for the test duration) and the
/// database path.
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("user.db");

    let user_store = Arc::new(SqliteUserStore::new(&db_path)?);
    let user_manager = UserManager::new(user_store);

    user_manager.add_user(TEST_USER)?;
    user_manager.create_password_credentials(TEST_USER, TEST_PASS)?;

    Ok((temp_dir, db_path))
}
