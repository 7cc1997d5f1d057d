//! Per-instance browser profile directories
//!
//! Every pooled browser gets its own UUID-named user data directory so that
//! concurrent instances never contend on Chrome's `SingletonLock`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix for every profile directory this crate creates under the temp dir
pub const PROFILE_PREFIX: &str = "searchpool_chrome";

/// RAII wrapper for a profile directory
///
/// Removes the directory on drop unless ownership was moved out with `into_path()`.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl BrowserProfile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cleanup_on_drop: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand the directory to another owner and disable auto-cleanup
    pub fn into_path(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            debug!("Removing browser profile {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!(
                    "Failed to remove profile directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Create a fresh profile directory under the system temp dir
pub fn create_unique_profile() -> Result<BrowserProfile> {
    create_profile_in(&std::env::temp_dir())
}

/// Create a fresh profile directory under `parent`
///
/// Uses `create_dir` rather than `create_dir_all` so that a UUID collision fails
/// loudly instead of sharing a directory.
pub fn create_profile_in(parent: &Path) -> Result<BrowserProfile> {
    let path = parent.join(format!("{PROFILE_PREFIX}_{}", Uuid::new_v4()));

    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    debug!("Created browser profile {}", path.display());
    Ok(BrowserProfile::new(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_removed_on_drop() {
        let parent = tempfile::tempdir().expect("temp dir");
        let profile = create_profile_in(parent.path()).expect("profile");
        let path = profile.path().to_path_buf();
        assert!(path.exists());
        assert!(
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(PROFILE_PREFIX))
        );

        drop(profile);
        assert!(!path.exists());
    }

    #[test]
    fn test_into_path_keeps_directory() {
        let parent = tempfile::tempdir().expect("temp dir");
        let path = create_profile_in(parent.path()).expect("profile").into_path();
        assert!(path.exists());
    }
}
