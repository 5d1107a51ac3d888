//! Storage configuration and path management for Zidelok.
//!
//! This module provides a centralized `StorageConfig` struct that manages all
//! file paths for Zidelok data:
//!
//! ```text
//! <root>/
//! ├── settings.json        # flat key/value settings
//! ├── logs/                # shell log files
//! └── sites/               # the archive store
//!     ├── <name>.zip
//!     └── <name>/
//!         ├── index.html       # entry point
//!         └── app_info/index.json  # optional manifest
//! ```
//!
//! Production code uses `StorageConfig::default()`.
//! Tests use `StorageConfig::with_root(temp_dir)` for isolation.

use std::path::{Path, PathBuf};

/// Suffix identifying site archives in the store.
pub const ARCHIVE_SUFFIX: &str = ".zip";
/// Entry point document inside an expanded site.
pub const ENTRY_POINT_FILE: &str = "index.html";
/// Manifest location relative to an expanded site.
pub const MANIFEST_DIR: &str = "app_info";
pub const MANIFEST_FILE: &str = "index.json";

const APP_DIR_NAME: &str = "zidelok";

/// Central configuration for all Zidelok storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all Zidelok data (default: platform data dir/zidelok)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .or_else(|| dirs::home_dir().map(|h| h.join(format!(".{}", APP_DIR_NAME))))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR_NAME));
        Self { root }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories and for `--data-dir` overrides.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Global Files & Directories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to settings.json (app preferences).
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Path to the archive store.
    pub fn sites_dir(&self) -> PathBuf {
        self.root.join("sites")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Per-Site Paths
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to a site's expanded directory.
    /// Example: <root>/sites/demo/
    pub fn site_dir(&self, name: &str) -> PathBuf {
        site_dir_in(&self.sites_dir(), name)
    }

    /// Path to a site's zip archive.
    /// Example: <root>/sites/demo.zip
    pub fn site_archive(&self, name: &str) -> PathBuf {
        site_archive_in(&self.sites_dir(), name)
    }

    pub fn site_entry_point(&self, name: &str) -> PathBuf {
        self.site_dir(name).join(ENTRY_POINT_FILE)
    }

    /// Example: <root>/sites/demo/app_info/index.json
    pub fn site_manifest(&self, name: &str) -> PathBuf {
        manifest_path(&self.site_dir(name))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directory Creation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Ensures the root directory and standard subdirectories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [self.root.clone(), self.sites_dir(), self.logs_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                tracing::info!(path = %dir.display(), "Created data directory");
            }
        }
        Ok(())
    }
}

pub(crate) fn site_dir_in(sites_dir: &Path, name: &str) -> PathBuf {
    sites_dir.join(name)
}

pub(crate) fn site_archive_in(sites_dir: &Path, name: &str) -> PathBuf {
    sites_dir.join(format!("{}{}", name, ARCHIVE_SUFFIX))
}

pub(crate) fn manifest_path(site_dir: &Path) -> PathBuf {
    site_dir.join(MANIFEST_DIR).join(MANIFEST_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_root_is_app_dir() {
        let config = StorageConfig::default();
        let name = config.root().file_name().unwrap().to_string_lossy();
        assert!(name.ends_with("zidelok"));
    }

    #[test]
    fn test_with_root_sets_custom_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/test-zidelok"));
        assert_eq!(config.root(), Path::new("/tmp/test-zidelok"));
    }

    #[test]
    fn test_global_paths() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/zidelok"));
        assert_eq!(
            config.settings_file(),
            PathBuf::from("/tmp/zidelok/settings.json")
        );
        assert_eq!(config.sites_dir(), PathBuf::from("/tmp/zidelok/sites"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/zidelok/logs"));
    }

    #[test]
    fn test_site_paths() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/zidelok"));
        assert_eq!(
            config.site_archive("demo"),
            PathBuf::from("/tmp/zidelok/sites/demo.zip")
        );
        assert_eq!(
            config.site_entry_point("demo"),
            PathBuf::from("/tmp/zidelok/sites/demo/index.html")
        );
        assert_eq!(
            config.site_manifest("demo"),
            PathBuf::from("/tmp/zidelok/sites/demo/app_info/index.json")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_structure() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::with_root(temp.path().join("data"));

        config.ensure_dirs().unwrap();
        // Second call is a no-op
        config.ensure_dirs().unwrap();

        assert!(config.root().exists());
        assert!(config.sites_dir().is_dir());
        assert!(config.logs_dir().is_dir());
    }
}
