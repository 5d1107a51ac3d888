//! Site lifecycle: extract, launch, delete and import.
//!
//! Every operation on a name runs under that name's lock in [`SiteLocks`].
//! Nothing here rolls back: a failed call leaves the store in whatever state
//! the filesystem reached, and the next scan reports exactly that.

use std::path::{Path, PathBuf};

use fs_err as fs;

use crate::archive::{copy_into_store, extract_archive, ExtractStats};
use crate::error::{ErrorKind, Result, SiteError};
use crate::locks::SiteLocks;
use crate::naming::{is_archive_name, normalize_archive_name, site_name_for, validate_site_name};
use crate::storage::{site_archive_in, site_dir_in, ENTRY_POINT_FILE};
use crate::tasks::CancelToken;
use crate::types::{ImportFailure, ImportOutcome, ImportSummary, LaunchTarget};

/// What a delete actually removed. Both false means the name was unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed_dir: bool,
    pub removed_archive: bool,
}

#[derive(Debug)]
pub struct SiteManager {
    sites_dir: PathBuf,
    locks: SiteLocks,
}

impl SiteManager {
    pub fn new(sites_dir: impl Into<PathBuf>) -> Self {
        Self {
            sites_dir: sites_dir.into(),
            locks: SiteLocks::new(),
        }
    }

    pub fn sites_dir(&self) -> &Path {
        &self.sites_dir
    }

    pub fn site_dir(&self, name: &str) -> PathBuf {
        site_dir_in(&self.sites_dir, name)
    }

    pub fn site_archive(&self, name: &str) -> PathBuf {
        site_archive_in(&self.sites_dir, name)
    }

    pub fn entry_point(&self, name: &str) -> PathBuf {
        self.site_dir(name).join(ENTRY_POINT_FILE)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Extract
    // ─────────────────────────────────────────────────────────────────────

    /// Replaces `<name>/` with the contents of `<name>.zip`.
    pub fn extract_site(&self, name: &str) -> Result<ExtractStats> {
        self.extract_site_with(name, &CancelToken::new())
    }

    pub fn extract_site_with(&self, name: &str, cancel: &CancelToken) -> Result<ExtractStats> {
        validate_site_name(name)?;
        self.locks
            .with_site(name, || self.extract_locked(name, cancel))
    }

    fn extract_locked(&self, name: &str, cancel: &CancelToken) -> Result<ExtractStats> {
        let archive = self.site_archive(name);
        let target = self.site_dir(name);
        tracing::info!(site = %name, "Extracting site");
        extract_archive(&archive, &target, cancel)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Launch
    // ─────────────────────────────────────────────────────────────────────

    /// Resolves the entry point for `name`, extracting the archive first if the
    /// site has not been expanded yet.
    ///
    /// When `extracted` is set on the result the store changed and callers
    /// should re-scan.
    pub fn launch_site(&self, name: &str) -> Result<LaunchTarget> {
        self.launch_site_with(name, &CancelToken::new())
    }

    pub fn launch_site_with(&self, name: &str, cancel: &CancelToken) -> Result<LaunchTarget> {
        validate_site_name(name)?;
        self.locks.with_site(name, || {
            let entry_point = self.entry_point(name);
            if entry_point.is_file() {
                return Ok(self.target(name, entry_point, false));
            }

            if !self.site_archive(name).is_file() {
                tracing::warn!(site = %name, "Launch requested for unknown site");
                return Err(SiteError::SiteNotFound(name.to_string()));
            }

            self.extract_locked(name, cancel)?;
            if !entry_point.is_file() {
                tracing::warn!(
                    site = %name,
                    entry_point = ENTRY_POINT_FILE,
                    "Archive extracted without an entry point"
                );
                return Err(SiteError::SiteNotFound(name.to_string()));
            }

            Ok(self.target(name, entry_point, true))
        })
    }

    fn target(&self, name: &str, entry_point: PathBuf, extracted: bool) -> LaunchTarget {
        tracing::info!(site = %name, extracted, "Launching site");
        LaunchTarget {
            name: name.to_string(),
            entry_point: entry_point.to_string_lossy().to_string(),
            extracted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Delete
    // ─────────────────────────────────────────────────────────────────────

    /// Removes `<name>/` and `<name>.zip`. Missing artifacts are skipped.
    pub fn delete_site(&self, name: &str) -> Result<DeleteOutcome> {
        validate_site_name(name)?;
        self.locks.with_site(name, || {
            let mut outcome = DeleteOutcome::default();

            let dir = self.site_dir(name);
            if dir.is_dir() {
                fs::remove_dir_all(&dir).map_err(|e| SiteError::io("deleting site directory", e))?;
                outcome.removed_dir = true;
            }

            let archive = self.site_archive(name);
            if archive.is_file() {
                fs::remove_file(&archive).map_err(|e| SiteError::io("deleting site archive", e))?;
                outcome.removed_archive = true;
            }

            tracing::info!(
                site = %name,
                removed_dir = outcome.removed_dir,
                removed_archive = outcome.removed_archive,
                "Deleted site"
            );
            Ok(outcome)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Import
    // ─────────────────────────────────────────────────────────────────────

    /// Copies an external archive into the store under its normalized name.
    ///
    /// The source is never modified and the archive is not extracted.
    pub fn import_site(&self, source: &Path) -> Result<ImportOutcome> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if !is_archive_name(file_name) {
            tracing::warn!(source = %source.display(), "Ignoring import of non-zip file");
            return Err(SiteError::InvalidArchivePath(
                source.to_string_lossy().to_string(),
            ));
        }
        if !source.is_file() {
            return Err(SiteError::ArchiveNotFound(source.to_path_buf()));
        }

        let stored_as = normalize_archive_name(file_name);
        let site_name = site_name_for(&stored_as)
            .ok_or_else(|| SiteError::InvalidSiteName(stored_as.clone()))?
            .to_string();
        validate_site_name(&site_name)?;

        self.locks.with_site(&site_name, || {
            let dest = self.sites_dir.join(&stored_as);
            let replaced = dest.exists();
            let bytes = copy_into_store(source, &dest)?;

            tracing::info!(
                source = %source.display(),
                stored_as = %stored_as,
                bytes,
                replaced,
                "Imported site archive"
            );

            Ok(ImportOutcome {
                source: source.to_string_lossy().to_string(),
                stored_as: stored_as.clone(),
                site_name: site_name.clone(),
                replaced,
            })
        })
    }

    /// Imports each file in turn. A failing file is recorded and the batch
    /// continues; cancellation stops before the next file.
    pub fn import_sites<P: AsRef<Path>>(&self, files: &[P], cancel: &CancelToken) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for file in files {
            let file = file.as_ref();
            if cancel.is_cancelled() {
                summary.failed.push(ImportFailure {
                    source: file.to_string_lossy().to_string(),
                    code: ErrorKind::Task.code().to_string(),
                    message: "Import cancelled".to_string(),
                });
                continue;
            }

            match self.import_site(file) {
                Ok(outcome) => summary.imported.push(outcome),
                Err(err) => {
                    tracing::warn!(source = %file.display(), error = %err, "Import failed");
                    summary.failed.push(ImportFailure {
                        source: file.to_string_lossy().to_string(),
                        code: err.kind().code().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        summary
    }
}
