//! Zip extraction and store file operations.
//!
//! Extraction is destructive and not transactional: an interrupted run leaves
//! a partially populated directory behind, which the registry then reports as
//! expanded.

use std::io::{self, Write};
use std::path::Path;

use fs_err as fs;

use crate::error::{Result, SiteError};
use crate::tasks::CancelToken;

/// Counts from a single extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub dirs: usize,
    /// Entries skipped because their path escapes the target directory.
    pub skipped: usize,
}

/// Removes `dir` (recursively) if present and recreates it empty.
pub fn clean_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        fs::remove_dir_all(dir).map_err(|e| SiteError::io("removing site directory", e))?;
    } else if dir.exists() {
        fs::remove_file(dir).map_err(|e| SiteError::io("removing stale site file", e))?;
    }
    fs::create_dir_all(dir).map_err(|e| SiteError::io("creating site directory", e))
}

/// Replaces the contents of `target` with the contents of `archive_path`.
///
/// The archive is opened before `target` is touched, so a missing or corrupt
/// archive leaves an existing directory as it was. Failures after that point
/// leave whatever was extracted so far.
pub fn extract_archive(
    archive_path: &Path,
    target: &Path,
    cancel: &CancelToken,
) -> Result<ExtractStats> {
    if !archive_path.is_file() {
        return Err(SiteError::extraction(archive_path, "archive not found"));
    }

    let file =
        fs::File::open(archive_path).map_err(|e| SiteError::extraction(archive_path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| SiteError::extraction(archive_path, e))?;

    cancel.check("extraction")?;
    clean_directory(target).map_err(|e| SiteError::extraction(archive_path, e))?;

    let mut stats = ExtractStats::default();
    for index in 0..archive.len() {
        cancel.check("extraction")?;

        let mut entry = archive
            .by_index(index)
            .map_err(|e| SiteError::extraction(archive_path, e))?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(
                archive = %archive_path.display(),
                entry = entry.name(),
                "Skipping archive entry outside the site directory"
            );
            stats.skipped += 1;
            continue;
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| SiteError::extraction(archive_path, e))?;
            stats.dirs += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SiteError::extraction(archive_path, e))?;
        }
        let mut out =
            fs::File::create(&out_path).map_err(|e| SiteError::extraction(archive_path, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| SiteError::extraction(archive_path, e))?;
        out.flush()
            .map_err(|e| SiteError::extraction(archive_path, e))?;
        stats.files += 1;
    }

    tracing::info!(
        archive = %archive_path.display(),
        files = stats.files,
        dirs = stats.dirs,
        skipped = stats.skipped,
        "Unzip complete"
    );
    Ok(stats)
}

/// Copies `source` to `dest` via a temp file in the destination directory.
///
/// Readers never observe a half-written archive.
pub fn copy_into_store(source: &Path, dest: &Path) -> Result<u64> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));

    let mut input = fs::File::open(source).map_err(|e| SiteError::io("opening import source", e))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".import-")
        .tempfile_in(dir)
        .map_err(|e| SiteError::io(format!("creating temp file in {}", dir.display()), e))?;

    let bytes = io::copy(&mut input, &mut tmp)
        .map_err(|e| SiteError::io(format!("copying {}", source.display()), e))?;
    tmp.flush()
        .map_err(|e| SiteError::io(format!("flushing temp file for {}", dest.display()), e))?;
    tmp.persist(dest).map_err(|e| {
        SiteError::io(format!("persisting temp file to {}", dest.display()), e.error)
    })?;

    Ok(bytes)
}


#[cfg(test)]
mod tests {
    use super::test_support::write_zip;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extracts_files_and_directories() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("demo.zip");
        write_zip(
            &archive,
            &[
                ("index.html", "<html></html>"),
                ("assets/", ""),
                ("assets/app.js", "console.log(1)"),
            ],
        );

        let target = temp.path().join("demo");
        let stats = extract_archive(&archive, &target, &CancelToken::new()).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.dirs, 1);
        assert_eq!(
            std::fs::read_to_string(target.join("index.html")).unwrap(),
            "<html></html>"
        );
        assert!(target.join("assets").join("app.js").is_file());
    }

    #[test]
    fn test_extraction_replaces_previous_contents() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("demo.zip");
        write_zip(&archive, &[("index.html", "new")]);

        let target = temp.path().join("demo");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.txt"), "old").unwrap();

        extract_archive(&archive, &target, &CancelToken::new()).unwrap();

        assert!(!target.join("stale.txt").exists());
        assert!(target.join("index.html").exists());
    }

    #[test]
    fn test_corrupt_archive_leaves_directory_untouched() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("demo.zip");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let target = temp.path().join("demo");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "x").unwrap();

        let err = extract_archive(&archive, &target, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SiteError::ExtractionFailed { .. }));
        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn test_unwritable_target_is_extraction_failure() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("demo.zip");
        write_zip(&archive, &[("index.html", "x")]);
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let err =
            extract_archive(&archive, &blocker.join("demo"), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SiteError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_missing_archive_is_extraction_failure() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(
            &temp.path().join("nope.zip"),
            &temp.path().join("nope"),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SiteError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_entries_escaping_target_are_skipped() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", "x"), ("ok.txt", "y")]);

        let target = temp.path().join("store").join("evil");
        let stats = extract_archive(&archive, &target, &CancelToken::new()).unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.files, 1);
        assert!(!temp.path().join("store").join("escape.txt").exists());
    }

    #[test]
    fn test_cancelled_before_start_leaves_target_alone() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("demo.zip");
        write_zip(&archive, &[("index.html", "x")]);
        let target = temp.path().join("demo");

        let token = CancelToken::new();
        token.cancel();
        let err = extract_archive(&archive, &target, &token).unwrap_err();
        assert!(matches!(err, SiteError::TaskCancelled(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_copy_into_store_overwrites() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.zip");
        let dest = temp.path().join("dest.zip");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&dest, b"old").unwrap();

        let bytes = copy_into_store(&source, &dest).unwrap();

        assert_eq!(bytes, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
        assert!(source.exists());
    }

    #[test]
    fn test_clean_directory_replaces_stray_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("demo");
        std::fs::write(&path, b"file, not dir").unwrap();

        clean_directory(&path).unwrap();
        assert!(path.is_dir());
    }
}
