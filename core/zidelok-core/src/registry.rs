//! Site registry: projects the archive store onto a list of logical sites.
//!
//! The store's filesystem state is the source of truth. Nothing here is
//! cached; every call lists the store directory again.
//!
//! # Reconciliation
//!
//! ```text
//! sites/
//! ├── demo.zip        ─┐
//! ├── demo/           ─┴─► { name: "demo",  zipped: true,  expanded: true  }
//! ├── other.zip       ───► { name: "other", zipped: true,  expanded: false }
//! └── local/          ───► { name: "local", zipped: false, expanded: true  }
//! ```
//!
//! Entries keep the order in which their name was first seen in the
//! directory listing. The listing itself is not sorted.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Result, SiteError};
use crate::naming::site_name_for;
use crate::storage::manifest_path;
use crate::types::{SiteEntry, SiteInfo};

/// Lists all sites in the store.
///
/// Returns `StoreUnreadable` if the store root itself cannot be read. A bad
/// manifest or an unreadable individual entry is logged and skipped.
pub fn list_sites(store: &Path) -> Result<Vec<SiteEntry>> {
    let metadata = fs::metadata(store).map_err(|e| SiteError::StoreUnreadable {
        path: store.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(SiteError::StoreUnreadable {
            path: store.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "store root is not a directory",
            ),
        });
    }

    let mut sites: Vec<SiteEntry> = Vec::new();

    let listing = WalkDir::new(store)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry in listing {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("store listing failed"));
                return Err(SiteError::StoreUnreadable {
                    path: store.to_path_buf(),
                    source,
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable store entry");
                continue;
            }
        };

        let Some(file_name) = entry.file_name().to_str() else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 store entry");
            continue;
        };

        if let Some(name) = site_name_for(file_name) {
            upsert(&mut sites, name).zipped = true;
        } else if entry.file_type().is_dir() {
            let info = read_site_info(entry.path());
            let site = upsert(&mut sites, file_name);
            site.expanded = true;
            site.info = info;
        }
    }

    Ok(sites)
}

/// Looks up a single site by name.
pub fn find_site(store: &Path, name: &str) -> Result<Option<SiteEntry>> {
    Ok(list_sites(store)?.into_iter().find(|s| s.name == name))
}

fn upsert<'a>(sites: &'a mut Vec<SiteEntry>, name: &str) -> &'a mut SiteEntry {
    let idx = match sites.iter().position(|s| s.name == name) {
        Some(idx) => idx,
        None => {
            sites.push(SiteEntry {
                name: name.to_string(),
                zipped: false,
                expanded: false,
                info: None,
            });
            sites.len() - 1
        }
    };
    &mut sites[idx]
}

/// Reads the optional manifest of an expanded site.
///
/// Missing manifest → `None`. Unreadable or malformed manifest → `None` with a warning.
pub fn read_site_info(site_dir: &Path) -> Option<SiteInfo> {
    let path = manifest_path(site_dir);
    if !path.is_file() {
        return None;
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read site manifest");
            return None;
        }
    };

    match serde_json::from_str::<SiteInfo>(&content) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed site manifest");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_empty_store() {
        let temp = TempDir::new().unwrap();
        assert!(list_sites(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_zip_and_directory_merge_into_one_entry() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.zip"));
        fs::create_dir(temp.path().join("a")).unwrap();

        let sites = list_sites(temp.path()).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "a");
        assert!(sites[0].zipped);
        assert!(sites[0].expanded);
    }

    #[test]
    fn test_zip_only_entry() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("only.zip"));

        let sites = list_sites(temp.path()).unwrap();
        assert_eq!(
            sites,
            vec![SiteEntry {
                name: "only".to_string(),
                zipped: true,
                expanded: false,
                info: None,
            }]
        );
    }

    #[test]
    fn test_directory_only_entry_reads_manifest() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("local").join("app_info").join("index.json");
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, r#"{"name":"Local App","docs":"docs/index.html"}"#).unwrap();

        let sites = list_sites(temp.path()).unwrap();
        assert_eq!(sites.len(), 1);
        assert!(!sites[0].zipped);
        assert!(sites[0].expanded);
        let info = sites[0].info.as_ref().unwrap();
        assert_eq!(info.name.as_deref(), Some("Local App"));
        assert_eq!(info.docs.as_deref(), Some("docs/index.html"));
        assert_eq!(info.image, None);
    }

    #[test]
    fn test_malformed_manifest_does_not_abort_scan() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("broken").join("app_info").join("index.json");
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, "{ not json").unwrap();
        touch(&temp.path().join("fine.zip"));

        let sites = list_sites(temp.path()).unwrap();
        assert_eq!(sites.len(), 2);
        let broken = sites.iter().find(|s| s.name == "broken").unwrap();
        assert!(broken.expanded);
        assert_eq!(broken.info, None);
    }

    #[test]
    fn test_stray_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("notes.txt"));
        touch(&temp.path().join(".DS_Store"));

        assert!(list_sites(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_names_are_unique() {
        let temp = TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            touch(&temp.path().join(format!("{}.zip", name)));
            fs::create_dir(temp.path().join(name)).unwrap();
        }

        let sites = list_sites(temp.path()).unwrap();
        let mut names: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(sites.iter().all(|s| s.zipped && s.expanded));
    }

    #[test]
    fn test_order_follows_first_sighting_in_listing() {
        let temp = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid", "omega", "beta"] {
            touch(&temp.path().join(format!("{}.zip", name)));
        }
        for name in ["mid", "gamma", "alpha", "delta"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        touch(&temp.path().join("readme.txt"));

        let mut expected: Vec<String> = Vec::new();
        for entry in fs::read_dir(temp.path()).unwrap() {
            let entry = entry.unwrap();
            let file_name = entry.file_name().to_string_lossy().to_string();
            let name = if entry.file_type().unwrap().is_dir() {
                file_name
            } else if let Some(stem) = file_name.strip_suffix(".zip") {
                stem.to_string()
            } else {
                continue;
            };
            if !expected.contains(&name) {
                expected.push(name);
            }
        }

        let names: Vec<String> = list_sites(temp.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, expected);
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_missing_store_is_an_io_failure() {
        let temp = TempDir::new().unwrap();
        let err = list_sites(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, SiteError::StoreUnreadable { .. }));
    }

    #[test]
    fn test_find_site() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("demo.zip"));

        assert!(find_site(temp.path(), "demo").unwrap().is_some());
        assert!(find_site(temp.path(), "nope").unwrap().is_none());
    }
}
