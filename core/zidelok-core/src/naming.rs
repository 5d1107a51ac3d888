//! Site and archive naming rules.
//!
//! A site's name is its archive file name without the `.zip` suffix, or its
//! directory name. Imported archives have download-manager decorations removed
//! before they enter the store.

use crate::error::{Result, SiteError};
use crate::patterns::RE_NAME_DECORATION;
use crate::storage::ARCHIVE_SUFFIX;

/// Normalizes a downloaded archive file name.
///
/// The name is split on decoration runs (brackets, parentheses, commas and
/// the whitespace around them). If that yields more than one segment the
/// result is the first segment plus `.zip`; otherwise the name is returned
/// unchanged.
///
/// The `.zip` suffix is forced whenever a decoration is found, even if the
/// original extension was something else.
///
/// ```
/// use zidelok_core::normalize_archive_name;
///
/// assert_eq!(normalize_archive_name("My App (1).zip"), "My App.zip");
/// assert_eq!(normalize_archive_name("weird[name].zip"), "weird.zip");
/// assert_eq!(normalize_archive_name("plainname.zip"), "plainname.zip");
/// ```
pub fn normalize_archive_name(file_name: &str) -> String {
    let mut segments = RE_NAME_DECORATION.split(file_name);
    let first = segments.next().unwrap_or_default();
    let decorated = segments.next().is_some();

    // A leading decoration would leave nothing to name the site after.
    if decorated && !first.is_empty() {
        format!("{}{}", first, ARCHIVE_SUFFIX)
    } else {
        file_name.to_string()
    }
}

/// Site name for an archive file name, or `None` if it is not an archive.
pub fn site_name_for(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(ARCHIVE_SUFFIX)
        .filter(|name| !name.is_empty())
}

/// True if the file name carries the archive suffix.
pub fn is_archive_name(file_name: &str) -> bool {
    site_name_for(file_name).is_some()
}

/// Rejects names that cannot address a single entry of the store.
pub fn validate_site_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.ends_with(ARCHIVE_SUFFIX);

    if invalid {
        Err(SiteError::InvalidSiteName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_parenthesized_counter() {
        assert_eq!(normalize_archive_name("My App (1).zip"), "My App.zip");
        assert_eq!(normalize_archive_name("site (2).zip"), "site.zip");
    }

    #[test]
    fn test_normalize_strips_bracketed_segments() {
        assert_eq!(normalize_archive_name("weird[name].zip"), "weird.zip");
        assert_eq!(normalize_archive_name("site [2].zip"), "site.zip");
        assert_eq!(normalize_archive_name("site(1)(2).zip"), "site.zip");
    }

    #[test]
    fn test_normalize_leaves_plain_names_alone() {
        assert_eq!(normalize_archive_name("plainname.zip"), "plainname.zip");
        assert_eq!(normalize_archive_name("My App.zip"), "My App.zip");
        assert_eq!(normalize_archive_name("my-site_v2.zip"), "my-site_v2.zip");
    }

    #[test]
    fn test_normalize_truncates_at_comma() {
        assert_eq!(normalize_archive_name("site, copy.zip"), "site.zip");
    }

    #[test]
    fn test_normalize_forces_zip_suffix() {
        // Known quirk: decorations force the archive suffix.
        assert_eq!(normalize_archive_name("notes (1).txt"), "notes.zip");
    }

    #[test]
    fn test_normalize_keeps_name_with_leading_decoration() {
        assert_eq!(normalize_archive_name("(1).zip"), "(1).zip");
    }

    #[test]
    fn test_site_name_for() {
        assert_eq!(site_name_for("demo.zip"), Some("demo"));
        assert_eq!(site_name_for("demo.ZIP"), None);
        assert_eq!(site_name_for(".zip"), None);
        assert_eq!(site_name_for("demo"), None);
    }

    #[test]
    fn test_validate_site_name() {
        assert!(validate_site_name("demo").is_ok());
        assert!(validate_site_name("My App").is_ok());
        assert!(validate_site_name("").is_err());
        assert!(validate_site_name("..").is_err());
        assert!(validate_site_name("../etc").is_err());
        assert!(validate_site_name("a\\b").is_err());
        assert!(validate_site_name("demo.zip").is_err());
    }
}
