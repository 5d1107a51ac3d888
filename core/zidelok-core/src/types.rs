//! Core types shared across all Zidelok shells.
//!
//! **FFI Support:** Records are annotated with UniFFI macros for Swift/Kotlin/Python bindings.
//! Serialized field names match what the renderer consumes.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Site Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Optional per-site metadata from `<site>/app_info/index.json`.
///
/// Unknown manifest keys are ignored; every field is optional.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct SiteInfo {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Image reference (usually relative to the site directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Documentation reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// A logical installed site: zipped, expanded, or both.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SiteEntry {
    pub name: String,
    pub zipped: bool,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<SiteInfo>,
}

impl SiteEntry {
    /// Label for display: manifest name when present, else the site name.
    pub fn display_name(&self) -> &str {
        self.info
            .as_ref()
            .and_then(|i| i.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Lifecycle Results
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a launched site should be loaded from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTarget {
    pub name: String,
    /// Absolute path to the site's entry point.
    pub entry_point: String,
    /// True if the archive was extracted as part of this launch.
    pub extracted: bool,
}

/// A single archive copied into the store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub source: String,
    /// File name inside the store after normalization.
    pub stored_as: String,
    pub site_name: String,
    /// True if an archive with the same name was overwritten.
    pub replaced: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ImportFailure {
    pub source: String,
    /// Wire error code, as in `ErrorInfo`.
    pub code: String,
    pub message: String,
}

/// Result of a bulk import. Failures never stop the batch.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct ImportSummary {
    pub imported: Vec<ImportOutcome>,
    pub failed: Vec<ImportFailure>,
}

/// Terminal result of a download handed over by the shell.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
pub struct DownloadOutcome {
    pub success: bool,
    pub file: String,
}
