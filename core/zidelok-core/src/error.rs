//! Error types for zidelok-core operations.
//! Keep SiteFfiError minimal and stable to avoid breaking FFI clients.

use std::path::PathBuf;
use zidelok_shell_protocol::{
    ErrorInfo, CODE_EXTRACTION_FAILED, CODE_INVALID_INPUT, CODE_IO_FAILURE, CODE_NOT_FOUND,
    CODE_SETTINGS_ERROR, CODE_TASK_FAILED,
};

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin/Python)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
///
/// This simplified error type contains just an error message string,
/// making it compatible with UniFFI's error handling.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SiteFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<SiteError> for SiteFfiError {
    fn from(err: SiteError) -> Self {
        SiteFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// Coarse classification shared with shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ErrorKind {
    NotFound,
    ExtractionFailed,
    IoFailure,
    InvalidInput,
    Settings,
    Task,
}

impl ErrorKind {
    /// Stable wire code used in `ErrorInfo`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => CODE_NOT_FOUND,
            ErrorKind::ExtractionFailed => CODE_EXTRACTION_FAILED,
            ErrorKind::IoFailure => CODE_IO_FAILURE,
            ErrorKind::InvalidInput => CODE_INVALID_INPUT,
            ErrorKind::Settings => CODE_SETTINGS_ERROR,
            ErrorKind::Task => CODE_TASK_FAILED,
        }
    }
}

/// All errors that can occur in zidelok-core operations.
///
/// This is the rich error type used internally in Rust code.
/// For FFI boundaries, use `SiteFfiError` instead.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    // ─────────────────────────────────────────────────────────────────────
    // Lookup Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    // ─────────────────────────────────────────────────────────────────────
    // Archive Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Extraction failed: {}: {details}", .archive.display())]
    ExtractionFailed { archive: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Not a zip archive: {0}")]
    InvalidArchivePath(String),

    #[error("Invalid site name: {0:?}")]
    InvalidSiteName(String),

    #[error("Invalid remote URL: {0}")]
    InvalidRemoteUrl(String),

    // ─────────────────────────────────────────────────────────────────────
    // Settings Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Settings file malformed: {}: {details}", .path.display())]
    SettingsMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Site store unreadable: {}: {source}", .path.display())]
    StoreUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Background Task Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Task cancelled: {0}")]
    TaskCancelled(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl SiteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SiteError::SiteNotFound(_) | SiteError::ArchiveNotFound(_) => ErrorKind::NotFound,
            SiteError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            SiteError::InvalidArchivePath(_)
            | SiteError::InvalidSiteName(_)
            | SiteError::InvalidRemoteUrl(_) => ErrorKind::InvalidInput,
            SiteError::SettingsMalformed { .. } | SiteError::Json { .. } => ErrorKind::Settings,
            SiteError::StoreUnreadable { .. } | SiteError::Io { .. } => ErrorKind::IoFailure,
            SiteError::TaskCancelled(_) | SiteError::TaskFailed(_) => ErrorKind::Task,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SiteError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn extraction(archive: impl Into<PathBuf>, details: impl ToString) -> Self {
        SiteError::ExtractionFailed {
            archive: archive.into(),
            details: details.to_string(),
        }
    }

    /// Converts to the shell-facing error shape.
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind().code(), self.to_string())
    }
}

/// Convenience type alias for Results using SiteError.
pub type Result<T> = std::result::Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_wire_codes() {
        assert_eq!(
            SiteError::SiteNotFound("a".into()).to_error_info().code,
            CODE_NOT_FOUND
        );
        assert_eq!(
            SiteError::extraction("/tmp/a.zip", "bad header")
                .to_error_info()
                .code,
            CODE_EXTRACTION_FAILED
        );
        assert_eq!(
            SiteError::InvalidArchivePath("a.txt".into()).kind(),
            ErrorKind::InvalidInput
        );
        let io = SiteError::io("reading", std::io::Error::other("boom"));
        assert_eq!(io.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_ffi_error_carries_message() {
        let err: SiteFfiError = SiteError::SiteNotFound("demo".into()).into();
        assert_eq!(err.to_string(), "Site not found: demo");
    }
}
