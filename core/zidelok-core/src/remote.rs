//! Remote catalogue URL handling.

use url::Url;

use crate::error::{Result, SiteError};

/// Normalizes user input from the address bar into an absolute URL.
///
/// Input without an `http://` or `https://` scheme gets `https://` prepended.
///
/// ```
/// use zidelok_core::normalize_remote_url;
///
/// assert_eq!(normalize_remote_url("example.com").unwrap(), "https://example.com/");
/// assert!(normalize_remote_url("   ").is_err());
/// ```
pub fn normalize_remote_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SiteError::InvalidRemoteUrl(input.to_string()));
    }

    let lowered = trimmed.to_ascii_lowercase();
    let candidate = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| {
        tracing::warn!(input = %trimmed, error = %e, "Rejected remote URL");
        SiteError::InvalidRemoteUrl(trimmed.to_string())
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(SiteError::InvalidRemoteUrl(trimmed.to_string()));
    }

    Ok(url.to_string())
}
