//! Compiled regex patterns for archive name handling.
//!
//! These patterns are compiled once on first use and reused throughout
//! the application.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Download Name Decorations
// ═══════════════════════════════════════════════════════════════════════════════

/// A run of decoration characters appended by download managers, e.g. the
/// ` (1)` in `site (1).zip` or `[2]` in `site[2].zip`. Whitespace only counts
/// when it sits next to a bracket, parenthesis or comma.
pub static RE_NAME_DECORATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[\[\](),][\[\](),\s]*").unwrap());
