//! # zidelok-core
//!
//! Core library for Zidelok: the local site registry and lifecycle manager
//! shared by every shell (native GUI, CLI).
//!
//! A *site* is a web application stored in a flat directory as `<name>.zip`,
//! an extracted `<name>/`, or both. The core lists sites, extracts, launches,
//! deletes and imports them, persists shell settings, and keeps the
//! renderer's view of all that up to date through incremental state patches.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Long operations can run on
//!   a [`TaskHandle`] worker thread.
//! - **Filesystem is the truth**: The registry is recomputed on every scan and
//!   never cached.
//! - **Failures are values at the shell boundary**: [`ShellEngine::handle_action`]
//!   folds every error into the returned [`ActionResult`].
//! - **FFI-ready**: UniFFI annotations enable Swift, Kotlin, Python bindings.
//!   Prefer additive public API changes; removing or renaming breaks FFI clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zidelok_core::{ShellEngine, StorageConfig};
//!
//! let engine = ShellEngine::with_storage(StorageConfig::default())?;
//! for site in engine.list_sites()? {
//!     println!("{} zipped={} expanded={}", site.name, site.zipped, site.expanded);
//! }
//! ```

// UniFFI scaffolding for Swift/Kotlin/Python bindings
uniffi::setup_scaffolding!();

pub mod archive;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod naming;
pub mod patterns;
pub mod registry;
pub mod remote;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod tasks;
pub mod types;

// Re-export commonly used items at crate root
pub use archive::ExtractStats;
pub use engine::{ActionResult, ShellEngine};
pub use error::{ErrorKind, Result, SiteError, SiteFfiError};
pub use lifecycle::{DeleteOutcome, SiteManager};
pub use naming::{normalize_archive_name, site_name_for, validate_site_name};
pub use registry::{find_site, list_sites, read_site_info};
pub use remote::normalize_remote_url;
pub use settings::{Settings, SettingsStore};
pub use storage::*;
pub use sync::{diff, AppState, Identity, StateField, StatePatch, StateSync, StateValue};
pub use tasks::{CancelToken, TaskHandle, TaskOutcome};
pub use types::*;

pub use zidelok_shell_protocol::{ErrorInfo, MainAction, Mode, StateEvent, UiAction, UiRequest};
