//! ShellEngine - the main entry point for Zidelok shells.
//!
//! The engine owns the site store, the settings file and the renderer-facing
//! state. Shells drive it either through typed calls (Rust, UniFFI) or through
//! protocol actions (`{action, params}`), and forward the resulting state
//! patches to their renderer.
//!
//! Mutating calls update the in-memory [`AppState`] but do not broadcast. The
//! pending patch is produced by [`ShellEngine::take_changes`], which
//! [`ShellEngine::handle_action`] calls for you.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use zidelok_core::{ShellEngine, UiAction};
//!
//! let engine = ShellEngine::new()?;
//! let initial = engine.sync_state(); // on dom-ready
//! let result = engine.handle_action(UiAction::LaunchSite { name: "demo".into() });
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use zidelok_shell_protocol::{
    parse_ui_action, ErrorInfo, MainAction, Mode, StateEvent, UiAction, CODE_INVALID_INPUT,
};

use crate::error::{Result, SiteError, SiteFfiError};
use crate::lifecycle::SiteManager;
use crate::naming::{is_archive_name, normalize_archive_name, site_name_for, validate_site_name};
use crate::registry::{find_site, list_sites};
use crate::remote::normalize_remote_url;
use crate::settings::SettingsStore;
use crate::storage::StorageConfig;
use crate::sync::{AppState, StatePatch, StateSync};
use crate::tasks::{CancelToken, TaskHandle};
use crate::types::{DownloadOutcome, ImportSummary, LaunchTarget, SiteEntry};

/// Everything a shell needs after dispatching one action.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Changed state fields, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_action: Option<MainAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<ImportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ActionResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Default)]
struct Dispatched {
    main_action: Option<MainAction>,
    imports: Option<ImportSummary>,
}

/// The main engine for Zidelok shells.
///
/// Safe to share between threads: site operations are serialized per name and
/// settings and state each sit behind their own mutex (always taken in that
/// order).
#[derive(uniffi::Object)]
pub struct ShellEngine {
    storage: StorageConfig,
    sites: SiteManager,
    settings: Mutex<SettingsStore>,
    state: Mutex<StateSync>,
}

impl ShellEngine {
    /// Creates an engine over a custom storage root.
    ///
    /// Used by tests and by shells honoring a data-dir override.
    pub fn with_storage(storage: StorageConfig) -> Result<Self> {
        storage
            .ensure_dirs()
            .map_err(|e| SiteError::io(format!("creating {}", storage.root().display()), e))?;

        let settings = SettingsStore::load_or_bundled(storage.settings_file())?;
        let sites = SiteManager::new(storage.sites_dir());
        let local_sites = list_sites(sites.sites_dir())?;

        let values = settings.settings();
        let initial = AppState {
            remote_url: values.remote_url.clone(),
            auto_start: values.auto_start.clone(),
            start_fullscreen: values.start_fullscreen,
            local_sites: Arc::new(local_sites),
        };

        tracing::info!(
            root = %storage.root().display(),
            sites = initial.local_sites.len(),
            "Shell engine ready"
        );

        Ok(Self {
            storage,
            sites,
            settings: Mutex::new(settings),
            state: Mutex::new(StateSync::new(initial)),
        })
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    fn settings_store(&self) -> MutexGuard<'_, SettingsStore> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_sync(&self) -> MutexGuard<'_, StateSync> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current (not necessarily broadcast) state.
    pub fn state_snapshot(&self) -> AppState {
        self.state_sync().state().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // State Sync
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fields changed since the last broadcast, or `None`.
    pub fn take_changes(&self) -> Option<StatePatch> {
        self.state_sync().sync()
    }

    /// Full state for a renderer that just loaded (dom-ready).
    pub fn sync_state(&self) -> Option<StatePatch> {
        let mut state = self.state_sync();
        state.reset();
        state.sync()
    }

    /// Re-scans the store into `localSites`.
    pub fn refresh_sites(&self) -> Result<()> {
        let sites = list_sites(self.sites.sites_dir())?;
        self.state_sync().set_local_sites(sites);
        Ok(())
    }

    /// Re-scan after a mutation. The mutation's own result wins; a scan
    /// failure here is only logged.
    fn rescan_after(&self, operation: &str) {
        if let Err(err) = self.refresh_sites() {
            tracing::warn!(operation, error = %err, "Re-scan after mutation failed");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Dispatches one protocol action.
    ///
    /// Failures are reported in [`ActionResult::error`]; this never returns
    /// an error. Any state change, including one caused by a failed
    /// operation (e.g. a partial extraction), is included in the result.
    pub fn handle_action(&self, action: UiAction) -> ActionResult {
        let name = action.name();
        tracing::debug!(action = name, "Handling UI action");

        let outcome = self.dispatch(action);
        let state = self.take_changes().map(|patch| patch.to_event());

        match outcome {
            Ok(dispatched) => ActionResult {
                state,
                main_action: dispatched.main_action,
                error: dispatched.imports.as_ref().and_then(import_error),
                imports: dispatched.imports,
            },
            Err(err) => {
                tracing::warn!(action = name, error = %err, "UI action failed");
                ActionResult {
                    state,
                    error: Some(err.to_error_info()),
                    ..Default::default()
                }
            }
        }
    }

    /// Parses and dispatches a raw `{action, params}` pair.
    pub fn handle_raw_action(&self, action: &str, params: serde_json::Value) -> ActionResult {
        match parse_ui_action(action, params) {
            Ok(action) => self.handle_action(action),
            Err(info) => {
                tracing::warn!(action, error = %info, "Rejected UI action");
                ActionResult {
                    error: Some(info),
                    ..Default::default()
                }
            }
        }
    }

    fn dispatch(&self, action: UiAction) -> Result<Dispatched> {
        let mut dispatched = Dispatched::default();
        match action {
            UiAction::LoadRemote => dispatched.main_action = Some(self.load_remote()),
            UiAction::RefreshSites => self.refresh_sites()?,
            UiAction::LaunchSite { name } => {
                let target = self.launch_with(&name, &CancelToken::new())?;
                dispatched.main_action = Some(self.show_site(target));
            }
            UiAction::ExtractSite { name } => self.extract_with(&name, &CancelToken::new())?,
            UiAction::DeleteSite { name } => self.remove_site(&name)?,
            UiAction::ImportSites { files } => {
                dispatched.imports = Some(self.import_with(&files, &CancelToken::new()));
            }
            UiAction::ApplySettings {
                url,
                start_fullscreen,
            } => {
                self.update_settings(&url, start_fullscreen)?;
                dispatched.main_action = Some(MainAction::SetMode { mode: Mode::Home });
            }
            UiAction::SetAutoStart { name } => self.update_auto_start(name)?,
        }
        Ok(dispatched)
    }

    /// Where "loadRemote" should go: the catalogue if configured, else settings.
    pub fn load_remote(&self) -> MainAction {
        match self.settings_store().settings().remote_url.clone() {
            Some(url) => MainAction::OpenRemote { url },
            None => {
                tracing::info!("No remote URL configured; opening settings");
                MainAction::SetMode {
                    mode: Mode::Settings,
                }
            }
        }
    }

    fn show_site(&self, target: LaunchTarget) -> MainAction {
        MainAction::ShowSite {
            name: target.name,
            entry_point: target.entry_point,
            fullscreen: self.settings_store().settings().start_fullscreen,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Cancellable Lifecycle Operations
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn launch_with(&self, name: &str, cancel: &CancelToken) -> Result<LaunchTarget> {
        let result = self.sites.launch_site_with(name, cancel);
        let extracted = match &result {
            Ok(target) => target.extracted,
            // A failed launch may still have extracted part of the archive.
            Err(SiteError::ExtractionFailed { .. }) | Err(SiteError::TaskCancelled(_)) => true,
            Err(SiteError::SiteNotFound(_)) => self.sites.site_dir(name).exists(),
            Err(_) => false,
        };
        if extracted {
            self.rescan_after("launch");
        }
        result
    }

    pub fn extract_with(&self, name: &str, cancel: &CancelToken) -> Result<()> {
        let result = self.sites.extract_site_with(name, cancel);
        self.rescan_after("extract");
        result.map(|_| ())
    }

    pub fn import_with<P: AsRef<Path>>(&self, files: &[P], cancel: &CancelToken) -> ImportSummary {
        let summary = self.sites.import_sites(files, cancel);
        if !summary.imported.is_empty() {
            self.rescan_after("import");
        }
        summary
    }

    /// Deletes a site and re-scans, whether or not the delete succeeded.
    pub fn remove_site(&self, name: &str) -> Result<()> {
        let result = self.sites.delete_site(name);
        self.rescan_after("delete");
        result.map(|_| ())
    }

    /// A blank URL clears the remote catalogue. Anything else must normalize
    /// to a valid URL or nothing is changed.
    pub fn update_settings(&self, url: &str, start_fullscreen: bool) -> Result<()> {
        let remote_url = if url.trim().is_empty() {
            None
        } else {
            Some(normalize_remote_url(url)?)
        };

        let mut settings = self.settings_store();
        settings.update(|s| {
            s.remote_url = remote_url.clone();
            s.start_fullscreen = start_fullscreen;
        })?;

        let mut state = self.state_sync();
        state.set_remote_url(remote_url);
        state.set_start_fullscreen(start_fullscreen);
        Ok(())
    }

    pub fn update_auto_start(&self, name: Option<String>) -> Result<()> {
        let name = name.filter(|n| !n.trim().is_empty());
        if let Some(name) = &name {
            validate_site_name(name)?;
        }

        let mut settings = self.settings_store();
        settings.update(|s| s.auto_start = name.clone())?;

        self.state_sync().set_auto_start(name);
        Ok(())
    }

    /// Launches the configured autostart site, if it is still installed.
    pub fn autostart(&self) -> Option<LaunchTarget> {
        let name = self.settings_store().settings().auto_start.clone()?;

        match find_site(self.sites.sites_dir(), &name) {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::info!(site = %name, "Autostart site is no longer installed");
                return None;
            }
            Err(err) => {
                tracing::warn!(site = %name, error = %err, "Autostart lookup failed");
                return None;
            }
        }

        match self.launch_with(&name, &CancelToken::new()) {
            Ok(target) => Some(target),
            Err(err) => {
                tracing::warn!(site = %name, error = %err, "Autostart launch failed");
                None
            }
        }
    }

    /// Store path for a download named `file_name`.
    ///
    /// The name is normalized like an import, so a re-downloaded archive
    /// replaces the existing site instead of creating `site (1)`.
    pub fn download_file(&self, file_name: &str) -> Result<PathBuf> {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let normalized = normalize_archive_name(base);
        if !is_archive_name(&normalized) {
            return Err(SiteError::InvalidArchivePath(file_name.to_string()));
        }
        let name = site_name_for(&normalized).unwrap_or_default();
        validate_site_name(name)?;
        Ok(self.sites.sites_dir().join(normalized))
    }

    pub fn finish_download_with(
        &self,
        file_name: &str,
        completed: bool,
        cancel: &CancelToken,
    ) -> DownloadOutcome {
        let path = match self.download_file(file_name) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "Download has no usable name");
                return DownloadOutcome {
                    success: false,
                    file: file_name.to_string(),
                };
            }
        };
        let file = path.to_string_lossy().to_string();

        if !completed {
            tracing::warn!(file = %file, "Download failed");
            return DownloadOutcome {
                success: false,
                file,
            };
        }

        let stored = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(site_name_for)
            .map(str::to_string);
        let Some(name) = stored else {
            return DownloadOutcome {
                success: false,
                file,
            };
        };

        let success = match self.extract_with(&name, cancel) {
            Ok(()) => {
                tracing::info!(site = %name, "Download finished and extracted");
                true
            }
            Err(err) => {
                tracing::warn!(site = %name, error = %err, "Extracting download failed");
                false
            }
        };
        DownloadOutcome { success, file }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Background Tasks
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn spawn_launch(self: &Arc<Self>, name: String) -> TaskHandle<LaunchTarget> {
        let engine = Arc::clone(self);
        TaskHandle::spawn("launch", move |cancel| engine.launch_with(&name, cancel))
    }

    pub fn spawn_import(self: &Arc<Self>, files: Vec<PathBuf>) -> TaskHandle<ImportSummary> {
        let engine = Arc::clone(self);
        TaskHandle::spawn("import", move |cancel| {
            let summary = engine.import_with(&files, cancel);
            cancel.check("import")?;
            Ok(summary)
        })
    }

    pub fn spawn_finish_download(
        self: &Arc<Self>,
        file_name: String,
        completed: bool,
    ) -> TaskHandle<DownloadOutcome> {
        let engine = Arc::clone(self);
        TaskHandle::spawn("download", move |cancel| {
            Ok(engine.finish_download_with(&file_name, completed, cancel))
        })
    }
}

fn import_error(summary: &ImportSummary) -> Option<ErrorInfo> {
    let first = summary.failed.first()?;
    let total = summary.failed.len() + summary.imported.len();
    Some(ErrorInfo {
        code: first.code.clone(),
        message: format!(
            "{} of {} imports failed; first: {}",
            summary.failed.len(),
            total,
            first.message
        ),
    })
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        serde_json::json!({
            "error": ErrorInfo::new(CODE_INVALID_INPUT, format!("serialization failed: {}", e))
        })
        .to_string()
    })
}

#[uniffi::export]
impl ShellEngine {
    /// Creates an engine over the default data directory.
    #[uniffi::constructor]
    pub fn new() -> std::result::Result<Self, SiteFfiError> {
        Self::with_storage(StorageConfig::default()).map_err(SiteFfiError::from)
    }

    pub fn data_dir(&self) -> String {
        self.storage.root().to_string_lossy().to_string()
    }

    pub fn sites_dir(&self) -> String {
        self.sites.sites_dir().to_string_lossy().to_string()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Sites API
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fresh scan of the store. Does not touch the broadcast state.
    pub fn list_sites(&self) -> std::result::Result<Vec<SiteEntry>, SiteFfiError> {
        list_sites(self.sites.sites_dir()).map_err(SiteFfiError::from)
    }

    pub fn launch_site(&self, name: String) -> std::result::Result<LaunchTarget, SiteFfiError> {
        self.launch_with(&name, &CancelToken::new())
            .map_err(SiteFfiError::from)
    }

    pub fn extract_site(&self, name: String) -> std::result::Result<(), SiteFfiError> {
        self.extract_with(&name, &CancelToken::new())
            .map_err(SiteFfiError::from)
    }

    /// Removes the site's directory and archive. Deleting an unknown site
    /// succeeds.
    pub fn delete_site(&self, name: String) -> std::result::Result<(), SiteFfiError> {
        self.remove_site(&name).map_err(SiteFfiError::from)
    }

    pub fn import_sites(&self, files: Vec<String>) -> ImportSummary {
        self.import_with(&files, &CancelToken::new())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Settings API
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores the remote catalogue URL and fullscreen preference.
    pub fn apply_settings(
        &self,
        url: String,
        start_fullscreen: bool,
    ) -> std::result::Result<(), SiteFfiError> {
        self.update_settings(&url, start_fullscreen)
            .map_err(SiteFfiError::from)
    }

    /// Sets or clears the site launched at startup.
    pub fn set_auto_start(&self, name: Option<String>) -> std::result::Result<(), SiteFfiError> {
        self.update_auto_start(name).map_err(SiteFfiError::from)
    }

    pub fn autostart_site(&self) -> Option<LaunchTarget> {
        self.autostart()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Downloads API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn download_path(&self, file_name: String) -> std::result::Result<String, SiteFfiError> {
        self.download_file(&file_name)
            .map(|p| p.to_string_lossy().to_string())
            .map_err(SiteFfiError::from)
    }

    /// Handles a finished download: extracts it on success.
    pub fn finish_download(&self, file_name: String, completed: bool) -> DownloadOutcome {
        self.finish_download_with(&file_name, completed, &CancelToken::new())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // JSON Protocol API
    // ─────────────────────────────────────────────────────────────────────────────

    /// Dispatches an action given as wire name plus JSON params; returns the
    /// `ActionResult` as JSON.
    pub fn handle_action_json(&self, action: String, params_json: String) -> String {
        let params = if params_json.trim().is_empty() {
            serde_json::Value::Null
        } else {
            match serde_json::from_str(&params_json) {
                Ok(params) => params,
                Err(e) => {
                    return to_json(&ActionResult {
                        error: Some(ErrorInfo::new(
                            CODE_INVALID_INPUT,
                            format!("{} params are not valid JSON: {}", action, e),
                        )),
                        ..Default::default()
                    })
                }
            }
        };
        to_json(&self.handle_raw_action(&action, params))
    }

    /// Pending `app-state` event as JSON, or `None` when nothing changed.
    pub fn take_changes_json(&self) -> Option<String> {
        self.take_changes().map(|patch| to_json(&patch.to_event()))
    }

    pub fn sync_state_json(&self) -> Option<String> {
        self.sync_state().map(|patch| to_json(&patch.to_event()))
    }
}
