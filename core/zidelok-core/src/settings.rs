//! Persistent shell settings (`settings.json`).
//!
//! A flat JSON object. Recognized keys are `remoteURL`, `startFS` and
//! `autoStart`. Any other key is carried through load/save untouched so that
//! older or newer shells can share the file.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::{Result, SiteError};

const DEFAULT_SETTINGS: &str = include_str!("../default_settings.json");

/// Key used by early shells for the remote catalogue URL.
const LEGACY_REMOTE_URL_KEY: &str = "startURL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(
        rename = "remoteURL",
        default,
        deserialize_with = "empty_as_none",
        serialize_with = "none_as_empty"
    )]
    pub remote_url: Option<String>,

    #[serde(
        rename = "startFS",
        default = "default_start_fullscreen",
        deserialize_with = "flag_or_default"
    )]
    pub start_fullscreen: bool,

    /// Site launched at startup.
    #[serde(
        rename = "autoStart",
        default,
        deserialize_with = "empty_as_none",
        serialize_with = "none_as_empty"
    )]
    pub auto_start: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_url: None,
            start_fullscreen: default_start_fullscreen(),
            auto_start: None,
            extra: Map::new(),
        }
    }
}

fn default_start_fullscreen() -> bool {
    true
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Early shells could write the remote URL into `startFS`, so anything other
/// than a boolean reads as the default.
fn flag_or_default<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        other => {
            tracing::warn!(value = %other, "Ignoring non-boolean startFS setting");
            Ok(default_start_fullscreen())
        }
    }
}

fn none_as_empty<S>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

impl Settings {
    /// Settings shipped with the application.
    pub fn bundled() -> Self {
        serde_json::from_str(DEFAULT_SETTINGS).unwrap_or_default()
    }

    fn parse(content: &str) -> serde_json::Result<Self> {
        let mut settings: Settings = serde_json::from_str(content)?;
        settings.migrate_legacy_keys();
        Ok(settings)
    }

    fn migrate_legacy_keys(&mut self) {
        let Some(legacy) = self.extra.remove(LEGACY_REMOTE_URL_KEY) else {
            return;
        };
        if self.remote_url.is_none() {
            self.remote_url = legacy
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
    }
}

/// Settings bound to their file.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Loads settings from `path`.
    ///
    /// A missing file is created from the bundled defaults. An empty file
    /// yields the defaults without being rewritten.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            let store = Self {
                path,
                settings: Settings::bundled(),
            };
            store.save()?;
            tracing::info!(path = %store.path.display(), "Initialized settings from defaults");
            return Ok(store);
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| SiteError::io(format!("reading {}", path.display()), e))?;

        let settings = if content.trim().is_empty() {
            Settings::bundled()
        } else {
            Settings::parse(&content).map_err(|e| SiteError::SettingsMalformed {
                path: path.clone(),
                details: e.to_string(),
            })?
        };

        Ok(Self { path, settings })
    }

    /// Like [`load`](Self::load), but a malformed file yields the bundled
    /// defaults. The file itself is left alone until the next save.
    pub fn load_or_bundled(path: impl Into<PathBuf>) -> Result<Self> {
        match Self::load(path) {
            Err(SiteError::SettingsMalformed { path, details }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %details,
                    "Settings file malformed; using defaults"
                );
                Ok(Self {
                    path,
                    settings: Settings::bundled(),
                })
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Applies `change` to a copy of the settings and keeps it only once the
    /// copy has been written.
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) -> Result<&Settings> {
        let mut next = self.settings.clone();
        change(&mut next);
        write_settings(&self.path, &next)?;
        self.settings = next;
        Ok(&self.settings)
    }

    pub fn save(&self) -> Result<()> {
        write_settings(&self.path, &self.settings)
    }
}

/// Writes `settings` to `path` atomically using temp file + rename.
fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings).map_err(|e| SiteError::Json {
        context: "serializing settings".to_string(),
        source: e,
    })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| SiteError::io(format!("creating {}", dir.display()), e))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| SiteError::io(format!("creating temp file in {}", dir.display()), e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| SiteError::io(format!("writing temp file for {}", path.display()), e))?;
    tmp.flush()
        .map_err(|e| SiteError::io(format!("flushing temp file for {}", path.display()), e))?;
    tmp.persist(path).map_err(|e| {
        SiteError::io(format!("persisting temp file to {}", path.display()), e.error)
    })?;

    Ok(())
}
