//! Message types exchanged between zidelok-core and its shells.
//!
//! This crate is shared by the core and every presentation layer (native GUI,
//! CLI) to prevent schema drift. The core remains the authority on validation,
//! but shells can reuse the same types to construct valid actions.
//!
//! Three message families cross the boundary:
//!
//! - **UI actions** (shell → core): a name plus a params object, e.g.
//!   `launchSite` with `{ "name": "site" }` or `importSites` with `{ "files": [...] }`.
//! - **Main actions** (core → shell): instructions such as switching the shell
//!   into settings mode or showing a launched site.
//! - **State events** (core → shell): partial `app-state` updates carrying only
//!   the fields that changed since the last broadcast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROTOCOL_VERSION: u32 = 1;

// App-state field names as seen by the renderer.
pub const FIELD_REMOTE_URL: &str = "remoteURL";
pub const FIELD_AUTO_START: &str = "autoStart";
pub const FIELD_START_FULLSCREEN: &str = "startFS";
pub const FIELD_LOCAL_SITES: &str = "localSites";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_EXTRACTION_FAILED: &str = "extraction_failed";
pub const CODE_IO_FAILURE: &str = "io_failure";
pub const CODE_INVALID_INPUT: &str = "invalid_input";
pub const CODE_SETTINGS_ERROR: &str = "settings_error";
pub const CODE_TASK_FAILED: &str = "task_failed";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// UI Actions (shell → core)
// ═══════════════════════════════════════════════════════════════════════════════

/// A validated action requested by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    LoadRemote,
    RefreshSites,
    LaunchSite { name: String },
    ExtractSite { name: String },
    DeleteSite { name: String },
    ImportSites { files: Vec<String> },
    ApplySettings { url: String, start_fullscreen: bool },
    SetAutoStart { name: Option<String> },
}

impl UiAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            UiAction::LoadRemote => "loadRemote",
            UiAction::RefreshSites => "refreshSites",
            UiAction::LaunchSite { .. } => "launchSite",
            UiAction::ExtractSite { .. } => "extractSite",
            UiAction::DeleteSite { .. } => "deleteSite",
            UiAction::ImportSites { .. } => "importSites",
            UiAction::ApplySettings { .. } => "applySettings",
            UiAction::SetAutoStart { .. } => "setAutoStart",
        }
    }
}

/// Raw action envelope as sent over the shell's message channel.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UiRequest {
    pub action: String,
    #[serde(default)]
    pub params: Value,
}

impl UiRequest {
    pub fn into_action(self) -> Result<UiAction, ErrorInfo> {
        parse_ui_action(&self.action, self.params)
    }
}

#[derive(Debug, Deserialize)]
struct NameParams {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilesParams {
    files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SettingsParams {
    #[serde(default)]
    url: String,
    #[serde(rename = "startFS", default)]
    start_fullscreen: bool,
}

#[derive(Debug, Deserialize)]
struct AutoStartParams {
    #[serde(default)]
    name: Option<String>,
}

/// Parses and validates a UI action from its name and params object.
///
/// `params` may be `null` for actions that take none.
pub fn parse_ui_action(action: &str, params: Value) -> Result<UiAction, ErrorInfo> {
    let params = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params
    };

    match action {
        "loadRemote" => Ok(UiAction::LoadRemote),
        "refreshSites" => Ok(UiAction::RefreshSites),
        "launchSite" => Ok(UiAction::LaunchSite {
            name: require_name(params, action)?,
        }),
        "extractSite" => Ok(UiAction::ExtractSite {
            name: require_name(params, action)?,
        }),
        "deleteSite" => Ok(UiAction::DeleteSite {
            name: require_name(params, action)?,
        }),
        "importSites" => {
            let parsed: FilesParams = from_params(params, action)?;
            let files: Vec<String> = parsed
                .files
                .unwrap_or_default()
                .into_iter()
                .filter(|f| !f.trim().is_empty())
                .collect();
            if files.is_empty() {
                return Err(ErrorInfo::new(
                    CODE_INVALID_INPUT,
                    "importSites requires a non-empty files list",
                ));
            }
            Ok(UiAction::ImportSites { files })
        }
        "applySettings" => {
            let parsed: SettingsParams = from_params(params, action)?;
            Ok(UiAction::ApplySettings {
                url: parsed.url,
                start_fullscreen: parsed.start_fullscreen,
            })
        }
        "setAutoStart" => {
            let parsed: AutoStartParams = from_params(params, action)?;
            let name = parsed.name.filter(|n| !n.trim().is_empty());
            Ok(UiAction::SetAutoStart { name })
        }
        other => Err(ErrorInfo::new(
            CODE_INVALID_INPUT,
            format!("Undefined action: {}", other),
        )),
    }
}

fn from_params<T: serde::de::DeserializeOwned>(params: Value, action: &str) -> Result<T, ErrorInfo> {
    serde_json::from_value(params).map_err(|err| {
        ErrorInfo::new(
            CODE_INVALID_INPUT,
            format!("{} params are invalid: {}", action, err),
        )
    })
}

fn require_name(params: Value, action: &str) -> Result<String, ErrorInfo> {
    let parsed: NameParams = from_params(params, action)?;
    match parsed.name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(ErrorInfo::new(
            CODE_INVALID_INPUT,
            format!("{} requires a site name", action),
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Actions (core → shell)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Home,
    Settings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "action", content = "params", rename_all = "camelCase")]
pub enum MainAction {
    SetMode {
        mode: Mode,
    },
    OpenRemote {
        url: String,
    },
    ShowSite {
        name: String,
        #[serde(rename = "entryPoint")]
        entry_point: String,
        fullscreen: bool,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// State Events (core → shell)
// ═══════════════════════════════════════════════════════════════════════════════

/// Partial app-state update. `changes` only holds fields that changed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateEvent {
    pub protocol_version: u32,
    pub sequence: u64,
    pub emitted_at: String,
    pub changes: Map<String, Value>,
}

impl StateEvent {
    pub fn new(sequence: u64, changes: Map<String, Value>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            sequence,
            emitted_at: Utc::now().to_rfc3339(),
            changes,
        }
    }

    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ErrorInfo::new(
                CODE_INVALID_INPUT,
                format!(
                    "unsupported protocol version {} (expected {})",
                    self.protocol_version, PROTOCOL_VERSION
                ),
            ));
        }
        if DateTime::parse_from_rfc3339(&self.emitted_at).is_err() {
            return Err(ErrorInfo::new(
                CODE_INVALID_INPUT,
                "emitted_at must be RFC3339",
            ));
        }
        if self.changes.is_empty() {
            return Err(ErrorInfo::new(
                CODE_INVALID_INPUT,
                "state events must carry at least one change",
            ));
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.changes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_launch_site() {
        let action = parse_ui_action("launchSite", json!({ "name": "demo" })).unwrap();
        assert_eq!(
            action,
            UiAction::LaunchSite {
                name: "demo".to_string()
            }
        );
        assert_eq!(action.name(), "launchSite");
    }

    #[test]
    fn launch_requires_name() {
        let err = parse_ui_action("launchSite", json!({})).unwrap_err();
        assert_eq!(err.code, CODE_INVALID_INPUT);

        let err = parse_ui_action("deleteSite", json!({ "name": "  " })).unwrap_err();
        assert_eq!(err.code, CODE_INVALID_INPUT);
    }

    #[test]
    fn parses_import_sites_and_drops_blank_entries() {
        let action =
            parse_ui_action("importSites", json!({ "files": ["/tmp/a.zip", ""] })).unwrap();
        assert_eq!(
            action,
            UiAction::ImportSites {
                files: vec!["/tmp/a.zip".to_string()]
            }
        );
    }

    #[test]
    fn import_requires_files() {
        assert!(parse_ui_action("importSites", json!({ "files": [] })).is_err());
        assert!(parse_ui_action("importSites", Value::Null).is_err());
    }

    #[test]
    fn parses_apply_settings_with_wire_names() {
        let action = parse_ui_action(
            "applySettings",
            json!({ "url": "example.com", "startFS": true }),
        )
        .unwrap();
        assert_eq!(
            action,
            UiAction::ApplySettings {
                url: "example.com".to_string(),
                start_fullscreen: true
            }
        );
    }

    #[test]
    fn blank_auto_start_clears() {
        let action = parse_ui_action("setAutoStart", json!({ "name": "" })).unwrap();
        assert_eq!(action, UiAction::SetAutoStart { name: None });
    }

    #[test]
    fn null_params_accepted_for_parameterless_actions() {
        assert_eq!(
            parse_ui_action("loadRemote", Value::Null).unwrap(),
            UiAction::LoadRemote
        );
    }

    #[test]
    fn rejects_unknown_action() {
        let err = parse_ui_action("formatDisk", Value::Null).unwrap_err();
        assert!(err.message.contains("formatDisk"));
    }

    #[test]
    fn request_envelope_without_params() {
        let request: UiRequest = serde_json::from_str(r#"{"action":"refreshSites"}"#).unwrap();
        assert_eq!(request.into_action().unwrap(), UiAction::RefreshSites);
    }

    #[test]
    fn main_action_wire_shape() {
        let action = MainAction::ShowSite {
            name: "demo".to_string(),
            entry_point: "/sites/demo/index.html".to_string(),
            fullscreen: false,
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["action"], "showSite");
        assert_eq!(value["params"]["entryPoint"], "/sites/demo/index.html");

        let mode = serde_json::to_value(MainAction::SetMode {
            mode: Mode::Settings,
        })
        .unwrap();
        assert_eq!(mode, json!({ "action": "setMode", "params": { "mode": "settings" } }));
    }

    #[test]
    fn state_event_validation() {
        let mut changes = Map::new();
        changes.insert(FIELD_START_FULLSCREEN.to_string(), json!(true));
        let event = StateEvent::new(1, changes);
        assert!(event.validate().is_ok());
        assert_eq!(event.field(FIELD_START_FULLSCREEN), Some(&json!(true)));

        let empty = StateEvent::new(2, Map::new());
        assert!(empty.validate().is_err());

        let mut stale = event.clone();
        stale.emitted_at = "yesterday".to_string();
        assert!(stale.validate().is_err());
    }
}
