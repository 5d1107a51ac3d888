//! Subcommand execution. Every command yields one JSON value.

use serde::Serialize;
use serde_json::{json, Value};
use zidelok_core::{list_sites, ActionResult, ShellEngine, UiAction};
use zidelok_shell_protocol::{ErrorInfo, CODE_INVALID_INPUT};

use crate::Commands;

pub struct Output {
    pub value: Value,
    pub ok: bool,
}

impl Output {
    fn ok(value: Value) -> Self {
        Self { value, ok: true }
    }

    fn failed(info: &ErrorInfo) -> Self {
        Self {
            value: error_value(info),
            ok: false,
        }
    }

    fn from_action(result: ActionResult) -> Self {
        let ok = result.is_ok();
        Self {
            value: to_value(&result),
            ok,
        }
    }
}

pub fn error_value(info: &ErrorInfo) -> Value {
    json!({ "error": info })
}

pub fn print(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => tracing::error!(error = %err, "Failed to render output"),
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error_value(&ErrorInfo::new(
            CODE_INVALID_INPUT,
            format!("serialization failed: {}", e),
        ))
    })
}

pub fn run(engine: &ShellEngine, command: Commands) -> Output {
    match command {
        Commands::List => match list_sites(&engine.storage().sites_dir()) {
            Ok(sites) => Output::ok(to_value(&sites)),
            Err(err) => Output::failed(&err.to_error_info()),
        },
        Commands::Import { files } => Output::from_action(engine.handle_action(
            UiAction::ImportSites {
                files: files
                    .iter()
                    .map(|f| f.to_string_lossy().to_string())
                    .collect(),
            },
        )),
        Commands::Extract { name } => {
            Output::from_action(engine.handle_action(UiAction::ExtractSite { name }))
        }
        Commands::Launch { name } => {
            Output::from_action(engine.handle_action(UiAction::LaunchSite { name }))
        }
        Commands::Delete { name } => {
            Output::from_action(engine.handle_action(UiAction::DeleteSite { name }))
        }
        Commands::Autostart { set, clear } => autostart(engine, set, clear),
        Commands::Settings { url, fullscreen } => settings(engine, url, fullscreen),
        Commands::Remote => Output::from_action(engine.handle_action(UiAction::LoadRemote)),
        Commands::Action { name, params } => {
            let params = match params.as_deref().map(str::trim) {
                None | Some("") => Value::Null,
                Some(raw) => match serde_json::from_str(raw) {
                    Ok(value) => value,
                    Err(err) => {
                        return Output::failed(&ErrorInfo::new(
                            CODE_INVALID_INPUT,
                            format!("params are not valid JSON: {}", err),
                        ))
                    }
                },
            };
            Output::from_action(engine.handle_raw_action(&name, params))
        }
        Commands::State => match engine.sync_state() {
            Some(patch) => Output::ok(to_value(&patch.to_event())),
            None => Output::ok(Value::Null),
        },
    }
}

fn autostart(engine: &ShellEngine, set: Option<String>, clear: bool) -> Output {
    if clear || set.is_some() {
        return Output::from_action(engine.handle_action(UiAction::SetAutoStart { name: set }));
    }

    let configured = engine.state_snapshot().auto_start;
    let launched = engine.autostart();
    Output::ok(json!({
        "autoStart": configured,
        "launched": launched,
    }))
}

fn settings(engine: &ShellEngine, url: Option<String>, fullscreen: Option<bool>) -> Output {
    let current = engine.state_snapshot();

    if url.is_none() && fullscreen.is_none() {
        return Output::ok(json!({
            "remoteURL": current.remote_url,
            "startFS": current.start_fullscreen,
            "autoStart": current.auto_start,
        }));
    }

    let action = UiAction::ApplySettings {
        url: url.or(current.remote_url).unwrap_or_default(),
        start_fullscreen: fullscreen.unwrap_or(current.start_fullscreen),
    };
    Output::from_action(engine.handle_action(action))
}
