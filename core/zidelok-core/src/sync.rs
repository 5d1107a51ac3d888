//! State synchronizer: incremental `app-state` updates for the renderer.
//!
//! [`StateSync`] holds the current [`AppState`] and the snapshot last sent to
//! the presentation layer. [`StateSync::sync`] emits only the fields that
//! differ between the two.
//!
//! Comparison is shallow. Primitive fields compare by value, the site list by
//! `Arc` identity, so a fresh scan always counts as a change even when its
//! contents match the previous one. Renderers rely on that to re-draw the list.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use zidelok_shell_protocol::{
    StateEvent, FIELD_AUTO_START, FIELD_LOCAL_SITES, FIELD_REMOTE_URL, FIELD_START_FULLSCREEN,
};

use crate::types::SiteEntry;

// ═══════════════════════════════════════════════════════════════════════════════
// Shallow Identity
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity comparison used by [`diff`].
pub trait Identity {
    fn same_as(&self, other: &Self) -> bool;
}

macro_rules! value_identity {
    ($($ty:ty),*) => {
        $(impl Identity for $ty {
            fn same_as(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

value_identity!(bool, i32, i64, u32, u64, String, &str);

impl<T: Identity> Identity for Option<T> {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ?Sized> Identity for Arc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Returns the fields of `current` that are missing from or differ in
/// `previous`, and records them in `previous`.
///
/// Keys present only in `previous` are left alone and not reported.
pub fn diff<K, V>(current: &BTreeMap<K, V>, previous: &mut BTreeMap<K, V>) -> BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Identity + Clone,
{
    let mut changes = BTreeMap::new();
    for (key, value) in current {
        let unchanged = previous.get(key).is_some_and(|old| old.same_as(value));
        if !unchanged {
            previous.insert(key.clone(), value.clone());
            changes.insert(key.clone(), value.clone());
        }
    }
    changes
}

// ═══════════════════════════════════════════════════════════════════════════════
// App State
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateField {
    RemoteUrl,
    AutoStart,
    StartFullscreen,
    LocalSites,
}

impl StateField {
    pub const ALL: [StateField; 4] = [
        StateField::RemoteUrl,
        StateField::AutoStart,
        StateField::StartFullscreen,
        StateField::LocalSites,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            StateField::RemoteUrl => FIELD_REMOTE_URL,
            StateField::AutoStart => FIELD_AUTO_START,
            StateField::StartFullscreen => FIELD_START_FULLSCREEN,
            StateField::LocalSites => FIELD_LOCAL_SITES,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StateValue {
    Text(Option<String>),
    Flag(bool),
    Sites(Arc<Vec<SiteEntry>>),
}

impl Identity for StateValue {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (StateValue::Text(a), StateValue::Text(b)) => a.same_as(b),
            (StateValue::Flag(a), StateValue::Flag(b)) => a.same_as(b),
            (StateValue::Sites(a), StateValue::Sites(b)) => a.same_as(b),
            _ => false,
        }
    }
}

impl StateValue {
    pub fn to_json(&self) -> Value {
        match self {
            StateValue::Text(Some(text)) => Value::String(text.clone()),
            StateValue::Text(None) => Value::Null,
            StateValue::Flag(flag) => Value::Bool(*flag),
            StateValue::Sites(sites) => {
                serde_json::to_value(sites.as_slice()).unwrap_or(Value::Array(Vec::new()))
            }
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct AppState {
    pub remote_url: Option<String>,
    pub auto_start: Option<String>,
    pub start_fullscreen: bool,
    pub local_sites: Arc<Vec<SiteEntry>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            remote_url: None,
            auto_start: None,
            start_fullscreen: true,
            local_sites: Arc::new(Vec::new()),
        }
    }
}

impl AppState {
    pub fn to_fields(&self) -> BTreeMap<StateField, StateValue> {
        StateField::ALL
            .into_iter()
            .map(|field| (field, self.value_of(field)))
            .collect()
    }

    fn value_of(&self, field: StateField) -> StateValue {
        match field {
            StateField::RemoteUrl => StateValue::Text(self.remote_url.clone()),
            StateField::AutoStart => StateValue::Text(self.auto_start.clone()),
            StateField::StartFullscreen => StateValue::Flag(self.start_fullscreen),
            StateField::LocalSites => StateValue::Sites(Arc::clone(&self.local_sites)),
        }
    }
}

/// The changed fields of one sync, numbered in emission order.
#[derive(Debug, Clone)]
pub struct StatePatch {
    pub sequence: u64,
    pub changes: BTreeMap<StateField, StateValue>,
}

impl StatePatch {
    pub fn contains(&self, field: StateField) -> bool {
        self.changes.contains_key(&field)
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.changes
            .iter()
            .map(|(field, value)| (field.wire_name().to_string(), value.to_json()))
            .collect()
    }

    pub fn to_event(&self) -> StateEvent {
        StateEvent::new(self.sequence, self.to_json_map())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Synchronizer
// ═══════════════════════════════════════════════════════════════════════════════

/// Owns the current state and the last-broadcast snapshot.
///
/// State only changes through the setters. Nothing is sent until
/// [`sync`](Self::sync) is called.
#[derive(Debug, Default)]
pub struct StateSync {
    current: AppState,
    previous: BTreeMap<StateField, StateValue>,
    sequence: u64,
}

impl StateSync {
    pub fn new(initial: AppState) -> Self {
        Self {
            current: initial,
            previous: BTreeMap::new(),
            sequence: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.current
    }

    pub fn set_remote_url(&mut self, url: Option<String>) {
        self.current.remote_url = url;
    }

    pub fn set_auto_start(&mut self, name: Option<String>) {
        self.current.auto_start = name;
    }

    pub fn set_start_fullscreen(&mut self, fullscreen: bool) {
        self.current.start_fullscreen = fullscreen;
    }

    pub fn set_local_sites(&mut self, sites: Vec<SiteEntry>) {
        self.current.local_sites = Arc::new(sites);
    }

    /// Diffs current state against the last broadcast.
    ///
    /// Returns `None` when nothing changed; callers skip notifying in that case.
    pub fn sync(&mut self) -> Option<StatePatch> {
        let changes = diff(&self.current.to_fields(), &mut self.previous);
        if changes.is_empty() {
            tracing::debug!("No changes detected");
            return None;
        }

        self.sequence += 1;
        tracing::debug!(count = changes.len(), sequence = self.sequence, "Sent changes");
        Some(StatePatch {
            sequence: self.sequence,
            changes,
        })
    }

    /// Forgets the last broadcast so the next sync sends every field.
    ///
    /// Used when a renderer (re)loads and needs the full state.
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}
