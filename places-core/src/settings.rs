// SPDX-License-Identifier: GPL-3.0-only

//! File-backed settings store and policy source.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use places_contracts::{PolicySource, ProviderError, ProviderErrorKind, SettingsStore};
use serde_json::{Map, Value};
use tracing::warn;

use crate::PlacesError;

/// Settings kept as `{group: {key: value}}` in one JSON file.
///
/// Every `set_value` rewrites the whole file synchronously.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: Option<PathBuf>,
    groups: Mutex<Map<String, Value>>,
}

impl JsonSettingsStore {
    /// Load `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PlacesError> {
        let path = path.into();
        let groups = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(groups)) => groups,
                Ok(_) => return Err(settings_error(&path, "top level is not an object")),
                Err(e) => return Err(settings_error(&path, e.to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(settings_error(&path, e.to_string())),
        };

        Ok(Self {
            path: Some(path),
            groups: Mutex::new(groups),
        })
    }

    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            groups: Mutex::new(Map::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, groups: &Map<String, Value>) -> Result<(), ProviderError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
        let contents = serde_json::to_string_pretty(groups)
            .map_err(|e| ProviderError::internal(e.to_string()))?;
        fs::write(path, contents).map_err(|e| io_error(path, e))
    }
}

impl SettingsStore for JsonSettingsStore {
    fn value(&self, group: &str, key: &str) -> Option<Value> {
        let groups = self
            .groups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        groups.get(group)?.get(key).cloned()
    }

    fn set_value(&self, group: &str, key: &str, value: Value) -> Result<(), ProviderError> {
        let mut groups = self
            .groups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut updated = groups.clone();
        let entry = updated
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            warn!(group, "replacing non-object settings group");
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(keys) = entry {
            keys.insert(key.to_string(), value);
        }
        self.persist(&updated)?;
        *groups = updated;
        Ok(())
    }
}

/// Central policy read from a JSON object file.
#[derive(Debug, Clone, Default)]
pub struct FilePolicySource {
    values: Map<String, Value>,
}

impl FilePolicySource {
    pub fn load(path: &Path) -> Result<Self, PlacesError> {
        let contents = fs::read_to_string(path).map_err(|e| settings_error(path, e.to_string()))?;
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(values)) => Ok(Self { values }),
            Ok(_) => Err(settings_error(path, "top level is not an object")),
            Err(e) => Err(settings_error(path, e.to_string())),
        }
    }

    pub fn from_values(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl PolicySource for FilePolicySource {
    fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn settings_error(path: &Path, message: impl Into<String>) -> PlacesError {
    PlacesError::Settings {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ProviderError {
    let kind = match e.kind() {
        std::io::ErrorKind::PermissionDenied => ProviderErrorKind::PermissionDenied,
        std::io::ErrorKind::NotFound => ProviderErrorKind::NotFound,
        _ => ProviderErrorKind::Internal,
    };
    ProviderError::new(kind, format!("{}: {e}", path.display()))
}
