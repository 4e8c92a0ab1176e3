// SPDX-License-Identifier: GPL-3.0-only

use serde_json::Value;

use crate::ProviderError;

/// Generic grouped key-value settings.
pub trait SettingsStore: Send + Sync {
    fn value(&self, group: &str, key: &str) -> Option<Value>;

    fn set_value(&self, group: &str, key: &str, value: Value) -> Result<(), ProviderError>;

    fn bool_value(&self, group: &str, key: &str) -> bool {
        self.value(group, key)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

/// Centrally administered policy.
pub trait PolicySource: Send + Sync {
    fn contains_key(&self, key: &str) -> bool;

    fn string_list(&self, key: &str) -> Vec<String>;
}
