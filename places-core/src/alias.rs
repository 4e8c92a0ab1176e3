// SPDX-License-Identifier: GPL-3.0-only

//! User display-name overrides for block devices.

use std::sync::Arc;

use places_contracts::SettingsStore;
use places_types::AliasRecord;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::PlacesError;

pub const ALIAS_GROUP: &str = "LocalDiskAlias";
pub const ALIAS_ITEMS: &str = "Items";

/// What `AliasStore::set_alias` did to the stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasChange {
    Added,
    Updated,
    Removed,
    Unchanged,
}

impl AliasChange {
    pub fn is_mutation(self) -> bool {
        self != Self::Unchanged
    }
}

/// Alias list stored as a single ordered settings value.
///
/// Records are edited in place in the raw list so entries this store does not
/// understand are written back untouched.
#[derive(Clone)]
pub struct AliasStore {
    settings: Arc<dyn SettingsStore>,
}

impl AliasStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    fn raw_items(&self) -> Vec<Value> {
        match self.settings.value(ALIAS_GROUP, ALIAS_ITEMS) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                warn!("alias list is not an array, ignoring: {other}");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    pub fn records(&self) -> Vec<AliasRecord> {
        self.raw_items()
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping malformed alias record: {e}");
                    None
                }
            })
            .collect()
    }

    pub fn alias_for(&self, uuid: &str) -> Option<String> {
        if uuid.is_empty() {
            return None;
        }
        self.records()
            .into_iter()
            .find(|record| record.uuid == uuid)
            .map(|record| record.alias)
            .filter(|alias| !alias.is_empty())
    }

    /// Set, replace or clear the alias for `uuid`.
    ///
    /// A blank alias removes the record; a blank alias without a record is a
    /// successful no-op. The list is persisted only when it changed.
    pub fn set_alias(
        &self,
        uuid: &str,
        current_name: &str,
        alias: &str,
    ) -> Result<AliasChange, PlacesError> {
        if uuid.is_empty() {
            return Err(PlacesError::MissingUuid(current_name.to_string()));
        }

        let alias = alias.trim();
        let mut items = self.raw_items();
        let position = items
            .iter()
            .position(|item| item.get("uuid").and_then(Value::as_str) == Some(uuid));

        let change = match (position, alias.is_empty()) {
            (Some(index), true) => {
                items.remove(index);
                AliasChange::Removed
            }
            (Some(index), false) => {
                items[index] = json!({ "uuid": uuid, "name": current_name, "alias": alias });
                AliasChange::Updated
            }
            (None, false) => {
                info!(uuid, alias, "adding disk alias");
                items.push(json!({ "uuid": uuid, "name": current_name, "alias": alias }));
                AliasChange::Added
            }
            (None, true) => AliasChange::Unchanged,
        };

        if change.is_mutation() {
            self.settings
                .set_value(ALIAS_GROUP, ALIAS_ITEMS, Value::Array(items))?;
        }

        Ok(change)
    }
}
