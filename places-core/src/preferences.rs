// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use places_contracts::SettingsStore;
use serde_json::Value;

use crate::PlacesError;

pub const GENERIC_GROUP: &str = "GenericAttribute";
pub const HIDE_LOOP_PARTITIONS: &str = "HideLoopPartitions";
pub const HIDDEN_SYSTEM_PARTITION: &str = "HiddenSystemPartition";
pub const ALWAYS_SHOW_OFFLINE_REMOTES: &str = "AlwaysShowOfflineRemoteConnections";

/// Boolean user preferences stored in the generic attribute group.
#[derive(Clone)]
pub struct Preferences {
    settings: Arc<dyn SettingsStore>,
}

impl Preferences {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    pub fn hide_loop_partitions(&self) -> bool {
        self.settings.bool_value(GENERIC_GROUP, HIDE_LOOP_PARTITIONS)
    }

    pub fn hide_system_partitions(&self) -> bool {
        self.settings.bool_value(GENERIC_GROUP, HIDDEN_SYSTEM_PARTITION)
    }

    pub fn set_hide_system_partitions(&self, hide: bool) -> Result<(), PlacesError> {
        self.settings
            .set_value(GENERIC_GROUP, HIDDEN_SYSTEM_PARTITION, Value::Bool(hide))?;
        Ok(())
    }

    pub fn always_show_offline_remotes(&self) -> bool {
        self.settings
            .bool_value(GENERIC_GROUP, ALWAYS_SHOW_OFFLINE_REMOTES)
    }
}
