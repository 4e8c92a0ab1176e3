// SPDX-License-Identifier: GPL-3.0-only

//! Centrally administered system disk hiding.

use places_contracts::PolicySource;

pub const DISK_HIDDEN_KEY: &str = "disk.hidden";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemDiskPolicy {
    hidden: Option<Vec<String>>,
}

impl SystemDiskPolicy {
    pub fn load(source: Option<&dyn PolicySource>) -> Self {
        let hidden = source
            .filter(|source| source.contains_key(DISK_HIDDEN_KEY))
            .map(|source| source.string_list(DISK_HIDDEN_KEY));
        Self { hidden }
    }

    pub fn from_hidden(hidden: Option<Vec<String>>) -> Self {
        Self { hidden }
    }

    /// Central policy present; it overrides the user preference.
    pub fn is_active(&self) -> bool {
        self.hidden.is_some()
    }

    pub fn hides(&self, uuid: &str) -> bool {
        self.hidden
            .as_ref()
            .is_some_and(|hidden| hidden.iter().any(|h| h == uuid))
    }

    /// Value the legacy "hide system partitions" preference should mirror,
    /// or `None` without central policy.
    pub fn mirrored_preference(&self, system_uuids: &[String]) -> Option<bool> {
        let hidden = self.hidden.as_ref()?;
        if hidden.is_empty() {
            return Some(false);
        }
        Some(system_uuids.iter().all(|uuid| hidden.contains(uuid)))
    }
}
