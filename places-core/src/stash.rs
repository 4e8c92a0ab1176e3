// SPDX-License-Identifier: GPL-3.0-only

//! Remembered remote connections.

use std::sync::Arc;

use places_contracts::SettingsStore;
use places_types::{
    DeviceEntry, EntryKind, StashedMount, SuffixTag, VirtualMountInfo, make_identifier,
};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::PlacesError;
use crate::identity::EmittedKeys;
use crate::mount_path::is_network_uri;

pub const STASH_GROUP: &str = "RemoteMounts";
pub const STASH_ITEMS: &str = "Items";

#[derive(Clone)]
pub struct StashedRemoteCache {
    settings: Arc<dyn SettingsStore>,
}

impl StashedRemoteCache {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    fn raw_items(&self) -> Vec<Value> {
        match self.settings.value(STASH_GROUP, STASH_ITEMS) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Parseable records, in stored order. Invalid ones are still returned.
    pub fn records(&self) -> Vec<StashedMount> {
        self.raw_items()
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<StashedMount>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping unparseable stashed mount: {e}");
                    None
                }
            })
            .collect()
    }

    /// Remember a network mount that was just added at `path`.
    ///
    /// Returns false when the mount is not a network mount.
    pub fn remember(&self, mount: &VirtualMountInfo, path: &str) -> Result<bool, PlacesError> {
        if path.is_empty() || !is_network_uri(mount.uri()) {
            return Ok(false);
        }
        let Ok(url) = Url::parse(mount.uri()) else {
            warn!(uri = mount.uri(), "cannot stash mount with unparseable uri");
            return Ok(false);
        };

        let share = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .unwrap_or_default()
            .to_string();
        let record = StashedMount {
            key: path.to_string(),
            protocol: url.scheme().to_string(),
            host: url.host_str().unwrap_or_default().to_string(),
            share,
            name: mount.name.clone(),
        };

        let mut items: Vec<Value> = self
            .raw_items()
            .into_iter()
            .filter(|item| item.get("key").and_then(Value::as_str) != Some(path))
            .collect();
        items.push(serde_json::to_value(&record).map_err(|e| PlacesError::Settings {
            path: STASH_GROUP.to_string(),
            message: e.to_string(),
        })?);
        self.settings
            .set_value(STASH_GROUP, STASH_ITEMS, Value::Array(items))?;
        debug!(key = path, "stashed remote mount");
        Ok(true)
    }

    /// Entries for remembered connections that are not mounted right now.
    ///
    /// `mounted` holds the identifiers emitted for live virtual mounts in the
    /// same pass. While smb integration mode is on, another aggregator shows
    /// remembered connections and none are listed here.
    pub fn offline_entries(&self, mounted: &EmittedKeys, smb_integration: bool) -> Vec<DeviceEntry> {
        let mut entries = Vec::new();

        for record in self.records() {
            if record.key.is_empty() {
                continue;
            }
            if mounted.contains(&make_identifier(&record.key, SuffixTag::VirtualMount)) {
                debug!(key = %record.key, "stashed mount is mounted");
                continue;
            }
            if !record.is_valid() {
                warn!(?record, "invalid stashed remote connection");
                continue;
            }
            if smb_integration {
                continue;
            }

            let url = record.remote_url();
            let display_name = [&record.name, &record.share, &record.host]
                .into_iter()
                .find(|name| !name.is_empty())
                .cloned()
                .unwrap_or_default();
            entries.push(DeviceEntry {
                identifier: make_identifier(&url, SuffixTag::StashedRemote),
                kind: EntryKind::StashedRemote {
                    protocol: record.protocol,
                    host: record.host,
                    share: record.share,
                },
                backend_ref: url,
                display_name,
            });
        }

        entries
    }

    pub fn find(&self, remote_url: &str) -> Option<StashedMount> {
        self.records()
            .into_iter()
            .find(|record| record.is_valid() && record.remote_url() == remote_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::JsonSettingsStore;
    use serde_json::json;

    fn cache_with(items: Value) -> StashedRemoteCache {
        let settings = Arc::new(JsonSettingsStore::in_memory());
        settings
            .set_value(STASH_GROUP, STASH_ITEMS, items)
            .expect("seed stash");
        StashedRemoteCache::new(settings)
    }

    #[test]
    fn mounted_and_malformed_records_are_skipped() {
        let cache = cache_with(json!([
            { "key": "/run/user/1000/gvfs/smb-share:server=nas,share=media", "protocol": "smb", "host": "nas", "share": "media" },
            { "key": "/run/user/1000/gvfs/ftp:host=files", "protocol": "ftp", "host": "files" },
            { "key": "/run/user/1000/gvfs/sftp:host=", "protocol": "sftp", "host": "" },
            { "protocol": "smb", "host": "nokey" },
            "garbage"
        ]));
        let mut mounted = EmittedKeys::new();
        mounted.insert(&make_identifier(
            "/run/user/1000/gvfs/smb-share:server=nas,share=media",
            SuffixTag::VirtualMount,
        ));

        let entries = cache.offline_entries(&mounted, false);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].backend_ref, "ftp://files/");
        assert_eq!(entries[0].display_name, "files");
        assert_eq!(
            entries[0].identifier,
            make_identifier("ftp://files/", SuffixTag::StashedRemote)
        );
    }

    #[test]
    fn integration_mode_suppresses_offline_entries() {
        let cache = cache_with(json!([
            { "key": "/run/user/1000/gvfs/smb-share:server=nas,share=media", "protocol": "smb", "host": "nas", "share": "media" }
        ]));
        assert!(cache.offline_entries(&EmittedKeys::new(), true).is_empty());
        assert_eq!(cache.offline_entries(&EmittedKeys::new(), false).len(), 1);
    }

    #[test]
    fn remember_replaces_record_for_same_path() {
        let cache = cache_with(json!([]));
        let mount = VirtualMountInfo {
            name: "media on nas".to_string(),
            root_uri: Some("smb://nas/media/".to_string()),
            ..Default::default()
        };
        let path = "/run/user/1000/gvfs/smb-share:server=nas,share=media";

        assert!(cache.remember(&mount, path).expect("stash"));
        assert!(cache.remember(&mount, path).expect("stash again"));

        let records = cache.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].protocol, "smb");
        assert_eq!(records[0].host, "nas");
        assert_eq!(records[0].share, "media");

        let local = VirtualMountInfo {
            root_uri: Some("mtp://phone/".to_string()),
            ..Default::default()
        };
        assert!(!cache.remember(&local, "/run/user/1000/gvfs/mtp:host=phone").expect("skip"));
    }
}
