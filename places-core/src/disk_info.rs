// SPDX-License-Identifier: GPL-3.0-only

//! Sidecar disk-info labels.
//!
//! Some media carry a `UOSICON/diskinfo.json` file at their mount root that
//! names the volumes on them. The table is shared between listing passes and
//! consulted when resolving display names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use places_types::{DiskInfoDocument, DiskInfoEntry};
use tracing::{debug, warn};

pub const SIDECAR_DIR: &str = "UOSICON";
pub const SIDECAR_FILE: &str = "diskinfo.json";

#[derive(Debug, Default)]
pub struct DiskInfoTable {
    entries: Mutex<HashMap<String, DiskInfoEntry>>,
}

impl DiskInfoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the sidecar found under `mount_point`, if there is one.
    ///
    /// A missing directory, unreadable file or malformed document leaves the
    /// table untouched.
    pub fn reload_from_mount(&self, mount_point: &str) {
        let dir = Path::new(mount_point).join(SIDECAR_DIR);
        if !dir.is_dir() {
            return;
        }

        let file = dir.join(SIDECAR_FILE);
        let contents = match fs::read_to_string(&file) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("no readable disk info at {}: {e}", file.display());
                return;
            }
        };

        match serde_json::from_str::<DiskInfoDocument>(&contents) {
            Ok(document) => self.merge(&document),
            Err(e) => warn!("ignoring malformed disk info {}: {e}", file.display()),
        }
    }

    pub fn merge(&self, document: &DiskInfoDocument) {
        let mut entries = self.lock();
        for entry in document.entries() {
            entries.insert(entry.uuid.clone(), entry);
        }
    }

    pub fn insert(&self, entry: DiskInfoEntry) {
        self.lock().insert(entry.uuid.clone(), entry);
    }

    pub fn get(&self, uuid: &str) -> Option<DiskInfoEntry> {
        self.lock().get(uuid).cloned()
    }

    /// Non-empty sidecar label for `uuid`.
    pub fn label_for(&self, uuid: &str) -> Option<String> {
        if uuid.is_empty() {
            return None;
        }
        self.get(uuid)
            .map(|entry| entry.label)
            .filter(|label| !label.is_empty())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DiskInfoEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_sidecar(root: &Path, contents: &str) {
        let dir = root.join(SIDECAR_DIR);
        fs::create_dir_all(&dir).expect("create sidecar dir");
        fs::write(dir.join(SIDECAR_FILE), contents).expect("write sidecar");
    }

    #[test]
    fn sidecar_entries_overwrite_by_uuid() {
        let mount = tempfile::tempdir().expect("tempdir");
        let table = DiskInfoTable::new();
        table.insert(DiskInfoEntry {
            uuid: "1234".to_string(),
            driver: "sda".to_string(),
            label: "Old".to_string(),
        });

        write_sidecar(
            mount.path(),
            r#"{"DISKINFO": [{"uuid": "1234", "label": "Backup"}, {"uuid": "5678", "drive": "sdb"}]}"#,
        );
        table.reload_from_mount(&mount.path().to_string_lossy());

        assert_eq!(table.label_for("1234").as_deref(), Some("Backup"));
        assert_eq!(table.get("1234").map(|e| e.driver), Some(String::new()));
        assert_eq!(table.label_for("5678"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn malformed_or_missing_sidecar_is_ignored() {
        let mount = tempfile::tempdir().expect("tempdir");
        let table = DiskInfoTable::new();

        table.reload_from_mount(&mount.path().to_string_lossy());
        assert!(table.is_empty());

        write_sidecar(mount.path(), "{not json");
        table.reload_from_mount(&mount.path().to_string_lossy());
        assert!(table.is_empty());

        write_sidecar(mount.path(), r#"{"OTHER": []}"#);
        table.reload_from_mount(&mount.path().to_string_lossy());
        assert!(table.is_empty());
    }
}
