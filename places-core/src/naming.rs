// SPDX-License-Identifier: GPL-3.0-only

//! Display names of block devices.

use places_types::{BlockDeviceInfo, bytes_to_pretty};

use crate::disk_info::DiskInfoTable;

pub const SYSTEM_DISK_NAME: &str = "System Disk";

/// Name of a block device before any user alias is applied.
///
/// For an unlocked encrypted shell the cleartext device supplies the label
/// and mount points.
pub fn volume_name(
    device: &BlockDeviceInfo,
    cleartext: Option<&BlockDeviceInfo>,
    disk_info: &DiskInfoTable,
) -> String {
    if let Some(label) = disk_info.label_for(&device.id_uuid) {
        return label;
    }

    let source = match (device.is_encrypted, cleartext) {
        (true, Some(cleartext)) => cleartext,
        (true, None) => {
            return format!("{} Encrypted Volume", bytes_to_pretty(&device.size, false));
        }
        (false, _) => device,
    };

    if !source.label.is_empty() {
        return source.label.clone();
    }
    if source.is_root_mount() {
        return SYSTEM_DISK_NAME.to_string();
    }
    format!("{} Volume", bytes_to_pretty(&device.size, false))
}

pub fn display_name(alias: Option<String>, volume_name: String) -> String {
    alias.filter(|alias| !alias.is_empty()).unwrap_or(volume_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use places_types::DiskInfoEntry;

    fn device() -> BlockDeviceInfo {
        BlockDeviceInfo {
            id_uuid: "u1".to_string(),
            size: 2 * 1024 * 1024 * 1024,
            has_filesystem: true,
            ..Default::default()
        }
    }

    #[test]
    fn falls_back_to_size() {
        let table = DiskInfoTable::new();
        assert_eq!(volume_name(&device(), None, &table), "2.00 GB Volume");
    }

    #[test]
    fn sidecar_label_beats_filesystem_label() {
        let table = DiskInfoTable::new();
        table.insert(DiskInfoEntry {
            uuid: "u1".to_string(),
            driver: String::new(),
            label: "From Sidecar".to_string(),
        });
        let labelled = BlockDeviceInfo {
            label: "FS".to_string(),
            ..device()
        };
        assert_eq!(volume_name(&labelled, None, &table), "From Sidecar");
    }

    #[test]
    fn root_mount_is_system_disk() {
        let root = BlockDeviceInfo {
            mount_points: vec!["/".to_string()],
            ..device()
        };
        assert_eq!(volume_name(&root, None, &DiskInfoTable::new()), SYSTEM_DISK_NAME);
    }

    #[test]
    fn encrypted_uses_cleartext_label() {
        let shell = BlockDeviceInfo {
            is_encrypted: true,
            has_filesystem: false,
            ..device()
        };
        let cleartext = BlockDeviceInfo {
            label: "Secret".to_string(),
            ..Default::default()
        };
        let table = DiskInfoTable::new();
        assert_eq!(volume_name(&shell, Some(&cleartext), &table), "Secret");
        assert_eq!(volume_name(&shell, None, &table), "2.00 GB Encrypted Volume");
    }

    #[test]
    fn alias_overrides_volume_name() {
        assert_eq!(display_name(Some("Games".into()), "Data".into()), "Games");
        assert_eq!(display_name(Some(String::new()), "Data".into()), "Data");
        assert_eq!(display_name(None, "Data".into()), "Data");
    }
}
