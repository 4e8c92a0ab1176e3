// SPDX-License-Identifier: GPL-3.0-only

//! Block device visibility.

use places_types::{BlockDeviceInfo, DriveInfo};
use tracing::debug;

/// Decide whether a block device stays out of the listing.
///
/// Rules are evaluated in order and the first match wins. Optical drives and
/// encrypted shells short-circuit before the structural checks because they
/// would otherwise match several of them.
pub fn should_hide(device: &BlockDeviceInfo, drive: &DriveInfo, hide_loop: bool) -> bool {
    let path = device.path.as_str();

    if device.hint_ignore {
        debug!(path, "hidden by ignore hint");
        return true;
    }

    if drive.supports_optical() {
        return false;
    }

    if device.is_encrypted {
        return false;
    }

    if device.is_extended_partition() {
        debug!(path, partition_type = ?device.partition_type, "hidden extended partition");
        return true;
    }

    if device.has_filesystem {
        if device.is_loop {
            debug!(path, hide_loop, "loop device visibility follows preference");
            return hide_loop;
        }

        if device.is_cleartext() {
            debug!(path, "cleartext device represented by its encrypted shell");
            return true;
        }
    } else {
        if device.has_partition_table {
            debug!(path, "hidden partition table container");
            return true;
        }

        if !drive.removable {
            debug!(path, "hidden internal device without filesystem");
            return true;
        }

        if device.size < 1024 {
            debug!(path, size = device.size, "hidden degenerate partition");
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_device() -> BlockDeviceInfo {
        BlockDeviceInfo {
            path: "/org/freedesktop/UDisks2/block_devices/sdb1".to_string(),
            device: "/dev/sdb1".to_string(),
            has_filesystem: true,
            size: 4 * 1024 * 1024 * 1024,
            ..Default::default()
        }
    }

    fn optical_drive() -> DriveInfo {
        DriveInfo {
            media_compatibility: vec!["optical_cd".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn ignore_hint_wins_over_everything() {
        let variants = [
            BlockDeviceInfo {
                hint_ignore: true,
                ..fs_device()
            },
            BlockDeviceInfo {
                hint_ignore: true,
                is_encrypted: true,
                ..fs_device()
            },
            BlockDeviceInfo {
                hint_ignore: true,
                has_filesystem: false,
                ..fs_device()
            },
        ];
        let drives = [
            DriveInfo::default(),
            optical_drive(),
            DriveInfo {
                removable: true,
                ..Default::default()
            },
        ];

        for device in &variants {
            for drive in &drives {
                assert!(should_hide(device, drive, false));
            }
        }
    }

    #[test]
    fn optical_drive_is_shown_even_for_extended_partitions() {
        let device = BlockDeviceInfo {
            has_filesystem: false,
            has_partition_table: true,
            partition_type: Some("0x05".to_string()),
            size: 0,
            ..fs_device()
        };
        assert!(!should_hide(&device, &optical_drive(), true));
        assert!(should_hide(&device, &DriveInfo::default(), true));
    }

    #[test]
    fn encrypted_shell_is_always_shown() {
        let device = BlockDeviceInfo {
            is_encrypted: true,
            has_filesystem: false,
            has_partition_table: true,
            ..fs_device()
        };
        assert!(!should_hide(&device, &DriveInfo::default(), false));
    }

    #[test]
    fn loop_devices_follow_preference() {
        let device = BlockDeviceInfo {
            is_loop: true,
            ..fs_device()
        };
        assert!(should_hide(&device, &DriveInfo::default(), true));
        assert!(!should_hide(&device, &DriveInfo::default(), false));
    }

    #[test]
    fn cleartext_device_is_hidden() {
        let device = BlockDeviceInfo {
            crypto_backing_device: Some("/org/freedesktop/UDisks2/block_devices/sda3".to_string()),
            ..fs_device()
        };
        assert!(should_hide(&device, &DriveInfo::default(), false));
    }

    #[test]
    fn bare_devices_depend_on_drive_and_size() {
        let device = BlockDeviceInfo {
            has_filesystem: false,
            has_partition_table: false,
            size: 2048,
            ..fs_device()
        };
        let fixed = DriveInfo::default();
        let removable = DriveInfo {
            removable: true,
            ..Default::default()
        };

        assert!(should_hide(&device, &fixed, false));
        assert!(!should_hide(&device, &removable, false));

        let tiny = BlockDeviceInfo {
            size: 512,
            ..device.clone()
        };
        assert!(should_hide(&tiny, &removable, false));

        let container = BlockDeviceInfo {
            has_partition_table: true,
            ..device
        };
        assert!(should_hide(&container, &removable, false));
    }

    #[test]
    fn plain_filesystem_is_shown() {
        assert!(!should_hide(&fs_device(), &DriveInfo::default(), true));
    }
}
