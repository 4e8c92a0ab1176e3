// SPDX-License-Identifier: GPL-3.0-only

//! Backend lookups shared by the registry and the watcher.

use places_contracts::BlockDeviceProvider;
use places_types::{BlockDeviceInfo, DriveInfo, VirtualMountInfo};
use tracing::{debug, warn};

use crate::listener::DeviceListener;

/// Backends report "/" for an unset object path.
fn object_path(path: &str) -> Option<&str> {
    (path.len() > 1).then_some(path)
}

/// Drive owning `device`; loop devices and other driveless objects get a
/// default (fixed, non-optical) drive.
pub(crate) async fn drive_for(
    block: &dyn BlockDeviceProvider,
    device: &BlockDeviceInfo,
) -> DriveInfo {
    let Some(drive_id) = object_path(&device.drive_id) else {
        return DriveInfo::default();
    };
    match block.drive(drive_id).await {
        Ok(drive) => drive,
        Err(e) => {
            warn!(drive = drive_id, "failed to read drive: {e}");
            DriveInfo::default()
        }
    }
}

/// Unlocked cleartext counterpart of an encrypted shell.
pub(crate) async fn cleartext_for(
    block: &dyn BlockDeviceProvider,
    device: &BlockDeviceInfo,
) -> Option<BlockDeviceInfo> {
    if !device.is_encrypted {
        return None;
    }
    let path = cleartext_path(device)?;
    match block.block_device(path).await {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(path, "failed to read cleartext device: {e}");
            None
        }
    }
}

pub(crate) fn cleartext_path(device: &BlockDeviceInfo) -> Option<&str> {
    device.cleartext_device.as_deref().and_then(object_path)
}

/// Why a virtual mount is left out of the listing, if it is.
///
/// Mounts under the per-user media directory are only skipped when a native
/// block device is known to be mounted there; protocol-backed mounts can share
/// that directory.
pub(crate) fn mount_skip_reason(
    mount: &VirtualMountInfo,
    listener: &DeviceListener,
) -> Option<&'static str> {
    let reason = if mount.is_udisks_backed() {
        "listed as block device"
    } else if mount.is_unix_mount() {
        "plain local mount"
    } else if mount.root_uri.is_none() {
        "no root file"
    } else if mount.is_burn_session() {
        "optical burn session"
    } else if mount.root_path.is_empty() {
        "no root path"
    } else if mount.is_under_media_dir()
        && listener.is_from_native_block_device(&mount.root_path)
    {
        "native block device mount"
    } else {
        return None;
    };
    debug!(uri = mount.uri(), reason, "skipping virtual mount");
    Some(reason)
}

/// Rename rules for a block device on `drive`.
pub(crate) fn rename_capabilities(device: &BlockDeviceInfo, drive: &DriveInfo) -> (bool, bool) {
    let optical = drive.supports_optical();
    let alias_capable = !drive.removable && !optical && !device.id_uuid.is_empty();
    let renamable =
        alias_capable || (device.has_filesystem && !optical && !device.is_root_mount());
    (alias_capable, renamable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use places_types::VirtualVolumeInfo;

    fn mount(uri: &str, path: &str) -> VirtualMountInfo {
        VirtualMountInfo {
            name: "m".to_string(),
            mount_class: "GDaemonMount".to_string(),
            root_uri: Some(uri.to_string()),
            root_path: path.to_string(),
            volume: None,
        }
    }

    #[test]
    fn media_dir_mounts_need_native_evidence() {
        let listener = DeviceListener::new();
        let phone = mount("file:///media/user/PHONE", "/media/user/PHONE");
        assert_eq!(mount_skip_reason(&phone, &listener), None);

        listener.set_native_mounts("sdd1", &["/media/user/PHONE".to_string()]);
        assert_eq!(
            mount_skip_reason(&phone, &listener),
            Some("native block device mount")
        );
    }

    #[test]
    fn backend_specific_mounts_are_skipped() {
        let listener = DeviceListener::new();
        let mut udisks = mount("file:///media/user/USB", "/media/user/USB");
        udisks.volume = Some(VirtualVolumeInfo {
            monitor_name: "GProxyVolumeMonitorUDisks2".to_string(),
            ..Default::default()
        });
        assert!(mount_skip_reason(&udisks, &listener).is_some());

        let mut unix = mount("file:///mnt/data", "/mnt/data");
        unix.mount_class = "GUnixMount".to_string();
        assert!(mount_skip_reason(&unix, &listener).is_some());

        assert!(mount_skip_reason(&mount("burn:///", "/burn"), &listener).is_some());

        let mut rootless = mount("smb://nas/media/", "");
        assert!(mount_skip_reason(&rootless, &listener).is_some());
        rootless.root_uri = None;
        assert_eq!(mount_skip_reason(&rootless, &listener), Some("no root file"));
    }

    #[test]
    fn internal_disks_take_aliases_removable_ones_relabel() {
        let device = BlockDeviceInfo {
            id_uuid: "u1".to_string(),
            has_filesystem: true,
            ..Default::default()
        };
        assert_eq!(rename_capabilities(&device, &DriveInfo::default()), (true, true));

        let usb = DriveInfo {
            removable: true,
            ..Default::default()
        };
        assert_eq!(rename_capabilities(&device, &usb), (false, true));

        let root = BlockDeviceInfo {
            mount_points: vec!["/".to_string()],
            ..device
        };
        assert_eq!(rename_capabilities(&root, &usb), (false, false));
    }
}
