//! Virtual mount and volume models reported by the user-space mount service

use serde::{Deserialize, Serialize};

/// Scheme of optical burn sessions, which are never listed as mounts.
pub const BURN_SCHEME: &str = "burn";

/// Mount class of plain local mounts (fstab entries and the like).
pub const UNIX_MOUNT_CLASS: &str = "GUnixMount";

const UDISKS_MONITOR_SUFFIX: &str = "UDisks2";

/// Volume monitors whose volumes are mounted automatically when they appear.
const AUTO_MOUNT_MONITOR_SUFFIXES: [&str; 3] = ["MTP", "GPhoto2", "Afc"];

/// A volume known to the mount service, mounted or not
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VirtualVolumeInfo {
    /// Human-readable volume name
    pub name: String,

    /// Name of the monitor that reported the volume (e.g., "GProxyVolumeMonitorMTP")
    pub monitor_name: String,

    /// URI or device used to activate the volume
    pub activation_root: String,

    /// Whether the volume currently has a mount
    pub mounted: bool,
}

impl VirtualVolumeInfo {
    /// Volumes proxied from the block storage manager are listed as block devices instead.
    pub fn is_udisks_backed(&self) -> bool {
        self.monitor_name.ends_with(UDISKS_MONITOR_SUFFIX)
    }

    /// Media transfer and camera protocols get mounted as soon as they show up.
    pub fn needs_auto_mount(&self) -> bool {
        AUTO_MOUNT_MONITOR_SUFFIXES
            .iter()
            .any(|suffix| self.monitor_name.ends_with(suffix))
    }
}

/// An active mount managed by the mount service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VirtualMountInfo {
    /// Mount name as shown by the mount service
    pub name: String,

    /// Mount class tag (e.g., "GDaemonMount", "GUnixMount", "GProxyMount")
    pub mount_class: String,

    /// URI of the mount root, `None` when there is no resolvable root file
    pub root_uri: Option<String>,

    /// Local path of the mount root; some backends leave it empty
    pub root_path: String,

    /// Owning volume, if any
    pub volume: Option<VirtualVolumeInfo>,
}

impl VirtualMountInfo {
    pub fn uri(&self) -> &str {
        self.root_uri.as_deref().unwrap_or_default()
    }

    pub fn scheme(&self) -> &str {
        self.uri().split_once(':').map(|(scheme, _)| scheme).unwrap_or_default()
    }

    pub fn is_udisks_backed(&self) -> bool {
        self.volume
            .as_ref()
            .is_some_and(VirtualVolumeInfo::is_udisks_backed)
    }

    pub fn is_unix_mount(&self) -> bool {
        self.mount_class == UNIX_MOUNT_CLASS
    }

    pub fn is_burn_session(&self) -> bool {
        self.scheme() == BURN_SCHEME
    }

    /// Mounts whose root lives in the per-user media directory, where the
    /// block storage manager also mounts native devices.
    pub fn is_under_media_dir(&self) -> bool {
        let uri = self.uri();
        uri.starts_with("file:///media/") || uri.starts_with("file:///run/media/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(monitor: &str) -> VirtualVolumeInfo {
        VirtualVolumeInfo {
            monitor_name: monitor.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn auto_mount_monitors() {
        assert!(volume("GProxyVolumeMonitorMTP").needs_auto_mount());
        assert!(volume("GProxyVolumeMonitorGPhoto2").needs_auto_mount());
        assert!(volume("GProxyVolumeMonitorAfc").needs_auto_mount());
        assert!(!volume("GProxyVolumeMonitorUDisks2").needs_auto_mount());
        assert!(!volume("GProxyVolumeMonitorMTPx").needs_auto_mount());
    }

    #[test]
    fn mount_classification() {
        let mount = VirtualMountInfo {
            mount_class: "GDaemonMount".to_string(),
            root_uri: Some("burn:///".to_string()),
            volume: Some(volume("GProxyVolumeMonitorUDisks2")),
            ..Default::default()
        };
        assert!(mount.is_burn_session());
        assert!(mount.is_udisks_backed());
        assert!(!mount.is_unix_mount());
        assert_eq!(VirtualMountInfo::default().scheme(), "");
    }
}
