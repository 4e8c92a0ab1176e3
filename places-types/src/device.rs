//! Block device and drive models
//!
//! These mirror what the block storage manager reports for one block object
//! and its owning drive. Providers fill them in; the engine never mutates them.

use serde::{Deserialize, Serialize};

/// DOS partition type codes that mark an extended (container) partition.
pub const EXTENDED_PARTITION_TYPES: [&str; 5] = ["0x05", "0x0f", "0x85", "0xc5", "0xd5"];

/// Block device state as reported by the block storage manager
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockDeviceInfo {
    // === Identity ===
    /// Backend object path (e.g., "/org/freedesktop/UDisks2/block_devices/sda1")
    pub path: String,

    /// Device node (e.g., "/dev/sda1")
    pub device: String,

    /// Backend object path of the owning drive ("/" when there is none)
    pub drive_id: String,

    /// Filesystem UUID (may be empty)
    pub id_uuid: String,

    /// Filesystem label (may be empty)
    pub label: String,

    /// Filesystem or container type (e.g., "ext4", "crypto_LUKS")
    pub id_type: String,

    // === Physical Properties ===
    /// Size in bytes
    pub size: u64,

    /// Whether the owning drive reports the device as removable
    pub removable: bool,

    /// Media types the owning drive can handle
    pub media_types: Vec<String>,

    // === Structure ===
    pub has_filesystem: bool,
    pub has_partition_table: bool,

    /// DOS/GPT partition type when the device is a partition
    pub partition_type: Option<String>,

    pub is_loop: bool,

    // === Encryption ===
    /// Whether this is a locked/unlocked encrypted shell
    pub is_encrypted: bool,

    /// Cleartext counterpart of an unlocked shell
    pub cleartext_device: Option<String>,

    /// Shell backing this cleartext device
    pub crypto_backing_device: Option<String>,

    // === Hints ===
    pub hint_system: bool,
    pub hint_ignore: bool,

    /// Current mount points, first one is the primary
    pub mount_points: Vec<String>,
}

impl BlockDeviceInfo {
    /// Device node name without the `/dev/` prefix.
    pub fn device_name(&self) -> &str {
        self.device.rsplit('/').next().unwrap_or(&self.device)
    }

    pub fn is_extended_partition(&self) -> bool {
        self.partition_type
            .as_deref()
            .map(|ty| {
                EXTENDED_PARTITION_TYPES
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(ty))
            })
            .unwrap_or(false)
    }

    /// A cleartext device that is represented by its encrypted shell.
    pub fn is_cleartext(&self) -> bool {
        self.crypto_backing_device
            .as_deref()
            .is_some_and(|backing| backing.len() > 1)
    }

    pub fn is_mounted(&self) -> bool {
        !self.mount_points.is_empty()
    }

    pub fn is_root_mount(&self) -> bool {
        self.mount_points.iter().any(|mp| mp == "/")
    }
}

/// Drive state as reported by the block storage manager
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriveInfo {
    /// Backend object path of the drive
    pub id: String,

    /// Whether the disk is removable
    pub removable: bool,

    /// Media the drive can read (e.g., "thumb", "optical_cd", "optical_dvd")
    pub media_compatibility: Vec<String>,

    /// Whether this is an optical drive
    pub optical: bool,
}

impl DriveInfo {
    pub fn supports_optical(&self) -> bool {
        self.optical
            || self
                .media_compatibility
                .iter()
                .any(|media| media.contains("optical"))
    }
}

/// Block device properties that can change while the device is present
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyField {
    IdLabel,
    MountPoints,
    Size,
    IdType,
    CleartextDevice,
}
