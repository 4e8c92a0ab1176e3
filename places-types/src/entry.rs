//! Listable entries of the aggregated view

use serde::{Deserialize, Serialize};

/// Fixed user-directory shortcuts, in listing order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserDirKind {
    Desktop,
    Videos,
    Music,
    Pictures,
    Documents,
    Downloads,
}

impl UserDirKind {
    pub const ALL: [UserDirKind; 6] = [
        Self::Desktop,
        Self::Videos,
        Self::Music,
        Self::Pictures,
        Self::Documents,
        Self::Downloads,
    ];

    /// Identifier component, also used to parse it back.
    pub fn key(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Videos => "videos",
            Self::Music => "music",
            Self::Pictures => "pictures",
            Self::Documents => "documents",
            Self::Downloads => "downloads",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Videos => "Videos",
            Self::Music => "Music",
            Self::Pictures => "Pictures",
            Self::Documents => "Documents",
            Self::Downloads => "Downloads",
        }
    }
}

/// Block-device specific entry data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockEntry {
    /// Device node (e.g., "/dev/sda1")
    pub device: String,

    /// Filesystem UUID (may be empty)
    pub uuid: String,

    /// Name resolved without any user alias
    pub volume_name: String,

    /// Whether the entry is renamed through a stored alias instead of a relabel
    pub alias_capable: bool,

    pub renamable: bool,

    pub mount_points: Vec<String>,

    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    UserDir {
        dir: UserDirKind,
    },
    BlockDevice(BlockEntry),
    VirtualMount {
        mount_class: String,
        uri: String,
    },
    StashedRemote {
        protocol: String,
        host: String,
        share: String,
    },
}

/// One browsable location in the aggregated listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Canonical identifier (`devices:///<component>.<suffix>`)
    pub identifier: String,

    pub kind: EntryKind,

    /// Block object path, mount root path, user directory path or
    /// `protocol://host/share` depending on the kind
    pub backend_ref: String,

    pub display_name: String,
}

impl DeviceEntry {
    pub fn block(&self) -> Option<&BlockEntry> {
        match &self.kind {
            EntryKind::BlockDevice(block) => Some(block),
            _ => None,
        }
    }

    pub fn can_rename(&self) -> bool {
        self.block().is_some_and(|block| block.renamable)
    }

    pub fn can_set_alias(&self) -> bool {
        self.block().is_some_and(|block| block.alias_capable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_dir_keys_roundtrip() {
        for kind in UserDirKind::ALL {
            assert_eq!(UserDirKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(UserDirKind::from_key("templates"), None);
    }

    #[test]
    fn entry_kind_serializes_with_tag() {
        let entry = DeviceEntry {
            identifier: "devices:///desktop.userdir".to_string(),
            kind: EntryKind::UserDir {
                dir: UserDirKind::Desktop,
            },
            backend_ref: "/home/user/Desktop".to_string(),
            display_name: "Desktop".to_string(),
        };
        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["kind"]["type"], "user_dir");
        assert_eq!(json["kind"]["dir"], "desktop");
        assert!(!entry.can_rename());
    }
}
