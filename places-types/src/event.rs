//! Backend and entry events

use serde::{Deserialize, Serialize};

use crate::{PropertyField, VirtualMountInfo, VirtualVolumeInfo};

/// Everything a provider can report, funnelled into one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    MountAdded(VirtualMountInfo),
    MountRemoved(VirtualMountInfo),
    VolumeAdded(VirtualVolumeInfo),
    /// Backend object path of a new block device
    BlockAdded(String),
    BlockRemoved(String),
    PropertyChanged {
        device: String,
        field: PropertyField,
    },
}

/// Live change of the aggregated listing, keyed by entry identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "identifier", rename_all = "snake_case")]
pub enum EntryEvent {
    Created(String),
    Removed(String),
    AttributeChanged(String),
}

impl EntryEvent {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Created(id) | Self::Removed(id) | Self::AttributeChanged(id) => id,
        }
    }
}

/// Requests to the surrounding shell that follow from mount changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShellRequest {
    RemoveRecentFile(String),
    RefreshFileViews,
    RefreshDesktop,
    ShowNewWindows,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    Entry(EntryEvent),
    Shell(ShellRequest),
}

/// Out-of-band signals for changes the backends never report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GhostSignal {
    Created,
    Removed,
    AttributeChanged,
}
