// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the places aggregation engine
//!
//! This crate defines the types shared by every layer of the stack:
//!
//! - **places-udisks** / **places-gvfs**: report backend state as these types
//! - **places-core**: turns them into listable `DeviceEntry` rows and live events
//! - **places-cli**: prints them as text or JSON
//!
//! ## Architecture
//!
//! ### Backend models (what providers report)
//! - `BlockDeviceInfo` / `DriveInfo` → block storage manager state
//! - `VirtualMountInfo` / `VirtualVolumeInfo` → user-space mount service state
//!
//! ### Listing models (what consumers see)
//! - `DeviceEntry` → one browsable location, addressed by a canonical identifier
//! - `EntryEvent` → live created/removed/attribute-changed notifications

pub mod common;
pub mod device;
pub mod entry;
pub mod event;
pub mod identifier;
pub mod mount;
pub mod records;

pub use common::bytes_to_pretty;
pub use device::{BlockDeviceInfo, DriveInfo, PropertyField};
pub use entry::{BlockEntry, DeviceEntry, EntryKind, UserDirKind};
pub use event::{BackendEvent, EntryEvent, GhostSignal, Notification, ShellRequest};
pub use identifier::{
    AGGREGATION_ROOT, SuffixTag, block_identifier, decode_component, encode_component,
    is_aggregation_root, make_identifier, parse_identifier,
};
pub use mount::{BURN_SCHEME, UNIX_MOUNT_CLASS, VirtualMountInfo, VirtualVolumeInfo};
pub use records::{AliasRecord, DiskInfoDocument, DiskInfoEntry, StashedMount};
