// SPDX-License-Identifier: GPL-3.0-only

//! Device and mount aggregation for the `devices:///` root
//!
//! Merges block devices, virtual mounts, the user's standard directories and
//! remembered remote connections into one list of addressable entries, and
//! keeps consumers informed about changes to it.
//!
//! - `DeviceRegistry` → listing, lookup, rename and alias operations
//! - `RootWatcher` → translates backend events into entry notifications
//! - `DeviceContext` → state shared by both, created once per process

pub mod alias;
pub mod backends;
pub mod context;
pub(crate) mod devices;
pub mod disk_info;
pub mod error;
pub mod filter;
pub mod identity;
pub mod listener;
pub mod mount_path;
pub mod naming;
pub mod network;
pub mod policy;
pub mod preferences;
pub mod registry;
pub mod settings;
pub mod stash;
pub mod user_dirs;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use alias::{AliasChange, AliasStore};
pub use backends::Backends;
pub use context::DeviceContext;
pub use error::PlacesError;
pub use filter::should_hide;
pub use preferences::Preferences;
pub use registry::{DeviceRegistry, ListOptions};
pub use settings::{FilePolicySource, JsonSettingsStore};
pub use stash::StashedRemoteCache;
pub use user_dirs::UserDirs;
pub use watcher::RootWatcher;
