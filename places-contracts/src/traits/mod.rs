// SPDX-License-Identifier: GPL-3.0-only

pub mod block;
pub mod mounts;
pub mod settings;

use places_types::BackendEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use block::BlockDeviceProvider;
pub use mounts::VirtualMountProvider;
pub use settings::{PolicySource, SettingsStore};

/// Channel end providers push their events into.
pub type EventSink = mpsc::UnboundedSender<BackendEvent>;

/// Handle of a registered event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);
