// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use places_types::{VirtualMountInfo, VirtualVolumeInfo};

use super::{EventSink, SubscriptionId};
use crate::ProviderError;

/// User-space mount service (network shares, media transfer devices).
#[async_trait]
pub trait VirtualMountProvider: Send + Sync {
    async fn volumes(&self) -> Result<Vec<VirtualVolumeInfo>, ProviderError>;

    async fn mounts(&self) -> Result<Vec<VirtualMountInfo>, ProviderError>;

    async fn mount_volume(&self, volume: &VirtualVolumeInfo) -> Result<(), ProviderError>;

    async fn unmount(&self, mount: &VirtualMountInfo) -> Result<(), ProviderError>;

    /// Delivers `MountAdded`, `MountRemoved` and `VolumeAdded` events.
    async fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId, ProviderError>;

    async fn unsubscribe(&self, id: SubscriptionId);
}
