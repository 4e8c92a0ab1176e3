// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use places_types::{BlockDeviceInfo, DriveInfo};

use super::{EventSink, SubscriptionId};
use crate::ProviderError;

/// Local block storage manager.
#[async_trait]
pub trait BlockDeviceProvider: Send + Sync {
    async fn block_device_paths(&self) -> Result<Vec<String>, ProviderError>;

    async fn block_device(&self, path: &str) -> Result<BlockDeviceInfo, ProviderError>;

    async fn drive(&self, drive_id: &str) -> Result<DriveInfo, ProviderError>;

    /// Gates delivery of property changes from `watch_properties` subscriptions.
    async fn set_watch_changes(&self, enabled: bool) -> Result<(), ProviderError>;

    /// Delivers `BlockAdded` / `BlockRemoved` events.
    async fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId, ProviderError>;

    /// Delivers `PropertyChanged` events for one block object.
    async fn watch_properties(
        &self,
        path: &str,
        sink: EventSink,
    ) -> Result<SubscriptionId, ProviderError>;

    async fn unsubscribe(&self, id: SubscriptionId);

    async fn unmount(&self, path: &str, force: bool) -> Result<(), ProviderError>;

    async fn set_label(&self, path: &str, label: &str) -> Result<(), ProviderError>;
}
