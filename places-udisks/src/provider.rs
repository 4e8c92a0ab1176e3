// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use places_contracts::{BlockDeviceProvider, EventSink, ProviderError, SubscriptionId};
use places_types::{BackendEvent, BlockDeviceInfo, DriveInfo};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use udisks2::{
    block::BlockProxy, drive::DriveProxy, encrypted::EncryptedProxy, filesystem::FilesystemProxy,
    partition::PartitionProxy, partitiontable::PartitionTableProxy,
};
use zbus::Connection;
use zbus::fdo::PropertiesProxy;
use zbus::zvariant::Value;

use crate::decode::{BLOCK_INTERFACE, byte_string, is_loop_device, mount_points, property_field};
use crate::error::UdisksError;
use crate::manager::{UDisks2ManagerProxy, UDisks2ObjectManagerProxy};

const UDISKS_SERVICE: &str = "org.freedesktop.UDisks2";

/// Block device provider backed by the UDisks2 system service.
///
/// Every subscription is a spawned task forwarding D-Bus signals into the
/// caller's sink; unsubscribing aborts the task.
pub struct UdisksProvider {
    connection: Connection,
    watching: Arc<AtomicBool>,
    tasks: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl UdisksProvider {
    pub async fn new() -> Result<Self, UdisksError> {
        let connection = Connection::system()
            .await
            .map_err(|e| UdisksError::ConnectionFailed(e.to_string()))?;
        Ok(Self::with_connection(connection))
    }

    pub fn with_connection(connection: Connection) -> Self {
        Self {
            connection,
            watching: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn register(&self, handle: JoinHandle<()>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_tasks().insert(id, handle);
        id
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, JoinHandle<()>>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn list_block_paths(&self) -> Result<Vec<String>, UdisksError> {
        let manager = UDisks2ManagerProxy::new(&self.connection).await?;
        let paths = manager.get_block_devices(HashMap::new()).await?;
        Ok(paths.into_iter().map(|p| p.to_string()).collect())
    }

    async fn read_block(&self, path: &str) -> Result<BlockDeviceInfo, UdisksError> {
        let connection = &self.connection;
        let block = BlockProxy::builder(connection).path(path)?.build().await?;

        let preferred = byte_string(&block.preferred_device().await?);
        let device = if preferred.is_empty() {
            byte_string(&block.device().await?)
        } else {
            preferred
        };
        if device.is_empty() {
            return Err(UdisksError::DeviceNotFound(path.to_string()));
        }

        let drive_id = block.drive().await?.to_string();

        let (has_filesystem, mounts) =
            match FilesystemProxy::builder(connection).path(path)?.build().await {
                Ok(proxy) => match proxy.mount_points().await {
                    Ok(raw) => (true, mount_points(raw)),
                    Err(_) => (false, Vec::new()),
                },
                Err(_) => (false, Vec::new()),
            };

        // Not every block object carries a partition table; a failing read means none.
        let has_partition_table =
            match PartitionTableProxy::builder(connection).path(path)?.build().await {
                Ok(proxy) => proxy.type_().await.is_ok(),
                Err(_) => false,
            };

        let partition_type = match PartitionProxy::builder(connection).path(path)?.build().await {
            Ok(proxy) => proxy.type_().await.ok(),
            Err(_) => None,
        };

        let cleartext_device = match EncryptedProxy::builder(connection).path(path)?.build().await
        {
            Ok(proxy) => proxy.cleartext_device().await.ok().map(|p| p.to_string()),
            Err(_) => None,
        };

        let (removable, media_types) = if drive_id.len() > 1 {
            match self.read_drive(&drive_id).await {
                Ok(drive) => (drive.removable, drive.media_compatibility),
                Err(e) => {
                    debug!(drive = drive_id, "drive unreadable: {e}");
                    (false, Vec::new())
                }
            }
        } else {
            (false, Vec::new())
        };

        Ok(BlockDeviceInfo {
            path: path.to_string(),
            is_loop: is_loop_device(&device),
            device,
            drive_id,
            id_uuid: block.id_uuid().await?,
            label: block.id_label().await?,
            id_type: block.id_type().await?,
            size: block.size().await?,
            removable,
            media_types,
            has_filesystem,
            has_partition_table,
            partition_type,
            is_encrypted: cleartext_device.is_some(),
            cleartext_device,
            crypto_backing_device: block.crypto_backing_device().await.ok().map(|p| p.to_string()),
            hint_system: block.hint_system().await?,
            hint_ignore: block.hint_ignore().await?,
            mount_points: mounts,
        })
    }

    async fn read_drive(&self, drive_id: &str) -> Result<DriveInfo, UdisksError> {
        let drive = DriveProxy::builder(&self.connection)
            .path(drive_id)?
            .build()
            .await?;

        Ok(DriveInfo {
            id: drive_id.to_string(),
            removable: drive.removable().await?,
            media_compatibility: drive.media_compatibility().await?,
            optical: drive.optical().await?,
        })
    }

    async fn forward_block_signals(&self, sink: EventSink) -> Result<JoinHandle<()>, UdisksError> {
        let object_manager = UDisks2ObjectManagerProxy::new(&self.connection).await?;
        let mut added_stream = object_manager.receive_interfaces_added().await?;
        let mut removed_stream = object_manager.receive_interfaces_removed().await?;

        Ok(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    maybe_added = added_stream.next() => {
                        let Some(signal) = maybe_added else {
                            break;
                        };
                        match signal.args() {
                            Ok(args) if args.interfaces_and_properties.contains_key(BLOCK_INTERFACE) => {
                                BackendEvent::BlockAdded(args.object_path.to_string())
                            }
                            Ok(_) => continue,
                            Err(e) => {
                                warn!("Failed to parse InterfacesAdded signal args: {e}");
                                continue;
                            }
                        }
                    }
                    maybe_removed = removed_stream.next() => {
                        let Some(signal) = maybe_removed else {
                            break;
                        };
                        match signal.args() {
                            Ok(args) if args.interfaces.iter().any(|i| i == BLOCK_INTERFACE) => {
                                BackendEvent::BlockRemoved(args.object_path.to_string())
                            }
                            Ok(_) => continue,
                            Err(e) => {
                                warn!("Failed to parse InterfacesRemoved signal args: {e}");
                                continue;
                            }
                        }
                    }
                };

                if sink.send(event).is_err() {
                    debug!("block event receiver dropped");
                    break;
                }
            }
        }))
    }

    async fn forward_property_changes(
        &self,
        path: &str,
        sink: EventSink,
    ) -> Result<JoinHandle<()>, UdisksError> {
        let properties = PropertiesProxy::builder(&self.connection)
            .destination(UDISKS_SERVICE)?
            .path(path.to_string())?
            .build()
            .await?;
        let mut changes = properties.receive_properties_changed().await?;
        let watching = self.watching.clone();
        let device = path.to_string();

        Ok(tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                if !watching.load(Ordering::Relaxed) {
                    continue;
                }
                let args = match signal.args() {
                    Ok(args) => args,
                    Err(e) => {
                        warn!(device, "Failed to parse PropertiesChanged signal args: {e}");
                        continue;
                    }
                };

                let interface = args.interface_name().as_str();
                let fields = args
                    .changed_properties()
                    .keys()
                    .copied()
                    .chain(args.invalidated_properties().iter().copied())
                    .filter_map(|property| property_field(interface, property));
                for field in fields {
                    let event = BackendEvent::PropertyChanged {
                        device: device.clone(),
                        field,
                    };
                    if sink.send(event).is_err() {
                        debug!(device, "property event receiver dropped");
                        return;
                    }
                }
            }
        }))
    }

    async fn unmount_filesystem(&self, path: &str, force: bool) -> Result<(), UdisksError> {
        let proxy = FilesystemProxy::builder(&self.connection)
            .path(path)?
            .build()
            .await?;

        let mut options: HashMap<&str, Value<'_>> = HashMap::new();
        if force {
            options.insert("force", Value::from(true));
        }
        proxy.unmount(options).await?;
        Ok(())
    }

    async fn relabel_filesystem(&self, path: &str, label: &str) -> Result<(), UdisksError> {
        let proxy = FilesystemProxy::builder(&self.connection)
            .path(path)?
            .build()
            .await?;

        let options: HashMap<&str, Value<'_>> = HashMap::new();
        proxy.set_label(label, options).await?;
        Ok(())
    }
}

impl Drop for UdisksProvider {
    fn drop(&mut self) {
        for (_, handle) in self.lock_tasks().drain() {
            handle.abort();
        }
    }
}

#[async_trait]
impl BlockDeviceProvider for UdisksProvider {
    async fn block_device_paths(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.list_block_paths().await?)
    }

    async fn block_device(&self, path: &str) -> Result<BlockDeviceInfo, ProviderError> {
        Ok(self.read_block(path).await?)
    }

    async fn drive(&self, drive_id: &str) -> Result<DriveInfo, ProviderError> {
        Ok(self.read_drive(drive_id).await?)
    }

    async fn set_watch_changes(&self, enabled: bool) -> Result<(), ProviderError> {
        debug!(enabled, "property change delivery");
        self.watching.store(enabled, Ordering::Relaxed);
        Ok(())
    }

    async fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId, ProviderError> {
        let handle = self.forward_block_signals(sink).await?;
        Ok(self.register(handle))
    }

    async fn watch_properties(
        &self,
        path: &str,
        sink: EventSink,
    ) -> Result<SubscriptionId, ProviderError> {
        let handle = self.forward_property_changes(path, sink).await?;
        Ok(self.register(handle))
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(handle) = self.lock_tasks().remove(&id) {
            handle.abort();
        }
    }

    async fn unmount(&self, path: &str, force: bool) -> Result<(), ProviderError> {
        info!(path, force, "unmounting filesystem");
        Ok(self.unmount_filesystem(path, force).await?)
    }

    async fn set_label(&self, path: &str, label: &str) -> Result<(), ProviderError> {
        info!(path, label, "setting filesystem label");
        Ok(self.relabel_filesystem(path, label).await?)
    }
}
