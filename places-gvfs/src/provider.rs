// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use places_contracts::{
    EventSink, ProviderError, ProviderErrorKind, SubscriptionId, VirtualMountProvider,
};
use places_types::{BackendEvent, VirtualMountInfo, VirtualVolumeInfo};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::GvfsError;
use crate::gio::GioCli;
use crate::parse::MountListing;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Virtual mount provider backed by GVfs.
///
/// GVfs has no change signal reachable without GIO bindings, so
/// subscriptions poll the listing and report the difference.
pub struct GvfsProvider {
    gio: Arc<GioCli>,
    uid: u32,
    poll_interval: Duration,
    tasks: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl GvfsProvider {
    pub fn new(uid: u32) -> Result<Self, GvfsError> {
        Ok(Self::with_gio(GioCli::locate()?, uid))
    }

    pub fn with_gio(gio: GioCli, uid: u32) -> Self {
        Self {
            gio: Arc::new(gio),
            uid,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, JoinHandle<()>>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, GvfsError>
    where
        T: Send + 'static,
        F: FnOnce(&GioCli) -> Result<T, GvfsError> + Send + 'static,
    {
        let gio = self.gio.clone();
        tokio::task::spawn_blocking(move || f(&gio))
            .await
            .map_err(|e| GvfsError::Task(e.to_string()))?
    }

    async fn snapshot(&self) -> Result<MountListing, GvfsError> {
        let uid = self.uid;
        self.blocking(move |gio| gio.listing(uid)).await
    }
}

impl Drop for GvfsProvider {
    fn drop(&mut self) {
        for (_, handle) in self.lock_tasks().drain() {
            handle.abort();
        }
    }
}

fn same_mount(a: &VirtualMountInfo, b: &VirtualMountInfo) -> bool {
    a.name == b.name && a.root_uri == b.root_uri
}

fn same_volume(a: &VirtualVolumeInfo, b: &VirtualVolumeInfo) -> bool {
    a.name == b.name && a.monitor_name == b.monitor_name && a.activation_root == b.activation_root
}

/// Events turning `previous` into `current`: removed mounts first, then new
/// volumes, then new mounts.
pub fn diff_listings(previous: &MountListing, current: &MountListing) -> Vec<BackendEvent> {
    let removed = previous
        .mounts
        .iter()
        .filter(|old| !current.mounts.iter().any(|new| same_mount(old, new)))
        .cloned()
        .map(BackendEvent::MountRemoved);
    let volumes = current
        .volumes
        .iter()
        .filter(|new| !previous.volumes.iter().any(|old| same_volume(old, new)))
        .cloned()
        .map(BackendEvent::VolumeAdded);
    let added = current
        .mounts
        .iter()
        .filter(|new| !previous.mounts.iter().any(|old| same_mount(old, new)))
        .cloned()
        .map(BackendEvent::MountAdded);

    removed.chain(volumes).chain(added).collect()
}

#[async_trait]
impl VirtualMountProvider for GvfsProvider {
    async fn volumes(&self) -> Result<Vec<VirtualVolumeInfo>, ProviderError> {
        Ok(self.snapshot().await?.volumes)
    }

    async fn mounts(&self) -> Result<Vec<VirtualMountInfo>, ProviderError> {
        Ok(self.snapshot().await?.mounts)
    }

    async fn mount_volume(&self, volume: &VirtualVolumeInfo) -> Result<(), ProviderError> {
        if volume.activation_root.is_empty() {
            return Err(GvfsError::NotActivatable(volume.name.clone()).into());
        }
        let root = volume.activation_root.clone();
        Ok(self.blocking(move |gio| gio.mount(&root)).await?)
    }

    async fn unmount(&self, mount: &VirtualMountInfo) -> Result<(), ProviderError> {
        let location = match mount.root_uri.as_deref() {
            Some(uri) => uri.to_string(),
            None if !mount.root_path.is_empty() => mount.root_path.clone(),
            None => {
                return Err(ProviderError::new(
                    ProviderErrorKind::InvalidInput,
                    format!("mount {} has no location", mount.name),
                ));
            }
        };
        Ok(self.blocking(move |gio| gio.unmount(&location)).await?)
    }

    async fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId, ProviderError> {
        let mut previous = self.snapshot().await?;
        let gio = self.gio.clone();
        let uid = self.uid;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            // The first tick completes immediately and the baseline is fresh.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let gio = gio.clone();
                let current = match tokio::task::spawn_blocking(move || gio.listing(uid)).await {
                    Ok(Ok(listing)) => listing,
                    Ok(Err(e)) => {
                        warn!("failed to poll mounts: {e}");
                        continue;
                    }
                    Err(e) => {
                        warn!("mount poll task failed: {e}");
                        continue;
                    }
                };

                for event in diff_listings(&previous, &current) {
                    if sink.send(event).is_err() {
                        debug!("mount event receiver dropped");
                        return;
                    }
                }
                previous = current;
            }
        });

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_tasks().insert(id, handle);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(handle) = self.lock_tasks().remove(&id) {
            handle.abort();
        }
    }
}
