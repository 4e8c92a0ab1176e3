// SPDX-License-Identifier: GPL-3.0-only

//! In-memory providers for exercising the registry and watcher.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use places_contracts::{
    BlockDeviceProvider, EventSink, ProviderError, SubscriptionId, VirtualMountProvider,
};
use places_types::{
    BackendEvent, BlockDeviceInfo, DriveInfo, PropertyField, VirtualMountInfo, VirtualVolumeInfo,
};

pub(crate) const BLOCK_PREFIX: &str = "/org/freedesktop/UDisks2/block_devices/";

/// A plain ext4 partition on a fixed disk.
pub(crate) fn block_device(name: &str) -> BlockDeviceInfo {
    BlockDeviceInfo {
        path: format!("{BLOCK_PREFIX}{name}"),
        device: format!("/dev/{name}"),
        drive_id: "/".to_string(),
        id_type: "ext4".to_string(),
        size: 16 * 1024 * 1024 * 1024,
        has_filesystem: true,
        ..Default::default()
    }
}

pub(crate) fn network_mount(uri: &str, path: &str) -> VirtualMountInfo {
    VirtualMountInfo {
        name: path.rsplit('/').next().unwrap_or_default().to_string(),
        mount_class: "GDaemonMount".to_string(),
        root_uri: Some(uri.to_string()),
        root_path: path.to_string(),
        volume: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockCall {
    SetWatchChanges(bool),
    Subscribe,
    WatchProperties(String),
    Unsubscribe(SubscriptionId),
    Unmount { path: String, force: bool },
    SetLabel { path: String, label: String },
}

struct Subscription {
    path: Option<String>,
    sink: EventSink,
}

pub(crate) struct FakeBlockProvider {
    devices: Mutex<Vec<BlockDeviceInfo>>,
    drives: Mutex<HashMap<String, DriveInfo>>,
    calls: Mutex<Vec<BlockCall>>,
    subscriptions: Mutex<HashMap<SubscriptionId, Subscription>>,
    next_id: AtomicU64,
    watching: AtomicBool,
    paths_error: Mutex<Option<ProviderError>>,
    unmount_result: Mutex<Result<(), ProviderError>>,
    set_label_result: Mutex<Result<(), ProviderError>>,
}

impl Default for FakeBlockProvider {
    fn default() -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
            drives: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            watching: AtomicBool::new(false),
            paths_error: Mutex::new(None),
            unmount_result: Mutex::new(Ok(())),
            set_label_result: Mutex::new(Ok(())),
        }
    }
}

impl FakeBlockProvider {
    /// Add or replace a device (matched by object path).
    pub(crate) fn add_device(&self, info: BlockDeviceInfo) {
        let mut devices = self.devices.lock().unwrap();
        match devices.iter_mut().find(|d| d.path == info.path) {
            Some(existing) => *existing = info,
            None => devices.push(info),
        }
    }

    pub(crate) fn remove_device(&self, path: &str) {
        self.devices.lock().unwrap().retain(|d| d.path != path);
    }

    pub(crate) fn add_drive(&self, drive: DriveInfo) {
        self.drives.lock().unwrap().insert(drive.id.clone(), drive);
    }

    pub(crate) fn set_paths_error(&self, error: Option<ProviderError>) {
        *self.paths_error.lock().unwrap() = error;
    }

    pub(crate) fn set_unmount_result(&self, res: Result<(), ProviderError>) {
        *self.unmount_result.lock().unwrap() = res;
    }

    pub(crate) fn take_calls(&self) -> Vec<BlockCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub(crate) fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    pub(crate) fn watched_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter_map(|s| s.path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Send an event to every manager-level subscriber.
    pub(crate) fn emit(&self, event: BackendEvent) {
        for sub in self.subscriptions.lock().unwrap().values() {
            if sub.path.is_none() {
                let _ = sub.sink.send(event.clone());
            }
        }
    }

    /// Send a property change to subscribers watching `path`.
    pub(crate) fn emit_property(&self, path: &str, field: PropertyField) {
        if !self.is_watching() {
            return;
        }
        for sub in self.subscriptions.lock().unwrap().values() {
            if sub.path.as_deref() == Some(path) {
                let _ = sub.sink.send(BackendEvent::PropertyChanged {
                    device: path.to_string(),
                    field,
                });
            }
        }
    }

    fn register(&self, path: Option<String>, sink: EventSink) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions
            .lock()
            .unwrap()
            .insert(id, Subscription { path, sink });
        id
    }
}

#[async_trait]
impl BlockDeviceProvider for FakeBlockProvider {
    async fn block_device_paths(&self) -> Result<Vec<String>, ProviderError> {
        if let Some(error) = self.paths_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.path.clone())
            .collect())
    }

    async fn block_device(&self, path: &str) -> Result<BlockDeviceInfo, ProviderError> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.path == path)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(path))
    }

    async fn drive(&self, drive_id: &str) -> Result<DriveInfo, ProviderError> {
        self.drives
            .lock()
            .unwrap()
            .get(drive_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(drive_id))
    }

    async fn set_watch_changes(&self, enabled: bool) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push(BlockCall::SetWatchChanges(enabled));
        self.watching.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId, ProviderError> {
        self.calls.lock().unwrap().push(BlockCall::Subscribe);
        Ok(self.register(None, sink))
    }

    async fn watch_properties(
        &self,
        path: &str,
        sink: EventSink,
    ) -> Result<SubscriptionId, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push(BlockCall::WatchProperties(path.to_string()));
        Ok(self.register(Some(path.to_string()), sink))
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        self.calls.lock().unwrap().push(BlockCall::Unsubscribe(id));
        self.subscriptions.lock().unwrap().remove(&id);
    }

    async fn unmount(&self, path: &str, force: bool) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(BlockCall::Unmount {
            path: path.to_string(),
            force,
        });
        self.unmount_result.lock().unwrap().clone()
    }

    async fn set_label(&self, path: &str, label: &str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(BlockCall::SetLabel {
            path: path.to_string(),
            label: label.to_string(),
        });
        self.set_label_result.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MountCall {
    MountVolume(String),
    Unmount(String),
    Subscribe,
    Unsubscribe(SubscriptionId),
}

pub(crate) struct FakeMountProvider {
    volumes: Mutex<Vec<VirtualVolumeInfo>>,
    mounts: Mutex<Vec<VirtualMountInfo>>,
    calls: Mutex<Vec<MountCall>>,
    subscriptions: Mutex<HashMap<SubscriptionId, EventSink>>,
    next_id: AtomicU64,
}

impl Default for FakeMountProvider {
    fn default() -> Self {
        Self {
            volumes: Mutex::new(Vec::new()),
            mounts: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1000),
        }
    }
}

impl FakeMountProvider {
    pub(crate) fn add_volume(&self, volume: VirtualVolumeInfo) {
        self.volumes.lock().unwrap().push(volume);
    }

    pub(crate) fn add_mount(&self, mount: VirtualMountInfo) {
        self.mounts.lock().unwrap().push(mount);
    }

    pub(crate) fn remove_mount(&self, root_path: &str) {
        self.mounts.lock().unwrap().retain(|m| m.root_path != root_path);
    }

    pub(crate) fn take_calls(&self) -> Vec<MountCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    pub(crate) fn emit(&self, event: BackendEvent) {
        for sink in self.subscriptions.lock().unwrap().values() {
            let _ = sink.send(event.clone());
        }
    }
}

#[async_trait]
impl VirtualMountProvider for FakeMountProvider {
    async fn volumes(&self) -> Result<Vec<VirtualVolumeInfo>, ProviderError> {
        Ok(self.volumes.lock().unwrap().clone())
    }

    async fn mounts(&self) -> Result<Vec<VirtualMountInfo>, ProviderError> {
        Ok(self.mounts.lock().unwrap().clone())
    }

    async fn mount_volume(&self, volume: &VirtualVolumeInfo) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push(MountCall::MountVolume(volume.name.clone()));
        Ok(())
    }

    async fn unmount(&self, mount: &VirtualMountInfo) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push(MountCall::Unmount(mount.name.clone()));
        Err(ProviderError::not_found("mount already gone"))
    }

    async fn subscribe(&self, sink: EventSink) -> Result<SubscriptionId, ProviderError> {
        self.calls.lock().unwrap().push(MountCall::Subscribe);
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.lock().unwrap().insert(id, sink);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        self.calls.lock().unwrap().push(MountCall::Unsubscribe(id));
        self.subscriptions.lock().unwrap().remove(&id);
    }
}
