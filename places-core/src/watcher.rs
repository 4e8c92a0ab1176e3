// SPDX-License-Identifier: GPL-3.0-only

//! Live change notifications for the aggregation root.
//!
//! Both providers push into one inbound channel of [`BackendEvent`]s. The
//! watcher consumes it from a single task and translates each event into
//! entry-identifier [`Notification`]s on its outbound channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use places_contracts::{BlockDeviceProvider, EventSink, SubscriptionId};
use places_types::{
    BackendEvent, BlockDeviceInfo, EntryEvent, GhostSignal, Notification, PropertyField,
    ShellRequest, SuffixTag, VirtualMountInfo, VirtualVolumeInfo, block_identifier,
    is_aggregation_root, make_identifier,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::PlacesError;
use crate::backends::Backends;
use crate::context::DeviceContext;
use crate::devices::{cleartext_path, drive_for, mount_skip_reason};
use crate::filter::should_hide;
use crate::mount_path::{is_network_uri, is_smb_path, resolve_mount_path, uri_host};
use crate::preferences::Preferences;
use crate::stash::StashedRemoteCache;

const LOOP_DEVICE_PREFIX: &str = "/dev/loop";

const PLAIN_DEVICE_FIELDS: [PropertyField; 5] = [
    PropertyField::IdLabel,
    PropertyField::MountPoints,
    PropertyField::Size,
    PropertyField::IdType,
    PropertyField::CleartextDevice,
];
const SHELL_FIELDS: [PropertyField; 1] = [PropertyField::CleartextDevice];
const CLEARTEXT_FIELDS: [PropertyField; 2] = [PropertyField::IdLabel, PropertyField::MountPoints];

/// Property subscription on one block object.
#[derive(Debug)]
struct DeviceWatch {
    subscription: SubscriptionId,
    /// Identifier the changes are reported for
    identifier: String,
    fields: Vec<PropertyField>,
    /// Object whose removal releases this watch
    owner: String,
    encrypted_shell: bool,
}

#[derive(Debug)]
struct ActiveWatch {
    sink: EventSink,
    events: Option<mpsc::UnboundedReceiver<BackendEvent>>,
    block_subscription: SubscriptionId,
    mount_subscription: SubscriptionId,
    device_watches: HashMap<String, DeviceWatch>,
    wired_keys: HashSet<String>,
    identifiers: HashMap<String, String>,
}

impl ActiveWatch {
    fn handler_count(&self) -> usize {
        2 + self
            .device_watches
            .values()
            .map(|watch| watch.fields.len())
            .sum::<usize>()
    }
}

pub struct RootWatcher {
    target: String,
    backends: Backends,
    context: Arc<DeviceContext>,
    preferences: Preferences,
    stash: StashedRemoteCache,
    notifications: mpsc::UnboundedSender<Notification>,
    active: Option<ActiveWatch>,
}

impl RootWatcher {
    pub fn new(
        target: impl Into<String>,
        backends: Backends,
        context: Arc<DeviceContext>,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        let settings = backends.settings.clone();
        Self {
            target: target.into(),
            backends,
            context,
            preferences: Preferences::new(settings.clone()),
            stash: StashedRemoteCache::new(settings),
            notifications,
            active: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.active.is_some()
    }

    /// Number of live backend handlers: the two provider subscriptions plus
    /// one per watched device property.
    pub fn handler_count(&self) -> usize {
        self.active.as_ref().map_or(0, ActiveWatch::handler_count)
    }

    pub async fn start(&mut self) -> Result<(), PlacesError> {
        if self.active.is_some() {
            return Err(PlacesError::AlreadyStarted);
        }
        if !is_aggregation_root(&self.target) {
            return Err(PlacesError::NotAggregationRoot(self.target.clone()));
        }

        let (sink, events) = mpsc::unbounded_channel();
        let block = self.backends.block.as_ref();
        block.set_watch_changes(true).await?;

        let block_subscription = match block.subscribe(sink.clone()).await {
            Ok(id) => id,
            Err(e) => {
                let _ = block.set_watch_changes(false).await;
                return Err(e.into());
            }
        };
        let mount_subscription = match self.backends.mounts.subscribe(sink.clone()).await {
            Ok(id) => id,
            Err(e) => {
                block.unsubscribe(block_subscription).await;
                let _ = block.set_watch_changes(false).await;
                return Err(e.into());
            }
        };

        self.active = Some(ActiveWatch {
            sink,
            events: Some(events),
            block_subscription,
            mount_subscription,
            device_watches: HashMap::new(),
            wired_keys: HashSet::new(),
            identifiers: HashMap::new(),
        });

        self.wire_present_devices().await;
        self.count_smb_mounts().await;
        info!(handlers = self.handler_count(), "root watcher started");
        Ok(())
    }

    async fn wire_present_devices(&mut self) {
        let block = self.backends.block.clone();
        let paths = match block.block_device_paths().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!("failed to enumerate block devices: {e}");
                return;
            }
        };

        let hide_loop = self.preferences.hide_loop_partitions();
        for path in paths {
            let info = match block.block_device(&path).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(path, "failed to read block device: {e}");
                    continue;
                }
            };
            let drive = drive_for(block.as_ref(), &info).await;

            // No hidden-marker file can be created at a filesystem root.
            if !drive.removable
                && let Some(mount_point) = info.mount_points.first()
            {
                self.context.listener.hide_system_dirs(mount_point);
            }

            if should_hide(&info, &drive, hide_loop) {
                continue;
            }
            self.context
                .listener
                .set_native_mounts(&info.path, &info.mount_points);
            self.wire_device(&info).await;
        }
    }

    /// Seed the per-host SMB counts with the shares mounted before start.
    async fn count_smb_mounts(&self) {
        match self.backends.mounts.mounts().await {
            Ok(mounts) => {
                let counts = smb_mounts_by_host(&mounts, self.backends.uid, None);
                debug!(hosts = counts.len(), "counted mounted smb shares");
                self.context.listener.reset_smb_mounts(counts);
            }
            Err(e) => warn!("failed to enumerate virtual mounts: {e}"),
        }
    }

    /// Shares still mounted from `host` once `removed` is gone.
    async fn remaining_smb_mounts(&self, host: &str, removed: &str) -> usize {
        let listener = &self.context.listener;
        match self.backends.mounts.mounts().await {
            Ok(mounts) => {
                let counts = smb_mounts_by_host(&mounts, self.backends.uid, Some(removed));
                listener.set_smb_mount_count(host, counts.get(host).copied().unwrap_or(0));
            }
            Err(e) => {
                warn!(host, "failed to enumerate virtual mounts: {e}");
                listener.smb_mount_removed(host);
            }
        }
        listener.smb_mount_count(host)
    }

    pub async fn stop(&mut self) -> Result<(), PlacesError> {
        let Some(active) = self.active.take() else {
            return Err(PlacesError::NotStarted);
        };

        let block = self.backends.block.as_ref();
        if let Err(e) = block.set_watch_changes(false).await {
            warn!("failed to disable change notification: {e}");
        }
        block.unsubscribe(active.block_subscription).await;
        self.backends
            .mounts
            .unsubscribe(active.mount_subscription)
            .await;
        for watch in active.device_watches.into_values() {
            block.unsubscribe(watch.subscription).await;
        }
        self.context.listener.reset_smb_mounts(HashMap::new());

        info!("root watcher stopped");
        Ok(())
    }

    /// Dispatch inbound events until `shutdown` fires, then stop.
    pub async fn run(&mut self, mut shutdown: oneshot::Receiver<()>) -> Result<(), PlacesError> {
        let mut events = self
            .active
            .as_mut()
            .and_then(|active| active.events.take())
            .ok_or(PlacesError::NotStarted)?;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => break,
                },
            }
        }

        self.stop().await
    }

    /// Drain already queued inbound events without waiting for more.
    pub async fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.active.as_mut().and_then(|a| a.events.as_mut()) {
                Some(events) => events.try_recv().ok(),
                None => None,
            };
            let Some(event) = event else {
                return handled;
            };
            self.dispatch(event).await;
            handled += 1;
        }
    }

    pub async fn dispatch(&mut self, event: BackendEvent) {
        if self.active.is_none() {
            debug!(?event, "dropping event while stopped");
            return;
        }

        match event {
            BackendEvent::MountAdded(mount) => self.on_mount_added(mount),
            BackendEvent::MountRemoved(mount) => self.on_mount_removed(mount).await,
            BackendEvent::VolumeAdded(volume) => self.on_volume_added(volume).await,
            BackendEvent::BlockAdded(path) => self.on_block_added(&path).await,
            BackendEvent::BlockRemoved(path) => self.on_block_removed(&path).await,
            BackendEvent::PropertyChanged { device, field } => {
                self.on_property_changed(&device, field).await
            }
        }
    }

    /// Inject a change the backends never report.
    ///
    /// Loop devices unmounted behind the backends' back are removed through
    /// here; every other signal is rejected.
    pub fn ghost_signal(&self, signal: GhostSignal, path: &str) -> Result<(), PlacesError> {
        if signal == GhostSignal::Removed && path.starts_with(LOOP_DEVICE_PREFIX) {
            info!(path, "removing loop device");
            self.emit_entry(EntryEvent::Removed(block_identifier(path)));
            return Ok(());
        }
        Err(PlacesError::UnhandledGhostSignal {
            signal,
            path: path.to_string(),
        })
    }

    fn on_mount_added(&mut self, mount: VirtualMountInfo) {
        if mount_skip_reason(&mount, &self.context.listener).is_some() {
            return;
        }

        let path = mount.root_path.as_str();
        self.emit_entry(EntryEvent::Created(make_identifier(
            path,
            SuffixTag::VirtualMount,
        )));

        if is_smb_path(path) {
            self.context
                .listener
                .smb_mount_added(&uri_host(mount.uri()));
            self.emit_shell(ShellRequest::RefreshFileViews);
            self.emit_shell(ShellRequest::RefreshDesktop);
            self.emit_shell(ShellRequest::ShowNewWindows);
        }

        if let Err(e) = self.stash.remember(&mount, path) {
            warn!(path, "failed to remember remote mount: {e}");
        }
    }

    async fn on_mount_removed(&mut self, mount: VirtualMountInfo) {
        if mount.is_udisks_backed() {
            return;
        }

        let path = resolve_mount_path(&mount, self.backends.uid);
        let uri = mount.uri();
        let host = uri_host(uri);
        let smb = is_smb_path(&path);

        self.emit_entry(EntryEvent::Removed(make_identifier(
            &path,
            SuffixTag::VirtualMount,
        )));
        self.emit_shell(ShellRequest::RemoveRecentFile(path.clone()));

        if smb {
            let remaining = self.remaining_smb_mounts(&host, &path).await;
            let listener = &self.context.listener;
            if listener.is_batch_removing_smb() && remaining > 0 {
                debug!(host, remaining, "deferring refresh until batch unmount completes");
            } else {
                listener.set_batch_removing_smb(false);
                self.emit_shell(ShellRequest::RefreshFileViews);
                self.emit_shell(ShellRequest::RefreshDesktop);
            }
        }

        if is_network_uri(uri) {
            let purged = self.context.network_nodes.purge_unmounted(uri);
            debug!(uri, purged, "purged network nodes");
            // The mount service can leave the FUSE path behind unless asked twice.
            if let Err(e) = self.backends.mounts.unmount(&mount).await {
                debug!(uri, "repeated unmount reported: {e}");
            }
        }
    }

    async fn on_volume_added(&mut self, volume: VirtualVolumeInfo) {
        if !volume.needs_auto_mount() {
            return;
        }
        info!(volume = %volume.name, "auto-mounting new volume");
        if let Err(e) = self.backends.mounts.mount_volume(&volume).await {
            warn!(volume = %volume.name, "auto-mount failed: {e}");
        }
    }

    async fn on_block_added(&mut self, path: &str) {
        let block = self.backends.block.clone();
        let info = match block.block_device(path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(path, "failed to read added block device: {e}");
                return;
            }
        };
        let drive = drive_for(block.as_ref(), &info).await;
        if should_hide(&info, &drive, self.preferences.hide_loop_partitions()) {
            return;
        }

        self.context
            .listener
            .set_native_mounts(&info.path, &info.mount_points);
        let identifier = self.wire_device(&info).await;
        self.emit_entry(EntryEvent::Created(identifier));
    }

    async fn on_block_removed(&mut self, path: &str) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let identifier = active
            .identifiers
            .remove(path)
            .unwrap_or_else(|| block_identifier(path));

        let released: Vec<String> = active
            .device_watches
            .iter()
            .filter(|(watched, watch)| watched.as_str() == path || watch.owner == path)
            .map(|(watched, _)| watched.clone())
            .collect();
        let mut subscriptions = Vec::new();
        for watched in released {
            if let Some(watch) = active.device_watches.remove(&watched) {
                if watch.owner == path {
                    active.wired_keys.remove(&watch.identifier);
                    active
                        .wired_keys
                        .remove(&format!("{}_encrypted", watch.identifier));
                }
                subscriptions.push(watch.subscription);
            }
        }
        for id in subscriptions {
            self.backends.block.unsubscribe(id).await;
        }
        self.context.listener.forget_native_mounts(path);

        self.emit_entry(EntryEvent::Removed(identifier));
    }

    async fn on_property_changed(&mut self, device: &str, field: PropertyField) {
        let Some(watch) = self
            .active
            .as_ref()
            .and_then(|active| active.device_watches.get(device))
        else {
            return;
        };
        if !watch.fields.contains(&field) {
            return;
        }
        let identifier = watch.identifier.clone();
        let shell = watch.encrypted_shell;

        if field == PropertyField::MountPoints {
            self.refresh_native_mounts(device).await;
        }
        self.emit_entry(EntryEvent::AttributeChanged(identifier.clone()));

        if shell && field == PropertyField::CleartextDevice {
            self.follow_cleartext(device, &identifier).await;
        }
    }

    async fn refresh_native_mounts(&self, device: &str) {
        match self.backends.block.block_device(device).await {
            Ok(info) => self
                .context
                .listener
                .set_native_mounts(device, &info.mount_points),
            Err(e) => {
                debug!(path = device, "device vanished: {e}");
                self.context.listener.forget_native_mounts(device);
            }
        }
    }

    /// Watch the cleartext object that appeared for an unlocked shell.
    async fn follow_cleartext(&mut self, shell_path: &str, identifier: &str) {
        let block = self.backends.block.clone();
        let info = match block.block_device(shell_path).await {
            Ok(info) => info,
            Err(e) => {
                debug!(path = shell_path, "shell vanished: {e}");
                return;
            }
        };
        let Some(cleartext) = cleartext_path(&info) else {
            return;
        };
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.device_watches.contains_key(cleartext) {
            return;
        }
        watch_device(
            block.as_ref(),
            active,
            cleartext,
            identifier,
            shell_path,
            &CLEARTEXT_FIELDS,
            false,
        )
        .await;
    }

    /// Attach property handlers for a listed device. Encrypted shells report
    /// their cleartext device's label and mount changes under their own
    /// identifier. Returns the device identifier.
    async fn wire_device(&mut self, info: &BlockDeviceInfo) -> String {
        let identifier = if info.device.is_empty() {
            block_identifier(&info.path)
        } else {
            block_identifier(&info.device)
        };
        let block = self.backends.block.clone();
        let Some(active) = self.active.as_mut() else {
            return identifier;
        };
        active
            .identifiers
            .insert(info.path.clone(), identifier.clone());

        if info.is_encrypted {
            if !active.wired_keys.insert(format!("{identifier}_encrypted")) {
                return identifier;
            }
            watch_device(
                block.as_ref(),
                active,
                &info.path,
                &identifier,
                &info.path,
                &SHELL_FIELDS,
                true,
            )
            .await;
            if let Some(cleartext) = cleartext_path(info) {
                watch_device(
                    block.as_ref(),
                    active,
                    cleartext,
                    &identifier,
                    &info.path,
                    &CLEARTEXT_FIELDS,
                    false,
                )
                .await;
            }
        } else {
            if !active.wired_keys.insert(identifier.clone()) {
                return identifier;
            }
            watch_device(
                block.as_ref(),
                active,
                &info.path,
                &identifier,
                &info.path,
                &PLAIN_DEVICE_FIELDS,
                false,
            )
            .await;
        }

        identifier
    }

    fn emit_entry(&self, event: EntryEvent) {
        debug!(?event, "entry event");
        self.emit(Notification::Entry(event));
    }

    fn emit_shell(&self, request: ShellRequest) {
        self.emit(Notification::Shell(request));
    }

    fn emit(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("notification receiver dropped");
        }
    }
}

/// Mounted SMB shares per host, leaving out the mount at `excluded`.
fn smb_mounts_by_host(
    mounts: &[VirtualMountInfo],
    uid: u32,
    excluded: Option<&str>,
) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for mount in mounts {
        if mount.is_udisks_backed() {
            continue;
        }
        let path = resolve_mount_path(mount, uid);
        if !is_smb_path(&path) || excluded == Some(path.as_str()) {
            continue;
        }
        *counts.entry(uri_host(mount.uri())).or_default() += 1;
    }
    counts
}

async fn watch_device(
    block: &dyn BlockDeviceProvider,
    active: &mut ActiveWatch,
    path: &str,
    identifier: &str,
    owner: &str,
    fields: &[PropertyField],
    encrypted_shell: bool,
) {
    if let Some(existing) = active.device_watches.get_mut(path) {
        for field in fields {
            if !existing.fields.contains(field) {
                existing.fields.push(*field);
            }
        }
        return;
    }

    match block.watch_properties(path, active.sink.clone()).await {
        Ok(subscription) => {
            active.device_watches.insert(
                path.to_string(),
                DeviceWatch {
                    subscription,
                    identifier: identifier.to_string(),
                    fields: fields.to_vec(),
                    owner: owner.to_string(),
                    encrypted_shell,
                },
            );
        }
        Err(e) => warn!(path, "failed to watch device properties: {e}"),
    }
}
