// SPDX-License-Identifier: GPL-3.0-only

//! Aggregated listing of browsable locations.

use std::sync::Arc;

use places_types::{
    BlockDeviceInfo, BlockEntry, DeviceEntry, DriveInfo, EntryEvent, EntryKind, Notification,
    SuffixTag, UserDirKind, VirtualMountInfo, block_identifier, is_aggregation_root,
    make_identifier, parse_identifier,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::alias::{AliasChange, AliasStore};
use crate::backends::Backends;
use crate::context::DeviceContext;
use crate::devices::{cleartext_for, drive_for, mount_skip_reason, rename_capabilities};
use crate::filter::should_hide;
use crate::identity::EmittedKeys;
use crate::mount_path::resolve_mount_path;
use crate::naming::{display_name, volume_name};
use crate::policy::SystemDiskPolicy;
use crate::preferences::Preferences;
use crate::stash::StashedRemoteCache;
use crate::user_dirs::UserDirs;
use crate::PlacesError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Stop after block devices (no virtual mounts or stashed remotes)
    pub block_only: bool,
    /// smb integration mode is active in the surrounding shell
    pub smb_integration: bool,
}

pub struct DeviceRegistry {
    backends: Backends,
    context: Arc<DeviceContext>,
    aliases: AliasStore,
    stash: StashedRemoteCache,
    preferences: Preferences,
    user_dirs: UserDirs,
    notifier: Option<mpsc::UnboundedSender<Notification>>,
}

impl DeviceRegistry {
    pub fn new(backends: Backends, context: Arc<DeviceContext>) -> Self {
        let settings = backends.settings.clone();
        Self {
            backends,
            context,
            aliases: AliasStore::new(settings.clone()),
            stash: StashedRemoteCache::new(settings.clone()),
            preferences: Preferences::new(settings),
            user_dirs: UserDirs::from_environment(),
            notifier: None,
        }
    }

    pub fn with_user_dirs(mut self, user_dirs: UserDirs) -> Self {
        self.user_dirs = user_dirs;
        self
    }

    /// Channel that receives attribute changes caused by alias edits.
    pub fn with_notifier(mut self, notifier: mpsc::UnboundedSender<Notification>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn aliases(&self) -> &AliasStore {
        &self.aliases
    }

    pub fn stash(&self) -> &StashedRemoteCache {
        &self.stash
    }

    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.context
    }

    /// Every entry under `root`, in emission order: user directories, block
    /// devices, virtual mounts, then offline remotes.
    ///
    /// Returns nothing for any root other than the aggregation root. Backend
    /// failures are logged and the affected group is left out.
    pub async fn list_entries(&self, root: &str, options: ListOptions) -> Vec<DeviceEntry> {
        if !is_aggregation_root(root) {
            debug!(root, "not the aggregation root");
            return Vec::new();
        }

        let mut entries = self.user_dirs.entries();

        let policy = SystemDiskPolicy::load(self.backends.policy.as_deref());
        let system_uuids = self.list_block_entries(&policy, &mut entries).await;

        self.auto_mount_volumes().await;

        if !options.block_only {
            let mut mounted = EmittedKeys::new();
            self.list_mount_entries(&mut mounted, &mut entries).await;

            if self.preferences.always_show_offline_remotes() {
                entries.extend(self.stash.offline_entries(&mounted, options.smb_integration));
            }
        }

        self.reconcile_policy(&policy, &system_uuids);

        info!(count = entries.len(), "listed device entries");
        entries
    }

    /// Emits block device entries and returns the UUIDs of visible
    /// system-hinted devices.
    async fn list_block_entries(
        &self,
        policy: &SystemDiskPolicy,
        entries: &mut Vec<DeviceEntry>,
    ) -> Vec<String> {
        let mut system_uuids = Vec::new();
        let hide_system = self.preferences.hide_system_partitions();

        let visible = self.visible_block_devices().await;
        self.context.listener.replace_native_mounts(
            visible
                .iter()
                .map(|(info, _)| (info.path.clone(), info.mount_points.clone())),
        );

        for (info, drive) in visible {
            if let Some(mount_point) = info.mount_points.first() {
                self.context.disk_info.reload_from_mount(mount_point);
            }

            if info.hint_system {
                if policy.hides(&info.id_uuid) {
                    debug!(device = %info.device, "hidden by central policy");
                    continue;
                }
                system_uuids.push(info.id_uuid.clone());
                if !policy.is_active() && hide_system {
                    debug!(device = %info.device, "hidden system partition");
                    continue;
                }
            }

            entries.push(self.block_entry(&info, &drive).await);
        }

        system_uuids
    }

    async fn visible_block_devices(&self) -> Vec<(BlockDeviceInfo, DriveInfo)> {
        let block = self.backends.block.as_ref();
        let paths = match block.block_device_paths().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!("failed to enumerate block devices: {e}");
                return Vec::new();
            }
        };

        let hide_loop = self.preferences.hide_loop_partitions();
        let mut visible = Vec::new();
        for path in paths {
            let info = match block.block_device(&path).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(path, "failed to read block device: {e}");
                    continue;
                }
            };
            let drive = drive_for(block, &info).await;
            if !should_hide(&info, &drive, hide_loop) {
                visible.push((info, drive));
            }
        }
        visible
    }

    async fn block_entry(&self, info: &BlockDeviceInfo, drive: &DriveInfo) -> DeviceEntry {
        let cleartext = cleartext_for(self.backends.block.as_ref(), info).await;
        let volume_name = volume_name(info, cleartext.as_ref(), &self.context.disk_info);
        let (alias_capable, renamable) = rename_capabilities(info, drive);
        let alias = alias_capable
            .then(|| self.aliases.alias_for(&info.id_uuid))
            .flatten();
        let mount_points = cleartext
            .as_ref()
            .map(|ct| ct.mount_points.clone())
            .unwrap_or_else(|| info.mount_points.clone());

        DeviceEntry {
            identifier: block_identifier(&info.device),
            kind: EntryKind::BlockDevice(BlockEntry {
                device: info.device.clone(),
                uuid: info.id_uuid.clone(),
                volume_name: volume_name.clone(),
                alias_capable,
                renamable,
                mount_points,
                size: info.size,
            }),
            backend_ref: info.path.clone(),
            display_name: display_name(alias, volume_name),
        }
    }

    async fn auto_mount_volumes(&self) {
        let volumes = match self.backends.mounts.volumes().await {
            Ok(volumes) => volumes,
            Err(e) => {
                warn!("failed to enumerate volumes: {e}");
                return;
            }
        };

        for volume in volumes
            .iter()
            .filter(|volume| volume.needs_auto_mount() && !volume.mounted)
        {
            info!(volume = %volume.name, "auto-mounting volume");
            if let Err(e) = self.backends.mounts.mount_volume(volume).await {
                warn!(volume = %volume.name, "auto-mount failed: {e}");
            }
        }
    }

    async fn list_mount_entries(&self, mounted: &mut EmittedKeys, entries: &mut Vec<DeviceEntry>) {
        let mounts = match self.backends.mounts.mounts().await {
            Ok(mounts) => mounts,
            Err(e) => {
                warn!("failed to enumerate virtual mounts: {e}");
                return;
            }
        };

        for mount in mounts {
            if mount_skip_reason(&mount, &self.context.listener).is_some() {
                continue;
            }
            let entry = mount_entry(&mount, mount.root_path.clone());
            if !mounted.insert(&entry.identifier) {
                debug!(identifier = %entry.identifier, "duplicate virtual mount");
                continue;
            }
            entries.push(entry);
        }
    }

    fn reconcile_policy(&self, policy: &SystemDiskPolicy, system_uuids: &[String]) {
        let Some(hide) = policy.mirrored_preference(system_uuids) else {
            return;
        };
        if let Err(e) = self.preferences.set_hide_system_partitions(hide) {
            warn!("failed to mirror system disk policy: {e}");
        }
    }

    /// UUIDs of visible block devices carrying the system hint.
    pub async fn system_disk_uuids(&self) -> Vec<String> {
        self.visible_block_devices()
            .await
            .into_iter()
            .filter(|(info, _)| info.hint_system)
            .map(|(info, _)| info.id_uuid)
            .collect()
    }

    /// Resolve an identifier to a fresh entry.
    pub async fn entry(&self, identifier: &str) -> Option<DeviceEntry> {
        let (component, tag) = parse_identifier(identifier)?;
        match tag {
            SuffixTag::UserDir => self.user_dirs.entry(UserDirKind::from_key(&component)?),
            SuffixTag::BlockDevice => {
                let (info, drive) = self.find_block_device(&component).await?;
                Some(self.block_entry(&info, &drive).await)
            }
            SuffixTag::VirtualMount => {
                let mounts = self.backends.mounts.mounts().await.ok()?;
                mounts
                    .iter()
                    .find(|mount| resolve_mount_path(mount, self.backends.uid) == component)
                    .map(|mount| mount_entry(mount, component.clone()))
            }
            SuffixTag::StashedRemote => {
                self.stash.find(&component).map(|record| {
                    let display = if record.share.is_empty() {
                        record.host.clone()
                    } else {
                        record.share.clone()
                    };
                    DeviceEntry {
                        identifier: identifier.to_string(),
                        backend_ref: component.clone(),
                        display_name: display,
                        kind: EntryKind::StashedRemote {
                            protocol: record.protocol,
                            host: record.host,
                            share: record.share,
                        },
                    }
                })
            }
        }
    }

    /// Re-read the sidecar disk info of a block device and resolve it again.
    pub async fn reload(&self, identifier: &str) -> Option<DeviceEntry> {
        let (component, tag) = parse_identifier(identifier)?;
        if tag == SuffixTag::BlockDevice
            && let Some((info, _)) = self.find_block_device(&component).await
            && let Some(mount_point) = info.mount_points.first()
        {
            self.context.disk_info.reload_from_mount(mount_point);
        }
        self.entry(identifier).await
    }

    async fn find_block_device(&self, name: &str) -> Option<(BlockDeviceInfo, DriveInfo)> {
        let block = self.backends.block.as_ref();
        let paths = block.block_device_paths().await.ok()?;
        for path in paths {
            let Ok(info) = block.block_device(&path).await else {
                continue;
            };
            if info.device_name() == name {
                let drive = drive_for(block, &info).await;
                return Some((info, drive));
            }
        }
        None
    }

    /// Store or clear the alias of an alias-capable entry.
    pub fn set_alias(&self, entry: &DeviceEntry, alias: &str) -> Result<AliasChange, PlacesError> {
        let block = entry
            .block()
            .filter(|block| block.alias_capable)
            .ok_or_else(|| PlacesError::NotRenamable(entry.identifier.clone()))?;
        if block.uuid.is_empty() {
            return Err(PlacesError::MissingUuid(entry.identifier.clone()));
        }

        let change = self
            .aliases
            .set_alias(&block.uuid, &block.volume_name, alias)?;
        if change.is_mutation() {
            self.notify(EntryEvent::AttributeChanged(entry.identifier.clone()));
        }
        Ok(change)
    }

    /// Rename an entry: through an alias for internal disks, by relabelling the
    /// filesystem otherwise.
    pub async fn rename(&self, entry: &DeviceEntry, name: &str) -> Result<(), PlacesError> {
        if !entry.can_rename() {
            return Err(PlacesError::NotRenamable(entry.identifier.clone()));
        }
        if entry.can_set_alias() {
            return self.set_alias(entry, name).map(|_| ());
        }

        let Some(block) = entry.block() else {
            return Err(PlacesError::NotRenamable(entry.identifier.clone()));
        };
        if block.volume_name == name {
            return Ok(());
        }

        if !block.mount_points.is_empty() {
            self.backends
                .block
                .unmount(&entry.backend_ref, false)
                .await
                .inspect_err(|e| warn!(device = %block.device, "unmount before rename failed: {e}"))?;
        }

        self.backends
            .block
            .set_label(&entry.backend_ref, name)
            .await
            .inspect_err(|e| warn!(device = %block.device, "set label failed: {e}"))?;
        info!(device = %block.device, name, "relabelled filesystem");
        Ok(())
    }

    fn notify(&self, event: EntryEvent) {
        if let Some(notifier) = &self.notifier
            && notifier.send(Notification::Entry(event)).is_err()
        {
            debug!("no listener for entry notifications");
        }
    }
}

fn mount_entry(mount: &VirtualMountInfo, path: String) -> DeviceEntry {
    let display_name = if mount.name.is_empty() {
        path.rsplit('/').next().unwrap_or_default().to_string()
    } else {
        mount.name.clone()
    };
    DeviceEntry {
        identifier: make_identifier(&path, SuffixTag::VirtualMount),
        kind: EntryKind::VirtualMount {
            mount_class: mount.mount_class.clone(),
            uri: mount.uri().to_string(),
        },
        backend_ref: path,
        display_name,
    }
}
