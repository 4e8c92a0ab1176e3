// SPDX-License-Identifier: GPL-3.0-only

//! Device state shared by the registry and the watcher.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

fn normalize(path: &str) -> String {
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}

#[derive(Debug, Default)]
pub struct DeviceListener {
    hidden_dirs: Mutex<BTreeSet<String>>,
    /// Mount points of visible block devices, keyed by block object path
    native_mounts: Mutex<HashMap<String, Vec<String>>>,
    smb_mounts: Mutex<HashMap<String, usize>>,
    batch_removing_smb: AtomicBool,
}

impl DeviceListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_hidden_dir(&self, path: impl Into<String>) {
        lock(&self.hidden_dirs).insert(path.into());
    }

    pub fn hidden_dirs(&self) -> Vec<String> {
        lock(&self.hidden_dirs).iter().cloned().collect()
    }

    pub fn is_hidden(&self, path: &str) -> bool {
        lock(&self.hidden_dirs).contains(path)
    }

    /// Hide `root` and `lost+found` under the primary mount of an internal disk.
    pub fn hide_system_dirs(&self, mount_point: &str) {
        let base = if mount_point.ends_with('/') {
            mount_point.to_string()
        } else {
            format!("{mount_point}/")
        };
        self.append_hidden_dir(format!("{base}root"));
        self.append_hidden_dir(format!("{base}lost+found"));
    }

    /// Record the current mount points of one block device, replacing
    /// whatever was known for it before.
    pub fn set_native_mounts(&self, device: &str, mount_points: &[String]) {
        let mut native = lock(&self.native_mounts);
        if mount_points.is_empty() {
            native.remove(device);
        } else {
            native.insert(
                device.to_string(),
                mount_points.iter().map(|mp| normalize(mp)).collect(),
            );
        }
    }

    pub fn forget_native_mounts(&self, device: &str) {
        lock(&self.native_mounts).remove(device);
    }

    /// Replace every known native mount with a fresh enumeration.
    pub fn replace_native_mounts<I>(&self, devices: I)
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let fresh = devices
            .into_iter()
            .filter(|(_, mount_points)| !mount_points.is_empty())
            .map(|(device, mount_points)| {
                let mount_points: Vec<String> =
                    mount_points.iter().map(|mp| normalize(mp)).collect();
                (device, mount_points)
            })
            .collect();
        *lock(&self.native_mounts) = fresh;
    }

    pub fn is_from_native_block_device(&self, path: &str) -> bool {
        let path = normalize(path);
        lock(&self.native_mounts)
            .values()
            .any(|mount_points| mount_points.contains(&path))
    }

    /// Replace the per-host SMB mount counts.
    pub fn reset_smb_mounts(&self, counts: HashMap<String, usize>) {
        *lock(&self.smb_mounts) = counts;
    }

    pub fn set_smb_mount_count(&self, host: &str, count: usize) {
        let mut mounts = lock(&self.smb_mounts);
        if count == 0 {
            mounts.remove(host);
        } else {
            mounts.insert(host.to_string(), count);
        }
    }

    pub fn smb_mount_added(&self, host: &str) {
        *lock(&self.smb_mounts).entry(host.to_string()).or_default() += 1;
    }

    pub fn smb_mount_removed(&self, host: &str) {
        let mut mounts = lock(&self.smb_mounts);
        if let Some(count) = mounts.get_mut(host) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                mounts.remove(host);
            }
        }
    }

    pub fn smb_mount_count(&self, host: &str) -> usize {
        lock(&self.smb_mounts).get(host).copied().unwrap_or(0)
    }

    pub fn set_batch_removing_smb(&self, active: bool) {
        self.batch_removing_smb.store(active, Ordering::Relaxed);
    }

    pub fn is_batch_removing_smb(&self) -> bool {
        self.batch_removing_smb.load(Ordering::Relaxed)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
