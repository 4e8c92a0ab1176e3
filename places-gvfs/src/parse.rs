// SPDX-License-Identifier: GPL-3.0-only

//! Parsers for `gio mount -li` and `gio info` output.
//!
//! `gio mount -li` prints an indented tree of drives, volumes and mounts:
//!
//! ```text
//! Volume(0): Phone
//!   Type: GProxyVolume (GProxyVolumeMonitorMTP)
//!   activation_root=mtp://Phone_1234/
//!   Mount(0): Phone -> mtp://Phone_1234/
//!     Type: GProxyMount (GProxyVolumeMonitorMTP)
//! Mount(1): media on nas -> smb://nas/media/
//!   Type: GDaemonMount
//! ```
//!
//! Mounts nested under a volume belong to it; top-level mounts have none.

use places_types::{VirtualMountInfo, VirtualVolumeInfo};

/// One parsed listing. Mount root paths are not part of the listing and are
/// left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountListing {
    pub volumes: Vec<VirtualVolumeInfo>,
    pub mounts: Vec<VirtualMountInfo>,
}

enum Current {
    None,
    Volume { index: usize, indent: usize },
    Mount { index: usize },
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Split `Kind(N): rest` into `rest` when the line starts with `kind`.
fn header<'a>(line: &'a str, kind: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(kind)?.strip_prefix('(')?;
    let (index, rest) = rest.split_once("):")?;
    index.parse::<usize>().ok()?;
    Some(rest.trim())
}

/// `Type: GProxyVolume (GProxyVolumeMonitorMTP)` → class and monitor.
fn type_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("Type:")?.trim();
    match rest.split_once('(') {
        Some((class, monitor)) => Some((class.trim(), monitor.trim_end_matches(')').trim())),
        None => Some((rest, "")),
    }
}

pub fn parse_mount_listing(output: &str) -> MountListing {
    let mut listing = MountListing::default();
    let mut owners: Vec<Option<usize>> = Vec::new();
    let mut current = Current::None;
    // Innermost volume still open, with its indentation
    let mut open_volume: Option<(usize, usize)> = None;

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);
        let text = line.trim();

        if let Some((_, volume_indent)) = open_volume
            && indent <= volume_indent
        {
            open_volume = None;
        }

        if let Some(name) = header(text, "Volume") {
            listing.volumes.push(VirtualVolumeInfo {
                name: name.to_string(),
                ..Default::default()
            });
            let index = listing.volumes.len() - 1;
            open_volume = Some((index, indent));
            current = Current::Volume { index, indent };
            continue;
        }

        if let Some(rest) = header(text, "Mount") {
            let (name, uri) = match rest.split_once(" -> ") {
                Some((name, uri)) => (name.trim(), Some(uri.trim().to_string())),
                None => (rest, None),
            };
            if let Some((volume, _)) = open_volume {
                listing.volumes[volume].mounted = true;
            }
            listing.mounts.push(VirtualMountInfo {
                name: name.to_string(),
                root_uri: uri.filter(|uri| !uri.is_empty()),
                ..Default::default()
            });
            owners.push(open_volume.map(|(volume, _)| volume));
            current = Current::Mount {
                index: listing.mounts.len() - 1,
            };
            continue;
        }

        if header(text, "Drive").is_some() {
            current = Current::None;
            continue;
        }

        match current {
            Current::Volume { index, indent: volume_indent } if indent > volume_indent => {
                let volume = &mut listing.volumes[index];
                if let Some((_, monitor)) = type_line(text) {
                    volume.monitor_name = monitor.to_string();
                } else if let Some(root) = text.strip_prefix("activation_root=") {
                    volume.activation_root = root.trim().to_string();
                }
            }
            Current::Mount { index } => {
                if let Some((class, _)) = type_line(text) {
                    listing.mounts[index].mount_class = class.to_string();
                }
            }
            _ => {}
        }
    }

    for (mount, owner) in listing.mounts.iter_mut().zip(owners) {
        mount.volume = owner.and_then(|index| listing.volumes.get(index).cloned());
    }

    listing
}

/// `local path:` line of `gio info`, if the location has one.
pub fn parse_local_path(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("local path:"))
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
}
