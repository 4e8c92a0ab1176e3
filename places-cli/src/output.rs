// SPDX-License-Identifier: GPL-3.0-only

//! Human readable rendering of entries and notifications.

use places_types::{
    DeviceEntry, EntryEvent, EntryKind, Notification, ShellRequest, bytes_to_pretty,
};

fn kind_label(kind: &EntryKind) -> &'static str {
    match kind {
        EntryKind::UserDir { .. } => "dir",
        EntryKind::BlockDevice(_) => "disk",
        EntryKind::VirtualMount { .. } => "mount",
        EntryKind::StashedRemote { .. } => "remote",
    }
}

fn detail(entry: &DeviceEntry) -> String {
    match &entry.kind {
        EntryKind::UserDir { dir } => dir.key().to_string(),
        EntryKind::BlockDevice(block) => {
            let mut parts = vec![block.device.clone(), bytes_to_pretty(&block.size, false)];
            if let Some(mount_point) = block.mount_points.first() {
                parts.push(format!("at {mount_point}"));
            }
            if block.alias_capable {
                parts.push("alias".to_string());
            }
            parts.join(", ")
        }
        EntryKind::VirtualMount { uri, .. } => uri.clone(),
        EntryKind::StashedRemote { protocol, host, share } => {
            format!("{protocol}://{host}/{share} (offline)")
        }
    }
}

pub(crate) fn entry_line(entry: &DeviceEntry) -> String {
    format!(
        "{:<6} {:<24} {}  [{}]",
        kind_label(&entry.kind),
        entry.display_name,
        detail(entry),
        entry.identifier
    )
}

pub(crate) fn notification_line(notification: &Notification) -> String {
    match notification {
        Notification::Entry(EntryEvent::Created(id)) => format!("created  {id}"),
        Notification::Entry(EntryEvent::Removed(id)) => format!("removed  {id}"),
        Notification::Entry(EntryEvent::AttributeChanged(id)) => format!("changed  {id}"),
        Notification::Shell(ShellRequest::RemoveRecentFile(path)) => format!("forget   {path}"),
        Notification::Shell(ShellRequest::RefreshFileViews) => "refresh  file views".to_string(),
        Notification::Shell(ShellRequest::RefreshDesktop) => "refresh  desktop".to_string(),
        Notification::Shell(ShellRequest::ShowNewWindows) => "show     new windows".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use places_types::BlockEntry;

    #[test]
    fn block_entry_line_shows_device_size_and_mount() {
        let entry = DeviceEntry {
            identifier: "devices:///sda1.localdisk".to_string(),
            kind: EntryKind::BlockDevice(BlockEntry {
                device: "/dev/sda1".to_string(),
                uuid: "1234".to_string(),
                volume_name: "Data".to_string(),
                alias_capable: true,
                renamable: true,
                mount_points: vec!["/mnt/data".to_string()],
                size: 2 * 1024 * 1024 * 1024,
            }),
            backend_ref: "/org/freedesktop/UDisks2/block_devices/sda1".to_string(),
            display_name: "Data".to_string(),
        };
        let line = entry_line(&entry);
        assert!(line.starts_with("disk"));
        assert!(line.contains("/dev/sda1, 2.00 GB, at /mnt/data, alias"));
        assert!(line.ends_with("[devices:///sda1.localdisk]"));
    }

    #[test]
    fn notifications_render_one_line_each() {
        assert_eq!(
            notification_line(&Notification::Entry(EntryEvent::Removed(
                "devices:///loop3.localdisk".to_string()
            ))),
            "removed  devices:///loop3.localdisk"
        );
        assert_eq!(
            notification_line(&Notification::Shell(ShellRequest::RefreshDesktop)),
            "refresh  desktop"
        );
    }
}
