// SPDX-License-Identifier: GPL-3.0-only

//! Mount root paths of virtual mounts.

use places_types::VirtualMountInfo;
use url::Url;

const NETWORK_URI_MARKERS: [&str; 4] = ["smb-share://", "smb://", "ftp://", "sftp://"];

fn gvfs_root(uid: u32) -> String {
    format!("/run/user/{uid}/gvfs/")
}

/// Rebuild the FUSE path of a mount that reports a URI but no local path.
///
/// The result must equal the path the mount had when it was added, since
/// add and remove events are correlated through the identifier built from it.
/// Returns an empty string when the URI has too few components.
pub fn reconstruct_mount_path(uri: &str, uid: u32) -> String {
    let flattened = uri.replace('/', "");
    let tokens: Vec<&str> = flattened.split(':').collect();

    match tokens.as_slice() {
        [scheme, host, port, ..] => {
            let host = host.strip_prefix("host=").unwrap_or(host);
            let port = port.strip_prefix("port=").unwrap_or(port);
            format!("{}{scheme}:host={host},port={port}", gvfs_root(uid))
        }
        [scheme, _] if scheme.starts_with("smb") => {
            let stripped = uri.replace(":/", "");
            let segments: Vec<&str> = stripped.split('/').collect();
            match segments.as_slice() {
                [scheme, server, share, ..] => format!(
                    "{}{scheme}-share:server={server},share={share}",
                    gvfs_root(uid)
                ),
                _ => String::new(),
            }
        }
        [scheme, host] => {
            let host = host.strip_prefix("host=").unwrap_or(host);
            format!("{}{scheme}:host={host}", gvfs_root(uid))
        }
        _ => String::new(),
    }
}

/// Root path of a mount, reconstructed from its URI when the backend left it empty.
pub fn resolve_mount_path(mount: &VirtualMountInfo, uid: u32) -> String {
    if !mount.root_path.is_empty() {
        return mount.root_path.clone();
    }
    reconstruct_mount_path(mount.uri(), uid)
}

pub fn is_smb_path(path: &str) -> bool {
    path.contains("/gvfs/smb-share:") || path.starts_with("smb://") || path.starts_with("smb-share://")
}

pub fn is_network_uri(uri: &str) -> bool {
    NETWORK_URI_MARKERS.iter().any(|marker| uri.contains(marker))
}

/// Lowercased host of a URI, empty when it has none.
pub fn uri_host(uri: &str) -> String {
    Url::parse(uri)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}
