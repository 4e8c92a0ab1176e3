// SPDX-License-Identifier: GPL-3.0-only

//! Wrapper around the `gio` command line tool.
//!
//! Every call blocks on a child process; async callers go through
//! `spawn_blocking`.

use std::path::{Path, PathBuf};

use places_types::VirtualMountInfo;
use tracing::{debug, info};
use url::Url;
use which::which;

use crate::error::GvfsError;
use crate::fuse::fuse_root;
use crate::parse::{MountListing, parse_local_path, parse_mount_listing};

#[derive(Debug, Clone)]
pub struct GioCli {
    binary: PathBuf,
}

impl GioCli {
    /// Find `gio` in PATH.
    pub fn locate() -> Result<Self, GvfsError> {
        let binary = which("gio").map_err(|_| GvfsError::GioNotFound)?;
        info!("Found gio binary at {:?}", binary);
        Ok(Self { binary })
    }

    fn run(&self, args: &[&str]) -> Result<String, GvfsError> {
        let output = duct::cmd(self.binary.as_path(), args.iter().copied())
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()?;

        if !output.status.success() {
            return Err(GvfsError::CommandFailed {
                command: format!("gio {}", args.join(" ")),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Current volumes and mounts with mount root paths filled in.
    pub fn listing(&self, uid: u32) -> Result<MountListing, GvfsError> {
        let mut listing = parse_mount_listing(&self.run(&["mount", "-li"])?);
        let bridge = fuse_root(uid);
        for mount in &mut listing.mounts {
            mount.root_path = self.root_path(mount, bridge.as_deref());
        }
        Ok(listing)
    }

    /// Local path of a mount root; daemon mounts need the FUSE bridge.
    fn root_path(&self, mount: &VirtualMountInfo, bridge: Option<&Path>) -> String {
        let uri = mount.uri();
        if uri.is_empty() {
            return String::new();
        }
        if let Some(path) = file_uri_path(uri) {
            return path;
        }
        let Some(bridge) = bridge else {
            return String::new();
        };

        match self.run(&["info", "-a", "standard::type", uri]) {
            Ok(output) => parse_local_path(&output)
                .filter(|path| Path::new(path).starts_with(bridge))
                .unwrap_or_default(),
            Err(e) => {
                debug!(uri, "no local path: {e}");
                String::new()
            }
        }
    }

    pub fn mount(&self, location: &str) -> Result<(), GvfsError> {
        info!(location, "mounting");
        self.run(&["mount", location]).map(|_| ())
    }

    pub fn unmount(&self, location: &str) -> Result<(), GvfsError> {
        info!(location, "unmounting");
        self.run(&["mount", "-u", location]).map(|_| ())
    }
}

fn file_uri_path(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path()
        .ok()
        .map(|path| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_uris_resolve_without_gio() {
        assert_eq!(
            file_uri_path("file:///run/media/user/My%20Disk").as_deref(),
            Some("/run/media/user/My Disk")
        );
        assert_eq!(file_uri_path("smb://nas/media/"), None);
        assert_eq!(file_uri_path("not a uri"), None);
    }
}
