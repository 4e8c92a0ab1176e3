// SPDX-License-Identifier: GPL-3.0-only

//! Location of the GVfs FUSE bridge.

use std::path::{Path, PathBuf};

use tracing::debug;

const GVFS_FUSE_FS_TYPE: &str = "fuse.gvfsd-fuse";

pub fn gvfs_dir(uid: u32) -> PathBuf {
    PathBuf::from(format!("/run/user/{uid}/gvfs"))
}

/// The FUSE bridge directory when it is mounted for `uid`.
///
/// Daemon mounts only have local paths while the bridge is up.
pub fn fuse_root(uid: u32) -> Option<PathBuf> {
    let mounts = match procfs::process::Process::myself().and_then(|me| me.mountinfo()) {
        Ok(mounts) => mounts,
        Err(e) => {
            debug!("cannot read mount table: {e}");
            return None;
        }
    };
    let expected = gvfs_dir(uid);
    find_fuse_root(
        mounts
            .into_iter()
            .map(|mount| (mount.mount_point, mount.fs_type)),
        &expected,
    )
}

fn find_fuse_root(
    mounts: impl IntoIterator<Item = (PathBuf, String)>,
    expected: &Path,
) -> Option<PathBuf> {
    mounts
        .into_iter()
        .find(|(mount_point, fs_type)| fs_type == GVFS_FUSE_FS_TYPE && mount_point == expected)
        .map(|(mount_point, _)| mount_point)
}
