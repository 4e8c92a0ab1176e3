// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use places_types::{DeviceEntry, EntryKind, SuffixTag, UserDirKind, make_identifier};

/// Locations of the fixed user-directory shortcuts.
#[derive(Debug, Clone, Default)]
pub struct UserDirs {
    dirs: Vec<(UserDirKind, PathBuf)>,
}

impl UserDirs {
    /// Resolve through the XDG user directories of the current user.
    pub fn from_environment() -> Self {
        let dirs = UserDirKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let path = match kind {
                    UserDirKind::Desktop => dirs::desktop_dir(),
                    UserDirKind::Videos => dirs::video_dir(),
                    UserDirKind::Music => dirs::audio_dir(),
                    UserDirKind::Pictures => dirs::picture_dir(),
                    UserDirKind::Documents => dirs::document_dir(),
                    UserDirKind::Downloads => dirs::download_dir(),
                };
                path.map(|path| (kind, path))
            })
            .collect();
        Self { dirs }
    }

    pub fn from_paths(dirs: impl IntoIterator<Item = (UserDirKind, PathBuf)>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
        }
    }

    pub fn path(&self, kind: UserDirKind) -> Option<&Path> {
        self.dirs
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, path)| path.as_path())
    }

    /// Entries for directories that exist, in fixed shortcut order.
    pub fn entries(&self) -> Vec<DeviceEntry> {
        UserDirKind::ALL
            .into_iter()
            .filter_map(|kind| self.entry(kind))
            .collect()
    }

    pub fn entry(&self, kind: UserDirKind) -> Option<DeviceEntry> {
        let path = self.path(kind).filter(|path| path.is_dir())?;
        Some(DeviceEntry {
            identifier: make_identifier(kind.key(), SuffixTag::UserDir),
            kind: EntryKind::UserDir { dir: kind },
            backend_ref: path.to_string_lossy().into_owned(),
            display_name: kind.title().to_string(),
        })
    }
}
