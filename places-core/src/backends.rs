// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use places_contracts::{BlockDeviceProvider, PolicySource, SettingsStore, VirtualMountProvider};

/// The collaborators the engine talks to, bundled for injection.
#[derive(Clone)]
pub struct Backends {
    pub block: Arc<dyn BlockDeviceProvider>,
    pub mounts: Arc<dyn VirtualMountProvider>,
    pub settings: Arc<dyn SettingsStore>,
    pub policy: Option<Arc<dyn PolicySource>>,
    /// Uid whose FUSE mount directory is used to reconstruct mount paths
    pub uid: u32,
}

impl Backends {
    pub fn new(
        block: Arc<dyn BlockDeviceProvider>,
        mounts: Arc<dyn VirtualMountProvider>,
        settings: Arc<dyn SettingsStore>,
        uid: u32,
    ) -> Self {
        Self {
            block,
            mounts,
            settings,
            policy: None,
            uid,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicySource>) -> Self {
        self.policy = Some(policy);
        self
    }
}
