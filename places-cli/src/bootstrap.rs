// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use places_contracts::PolicySource;
use places_core::{Backends, DeviceContext, FilePolicySource, JsonSettingsStore};
use places_gvfs::GvfsProvider;
use places_udisks::UdisksProvider;
use tracing::{info, warn};

use crate::config::Config;

/// Connect both providers and open the settings and policy files.
pub(crate) async fn backends(config: &Config) -> Result<Backends> {
    let uid = nix::unistd::getuid().as_raw();

    let block = UdisksProvider::new()
        .await
        .context("connecting to UDisks2")?;
    let mounts = GvfsProvider::new(uid)
        .context("initializing GVfs provider")?
        .with_poll_interval(Duration::from_millis(config.poll_interval_ms.max(100)));
    let settings = JsonSettingsStore::open(&config.settings_path)
        .with_context(|| format!("opening settings {}", config.settings_path.display()))?;

    let mut backends = Backends::new(Arc::new(block), Arc::new(mounts), Arc::new(settings), uid);
    if let Some(policy) = policy_source(config) {
        backends = backends.with_policy(policy);
    }

    info!(uid, settings = %config.settings_path.display(), "backends ready");
    Ok(backends)
}

fn policy_source(config: &Config) -> Option<Arc<dyn PolicySource>> {
    let path = config.policy_path.as_deref()?;
    if !path.exists() {
        return None;
    }
    match FilePolicySource::load(path) {
        Ok(policy) => Some(Arc::new(policy)),
        Err(e) => {
            warn!(path = %path.display(), "ignoring policy file: {e}");
            None
        }
    }
}

pub(crate) fn context() -> Arc<DeviceContext> {
    Arc::new(DeviceContext::new())
}
