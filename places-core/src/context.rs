// SPDX-License-Identifier: GPL-3.0-only

use crate::disk_info::DiskInfoTable;
use crate::listener::DeviceListener;
use crate::network::NetworkNodeCache;

/// Process-wide device state, created once at startup and shared between the
/// registry and the watcher.
#[derive(Debug, Default)]
pub struct DeviceContext {
    pub listener: DeviceListener,
    pub network_nodes: NetworkNodeCache,
    pub disk_info: DiskInfoTable,
}

impl DeviceContext {
    pub fn new() -> Self {
        Self::default()
    }
}
