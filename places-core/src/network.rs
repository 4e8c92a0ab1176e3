// SPDX-License-Identifier: GPL-3.0-only

//! Cached network browsing nodes.

use std::collections::BTreeMap;
use std::sync::Mutex;

use places_types::decode_component;
use url::Url;

/// Discovered network nodes keyed by URL. Dropping a key forces the next
/// browse of that location to rediscover it.
#[derive(Debug, Default)]
pub struct NetworkNodeCache {
    nodes: Mutex<BTreeMap<String, Vec<String>>>,
}

impl NetworkNodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, children: Vec<String>) {
        self.lock().insert(key.into(), children);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Drop every node at or below an unmounted location, plus its host root.
    /// Comparison is case-insensitive. Returns the number of nodes removed.
    pub fn purge_unmounted(&self, uri: &str) -> usize {
        let decoded = decode_component(uri);
        let target = decoded.trim_end_matches('/').to_lowercase();
        if target.is_empty() {
            return 0;
        }

        let host_root = Url::parse(&decoded).ok().and_then(|mut url| {
            url.set_path("");
            url.set_query(None);
            url.set_fragment(None);
            url.host_str()?;
            Some(url.as_str().trim_end_matches('/').to_lowercase())
        });

        let mut nodes = self.lock();
        let before = nodes.len();
        nodes.retain(|key, _| {
            let key = key.to_lowercase();
            if key.starts_with(&target) {
                return false;
            }
            host_root
                .as_deref()
                .is_none_or(|root| key.trim_end_matches('/') != root)
        });
        before - nodes.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<String>>> {
        self.nodes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
