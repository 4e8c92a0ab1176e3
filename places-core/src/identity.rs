// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashSet;

/// Keys emitted during one listing pass.
#[derive(Debug, Default)]
pub struct EmittedKeys {
    keys: HashSet<String>,
}

impl EmittedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; returns false if it was already emitted in this pass.
    pub fn insert(&mut self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
