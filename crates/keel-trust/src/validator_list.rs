//! Permanently trusted validator keys
//!
//! Keys placed here by static configuration are trusted independently of any
//! manifest. The manifest cache removes a key from this list once it accepts
//! the key's first manifest and takes over trust responsibility for it.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use keel_core::PublicKey;

/// Statically configured permanent trust entries
#[derive(Default)]
pub struct ValidatorList {
    entries: RwLock<HashMap<PublicKey, String>>,
}

impl ValidatorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permanently trusted key.
    ///
    /// Returns false if the key is already present; the existing comment is
    /// kept.
    pub fn insert_permanent_key(&self, master_key: PublicKey, comment: &str) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&master_key) {
            return false;
        }
        entries.insert(master_key, comment.to_string());
        true
    }

    /// Membership test
    pub fn trusted(&self, master_key: &PublicKey) -> bool {
        self.entries.read().contains_key(master_key)
    }

    /// Remove a key, returning its comment.
    ///
    /// Called by the manifest cache when it migrates the key into manifest
    /// trust.
    pub fn remove_permanent_key(&self, master_key: &PublicKey) -> Option<String> {
        let removed = self.entries.write().remove(master_key);
        if removed.is_some() {
            debug!("Removed permanent trust entry for {}", master_key.to_hex());
        }
        removed
    }

    /// Number of permanent entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
