//! Manifest cache and disposition engine
//!
//! Tracks, per master key, the most recent accepted manifest and whether the
//! key is currently trusted. Trust enters the cache either by
//! pre-registration (configuration) or by migration from the permanent
//! validator list on a key's first accepted manifest; after migration the
//! cache, not the validator list, is authoritative for that key.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use keel_core::{Manifest, PublicKey};

use crate::error::Result;
use crate::store::{ManifestStore, StoredManifest};
use crate::tokens;
use crate::validator_list::ValidatorList;

/// Outcome of applying a candidate manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestDisposition {
    /// Sequence advanced (or first manifest for the key); installed as current
    Accepted,
    /// Not newer than the installed manifest; dropped
    Stale,
    /// Master key trusted by neither trust tier; dropped
    Untrusted,
    /// Signature does not verify against the stated fields; dropped
    Invalid,
}

/// Per-key trust state
struct TrustEntry {
    comment: String,
    manifest: Option<Manifest>,
}

/// Manifest trust store.
///
/// All state sits behind one mutex; a disposition decision is a single
/// read-modify-write under that lock.
#[derive(Default)]
pub struct ManifestCache {
    entries: Mutex<HashMap<PublicKey, TrustEntry>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register a master key as eligible for manifest trust, without
    /// requiring a manifest yet. No-op if the key is already trusted.
    pub fn add_trusted_key(&self, master_key: PublicKey, comment: &str) {
        let mut entries = self.entries.lock();
        entries.entry(master_key).or_insert_with(|| TrustEntry {
            comment: comment.to_string(),
            manifest: None,
        });
    }

    /// True iff the key is trusted through this cache
    pub fn trusted(&self, master_key: &PublicKey) -> bool {
        self.entries.lock().contains_key(master_key)
    }

    /// Number of installed manifests
    pub fn size(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|e| e.manifest.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Install a manifest supplied by static configuration.
    ///
    /// The operator is asserting authority out-of-band: the master key is
    /// trusted unconditionally and the manifest bypasses sequence and
    /// disposition checks.
    pub fn config_manifest(&self, manifest: Manifest, validators: &ValidatorList) {
        let master_key = *manifest.master_key();
        {
            let mut entries = self.entries.lock();
            let entry = entries.entry(master_key).or_insert_with(|| TrustEntry {
                comment: String::new(),
                manifest: None,
            });
            entry.manifest = Some(manifest);
        }
        self.migrate_permanent(&master_key, validators);
    }

    /// Classify a candidate manifest and, if accepted, install it as the
    /// current manifest for its master key.
    pub fn apply_manifest(
        &self,
        manifest: Manifest,
        validators: &ValidatorList,
    ) -> ManifestDisposition {
        let master_key = *manifest.master_key();
        {
            let mut entries = self.entries.lock();

            let known = entries.contains_key(&master_key);
            if !known && !validators.trusted(&master_key) {
                debug!(
                    "Dropping manifest for untrusted master key {}",
                    master_key.to_hex()
                );
                return ManifestDisposition::Untrusted;
            }

            // The stated fields must match what was signed; a post-signing
            // sequence tamper lands here.
            if !manifest.verify() {
                warn!(
                    "Manifest for {} failed signature verification",
                    master_key.to_hex()
                );
                return ManifestDisposition::Invalid;
            }

            if let Some(current) = entries.get(&master_key).and_then(|e| e.manifest.as_ref()) {
                if manifest.sequence() <= current.sequence() {
                    debug!(
                        "Stale manifest for {}: sequence {} <= {}",
                        master_key.to_hex(),
                        manifest.sequence(),
                        current.sequence()
                    );
                    return ManifestDisposition::Stale;
                }
            }

            let entry = entries.entry(master_key).or_insert_with(|| TrustEntry {
                comment: String::new(),
                manifest: None,
            });
            entry.manifest = Some(manifest);
        }

        self.migrate_permanent(&master_key, validators);
        ManifestDisposition::Accepted
    }

    /// Visit every installed manifest. Order is unspecified.
    pub fn for_each_manifest<F>(&self, mut visitor: F)
    where
        F: FnMut(&Manifest),
    {
        let entries = self.entries.lock();
        for entry in entries.values() {
            if let Some(manifest) = &entry.manifest {
                visitor(manifest);
            }
        }
    }

    /// Seed manifest trust from configuration lines.
    ///
    /// All-or-nothing: on any parse failure nothing is installed and false is
    /// returned.
    pub fn load_validator_keys<'a, I>(&self, lines: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let parsed = match tokens::parse_trust_tokens(lines) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Rejecting validator key batch: {}", e);
                return false;
            }
        };

        for entry in parsed {
            self.add_trusted_key(entry.public_key, &entry.comment);
        }
        true
    }

    /// Write every installed manifest to storage. Safe to call with zero
    /// rows.
    pub fn save(&self, store: &dyn ManifestStore) -> Result<()> {
        let entries = self.entries.lock();
        for entry in entries.values() {
            if let Some(manifest) = &entry.manifest {
                store.upsert(&StoredManifest::from_manifest(manifest))?;
            }
        }
        Ok(())
    }

    /// Reload manifests from storage.
    ///
    /// Only rows whose master key is trusted (registered here, or present in
    /// the permanent validator list) are installed; other rows are skipped.
    /// Permanent-trusted keys are migrated exactly as in
    /// [`ManifestCache::apply_manifest`]. Every row is decoded and
    /// re-verified before any state changes, so a corrupt store leaves the
    /// cache untouched.
    pub fn load(&self, store: &dyn ManifestStore, validators: &ValidatorList) -> Result<()> {
        let rows = store.load_all()?;
        let mut manifests = Vec::with_capacity(rows.len());
        for row in rows {
            manifests.push(row.to_manifest()?);
        }

        let mut installed = Vec::new();
        {
            let mut entries = self.entries.lock();
            for manifest in manifests {
                let master_key = *manifest.master_key();
                if !entries.contains_key(&master_key) && !validators.trusted(&master_key) {
                    debug!(
                        "Skipping stored manifest for untrusted master key {}",
                        master_key.to_hex()
                    );
                    continue;
                }
                let entry = entries.entry(master_key).or_insert_with(|| TrustEntry {
                    comment: String::new(),
                    manifest: None,
                });
                entry.manifest = Some(manifest);
                installed.push(master_key);
            }
        }

        for master_key in &installed {
            self.migrate_permanent(master_key, validators);
        }
        Ok(())
    }

    // Insert-before-remove ordering keeps a migrating key visible in at
    // least one trust tier at every instant.
    fn migrate_permanent(&self, master_key: &PublicKey, validators: &ValidatorList) {
        if let Some(comment) = validators.remove_permanent_key(master_key) {
            debug!(
                "Master key {} migrated from permanent trust to manifest trust",
                master_key.to_hex()
            );
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get_mut(master_key) {
                if entry.comment.is_empty() {
                    entry.comment = comment;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::{manifest, KeyType, SecretKey};

    fn make_manifest(master: &SecretKey, signing: &PublicKey, sequence: u32) -> Manifest {
        Manifest::sign(master, signing, sequence).unwrap()
    }

    // Sign at `sequence`, then re-encode claiming `sequence + 1`
    fn make_broken_manifest(master: &SecretKey, signing: &PublicKey, sequence: u32) -> Manifest {
        let signed = make_manifest(master, signing, sequence);
        let serialized = manifest::encode(
            sequence + 1,
            signed.master_key(),
            signed.signing_key(),
            signed.signature(),
        );
        Manifest::new(
            serialized,
            *signed.master_key(),
            *signed.signing_key(),
            sequence + 1,
            signed.signature().to_vec(),
        )
    }

    #[test]
    fn test_untrusted_key_rejected() {
        let cache = ManifestCache::new();
        let validators = ValidatorList::new();
        let master = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();

        let m = make_manifest(&master, &signing, 0);
        assert_eq!(
            cache.apply_manifest(m, &validators),
            ManifestDisposition::Untrusted
        );
        assert!(!cache.trusted(&master.public_key()));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_sequence_dance() {
        let cache = ManifestCache::new();
        let validators = ValidatorList::new();
        let master = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();

        cache.add_trusted_key(master.public_key(), "a");

        let m0 = make_manifest(&master, &signing, 0);
        let m1 = make_manifest(&master, &signing, 1);

        assert_eq!(
            cache.apply_manifest(m0.clone(), &validators),
            ManifestDisposition::Accepted
        );
        assert_eq!(
            cache.apply_manifest(m0.clone(), &validators),
            ManifestDisposition::Stale
        );
        assert_eq!(
            cache.apply_manifest(m1.clone(), &validators),
            ManifestDisposition::Accepted
        );
        assert_eq!(
            cache.apply_manifest(m1, &validators),
            ManifestDisposition::Stale
        );
        assert_eq!(
            cache.apply_manifest(m0, &validators),
            ManifestDisposition::Stale
        );
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_broken_manifest_invalid() {
        let cache = ManifestCache::new();
        let validators = ValidatorList::new();
        let master = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();

        cache.add_trusted_key(master.public_key(), "b");

        let broken = make_broken_manifest(&master, &signing, 2);
        assert_eq!(
            cache.apply_manifest(broken, &validators),
            ManifestDisposition::Invalid
        );
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_migration_from_permanent_trust() {
        let cache = ManifestCache::new();
        let validators = ValidatorList::new();
        let master = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();
        let master_key = master.public_key();

        assert!(validators.insert_permanent_key(master_key, "trusted key"));
        assert!(validators.trusted(&master_key));
        assert!(!cache.trusted(&master_key));

        let m = make_manifest(&master, &signing, 0);
        assert_eq!(
            cache.apply_manifest(m, &validators),
            ManifestDisposition::Accepted
        );
        assert!(!validators.trusted(&master_key));
        assert!(cache.trusted(&master_key));
    }

    #[test]
    fn test_config_manifest_bootstraps_trust() {
        let cache = ManifestCache::new();
        let validators = ValidatorList::new();
        let master = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();

        let m = make_manifest(&master, &signing, 0);
        cache.config_manifest(m, &validators);
        assert!(cache.trusted(&master.public_key()));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_load_validator_keys_all_or_nothing() {
        let cache = ManifestCache::new();
        let a = SecretKey::generate(KeyType::Ed25519).public_key();
        let b = SecretKey::generate(KeyType::Ed25519).public_key();

        let bad = format!("{}XXX", keel_core::encode_node_public(&a));
        let good = keel_core::encode_node_public(&b);
        assert!(!cache.load_validator_keys([bad.as_str(), good.as_str()]));
        assert!(!cache.trusted(&a));
        assert!(!cache.trusted(&b));

        // A well-formed line ahead of the bad one must not install either
        assert!(!cache.load_validator_keys([good.as_str(), bad.as_str()]));
        assert!(!cache.trusted(&a));
        assert!(!cache.trusted(&b));

        assert!(cache.load_validator_keys([good.as_str()]));
        assert!(cache.trusted(&b));
    }

    #[test]
    fn test_for_each_visits_installed_only() {
        let cache = ManifestCache::new();
        let validators = ValidatorList::new();
        let master = SecretKey::generate(KeyType::Ed25519);
        let idle = SecretKey::generate(KeyType::Ed25519);
        let signing = SecretKey::generate(KeyType::Secp256k1).public_key();

        cache.add_trusted_key(master.public_key(), "");
        cache.add_trusted_key(idle.public_key(), "");
        cache.apply_manifest(make_manifest(&master, &signing, 0), &validators);

        let mut seen = Vec::new();
        cache.for_each_manifest(|m| seen.push(*m.master_key()));
        assert_eq!(seen, vec![master.public_key()]);
    }
}
