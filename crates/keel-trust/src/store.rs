//! Durable storage for installed manifests
//!
//! The storage contract is narrow: upsert rows keyed by master key, scan them
//! all back, and round-trip `(master_key, signing_key, sequence, serialized)`
//! faithfully. The file-backed implementation keeps one JSON document and
//! replaces it atomically on every write.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use keel_core::{Manifest, PublicKey};

use crate::error::{Result, TrustError};

/// One persisted manifest row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredManifest {
    /// Master identity key
    pub master_key: PublicKey,

    /// Delegated operational signing key
    pub signing_key: PublicKey,

    /// Manifest sequence number
    pub sequence: u32,

    /// Canonical manifest bytes, hex encoded
    pub serialized: String,
}

impl StoredManifest {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            master_key: *manifest.master_key(),
            signing_key: *manifest.signing_key(),
            sequence: manifest.sequence(),
            serialized: hex::encode(manifest.serialized()),
        }
    }

    /// Decode and re-verify the canonical bytes, cross-checking the row's
    /// indexed columns against the decoded fields.
    pub fn to_manifest(&self) -> Result<Manifest> {
        let bytes = hex::decode(&self.serialized)
            .map_err(|e| TrustError::Storage(format!("Bad stored manifest encoding: {}", e)))?;
        let manifest = Manifest::decode(&bytes)?;
        if manifest.master_key() != &self.master_key
            || manifest.signing_key() != &self.signing_key
            || manifest.sequence() != self.sequence
        {
            return Err(TrustError::Storage(
                "Stored manifest row does not match its serialized bytes".to_string(),
            ));
        }
        Ok(manifest)
    }
}

/// Storage seam for manifest persistence
pub trait ManifestStore {
    /// Insert or replace the row for `row.master_key`
    fn upsert(&self, row: &StoredManifest) -> Result<()>;

    /// Return every stored row
    fn load_all(&self) -> Result<Vec<StoredManifest>>;
}

/// JSON-file backed manifest store
pub struct FileManifestStore {
    path: PathBuf,
}

impl FileManifestStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_rows(&self) -> Result<BTreeMap<String, StoredManifest>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let rows: BTreeMap<String, StoredManifest> = serde_json::from_str(&content)?;
        Ok(rows)
    }

    fn write_rows(&self, rows: &BTreeMap<String, StoredManifest>) -> Result<()> {
        let content = serde_json::to_string_pretty(rows)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl ManifestStore for FileManifestStore {
    fn upsert(&self, row: &StoredManifest) -> Result<()> {
        let mut rows = self.read_rows()?;
        rows.insert(row.master_key.to_hex(), row.clone());
        self.write_rows(&rows)
    }

    fn load_all(&self) -> Result<Vec<StoredManifest>> {
        Ok(self.read_rows()?.into_values().collect())
    }
}
