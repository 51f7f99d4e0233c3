//! Trust store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Trust store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Path of the manifest store file
    pub manifest_store_path: PathBuf,

    /// Permanent validator trust tokens, one `<token> [comment]` per line
    pub validator_keys: Vec<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            manifest_store_path: Self::default_store_path(),
            validator_keys: Vec::new(),
        }
    }
}

impl TrustConfig {
    fn default_store_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/var/lib"))
            .join("keel")
            .join("manifests.json")
    }

    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create the store directory if it doesn't exist
    pub fn ensure_directories(&self) -> crate::Result<()> {
        if let Some(parent) = self.manifest_store_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Helper module for dirs crate functionality
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })
    }
}
