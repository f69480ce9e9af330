//! JSON key files for generated key pairs

use crate::crypto::KeyPair;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Serialize, Deserialize)]
pub struct KeyFile {
    #[serde(default)]
    pub name: Option<String>,
    pub public_key: String,
    pub secret_seed: String,
    pub created: String,
}

impl std::fmt::Debug for KeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFile")
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("created", &self.created)
            .finish()
    }
}

impl KeyFile {
    pub fn from_keypair(keypair: &KeyPair, name: Option<String>) -> Self {
        KeyFile {
            name,
            public_key: keypair.public_key(),
            secret_seed: keypair.secret_seed(),
            created: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuilds the key pair and checks it against the stored public key.
    pub fn keypair(&self) -> Result<KeyPair, LedgerError> {
        let keypair = KeyPair::from_secret_seed(&self.secret_seed)?;
        if keypair.public_key() != self.public_key {
            return Err(LedgerError::CryptoError(format!(
                "Key file public key {} does not match its secret seed",
                self.public_key
            )));
        }
        Ok(keypair)
    }

    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let content = fs::read_to_string(path).map_err(|e| {
            LedgerError::IoError(format!("Failed to read key file {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Default directory for key files: `~/.carbon-tokens/keys`.
pub fn default_key_dir() -> Result<PathBuf, LedgerError> {
    dirs::home_dir()
        .map(|home| home.join(".carbon-tokens").join("keys"))
        .ok_or_else(|| LedgerError::ConfigError("Cannot determine home directory".to_string()))
}
