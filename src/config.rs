//! Configuration management for carbon-tokens
//!
//! Values come from an optional `carbon.toml`, then environment variables
//! (a `.env` file is honoured) override them. Secrets are never compiled in.

use crate::amount::Amount;
use crate::asset::validate_asset_code;
use crate::crypto::{is_valid_account_id, KeyPair};
use crate::error::LedgerError;
use crate::keystore::KeyFile;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "carbon.toml";
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub asset: AssetConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_horizon_url")]
    pub horizon_url: String,
    #[serde(default = "default_passphrase")]
    pub passphrase: String,
    #[serde(default = "default_friendbot_url")]
    pub friendbot_url: String,
    /// Per-operation fee in stroops.
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,
    #[serde(default = "default_timeout")]
    pub tx_timeout_secs: u64,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            horizon_url: default_horizon_url(),
            passphrase: default_passphrase(),
            friendbot_url: default_friendbot_url(),
            base_fee: default_base_fee(),
            tx_timeout_secs: default_timeout(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "default_asset_code")]
    pub code: String,
    #[serde(default = "default_trust_limit")]
    pub trust_limit: String,
    #[serde(default = "default_mint_amount")]
    pub mint_amount: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            code: default_asset_code(),
            trust_limit: default_trust_limit(),
            mint_amount: default_mint_amount(),
        }
    }
}

impl AssetConfig {
    pub fn trust_limit(&self) -> Result<Amount, LedgerError> {
        self.trust_limit.parse()
    }

    pub fn mint_amount(&self) -> Result<Amount, LedgerError> {
        self.mint_amount.parse()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub issuer_secret: Option<String>,
    #[serde(default)]
    pub distribution_secret: Option<String>,
    #[serde(default)]
    pub issuer_key_file: Option<PathBuf>,
    #[serde(default)]
    pub distribution_key_file: Option<PathBuf>,
    /// Account inspected by the balance flow when none is given on the command line.
    #[serde(default)]
    pub account_id: Option<String>,
}

impl std::fmt::Debug for AccountsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("AccountsConfig")
            .field("issuer_secret", &redact(&self.issuer_secret))
            .field("distribution_secret", &redact(&self.distribution_secret))
            .field("issuer_key_file", &self.issuer_key_file)
            .field("distribution_key_file", &self.distribution_key_file)
            .field("account_id", &self.account_id)
            .finish()
    }
}

fn resolve_keypair(
    secret: &Option<String>,
    key_file: &Option<PathBuf>,
) -> Result<Option<KeyPair>, LedgerError> {
    if let Some(secret) = secret {
        return KeyPair::from_secret_seed(secret).map(Some);
    }
    if let Some(path) = key_file {
        return KeyFile::load(path)?.keypair().map(Some);
    }
    Ok(None)
}

impl AccountsConfig {
    /// Issuer key from a literal secret or key file; `None` means generate one.
    pub fn issuer_keypair(&self) -> Result<Option<KeyPair>, LedgerError> {
        resolve_keypair(&self.issuer_secret, &self.issuer_key_file)
    }

    pub fn distribution_keypair(&self) -> Result<Option<KeyPair>, LedgerError> {
        resolve_keypair(&self.distribution_secret, &self.distribution_key_file)
    }
}

fn default_horizon_url() -> String {
    "https://horizon-testnet.stellar.org".to_string()
}

fn default_passphrase() -> String {
    TESTNET_PASSPHRASE.to_string()
}

fn default_friendbot_url() -> String {
    "https://friendbot.stellar.org".to_string()
}

fn default_base_fee() -> u32 {
    100
}

fn default_timeout() -> u64 {
    30
}

fn default_asset_code() -> String {
    "CARBON".to_string()
}

fn default_trust_limit() -> String {
    "1000000".to_string()
}

fn default_mint_amount() -> String {
    "1000".to_string()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Config {
    /// Applies `CARBON_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        if let Some(url) = get("CARBON_HORIZON_URL") {
            self.network.horizon_url = url;
        }
        if let Some(passphrase) = get("CARBON_NETWORK_PASSPHRASE") {
            self.network.passphrase = passphrase;
        }
        if let Some(url) = get("CARBON_FRIENDBOT_URL") {
            self.network.friendbot_url = url;
        }
        if let Some(fee) = get("CARBON_BASE_FEE") {
            self.network.base_fee = fee.parse().map_err(|e| {
                LedgerError::ConfigError(format!("CARBON_BASE_FEE '{}' is invalid: {}", fee, e))
            })?;
        }
        if let Some(code) = get("CARBON_ASSET_CODE") {
            self.asset.code = code;
        }
        if let Some(secret) = get("CARBON_ISSUER_SECRET") {
            self.accounts.issuer_secret = Some(secret);
        }
        if let Some(secret) = get("CARBON_DISTRIBUTION_SECRET") {
            self.accounts.distribution_secret = Some(secret);
        }
        if let Some(account_id) = get("CARBON_ACCOUNT_ID") {
            self.accounts.account_id = Some(account_id);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.network.horizon_url.trim().is_empty() {
            return Err(LedgerError::ConfigError(
                "network.horizon_url must be set".to_string(),
            ));
        }
        if self.network.passphrase.is_empty() {
            return Err(LedgerError::ConfigError(
                "network.passphrase must be set".to_string(),
            ));
        }
        if self.network.base_fee == 0 {
            return Err(LedgerError::ConfigError(
                "network.base_fee must be at least 1 stroop".to_string(),
            ));
        }
        validate_asset_code(&self.asset.code)
            .map_err(|e| LedgerError::ConfigError(format!("asset.code: {}", e)))?;
        let trust_limit = self
            .asset
            .trust_limit()
            .map_err(|e| LedgerError::ConfigError(format!("asset.trust_limit: {}", e)))?;
        // A zero limit on a change-trust operation deletes the trustline.
        if trust_limit.is_zero() {
            return Err(LedgerError::ConfigError(
                "asset.trust_limit must be greater than zero".to_string(),
            ));
        }
        let mint = self
            .asset
            .mint_amount()
            .map_err(|e| LedgerError::ConfigError(format!("asset.mint_amount: {}", e)))?;
        if mint.is_zero() {
            return Err(LedgerError::ConfigError(
                "asset.mint_amount must be greater than zero".to_string(),
            ));
        }
        if mint > trust_limit {
            return Err(LedgerError::ConfigError(format!(
                "asset.mint_amount {} exceeds asset.trust_limit {}",
                mint, trust_limit
            )));
        }
        if let Some(account_id) = &self.accounts.account_id {
            if !is_valid_account_id(account_id) {
                return Err(LedgerError::ConfigError(format!(
                    "accounts.account_id '{}' is not a valid account id",
                    account_id
                )));
            }
        }
        Ok(())
    }
}

/// Loads configuration from `path` (or `carbon.toml`), applying environment overrides.
pub fn load_config_from(path: Option<&Path>) -> Result<Config, LedgerError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let mut config: Config = match fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            return Err(LedgerError::ConfigError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    dotenvy::dotenv().ok();
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

pub fn load_config() -> Result<Config, LedgerError> {
    load_config_from(None)
}
