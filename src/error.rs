//! Error types for carbon-tokens

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Horizon has no record of the account, usually because it was never funded.
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Horizon rejected request ({status}): {title}{}", format_result_codes(.result_codes))]
    HorizonError {
        status: u16,
        title: String,
        result_codes: Vec<String>,
    },
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("XDR encoding error: {0}")]
    XdrError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Credit agreement error: {0}")]
    AgreementError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn format_result_codes(codes: &[String]) -> String {
    if codes.is_empty() {
        String::new()
    } else {
        format!(" [{}]", codes.join(", "))
    }
}

impl LedgerError {
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, LedgerError::AccountNotFound(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::ConfigError(err.to_string())
    }
}

impl From<stellar_xdr::curr::Error> for LedgerError {
    fn from(err: stellar_xdr::curr::Error) -> Self {
        LedgerError::XdrError(err.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::NetworkError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
