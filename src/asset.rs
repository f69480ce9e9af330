//! Asset descriptors: the native currency or a (code, issuer) credit asset

use crate::crypto::{decode_account_id, PublicKeyBytes};
use crate::error::LedgerError;
use std::fmt;
use stellar_xdr::curr as xdr;

pub const NATIVE_ASSET_CODE: &str = "XLM";
pub const MAX_ASSET_CODE_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    Credit(CreditAsset),
}

/// A custom token identified by its code and the issuing account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreditAsset {
    code: String,
    issuer: String,
    issuer_key: PublicKeyBytes,
}

impl CreditAsset {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Issuer account id (`G...`).
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issuer_key(&self) -> &PublicKeyBytes {
        &self.issuer_key
    }

    /// Codes of up to four characters use the short on-ledger form.
    pub fn is_alphanum4(&self) -> bool {
        self.code.len() <= 4
    }
}

pub fn validate_asset_code(code: &str) -> Result<(), LedgerError> {
    if code.is_empty() || code.len() > MAX_ASSET_CODE_LENGTH {
        return Err(LedgerError::InvalidAsset(format!(
            "Asset code must be 1-{} characters, got {}",
            MAX_ASSET_CODE_LENGTH,
            code.len()
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::InvalidAsset(format!(
            "Asset code '{}' must be ASCII alphanumeric",
            code
        )));
    }
    Ok(())
}

impl Asset {
    pub fn native() -> Self {
        Asset::Native
    }

    /// Builds a credit asset bound to the issuer's account id.
    pub fn credit(code: &str, issuer: &str) -> Result<Self, LedgerError> {
        validate_asset_code(code)?;
        let issuer_key = decode_account_id(issuer)
            .map_err(|e| LedgerError::InvalidAsset(format!("Invalid issuer '{}': {}", issuer, e)))?;
        Ok(Asset::Credit(CreditAsset {
            code: code.to_string(),
            issuer: issuer.trim().to_string(),
            issuer_key,
        }))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    pub fn code(&self) -> &str {
        match self {
            Asset::Native => NATIVE_ASSET_CODE,
            Asset::Credit(credit) => credit.code(),
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Asset::Native => None,
            Asset::Credit(credit) => Some(credit.issuer()),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "{}", NATIVE_ASSET_CODE),
            Asset::Credit(credit) => write!(f, "{}:{}", credit.code, credit.issuer),
        }
    }
}

/// Ledger `AccountId` for raw ed25519 public key bytes.
pub fn xdr_account_id(key: &PublicKeyBytes) -> xdr::AccountId {
    xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(*key)))
}

impl CreditAsset {
    // Codes are right-padded with NUL bytes to the fixed width.
    fn padded_code<const N: usize>(&self) -> [u8; N] {
        let mut code = [0u8; N];
        code[..self.code.len()].copy_from_slice(self.code.as_bytes());
        code
    }

    fn alphanum4(&self) -> xdr::AlphaNum4 {
        xdr::AlphaNum4 {
            asset_code: xdr::AssetCode4(self.padded_code()),
            issuer: xdr_account_id(&self.issuer_key),
        }
    }

    fn alphanum12(&self) -> xdr::AlphaNum12 {
        xdr::AlphaNum12 {
            asset_code: xdr::AssetCode12(self.padded_code()),
            issuer: xdr_account_id(&self.issuer_key),
        }
    }
}

impl Asset {
    /// The asset as it appears in payments.
    pub fn to_xdr_asset(&self) -> xdr::Asset {
        match self {
            Asset::Native => xdr::Asset::Native,
            Asset::Credit(credit) if credit.is_alphanum4() => {
                xdr::Asset::CreditAlphanum4(credit.alphanum4())
            }
            Asset::Credit(credit) => xdr::Asset::CreditAlphanum12(credit.alphanum12()),
        }
    }

    /// The asset as the line of a change-trust operation.
    pub fn to_change_trust_asset(&self) -> xdr::ChangeTrustAsset {
        match self {
            Asset::Native => xdr::ChangeTrustAsset::Native,
            Asset::Credit(credit) if credit.is_alphanum4() => {
                xdr::ChangeTrustAsset::CreditAlphanum4(credit.alphanum4())
            }
            Asset::Credit(credit) => xdr::ChangeTrustAsset::CreditAlphanum12(credit.alphanum12()),
        }
    }
}
