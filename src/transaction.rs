//! Transaction types, builder and signing
//!
//! Operations and transactions are plain Rust values; the ledger wire
//! form comes from `stellar-xdr` at hashing and submission time.

use crate::amount::Amount;
use crate::asset::Asset;
use crate::crypto::{decode_account_id, KeyPair, PublicKeyBytes};
use crate::error::LedgerError;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{self as xdr, Limits, WriteXdr};

/// Protocol limit on operations per transaction.
pub const MAX_OPERATIONS: usize = 100;
pub const MAX_SIGNATURES: usize = 20;
pub const MAX_DATA_NAME_LENGTH: usize = 64;
pub const MAX_DATA_VALUE_LENGTH: usize = 64;
pub const MAX_MEMO_TEXT_LENGTH: usize = 28;
pub const MAX_HOME_DOMAIN_LENGTH: usize = 32;

/// Network id: SHA-256 of the network passphrase.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

fn muxed_account(key: &PublicKeyBytes) -> xdr::MuxedAccount {
    xdr::MuxedAccount::Ed25519(xdr::Uint256(*key))
}

/// An account as seen by the transaction builder: id plus current sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    account_id: String,
    sequence: i64,
}

impl Account {
    pub fn new(account_id: &str, sequence: i64) -> Result<Self, LedgerError> {
        decode_account_id(account_id)?;
        Ok(Account {
            account_id: account_id.to_string(),
            sequence,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn next_sequence(&self) -> Result<i64, LedgerError> {
        self.sequence
            .checked_add(1)
            .ok_or_else(|| LedgerError::InvalidOperation("Sequence number overflow".to_string()))
    }
}

/// Options for a SetOptions operation. Unset fields are left unchanged on the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub clear_flags: Option<u32>,
    pub set_flags: Option<u32>,
    pub master_weight: Option<u32>,
    pub low_threshold: Option<u32>,
    pub med_threshold: Option<u32>,
    pub high_threshold: Option<u32>,
    pub home_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ChangeTrust {
        asset: Asset,
        limit: Amount,
    },
    ManageData {
        name: String,
        value: Option<Vec<u8>>,
    },
    Payment {
        destination: String,
        asset: Asset,
        amount: Amount,
    },
    SetOptions(SetOptions),
}

impl Operation {
    /// Trustline to a credit asset. A zero limit removes the trustline.
    pub fn change_trust(asset: Asset, limit: Amount) -> Result<Self, LedgerError> {
        if asset.is_native() {
            return Err(LedgerError::InvalidOperation(
                "Cannot establish a trustline to the native asset".to_string(),
            ));
        }
        Ok(Operation::ChangeTrust { asset, limit })
    }

    /// Sets (or with `None`, deletes) a named data entry on the source account.
    pub fn manage_data(name: &str, value: Option<&[u8]>) -> Result<Self, LedgerError> {
        if name.is_empty() || name.len() > MAX_DATA_NAME_LENGTH {
            return Err(LedgerError::InvalidOperation(format!(
                "Data entry name must be 1-{} bytes, got {}",
                MAX_DATA_NAME_LENGTH,
                name.len()
            )));
        }
        if let Some(value) = value {
            if value.len() > MAX_DATA_VALUE_LENGTH {
                return Err(LedgerError::InvalidOperation(format!(
                    "Data entry value must be at most {} bytes, got {}",
                    MAX_DATA_VALUE_LENGTH,
                    value.len()
                )));
            }
        }
        Ok(Operation::ManageData {
            name: name.to_string(),
            value: value.map(|v| v.to_vec()),
        })
    }

    pub fn payment(destination: &str, asset: Asset, amount: Amount) -> Result<Self, LedgerError> {
        decode_account_id(destination).map_err(|e| {
            LedgerError::InvalidOperation(format!("Invalid destination '{}': {}", destination, e))
        })?;
        if amount.is_zero() {
            return Err(LedgerError::InvalidOperation(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        Ok(Operation::Payment {
            destination: destination.to_string(),
            asset,
            amount,
        })
    }

    pub fn set_options(options: SetOptions) -> Result<Self, LedgerError> {
        for (label, value) in [
            ("master weight", options.master_weight),
            ("low threshold", options.low_threshold),
            ("medium threshold", options.med_threshold),
            ("high threshold", options.high_threshold),
        ] {
            if let Some(v) = value {
                if v > 255 {
                    return Err(LedgerError::InvalidOperation(format!(
                        "{} must be 0-255, got {}",
                        label, v
                    )));
                }
            }
        }
        if let Some(domain) = &options.home_domain {
            if domain.len() > MAX_HOME_DOMAIN_LENGTH {
                return Err(LedgerError::InvalidOperation(format!(
                    "Home domain must be at most {} bytes",
                    MAX_HOME_DOMAIN_LENGTH
                )));
            }
        }
        Ok(Operation::SetOptions(options))
    }

    /// Master weight zero: nothing can sign for the account again, so no further issuance.
    pub fn lock_account() -> Self {
        Operation::SetOptions(SetOptions {
            master_weight: Some(0),
            ..SetOptions::default()
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::ChangeTrust { .. } => "change_trust",
            Operation::ManageData { .. } => "manage_data",
            Operation::Payment { .. } => "payment",
            Operation::SetOptions(_) => "set_options",
        }
    }
}

impl Operation {
    /// Ledger form, without a per-operation source account.
    pub fn to_xdr_operation(&self) -> Result<xdr::Operation, LedgerError> {
        let body = match self {
            Operation::ChangeTrust { asset, limit } => {
                xdr::OperationBody::ChangeTrust(xdr::ChangeTrustOp {
                    line: asset.to_change_trust_asset(),
                    limit: limit.stroops(),
                })
            }
            Operation::ManageData { name, value } => {
                let data_value = match value {
                    Some(bytes) => Some(xdr::DataValue(bytes.clone().try_into()?)),
                    None => None,
                };
                xdr::OperationBody::ManageData(xdr::ManageDataOp {
                    data_name: xdr::String64(name.as_bytes().to_vec().try_into()?),
                    data_value,
                })
            }
            Operation::Payment {
                destination,
                asset,
                amount,
            } => xdr::OperationBody::Payment(xdr::PaymentOp {
                destination: muxed_account(&decode_account_id(destination)?),
                asset: asset.to_xdr_asset(),
                amount: amount.stroops(),
            }),
            Operation::SetOptions(options) => {
                let home_domain = match &options.home_domain {
                    Some(domain) => Some(xdr::String32(domain.as_bytes().to_vec().try_into()?)),
                    None => None,
                };
                xdr::OperationBody::SetOptions(xdr::SetOptionsOp {
                    inflation_dest: None,
                    clear_flags: options.clear_flags,
                    set_flags: options.set_flags,
                    master_weight: options.master_weight,
                    low_threshold: options.low_threshold,
                    med_threshold: options.med_threshold,
                    high_threshold: options.high_threshold,
                    home_domain,
                    signer: None,
                })
            }
        };
        Ok(xdr::Operation {
            source_account: None,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Memo {
    #[default]
    None,
    Text(String),
}

impl Memo {
    pub fn text(text: &str) -> Result<Self, LedgerError> {
        if text.len() > MAX_MEMO_TEXT_LENGTH {
            return Err(LedgerError::InvalidOperation(format!(
                "Memo text exceeds maximum length of {} bytes",
                MAX_MEMO_TEXT_LENGTH
            )));
        }
        Ok(Memo::Text(text.to_string()))
    }
}

impl Memo {
    fn to_xdr_memo(&self) -> Result<xdr::Memo, LedgerError> {
        Ok(match self {
            Memo::None => xdr::Memo::None,
            Memo::Text(text) => xdr::Memo::Text(text.as_bytes().to_vec().try_into()?),
        })
    }
}

/// Validity window in unix seconds; zero `max_time` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

impl DecoratedSignature {
    fn to_xdr_signature(&self) -> Result<xdr::DecoratedSignature, LedgerError> {
        Ok(xdr::DecoratedSignature {
            hint: xdr::SignatureHint(self.hint),
            signature: xdr::Signature(self.signature.clone().try_into()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    source_account: String,
    source_key: PublicKeyBytes,
    fee: u32,
    sequence: i64,
    time_bounds: TimeBounds,
    memo: Memo,
    operations: Vec<Operation>,
    network_passphrase: String,
    signatures: Vec<DecoratedSignature>,
}

impl Transaction {
    pub fn source_account(&self) -> &str {
        &self.source_account
    }

    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// Bytes that get hashed and signed: network id, envelope type, transaction body.
    pub fn signature_base(&self) -> Result<Vec<u8>, LedgerError> {
        let payload = xdr::TransactionSignaturePayload {
            network_id: xdr::Hash(network_id(&self.network_passphrase)),
            tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(
                self.to_xdr_transaction()?,
            ),
        };
        Ok(payload.to_xdr(Limits::none())?)
    }

    pub fn hash(&self) -> Result<[u8; 32], LedgerError> {
        Ok(Sha256::digest(self.signature_base()?).into())
    }

    pub fn hash_hex(&self) -> Result<String, LedgerError> {
        Ok(hex::encode(self.hash()?))
    }

    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), LedgerError> {
        if self.signatures.len() >= MAX_SIGNATURES {
            return Err(LedgerError::InvalidOperation(format!(
                "Transaction already carries {} signatures",
                MAX_SIGNATURES
            )));
        }
        let hash = self.hash()?;
        self.signatures.push(DecoratedSignature {
            hint: keypair.signature_hint(),
            signature: keypair.sign(&hash).to_vec(),
        });
        Ok(())
    }

    fn to_xdr_transaction(&self) -> Result<xdr::Transaction, LedgerError> {
        let operations = self
            .operations
            .iter()
            .map(Operation::to_xdr_operation)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(xdr::Transaction {
            source_account: muxed_account(&self.source_key),
            fee: self.fee,
            seq_num: xdr::SequenceNumber(self.sequence),
            cond: xdr::Preconditions::Time(xdr::TimeBounds {
                min_time: xdr::TimePoint(self.time_bounds.min_time),
                max_time: xdr::TimePoint(self.time_bounds.max_time),
            }),
            memo: self.memo.to_xdr_memo()?,
            operations: operations.try_into()?,
            ext: xdr::TransactionExt::V0,
        })
    }

    pub fn to_envelope(&self) -> Result<xdr::TransactionEnvelope, LedgerError> {
        let signatures = self
            .signatures
            .iter()
            .map(DecoratedSignature::to_xdr_signature)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
            tx: self.to_xdr_transaction()?,
            signatures: signatures.try_into()?,
        }))
    }

    pub fn to_envelope_xdr(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(self.to_envelope()?.to_xdr(Limits::none())?)
    }

    /// Base64 envelope, the form Horizon accepts on `POST /transactions`.
    pub fn to_envelope_base64(&self) -> Result<String, LedgerError> {
        Ok(self.to_envelope()?.to_xdr_base64(Limits::none())?)
    }
}

pub struct TransactionBuilder<'a> {
    source: &'a mut Account,
    network_passphrase: String,
    base_fee: u32,
    operations: Vec<Operation>,
    memo: Memo,
    time_bounds: Option<TimeBounds>,
    timeout_secs: Option<u64>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(source: &'a mut Account, network_passphrase: &str, base_fee: u32) -> Self {
        TransactionBuilder {
            source,
            network_passphrase: network_passphrase.to_string(),
            base_fee,
            operations: Vec::new(),
            memo: Memo::None,
            time_bounds: None,
            timeout_secs: None,
        }
    }

    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn with_memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Transaction expires `secs` seconds after it is built.
    pub fn set_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_time_bounds(mut self, time_bounds: TimeBounds) -> Self {
        self.time_bounds = Some(time_bounds);
        self
    }

    /// Builds the transaction and advances the source account's sequence.
    pub fn build(self) -> Result<Transaction, LedgerError> {
        if self.operations.is_empty() {
            return Err(LedgerError::InvalidOperation(
                "Transaction must contain at least one operation".to_string(),
            ));
        }
        if self.operations.len() > MAX_OPERATIONS {
            return Err(LedgerError::InvalidOperation(format!(
                "Transaction has {} operations (max: {})",
                self.operations.len(),
                MAX_OPERATIONS
            )));
        }
        if self.base_fee == 0 {
            return Err(LedgerError::InvalidOperation(
                "Base fee must be at least one stroop".to_string(),
            ));
        }
        let fee = self
            .base_fee
            .checked_mul(self.operations.len() as u32)
            .ok_or_else(|| LedgerError::InvalidOperation("Fee overflow".to_string()))?;

        let time_bounds = match (self.time_bounds, self.timeout_secs) {
            (Some(bounds), _) => bounds,
            (None, Some(secs)) => {
                let now = chrono::Utc::now().timestamp().max(0) as u64;
                TimeBounds {
                    min_time: 0,
                    max_time: now.saturating_add(secs),
                }
            }
            (None, None) => TimeBounds::default(),
        };

        let sequence = self.source.next_sequence()?;
        let source_key = decode_account_id(&self.source.account_id)?;
        self.source.sequence = sequence;

        Ok(Transaction {
            source_account: self.source.account_id.clone(),
            source_key,
            fee,
            sequence,
            time_bounds,
            memo: self.memo,
            operations: self.operations,
            network_passphrase: self.network_passphrase,
            signatures: Vec::new(),
        })
    }
}
