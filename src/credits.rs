//! Carbon credit agreements and token retirement
//!
//! A buyer opens an agreement for a total number of credits at a fixed
//! price per token. Sellers fulfil it by retiring CARBON tokens, which on
//! the classic ledger means paying them back to the issuer: tokens held by
//! their issuer no longer exist.

use crate::amount::Amount;
use crate::asset::Asset;
use crate::crypto::KeyPair;
use crate::error::LedgerError;
use crate::horizon::{Horizon, SubmitResponse};
use crate::token::TokenClient;
use crate::transaction::Operation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementEvent {
    Created {
        buyer: String,
        price_per_token: u32,
        total_value: i128,
    },
    TokensAssigned {
        seller: String,
        amount: i128,
        outstanding: i128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAgreement {
    pub buyer: String,
    pub price_per_token: u32,
    /// Number of tokens the buyer wants retired.
    pub total_value: i128,
    pub assigned_tokens: i128,
    #[serde(default)]
    pub events: Vec<AgreementEvent>,
}

impl CreditAgreement {
    pub fn create(buyer: &str, price_per_token: u32, total_value: i128) -> Result<Self, LedgerError> {
        if price_per_token == 0 || total_value <= 0 {
            return Err(LedgerError::AgreementError(
                "Invalid price or total value".to_string(),
            ));
        }
        info!(
            "Agreement created for {}: {} tokens at {}",
            buyer, total_value, price_per_token
        );
        Ok(CreditAgreement {
            buyer: buyer.to_string(),
            price_per_token,
            total_value,
            assigned_tokens: 0,
            events: vec![AgreementEvent::Created {
                buyer: buyer.to_string(),
                price_per_token,
                total_value,
            }],
        })
    }

    pub fn outstanding(&self) -> i128 {
        self.total_value - self.assigned_tokens
    }

    pub fn is_fulfilled(&self) -> bool {
        self.outstanding() <= 0
    }

    /// Price the buyer owes for everything assigned so far.
    pub fn amount_due(&self) -> i128 {
        self.assigned_tokens * i128::from(self.price_per_token)
    }

    fn assigned_after(&self, amount: i128) -> Result<i128, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::AgreementError(
                "Token amount must be greater than zero".to_string(),
            ));
        }
        self.assigned_tokens
            .checked_add(amount)
            .ok_or_else(|| LedgerError::AgreementError("Assigned tokens overflow".to_string()))
    }

    /// Records `amount` tokens retired by `seller`; returns what is still outstanding.
    pub fn assign_tokens(&mut self, seller: &str, amount: i128) -> Result<i128, LedgerError> {
        self.assigned_tokens = self.assigned_after(amount)?;
        let outstanding = self.outstanding();
        self.events.push(AgreementEvent::TokensAssigned {
            seller: seller.to_string(),
            amount,
            outstanding,
        });
        info!(
            "{} assigned {} tokens, {} outstanding",
            seller, amount, outstanding
        );
        Ok(outstanding)
    }

    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Payment of `amount` of `asset` back to its issuer, which removes it from circulation.
pub fn retire_operation(asset: &Asset, amount: Amount) -> Result<Operation, LedgerError> {
    let issuer = asset.issuer().ok_or_else(|| {
        LedgerError::InvalidOperation("The native asset cannot be retired".to_string())
    })?;
    Operation::payment(issuer, asset.clone(), amount)
}

/// A submitted retirement and what the agreement still needs afterwards.
#[derive(Debug, Clone)]
pub struct Retirement {
    pub response: SubmitResponse,
    pub outstanding: i128,
}

/// Retires `amount` of `asset` held by `seller` and records it on the agreement at `path`.
///
/// Nothing is submitted unless the assignment is valid and the agreement file is writable.
pub async fn retire<H: Horizon + ?Sized>(
    client: &TokenClient<'_, H>,
    agreement: &mut CreditAgreement,
    path: &Path,
    seller: &KeyPair,
    asset: &Asset,
    amount: Amount,
) -> Result<Retirement, LedgerError> {
    let tokens = whole_tokens(amount)?;
    let operation = retire_operation(asset, amount)?;
    agreement.assigned_after(tokens)?;
    agreement.save(path)?;

    let seller_id = seller.public_key();
    let response = client.submit(seller, vec![operation]).await?;
    info!("{} retired {} {} in {}", seller_id, amount, asset.code(), response.hash);

    let outstanding = agreement.assign_tokens(&seller_id, tokens)?;
    agreement.save(path).map_err(|e| {
        LedgerError::AgreementError(format!(
            "Retirement {} was submitted but {} was not updated: {}",
            response.hash,
            path.display(),
            e
        ))
    })?;
    Ok(Retirement {
        response,
        outstanding,
    })
}

/// Whole tokens represented by `amount`; retirement is counted in whole credits.
pub fn whole_tokens(amount: Amount) -> Result<i128, LedgerError> {
    let stroops = amount.stroops();
    if stroops % crate::amount::STROOPS_PER_UNIT != 0 {
        return Err(LedgerError::InvalidAmount(format!(
            "{} is not a whole number of tokens",
            amount
        )));
    }
    Ok(i128::from(stroops / crate::amount::STROOPS_PER_UNIT))
}
