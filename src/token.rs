//! Token operations signed by a holder: transfers between holders and supply queries

use crate::amount::Amount;
use crate::asset::Asset;
use crate::config::NetworkConfig;
use crate::crypto::KeyPair;
use crate::error::{LedgerError, Result};
use crate::horizon::{Horizon, SubmitResponse};
use crate::transaction::{Operation, TransactionBuilder};
use tracing::info;

/// Builds, signs and submits transactions on behalf of one network.
pub struct TokenClient<'a, H: Horizon + ?Sized> {
    horizon: &'a H,
    network_passphrase: String,
    base_fee: u32,
    tx_timeout_secs: u64,
}

impl<'a, H: Horizon + ?Sized> TokenClient<'a, H> {
    pub fn new(horizon: &'a H, network: &NetworkConfig) -> Self {
        TokenClient {
            horizon,
            network_passphrase: network.passphrase.clone(),
            base_fee: network.base_fee,
            tx_timeout_secs: network.tx_timeout_secs,
        }
    }

    pub fn horizon(&self) -> &'a H {
        self.horizon
    }

    /// Loads the signer's account and submits `operations` as one transaction.
    pub async fn submit(&self, signer: &KeyPair, operations: Vec<Operation>) -> Result<SubmitResponse> {
        let mut account = self
            .horizon
            .load_account(&signer.public_key())
            .await?
            .to_account()?;
        let mut builder =
            TransactionBuilder::new(&mut account, &self.network_passphrase, self.base_fee)
                .set_timeout(self.tx_timeout_secs);
        for operation in operations {
            builder = builder.add_operation(operation);
        }
        let mut transaction = builder.build()?;
        transaction.sign(signer)?;
        self.horizon.submit_transaction(&transaction).await
    }

    /// Moves `amount` of `asset` from one holder to another.
    pub async fn transfer(
        &self,
        from: &KeyPair,
        recipient: &str,
        asset: &Asset,
        amount: Amount,
    ) -> Result<SubmitResponse> {
        let sender = from.public_key();
        if recipient.trim() == sender {
            return Err(LedgerError::InvalidOperation(
                "Sender and recipient are the same account".to_string(),
            ));
        }
        if asset.issuer() == Some(recipient.trim()) {
            return Err(LedgerError::InvalidOperation(
                "Paying tokens to their issuer retires them; use retire instead".to_string(),
            ));
        }
        let payment = Operation::payment(recipient.trim(), asset.clone(), amount)?;
        info!("Transferring {} {} from {} to {}", amount, asset.code(), sender, recipient);
        self.submit(from, vec![payment]).await
    }

    /// Units of `asset` currently held outside the issuer.
    pub async fn total_supply(&self, asset: &Asset) -> Result<Amount> {
        match self.horizon.load_asset(asset).await? {
            Some(record) => record.circulating(),
            None => Ok(Amount::ZERO),
        }
    }
}
