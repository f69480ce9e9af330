//! In-memory Horizon shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use carbon_tokens::amount::Amount;
use carbon_tokens::asset::Asset;
use carbon_tokens::error::{LedgerError, Result};
use carbon_tokens::horizon::{AccountSnapshot, AssetRecord, BalanceEntry, Horizon, SubmitResponse};
use carbon_tokens::transaction::{Operation, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Tracks sequences and credit balances, and records every accepted submission.
#[derive(Default)]
pub struct MockHorizon {
    pub accounts: Mutex<HashMap<String, AccountSnapshot>>,
    pub submitted: Mutex<Vec<Transaction>>,
    pub failing_kinds: HashSet<&'static str>,
    pub funded: Mutex<Vec<String>>,
}

fn add_stroops(balance: &str, delta: i64) -> Result<String> {
    let current: Amount = balance.parse()?;
    let updated = current
        .stroops()
        .checked_add(delta)
        .ok_or_else(|| LedgerError::InvalidAmount("balance overflow".to_string()))?;
    if updated < 0 {
        return Err(LedgerError::HorizonError {
            status: 400,
            title: "Transaction Failed".to_string(),
            result_codes: vec!["tx_failed".to_string(), "op_underfunded".to_string()],
        });
    }
    Ok(Amount::from_stroops(updated)?.to_string())
}

fn credit_entry(asset: &Asset, balance: &str) -> BalanceEntry {
    BalanceEntry::credit(asset.code(), asset.issuer().unwrap_or_default(), balance)
}

impl MockHorizon {
    pub fn with_accounts(ids: &[String]) -> Self {
        let mock = MockHorizon::default();
        for id in ids {
            mock.add_account(id, 1000);
        }
        mock
    }

    pub fn add_account(&self, id: &str, sequence: i64) {
        self.accounts.lock().unwrap().insert(
            id.to_string(),
            AccountSnapshot::new(id, sequence, vec![BalanceEntry::native("10000.0000000")]),
        );
    }

    /// Gives `id` a trustline to `asset` holding `balance`.
    pub fn set_balance(&self, id: &str, asset: &Asset, balance: &str) {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(id).expect("account exists");
        account.balances.retain(|entry| !entry.matches(asset));
        account.balances.push(credit_entry(asset, balance));
    }

    pub fn balance(&self, id: &str, asset: &Asset) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(id)
            .and_then(|account| account.balance_of(asset).map(|entry| entry.balance.clone()))
    }

    pub fn failing(mut self, kind: &'static str) -> Self {
        self.failing_kinds.insert(kind);
        self
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        self.submitted.lock().unwrap().clone()
    }

    fn apply(
        accounts: &mut HashMap<String, AccountSnapshot>,
        source: &str,
        operation: &Operation,
    ) -> Result<()> {
        match operation {
            Operation::ChangeTrust { asset, .. } => {
                let account = accounts.get_mut(source).ok_or_else(|| {
                    LedgerError::AccountNotFound(source.to_string())
                })?;
                if account.balance_of(asset).is_none() {
                    account.balances.push(credit_entry(asset, "0.0000000"));
                }
            }
            Operation::Payment {
                destination,
                asset,
                amount,
            } if !asset.is_native() => {
                let issuer = asset.issuer().unwrap_or_default().to_string();
                if source != issuer {
                    let account = accounts.get_mut(source).ok_or_else(|| {
                        LedgerError::AccountNotFound(source.to_string())
                    })?;
                    let entry = account
                        .balances
                        .iter_mut()
                        .find(|entry| entry.matches(asset))
                        .ok_or_else(|| LedgerError::InvalidOperation("src_no_trust".to_string()))?;
                    entry.balance = add_stroops(&entry.balance, -amount.stroops())?;
                }
                if *destination != issuer {
                    let account = accounts.get_mut(destination).ok_or_else(|| {
                        LedgerError::AccountNotFound(destination.clone())
                    })?;
                    let entry = account
                        .balances
                        .iter_mut()
                        .find(|entry| entry.matches(asset))
                        .ok_or_else(|| LedgerError::HorizonError {
                            status: 400,
                            title: "Transaction Failed".to_string(),
                            result_codes: vec!["tx_failed".to_string(), "op_no_trust".to_string()],
                        })?;
                    entry.balance = add_stroops(&entry.balance, amount.stroops())?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[async_trait]
impl Horizon for MockHorizon {
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot> {
        self.accounts
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<SubmitResponse> {
        let mut accounts = self.accounts.lock().unwrap();
        let source = transaction.source_account().to_string();
        let sequence = accounts
            .get(&source)
            .ok_or_else(|| LedgerError::AccountNotFound(source.clone()))?
            .sequence_number()?;

        if transaction
            .operations()
            .iter()
            .any(|op| self.failing_kinds.contains(op.kind()))
        {
            return Err(LedgerError::HorizonError {
                status: 400,
                title: "Transaction Failed".to_string(),
                result_codes: vec!["tx_failed".to_string()],
            });
        }
        if transaction.sequence() != sequence + 1 {
            return Err(LedgerError::HorizonError {
                status: 400,
                title: "Transaction Failed".to_string(),
                result_codes: vec!["tx_bad_seq".to_string()],
            });
        }

        // All or nothing, like the ledger.
        let mut staged = accounts.clone();
        for operation in transaction.operations() {
            Self::apply(&mut staged, &source, operation)?;
        }
        if let Some(account) = staged.get_mut(&source) {
            account.sequence = transaction.sequence().to_string();
        }
        *accounts = staged;
        self.submitted.lock().unwrap().push(transaction.clone());

        Ok(SubmitResponse {
            hash: transaction.hash_hex()?,
            ledger: Some(42),
            successful: Some(true),
        })
    }

    async fn load_asset(&self, asset: &Asset) -> Result<Option<AssetRecord>> {
        let issuer = asset
            .issuer()
            .ok_or_else(|| LedgerError::InvalidAsset("native".to_string()))?;
        let accounts = self.accounts.lock().unwrap();
        let mut holders = 0;
        let mut total: i64 = 0;
        for account in accounts.values() {
            if let Some(entry) = account.balance_of(asset) {
                holders += 1;
                total += entry.balance.parse::<Amount>()?.stroops();
            }
        }
        if holders == 0 {
            return Ok(None);
        }
        Ok(Some(AssetRecord::new(asset.code(), issuer, Amount::from_stroops(total)?)))
    }

    async fn fund_account(&self, account_id: &str) -> Result<()> {
        self.funded.lock().unwrap().push(account_id.to_string());
        if !self.accounts.lock().unwrap().contains_key(account_id) {
            self.add_account(account_id, 1000);
        }
        Ok(())
    }
}
