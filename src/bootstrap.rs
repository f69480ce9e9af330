//! Asset bootstrap: trustline, issuer metadata, mint, and optional issuer lock
//!
//! Every submission is an independent step. A failed step is recorded in the
//! [`BootstrapReport`] and the flow moves on; nothing is rolled back. The
//! only hard stop is a distribution account that cannot be loaded, since
//! without it no trustline can exist and the mint cannot land.
//!
//! No local state is kept between runs. Running the flow again with the
//! same keys submits everything again, and Horizon decides what succeeds.

use crate::amount::Amount;
use crate::asset::Asset;
use crate::config::Config;
use crate::crypto::KeyPair;
use crate::error::{LedgerError, Result};
use crate::horizon::{Horizon, SubmitResponse};
use crate::transaction::{Account, Operation, Transaction, TransactionBuilder};
use std::fmt;
use tracing::{error, info, warn};

/// Lifecycle of an issued asset, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootstrapStage {
    KeysResolved,
    Trusted,
    MetadataRecorded,
    Minted,
    /// Issuer master weight is zero; the supply is final.
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapStep {
    FundIssuer,
    FundDistribution,
    Trustline,
    Metadata,
    Mint,
    LockIssuer,
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapStep::FundIssuer => "fund issuer",
            BootstrapStep::FundDistribution => "fund distribution",
            BootstrapStep::Trustline => "trustline",
            BootstrapStep::Metadata => "issuer metadata",
            BootstrapStep::Mint => "mint",
            BootstrapStep::LockIssuer => "lock issuer",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Transaction accepted by Horizon.
    Submitted(SubmitResponse),
    /// Step without a transaction (faucet funding) finished.
    Completed,
    Failed(LedgerError),
    Skipped(String),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Submitted(_) | StepOutcome::Completed)
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapPlan {
    pub asset_code: String,
    pub trust_limit: Amount,
    pub mint_amount: Amount,
    pub network_passphrase: String,
    pub base_fee: u32,
    pub tx_timeout_secs: u64,
    pub fund_accounts: bool,
    pub lock_issuer: bool,
}

impl BootstrapPlan {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(BootstrapPlan {
            asset_code: config.asset.code.clone(),
            trust_limit: config.asset.trust_limit()?,
            mint_amount: config.asset.mint_amount()?,
            network_passphrase: config.network.passphrase.clone(),
            base_fee: config.network.base_fee,
            tx_timeout_secs: config.network.tx_timeout_secs,
            fund_accounts: false,
            lock_issuer: false,
        })
    }

    pub fn with_funding(mut self, fund_accounts: bool) -> Self {
        self.fund_accounts = fund_accounts;
        self
    }

    pub fn with_lock_issuer(mut self, lock_issuer: bool) -> Self {
        self.lock_issuer = lock_issuer;
        self
    }
}

/// Issuer and distribution keys, noting which were freshly generated.
#[derive(Debug, Clone)]
pub struct ResolvedKeys {
    pub issuer: KeyPair,
    pub distribution: KeyPair,
    pub issuer_generated: bool,
    pub distribution_generated: bool,
}

impl ResolvedKeys {
    /// Uses the given keys, generating random ones where `None`.
    pub fn resolve(issuer: Option<KeyPair>, distribution: Option<KeyPair>) -> Self {
        let issuer_generated = issuer.is_none();
        let distribution_generated = distribution.is_none();
        ResolvedKeys {
            issuer: issuer.unwrap_or_else(KeyPair::random),
            distribution: distribution.unwrap_or_else(KeyPair::random),
            issuer_generated,
            distribution_generated,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::resolve(
            config.accounts.issuer_keypair()?,
            config.accounts.distribution_keypair()?,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub asset: Asset,
    pub issuer: String,
    pub distribution: String,
    pub steps: Vec<(BootstrapStep, StepOutcome)>,
}

impl BootstrapReport {
    fn new(asset: Asset, keys: &ResolvedKeys) -> Self {
        BootstrapReport {
            asset,
            issuer: keys.issuer.public_key(),
            distribution: keys.distribution.public_key(),
            steps: Vec::new(),
        }
    }

    fn record(&mut self, step: BootstrapStep, outcome: StepOutcome) {
        match &outcome {
            StepOutcome::Submitted(response) => {
                info!("{} submitted: {}", step, response.hash)
            }
            StepOutcome::Completed => info!("{} completed", step),
            StepOutcome::Failed(err) => error!("{} failed: {}", step, err),
            StepOutcome::Skipped(reason) => warn!("{} skipped: {}", step, reason),
        }
        self.steps.push((step, outcome));
    }

    pub fn outcome(&self, step: BootstrapStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    fn succeeded(&self, step: BootstrapStep) -> bool {
        self.outcome(step).map(StepOutcome::is_success).unwrap_or(false)
    }

    /// Furthest lifecycle stage reached with every earlier stage completed.
    pub fn stage(&self) -> BootstrapStage {
        let ladder = [
            (BootstrapStep::Trustline, BootstrapStage::Trusted),
            (BootstrapStep::Metadata, BootstrapStage::MetadataRecorded),
            (BootstrapStep::Mint, BootstrapStage::Minted),
            (BootstrapStep::LockIssuer, BootstrapStage::Locked),
        ];
        let mut stage = BootstrapStage::KeysResolved;
        for (step, reached) in ladder {
            if !self.succeeded(step) {
                break;
            }
            stage = reached;
        }
        stage
    }

    pub fn failures(&self) -> Vec<(BootstrapStep, &LedgerError)> {
        self.steps
            .iter()
            .filter_map(|(step, outcome)| match outcome {
                StepOutcome::Failed(err) => Some((*step, err)),
                _ => None,
            })
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures().is_empty()
    }
}

pub struct AssetBootstrap<'a, H: Horizon + ?Sized> {
    horizon: &'a H,
    plan: BootstrapPlan,
}

impl<'a, H: Horizon + ?Sized> AssetBootstrap<'a, H> {
    pub fn new(horizon: &'a H, plan: BootstrapPlan) -> Self {
        Self { horizon, plan }
    }

    pub fn plan(&self) -> &BootstrapPlan {
        &self.plan
    }

    /// Data entries written to the issuer account: who issues, who receives.
    pub fn metadata_operations(&self, keys: &ResolvedKeys) -> Result<Vec<Operation>> {
        let issuer = keys.issuer.public_key();
        let recipient = keys.distribution.public_key();
        Ok(vec![
            Operation::manage_data(
                &format!("{}.issuer", self.plan.asset_code),
                Some(issuer.as_bytes()),
            )?,
            Operation::manage_data(
                &format!("{}.recipient", self.plan.asset_code),
                Some(recipient.as_bytes()),
            )?,
        ])
    }

    fn build(&self, source: &mut Account, operations: Vec<Operation>, signer: &KeyPair) -> Result<Transaction> {
        let mut builder = TransactionBuilder::new(source, &self.plan.network_passphrase, self.plan.base_fee)
            .set_timeout(self.plan.tx_timeout_secs);
        for operation in operations {
            builder = builder.add_operation(operation);
        }
        let mut transaction = builder.build()?;
        transaction.sign(signer)?;
        Ok(transaction)
    }

    async fn submit(&self, source: &mut Account, operations: Vec<Operation>, signer: &KeyPair) -> StepOutcome {
        let transaction = match self.build(source, operations, signer) {
            Ok(tx) => tx,
            Err(err) => return StepOutcome::Failed(err),
        };
        match self.horizon.submit_transaction(&transaction).await {
            Ok(response) => StepOutcome::Submitted(response),
            Err(err) => StepOutcome::Failed(err),
        }
    }

    /// Loads the issuer and submits one issuer-signed transaction.
    async fn submit_from_issuer(
        &self,
        keys: &ResolvedKeys,
        operations: Result<Vec<Operation>>,
    ) -> StepOutcome {
        let operations = match operations {
            Ok(ops) => ops,
            Err(err) => return StepOutcome::Failed(err),
        };
        let mut issuer = match self.load(&keys.issuer.public_key()).await {
            Ok(account) => account,
            Err(err) => return StepOutcome::Failed(err),
        };
        self.submit(&mut issuer, operations, &keys.issuer).await
    }

    async fn load(&self, account_id: &str) -> Result<Account> {
        self.horizon.load_account(account_id).await?.to_account()
    }

    async fn fund(&self, account_id: &str) -> StepOutcome {
        match self.horizon.fund_account(account_id).await {
            Ok(()) => StepOutcome::Completed,
            Err(err) => StepOutcome::Failed(err),
        }
    }

    /// Runs the flow. Returns `Err` only when the distribution account cannot be loaded.
    pub async fn run(&self, keys: &ResolvedKeys) -> Result<BootstrapReport> {
        let asset = Asset::credit(&self.plan.asset_code, &keys.issuer.public_key())?;
        let mut report = BootstrapReport::new(asset.clone(), keys);
        info!(
            "Bootstrapping {} (issuer {}, distribution {})",
            asset, report.issuer, report.distribution
        );

        if self.plan.fund_accounts {
            let outcome = self.fund(&report.issuer).await;
            report.record(BootstrapStep::FundIssuer, outcome);
            let outcome = self.fund(&report.distribution).await;
            report.record(BootstrapStep::FundDistribution, outcome);
        }

        let mut distribution = match self.load(&report.distribution).await {
            Ok(account) => account,
            Err(err) => {
                error!(
                    "Cannot load distribution account {}: {}",
                    report.distribution, err
                );
                return Err(err);
            }
        };

        let outcome = match Operation::change_trust(asset.clone(), self.plan.trust_limit) {
            Ok(op) => self.submit(&mut distribution, vec![op], &keys.distribution).await,
            Err(err) => StepOutcome::Failed(err),
        };
        report.record(BootstrapStep::Trustline, outcome);

        let outcome = self
            .submit_from_issuer(keys, self.metadata_operations(keys))
            .await;
        report.record(BootstrapStep::Metadata, outcome);

        let mint = Operation::payment(&report.distribution, asset.clone(), self.plan.mint_amount)
            .map(|op| vec![op]);
        let outcome = self.submit_from_issuer(keys, mint).await;
        report.record(BootstrapStep::Mint, outcome);

        if self.plan.lock_issuer {
            let outcome = if report.succeeded(BootstrapStep::Mint) {
                self.submit_from_issuer(keys, Ok(vec![Operation::lock_account()]))
                    .await
            } else {
                // Never lock an issuer that has not minted.
                StepOutcome::Skipped("mint did not succeed".to_string())
            };
            report.record(BootstrapStep::LockIssuer, outcome);
        }

        info!("Bootstrap finished at stage {:?}", report.stage());
        Ok(report)
    }
}
