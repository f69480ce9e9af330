//! Horizon HTTP client: account snapshots and transaction submission

use crate::amount::Amount;
use crate::asset::Asset;
use crate::crypto::decode_account_id;
use crate::error::{LedgerError, Result};
use crate::transaction::{Account, Transaction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NATIVE_ASSET_TYPE: &str = "native";
pub const POOL_SHARE_ASSET_TYPE: &str = "liquidity_pool_shares";

/// One entry of an account's `balances` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
    /// Set only on liquidity pool share balances, which carry no code or issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_pool_id: Option<String>,
    pub balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl BalanceEntry {
    pub fn native(balance: &str) -> Self {
        BalanceEntry {
            asset_type: NATIVE_ASSET_TYPE.to_string(),
            asset_code: None,
            asset_issuer: None,
            liquidity_pool_id: None,
            balance: balance.to_string(),
            limit: None,
        }
    }

    pub fn pool_share(pool_id: &str, balance: &str) -> Self {
        BalanceEntry {
            asset_type: POOL_SHARE_ASSET_TYPE.to_string(),
            asset_code: None,
            asset_issuer: None,
            liquidity_pool_id: Some(pool_id.to_string()),
            balance: balance.to_string(),
            limit: None,
        }
    }

    pub fn credit(code: &str, issuer: &str, balance: &str) -> Self {
        let asset_type = if code.len() <= 4 {
            "credit_alphanum4"
        } else {
            "credit_alphanum12"
        };
        BalanceEntry {
            asset_type: asset_type.to_string(),
            asset_code: Some(code.to_string()),
            asset_issuer: Some(issuer.to_string()),
            liquidity_pool_id: None,
            balance: balance.to_string(),
            limit: None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.asset_type == NATIVE_ASSET_TYPE
    }

    pub fn is_pool_share(&self) -> bool {
        self.asset_type == POOL_SHARE_ASSET_TYPE
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        match asset {
            Asset::Native => self.is_native(),
            Asset::Credit(credit) => {
                self.asset_code.as_deref() == Some(credit.code())
                    && self.asset_issuer.as_deref() == Some(credit.issuer())
            }
        }
    }
}

/// Horizon's current view of an account. Fetched on demand, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    /// Horizon encodes the 64-bit sequence as a string.
    pub sequence: String,
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

impl AccountSnapshot {
    pub fn new(account_id: &str, sequence: i64, balances: Vec<BalanceEntry>) -> Self {
        AccountSnapshot {
            account_id: account_id.to_string(),
            sequence: sequence.to_string(),
            balances,
        }
    }

    pub fn sequence_number(&self) -> Result<i64> {
        self.sequence.parse().map_err(|e| {
            LedgerError::SerializationError(format!(
                "Invalid sequence '{}' for {}: {}",
                self.sequence, self.account_id, e
            ))
        })
    }

    /// Source account for the transaction builder.
    pub fn to_account(&self) -> Result<Account> {
        Account::new(&self.account_id, self.sequence_number()?)
    }

    pub fn balance_of(&self, asset: &Asset) -> Option<&BalanceEntry> {
        self.balances.iter().find(|entry| entry.matches(asset))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub hash: String,
    #[serde(default)]
    pub ledger: Option<u64>,
    #[serde(default)]
    pub successful: Option<bool>,
}

/// One record of `GET /assets`: circulation statistics for a credit asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_code: String,
    pub asset_issuer: String,
    /// Older Horizon releases report the supply here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balances: Option<AssetBalances>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalances {
    pub authorized: String,
}

impl AssetRecord {
    pub fn new(asset_code: &str, asset_issuer: &str, authorized: Amount) -> Self {
        AssetRecord {
            asset_code: asset_code.to_string(),
            asset_issuer: asset_issuer.to_string(),
            amount: None,
            balances: Some(AssetBalances {
                authorized: authorized.to_string(),
            }),
        }
    }

    /// Units held by authorized trustlines. Tokens paid back to the issuer no longer count.
    pub fn circulating(&self) -> Result<Amount> {
        let raw = self
            .balances
            .as_ref()
            .map(|b| b.authorized.as_str())
            .or(self.amount.as_deref())
            .ok_or_else(|| {
                LedgerError::SerializationError(format!(
                    "Asset record for {} carries no amount",
                    self.asset_code
                ))
            })?;
        raw.parse()
    }
}

#[derive(Debug, Deserialize)]
struct AssetPage {
    #[serde(rename = "_embedded")]
    embedded: AssetPageRecords,
}

#[derive(Debug, Deserialize)]
struct AssetPageRecords {
    #[serde(default)]
    records: Vec<AssetRecord>,
}

/// Horizon "problem" document returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl Problem {
    fn into_error(self, status: u16) -> LedgerError {
        let mut result_codes = Vec::new();
        if let Some(codes) = self.extras.and_then(|e| e.result_codes) {
            result_codes.extend(codes.transaction);
            result_codes.extend(codes.operations);
        }
        let title = match (self.title.is_empty(), self.detail) {
            (true, Some(detail)) => detail,
            (true, None) => "Unknown error".to_string(),
            (false, _) => self.title,
        };
        LedgerError::HorizonError {
            status,
            title,
            result_codes,
        }
    }
}

/// The remote ledger service as the flows see it.
#[async_trait]
pub trait Horizon: Send + Sync {
    /// Fails with `AccountNotFound` when the account does not exist on the ledger.
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot>;

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<SubmitResponse>;

    /// Statistics for a credit asset; `None` when no account trusts it yet.
    async fn load_asset(&self, asset: &Asset) -> Result<Option<AssetRecord>>;

    /// Creates and funds an account through a test network faucet.
    async fn fund_account(&self, account_id: &str) -> Result<()> {
        Err(LedgerError::InvalidOperation(format!(
            "No faucet configured to fund {}",
            account_id
        )))
    }
}

pub struct HorizonClient {
    base_url: String,
    friendbot_url: Option<String>,
    client: reqwest::Client,
}

impl HorizonClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(LedgerError::ConfigError("Horizon URL must be set".to_string()));
        }
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            friendbot_url: None,
            client,
        })
    }

    pub fn with_friendbot(mut self, friendbot_url: &str) -> Self {
        let url = friendbot_url.trim();
        self.friendbot_url = if url.is_empty() {
            None
        } else {
            Some(url.trim_end_matches('/').to_string())
        };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn problem(response: reqwest::Response) -> LedgerError {
        let status = response.status().as_u16();
        let problem: Problem = response.json().await.unwrap_or_default();
        problem.into_error(status)
    }
}

#[async_trait]
impl Horizon for HorizonClient {
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot> {
        decode_account_id(account_id)?;
        debug!("Loading account {}", account_id);
        let response = self
            .client
            .get(format!("{}/accounts/{}", self.base_url, account_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::problem(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::SerializationError(format!("Failed to parse account: {}", e)))
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<SubmitResponse> {
        let envelope = transaction.to_envelope_base64()?;
        debug!(
            "Submitting transaction {} from {}",
            transaction.hash_hex()?,
            transaction.source_account()
        );
        let response = self
            .client
            .post(format!("{}/transactions", self.base_url))
            .form(&[("tx", envelope.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::problem(response).await);
        }

        response.json().await.map_err(|e| {
            LedgerError::SerializationError(format!("Failed to parse submit response: {}", e))
        })
    }

    async fn load_asset(&self, asset: &Asset) -> Result<Option<AssetRecord>> {
        let issuer = asset.issuer().ok_or_else(|| {
            LedgerError::InvalidAsset("The native asset has no asset record".to_string())
        })?;
        debug!("Loading asset {}", asset);
        let response = self
            .client
            .get(format!("{}/assets", self.base_url))
            .query(&[("asset_code", asset.code()), ("asset_issuer", issuer)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::problem(response).await);
        }

        let page: AssetPage = response
            .json()
            .await
            .map_err(|e| LedgerError::SerializationError(format!("Failed to parse assets: {}", e)))?;
        Ok(page
            .embedded
            .records
            .into_iter()
            .find(|record| record.asset_code == asset.code() && record.asset_issuer == issuer))
    }

    async fn fund_account(&self, account_id: &str) -> Result<()> {
        decode_account_id(account_id)?;
        let friendbot_url = self.friendbot_url.as_deref().ok_or_else(|| {
            LedgerError::ConfigError("Friendbot URL is not configured".to_string())
        })?;
        info!("Requesting Friendbot funding for {}", account_id);
        let response = self
            .client
            .get(friendbot_url)
            .query(&[("addr", account_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::problem(response).await;
            warn!("Friendbot refused to fund {}: {}", account_id, err);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_parse_account_snapshot() {
        let body = r#"{
            "id": "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57",
            "account_id": "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57",
            "sequence": "1234567890123",
            "subentry_count": 1,
            "balances": [
                {"balance": "1000.0000000", "limit": "1000000.0000000", "asset_type": "credit_alphanum12",
                 "asset_code": "CARBON", "asset_issuer": "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"},
                {"balance": "9999.9999900", "asset_type": "native"}
            ]
        }"#;
        let snapshot: AccountSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.sequence_number().unwrap(), 1_234_567_890_123);
        assert_eq!(snapshot.balances.len(), 2);
        assert!(snapshot.balances[1].is_native());
        assert_eq!(snapshot.balances[0].limit.as_deref(), Some("1000000.0000000"));

        let account = snapshot.to_account().unwrap();
        assert_eq!(account.sequence(), 1_234_567_890_123);
    }

    #[test]
    fn test_parse_pool_share_balance() {
        let body = r#"{"balance": "12.5000000", "limit": "922337203685.4775807",
            "liquidity_pool_id": "dd7b1ab831c273310ddbec6f97870aa83c2fbd78ce22aded37ecbf4f3380fac7",
            "asset_type": "liquidity_pool_shares"}"#;
        let entry: BalanceEntry = serde_json::from_str(body).unwrap();
        assert!(entry.is_pool_share());
        assert!(!entry.is_native());
        assert_eq!(entry.asset_code, None);
        assert_eq!(
            entry.liquidity_pool_id.as_deref(),
            Some("dd7b1ab831c273310ddbec6f97870aa83c2fbd78ce22aded37ecbf4f3380fac7")
        );
    }

    #[test]
    fn test_parse_asset_page() {
        let body = r#"{"_embedded": {"records": [
            {"asset_type": "credit_alphanum12", "asset_code": "CARBON",
             "asset_issuer": "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF",
             "accounts": {"authorized": 2}, "balances": {"authorized": "1000.0000000"}}
        ]}}"#;
        let page: AssetPage = serde_json::from_str(body).unwrap();
        let record = &page.embedded.records[0];
        assert_eq!(record.circulating().unwrap(), Amount::from_units(1000).unwrap());
    }

    #[test]
    fn test_asset_record_legacy_amount() {
        let record: AssetRecord = serde_json::from_str(
            r#"{"asset_code": "CARBON", "asset_issuer": "G", "amount": "25.0000000"}"#,
        )
        .unwrap();
        assert_eq!(record.circulating().unwrap().to_string(), "25.0000000");

        let empty: AssetRecord =
            serde_json::from_str(r#"{"asset_code": "CARBON", "asset_issuer": "G"}"#).unwrap();
        assert!(empty.circulating().is_err());
    }

    #[test]
    fn test_balance_of() {
        let issuer = KeyPair::random();
        let carbon = Asset::credit("CARBON", &issuer.public_key()).unwrap();
        let snapshot = AccountSnapshot::new(
            &KeyPair::random().public_key(),
            5,
            vec![
                BalanceEntry::native("100.0000000"),
                BalanceEntry::credit("CARBON", &issuer.public_key(), "1000.0000000"),
            ],
        );
        assert_eq!(snapshot.balance_of(&carbon).unwrap().balance, "1000.0000000");
        assert_eq!(snapshot.balance_of(&Asset::native()).unwrap().balance, "100.0000000");

        let other = Asset::credit("CARBON", &KeyPair::random().public_key()).unwrap();
        assert!(snapshot.balance_of(&other).is_none());
    }

    #[test]
    fn test_problem_with_result_codes() {
        let body = r#"{
            "type": "https://stellar.org/horizon-errors/transaction_failed",
            "title": "Transaction Failed",
            "status": 400,
            "extras": {"result_codes": {"transaction": "tx_failed", "operations": ["op_no_trust"]}}
        }"#;
        let problem: Problem = serde_json::from_str(body).unwrap();
        match problem.into_error(400) {
            LedgerError::HorizonError {
                status,
                title,
                result_codes,
            } => {
                assert_eq!(status, 400);
                assert_eq!(title, "Transaction Failed");
                assert_eq!(result_codes, vec!["tx_failed", "op_no_trust"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_problem() {
        let err = Problem::default().into_error(502);
        assert_eq!(err.to_string(), "Horizon rejected request (502): Unknown error");
    }

    #[test]
    fn test_client_requires_url() {
        assert!(HorizonClient::new("", Duration::from_secs(1)).is_err());
        let client = HorizonClient::new("https://horizon-testnet.stellar.org/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "https://horizon-testnet.stellar.org");
    }
}
