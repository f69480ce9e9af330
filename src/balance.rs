//! Balance inspection: one line per asset held by an account

use crate::asset::NATIVE_ASSET_CODE;
use crate::error::Result;
use crate::horizon::{BalanceEntry, Horizon};
use tracing::{info, warn};

pub const POOL_SHARE_LABEL: &str = "Pool Share";

/// Formats a balance entry the way the balance report prints it.
///
/// Returns `None` for a credit entry missing its code or issuer.
pub fn format_balance_line(entry: &BalanceEntry) -> Option<String> {
    if entry.is_native() {
        return Some(format!(
            "Asset: {}, Balance: {}",
            NATIVE_ASSET_CODE, entry.balance
        ));
    }
    if entry.is_pool_share() {
        let pool = entry.liquidity_pool_id.as_deref()?;
        return Some(format!(
            "Asset: {}, Pool: {}, Balance: {}",
            POOL_SHARE_LABEL, pool, entry.balance
        ));
    }
    match (&entry.asset_code, &entry.asset_issuer) {
        (Some(code), Some(issuer)) => Some(format!(
            "Asset: {}, Issuer: {}, Balance: {}",
            code, issuer, entry.balance
        )),
        _ => None,
    }
}

/// Fetches `account_id` and returns its balance lines in ledger order.
pub async fn inspect_balances<H: Horizon + ?Sized>(
    horizon: &H,
    account_id: &str,
) -> Result<Vec<String>> {
    let snapshot = horizon.load_account(account_id).await?;
    info!(
        "Account {} holds {} balance entries",
        snapshot.account_id,
        snapshot.balances.len()
    );
    Ok(snapshot
        .balances
        .iter()
        .filter_map(|entry| {
            let line = format_balance_line(entry);
            if line.is_none() {
                warn!(
                    "Skipping {} balance of {} with no asset identity",
                    entry.asset_type, entry.balance
                );
            }
            line
        })
        .collect())
}
