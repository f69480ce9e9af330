//! Retirement against agreements, holder transfers and supply, against an in-memory ledger

mod common;

use carbon_tokens::amount::Amount;
use carbon_tokens::asset::Asset;
use carbon_tokens::config::NetworkConfig;
use carbon_tokens::credits::{retire, CreditAgreement};
use carbon_tokens::crypto::KeyPair;
use carbon_tokens::error::LedgerError;
use carbon_tokens::token::TokenClient;
use carbon_tokens::transaction::Operation;
use common::MockHorizon;
use tempfile::TempDir;

struct Holders {
    issuer: KeyPair,
    seller: KeyPair,
    other: KeyPair,
    asset: Asset,
}

/// Issuer plus two holders; the seller starts with 100 CARBON.
fn setup() -> (Holders, MockHorizon) {
    let issuer = KeyPair::random();
    let seller = KeyPair::random();
    let other = KeyPair::random();
    let asset = Asset::credit("CARBON", &issuer.public_key()).unwrap();
    let horizon = MockHorizon::with_accounts(&[
        issuer.public_key(),
        seller.public_key(),
        other.public_key(),
    ]);
    horizon.set_balance(&seller.public_key(), &asset, "100.0000000");
    horizon.set_balance(&other.public_key(), &asset, "0.0000000");
    (
        Holders {
            issuer,
            seller,
            other,
            asset,
        },
        horizon,
    )
}

#[tokio::test]
async fn test_retire_pays_issuer_and_records_assignment() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());
    let dir = TempDir::new()?;
    let path = dir.path().join("agreement.json");
    let mut agreement = CreditAgreement::create("buyer", 10, 100)?;
    agreement.save(&path)?;

    let retirement = retire(
        &client,
        &mut agreement,
        &path,
        &holders.seller,
        &holders.asset,
        Amount::from_units(40)?,
    )
    .await?;

    assert_eq!(retirement.outstanding, 60);
    assert_eq!(agreement.assigned_tokens, 40);
    assert_eq!(CreditAgreement::load(&path)?, agreement);

    let submitted = horizon.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].source_account(), holders.seller.public_key());
    assert_eq!(
        submitted[0].operations(),
        &[Operation::Payment {
            destination: holders.issuer.public_key(),
            asset: holders.asset.clone(),
            amount: Amount::from_units(40)?,
        }]
    );
    assert_eq!(retirement.response.hash, submitted[0].hash_hex()?);
    assert_eq!(
        horizon.balance(&holders.seller.public_key(), &holders.asset).as_deref(),
        Some("60.0000000")
    );
    Ok(())
}

#[tokio::test]
async fn test_retire_with_unwritable_agreement_submits_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());
    let dir = TempDir::new()?;
    let path = dir.path().join("missing").join("agreement.json");
    let mut agreement = CreditAgreement::create("buyer", 10, 100)?;

    let result = retire(
        &client,
        &mut agreement,
        &path,
        &holders.seller,
        &holders.asset,
        Amount::from_units(40)?,
    )
    .await;

    assert!(matches!(result, Err(LedgerError::IoError(_))));
    assert!(horizon.submitted().is_empty());
    assert_eq!(agreement.assigned_tokens, 0);
    assert_eq!(
        horizon.balance(&holders.seller.public_key(), &holders.asset).as_deref(),
        Some("100.0000000")
    );
    Ok(())
}

#[tokio::test]
async fn test_retire_rejects_fractional_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());
    let dir = TempDir::new()?;
    let path = dir.path().join("agreement.json");
    let mut agreement = CreditAgreement::create("buyer", 10, 100)?;

    let result = retire(
        &client,
        &mut agreement,
        &path,
        &holders.seller,
        &holders.asset,
        "2.5".parse()?,
    )
    .await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    assert!(horizon.submitted().is_empty());
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn test_rejected_retirement_leaves_agreement_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());
    let dir = TempDir::new()?;
    let path = dir.path().join("agreement.json");
    let mut agreement = CreditAgreement::create("buyer", 10, 500)?;

    // The seller only holds 100.
    let result = retire(
        &client,
        &mut agreement,
        &path,
        &holders.seller,
        &holders.asset,
        Amount::from_units(200)?,
    )
    .await;
    assert!(matches!(result, Err(LedgerError::HorizonError { .. })));
    assert_eq!(agreement.assigned_tokens, 0);
    assert_eq!(CreditAgreement::load(&path)?.assigned_tokens, 0);
    Ok(())
}

#[tokio::test]
async fn test_transfer_between_holders() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());

    let response = client
        .transfer(
            &holders.seller,
            &holders.other.public_key(),
            &holders.asset,
            "12.5".parse()?,
        )
        .await?;

    let submitted = horizon.submitted();
    assert_eq!(response.hash, submitted[0].hash_hex()?);
    assert_eq!(submitted[0].source_account(), holders.seller.public_key());
    assert_eq!(submitted[0].fee(), 100);
    assert_eq!(
        horizon.balance(&holders.seller.public_key(), &holders.asset).as_deref(),
        Some("87.5000000")
    );
    assert_eq!(
        horizon.balance(&holders.other.public_key(), &holders.asset).as_deref(),
        Some("12.5000000")
    );
    Ok(())
}

#[tokio::test]
async fn test_transfer_refuses_self_and_issuer() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());
    let amount = Amount::from_units(1)?;

    let to_self = client
        .transfer(&holders.seller, &holders.seller.public_key(), &holders.asset, amount)
        .await;
    assert!(matches!(to_self, Err(LedgerError::InvalidOperation(_))));

    let to_issuer = client
        .transfer(&holders.seller, &holders.issuer.public_key(), &holders.asset, amount)
        .await;
    assert!(to_issuer.unwrap_err().to_string().contains("retire"));
    assert!(horizon.submitted().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_total_supply_drops_after_retirement() -> Result<(), Box<dyn std::error::Error>> {
    let (holders, horizon) = setup();
    let client = TokenClient::new(&horizon, &NetworkConfig::default());
    assert_eq!(client.total_supply(&holders.asset).await?, Amount::from_units(100)?);

    let dir = TempDir::new()?;
    let path = dir.path().join("agreement.json");
    let mut agreement = CreditAgreement::create("buyer", 10, 100)?;
    retire(
        &client,
        &mut agreement,
        &path,
        &holders.seller,
        &holders.asset,
        Amount::from_units(30)?,
    )
    .await?;
    assert_eq!(client.total_supply(&holders.asset).await?, Amount::from_units(70)?);

    let unknown = Asset::credit("CO2", &holders.issuer.public_key())?;
    assert_eq!(client.total_supply(&unknown).await?, Amount::ZERO);
    Ok(())
}
