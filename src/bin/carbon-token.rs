#![forbid(unsafe_code)]
//! Move CARBON between holders and report its circulating supply

use carbon_tokens::amount::Amount;
use carbon_tokens::asset::Asset;
use carbon_tokens::config::{load_config_from, Config};
use carbon_tokens::crypto::KeyPair;
use carbon_tokens::horizon::HorizonClient;
use carbon_tokens::token::TokenClient;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "carbon.toml")]
    config: PathBuf,
    /// Issuer account id of the asset (defaults to the configured issuer)
    #[arg(long, global = true)]
    issuer: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sends tokens from one holder to another
    Transfer {
        /// Recipient account id
        recipient: String,
        /// Amount with up to 7 decimals
        amount: String,
        /// Sender secret seed (defaults to the distribution secret)
        #[arg(long)]
        from_secret: Option<String>,
    },
    /// Prints the amount held outside the issuer
    Supply,
}

fn resolve_issuer(cli_issuer: Option<String>, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    match cli_issuer {
        Some(id) => Ok(id),
        None => Ok(config
            .accounts
            .issuer_keypair()?
            .map(|kp| kp.public_key())
            .ok_or("No issuer given and no issuer configured")?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    carbon_tokens::init_logging();
    let cli = Cli::parse();
    let config = load_config_from(Some(cli.config.as_path()))?;

    let issuer = resolve_issuer(cli.issuer, &config)?;
    let asset = Asset::credit(&config.asset.code, &issuer)?;
    let horizon = HorizonClient::new(&config.network.horizon_url, config.network.request_timeout())?;
    let client = TokenClient::new(&horizon, &config.network);

    match cli.command {
        Commands::Transfer {
            recipient,
            amount,
            from_secret,
        } => {
            let amount: Amount = amount.parse()?;
            let sender = match from_secret {
                Some(secret) => KeyPair::from_secret_seed(&secret)?,
                None => config
                    .accounts
                    .distribution_keypair()?
                    .ok_or("No sender secret given and no distribution secret configured")?,
            };
            let response = client.transfer(&sender, &recipient, &asset, amount).await?;
            println!(
                "{}",
                format!("💸 Sent {} {} to {} ({})", amount, asset.code(), recipient, response.hash).green()
            );
        }
        Commands::Supply => {
            let supply = client.total_supply(&asset).await?;
            println!("{} {}", "Asset:".bright_white(), asset);
            println!("{} {}", "Circulating supply:".bright_white(), supply);
        }
    }

    Ok(())
}
