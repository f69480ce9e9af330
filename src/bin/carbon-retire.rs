#![forbid(unsafe_code)]
//! Retire CARBON credits against an agreement by paying them back to the issuer

use carbon_tokens::amount::Amount;
use carbon_tokens::asset::Asset;
use carbon_tokens::config::load_config_from;
use carbon_tokens::credits::{retire, CreditAgreement};
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
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Opens a new agreement file for a buyer
    Create {
        /// Agreement file to write
        file: PathBuf,
        /// Buyer account id
        #[arg(long)]
        buyer: String,
        /// Price per retired token
        #[arg(long)]
        price: u32,
        /// Number of tokens the buyer wants retired
        #[arg(long)]
        total: i128,
    },
    /// Retires tokens held by the seller and records them on the agreement
    Assign {
        /// Agreement file to update
        file: PathBuf,
        /// Whole number of tokens to retire
        #[arg(long)]
        amount: String,
        /// Seller secret seed (defaults to the distribution secret)
        #[arg(long)]
        seller_secret: Option<String>,
        /// Issuer account id of the asset (defaults to the configured issuer)
        #[arg(long)]
        issuer: Option<String>,
    },
    /// Shows the agreement state
    Show {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    carbon_tokens::init_logging();
    let cli = Cli::parse();
    let config = load_config_from(Some(cli.config.as_path()))?;

    match cli.command {
        Commands::Create {
            file,
            buyer,
            price,
            total,
        } => {
            let agreement = CreditAgreement::create(&buyer, price, total)?;
            agreement.save(&file)?;
            println!("{}", format!("📄 Agreement written to {}", file.display()).green());
        }
        Commands::Assign {
            file,
            amount,
            seller_secret,
            issuer,
        } => {
            let mut agreement = CreditAgreement::load(&file)?;
            let amount: Amount = amount.parse()?;

            let seller = match seller_secret {
                Some(secret) => KeyPair::from_secret_seed(&secret)?,
                None => config
                    .accounts
                    .distribution_keypair()?
                    .ok_or("No seller secret given and no distribution secret configured")?,
            };
            let issuer = match issuer {
                Some(id) => id,
                None => config
                    .accounts
                    .issuer_keypair()?
                    .map(|kp| kp.public_key())
                    .ok_or("No issuer given and no issuer configured")?,
            };
            let asset = Asset::credit(&config.asset.code, &issuer)?;

            let horizon =
                HorizonClient::new(&config.network.horizon_url, config.network.request_timeout())?;
            let client = TokenClient::new(&horizon, &config.network);
            let retirement = retire(&client, &mut agreement, &file, &seller, &asset, amount).await?;
            println!(
                "{}",
                format!("🔥 Retired {} {} ({})", amount, asset.code(), retirement.response.hash).green()
            );

            if agreement.is_fulfilled() {
                println!("{}", "✅ Agreement fulfilled".bright_green().bold());
            } else {
                println!("{}", format!("⏳ {} tokens outstanding", retirement.outstanding).yellow());
            }
        }
        Commands::Show { file } => {
            let agreement = CreditAgreement::load(&file)?;
            println!("{} {}", "Buyer:".bright_white(), agreement.buyer);
            println!("{} {}", "Price per token:".bright_white(), agreement.price_per_token);
            println!("{} {}", "Total:".bright_white(), agreement.total_value);
            println!("{} {}", "Assigned:".bright_white(), agreement.assigned_tokens);
            println!("{} {}", "Outstanding:".bright_white(), agreement.outstanding());
            println!("{} {}", "Amount due:".bright_white(), agreement.amount_due());
        }
    }

    Ok(())
}
