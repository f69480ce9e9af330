#![forbid(unsafe_code)]
//! Print every balance held by an account

use carbon_tokens::balance::inspect_balances;
use carbon_tokens::config::load_config_from;
use carbon_tokens::horizon::HorizonClient;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account to inspect (defaults to accounts.account_id / CARBON_ACCOUNT_ID)
    account_id: Option<String>,
    /// Path to the TOML config file
    #[arg(long, default_value = "carbon.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    carbon_tokens::init_logging();
    let cli = Cli::parse();
    let config = load_config_from(Some(cli.config.as_path()))?;

    let account_id = match cli.account_id.or(config.accounts.account_id.clone()) {
        Some(id) => id,
        None => {
            eprintln!("{}", "❌ No account given".red());
            eprintln!("{}", "💡 Usage: carbon-balance <ACCOUNT_ID>".yellow());
            std::process::exit(2);
        }
    };

    let horizon = HorizonClient::new(&config.network.horizon_url, config.network.request_timeout())?;
    let lines = match inspect_balances(&horizon, &account_id).await {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error fetching account details: {}", e);
            std::process::exit(1);
        }
    };

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
