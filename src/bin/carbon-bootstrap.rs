#![forbid(unsafe_code)]
//! Create the CARBON asset: trustline, issuer metadata, mint, optional lock

use carbon_tokens::bootstrap::{AssetBootstrap, BootstrapPlan, ResolvedKeys, StepOutcome};
use carbon_tokens::config::load_config_from;
use carbon_tokens::horizon::HorizonClient;
use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "carbon.toml")]
    config: PathBuf,
    /// Fund both accounts through Friendbot before starting
    #[arg(long)]
    fund: bool,
    /// Set the issuer's master weight to zero after a successful mint
    #[arg(long)]
    lock_issuer: bool,
    /// Asset code to issue (overrides config)
    #[arg(long)]
    asset_code: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    carbon_tokens::init_logging();
    let cli = Cli::parse();

    let mut config = load_config_from(Some(cli.config.as_path()))?;
    if let Some(code) = cli.asset_code {
        config.asset.code = code;
        config.validate()?;
    }

    let keys = ResolvedKeys::from_config(&config)?;
    println!("{}", "🌱 CARBON asset bootstrap".bright_green().bold());
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━".bright_green());
    print_key("Issuer", &keys.issuer, keys.issuer_generated);
    print_key("Distribution", &keys.distribution, keys.distribution_generated);
    println!();

    let horizon = HorizonClient::new(&config.network.horizon_url, config.network.request_timeout())?
        .with_friendbot(&config.network.friendbot_url);
    let plan = BootstrapPlan::from_config(&config)?
        .with_funding(cli.fund)
        .with_lock_issuer(cli.lock_issuer);

    let report = match AssetBootstrap::new(&horizon, plan).run(&keys).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", format!("❌ Bootstrap halted: {}", e).red().bold());
            if e.is_account_not_found() {
                eprintln!(
                    "{}",
                    "💡 Fund the distribution account first (or pass --fund on testnet)".yellow()
                );
            }
            std::process::exit(1);
        }
    };

    println!("{}", format!("🪙 Asset: {}", report.asset).cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Step").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Result").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Details").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
        ]);

    for (step, outcome) in &report.steps {
        let (result, details, color) = match outcome {
            StepOutcome::Submitted(response) => (
                "submitted",
                match response.ledger {
                    Some(ledger) => format!("{} (ledger {})", response.hash, ledger),
                    None => response.hash.clone(),
                },
                TableColor::Green,
            ),
            StepOutcome::Completed => ("done", String::new(), TableColor::Green),
            StepOutcome::Failed(err) => ("failed", err.to_string(), TableColor::Red),
            StepOutcome::Skipped(reason) => ("skipped", reason.clone(), TableColor::Yellow),
        };
        table.add_row(vec![
            Cell::new(step.to_string()).fg(TableColor::White),
            Cell::new(result).fg(color),
            Cell::new(details).fg(TableColor::White),
        ]);
    }

    println!("{}", table);
    println!();
    println!("{}", format!("📍 Stage reached: {:?}", report.stage()).bright_blue().bold());
    if !report.is_clean() {
        println!(
            "{}",
            "⚠️  Some steps failed. Nothing was rolled back; re-running submits every step again."
                .yellow()
        );
    }

    Ok(())
}

fn print_key(label: &str, keypair: &carbon_tokens::crypto::KeyPair, generated: bool) {
    println!("{} {}", format!("{} public key:", label).bright_white(), keypair.public_key());
    if generated {
        // Generated keys exist nowhere else, so the secret has to be shown once.
        println!(
            "{} {}",
            format!("{} secret (generated, store it now):", label).yellow(),
            keypair.secret_seed()
        );
    }
}
