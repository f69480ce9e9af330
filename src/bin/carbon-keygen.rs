#![forbid(unsafe_code)]
//! Generate a key pair, optionally saving it as a JSON key file

use carbon_tokens::crypto::KeyPair;
use carbon_tokens::keystore::{default_key_dir, KeyFile};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name stored in the key file; also the file name under ~/.carbon-tokens/keys
    #[arg(long)]
    name: Option<String>,
    /// Explicit output path for the key file
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    carbon_tokens::init_logging();
    let cli = Cli::parse();

    let keypair = KeyPair::random();
    println!("{}", "🔑 New key pair".bright_cyan().bold());
    println!("{} {}", "Public Key:".bright_white(), keypair.public_key());
    println!("{} {}", "Secret Key:".yellow(), keypair.secret_seed());

    let path = match (cli.out, &cli.name) {
        (Some(path), _) => Some(path),
        (None, Some(name)) => Some(default_key_dir()?.join(format!("{}.json", name))),
        (None, None) => None,
    };

    if let Some(path) = path {
        KeyFile::from_keypair(&keypair, cli.name).save(&path)?;
        println!("{}", format!("💾 Saved to {}", path.display()).green());
    } else {
        println!("{}", "⚠️  Not saved. Copy the secret key somewhere safe.".yellow());
    }

    Ok(())
}
