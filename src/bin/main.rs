#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "carbon-tokens CLI".bright_green().bold());
    println!("{}", "-----------------".bright_green());
    println!();
    println!(
        "{}",
        "Each task is a separate binary; this one only lists them.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}  issue the asset, trustline, metadata, mint", "carbon-bootstrap".bright_white());
    println!("  - {}    print an account's balances", "carbon-balance".bright_white());
    println!("  - {}     generate a key pair", "carbon-keygen".bright_white());
    println!("  - {}     retire credits against an agreement", "carbon-retire".bright_white());
    println!("  - {}      transfer between holders, circulating supply", "carbon-token".bright_white());
    println!();
    println!("{}", "Configuration:".bright_green().underline());
    println!("  carbon.toml, or CARBON_* environment variables (a .env file is read)");
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin carbon-bootstrap -- --fund".italic());
}
