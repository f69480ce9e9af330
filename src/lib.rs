//! carbon-tokens - issue and inspect a CARBON credit asset on the Stellar test network
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Primitives
//! - [`crypto`] - ed25519 key pairs and strkey encoding
//! - [`asset`] - Asset descriptors (native or code + issuer)
//! - [`amount`] - Seven-decimal fixed-point amounts
//! - [`transaction`] - Operations, transaction builder and signing
//!
//! ## Remote Ledger
//! - [`horizon`] - Horizon HTTP client and the [`horizon::Horizon`] trait
//!
//! ## Flows
//! - [`bootstrap`] - Trustline, metadata, mint and issuer lock
//! - [`balance`] - Balance inspection
//! - [`credits`] - Carbon credit agreements and retirement
//! - [`token`] - Signed submissions, holder transfers and supply queries
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`keystore`] - JSON key files
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Primitives
// ============================================================================
pub mod amount;
pub mod asset;
pub mod crypto;
pub mod transaction;

// ============================================================================
// Remote Ledger
// ============================================================================
pub mod horizon;

// ============================================================================
// Flows
// ============================================================================
pub mod balance;
pub mod bootstrap;
pub mod credits;
pub mod token;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod keystore;

/// Installs the tracing subscriber used by every binary (`RUST_LOG` controls the filter).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
