// Subcommands

pub mod job_chain;
pub mod rdkit_props;
pub mod token;
pub mod units_products;

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Display;

use squonk2_sdk::{ClientConfig, DmClient};

/// Print a completed step
pub(crate) fn ok(message: impl Display) {
    println!("{} {}", "✓".green(), message);
}

/// Print an in-progress step
pub(crate) fn step(message: impl Display) {
    println!("{} {}", "•".bold(), message);
}

/// A Data Manager client for an explicit URL
pub(crate) fn dm_client(url: &str, verify_tls: bool) -> Result<DmClient> {
    DmClient::new(ClientConfig::new(url).with_verify_tls(verify_tls))
        .with_context(|| format!("Invalid Data Manager URL '{}'", url))
}
