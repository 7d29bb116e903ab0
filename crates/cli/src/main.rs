//! Squonk2 CLI - example and test drivers for the Squonk2 client
//!
//! Each subcommand is a short, sequential script against the Data Manager
//! or Account Server. Exit code 0 means every step succeeded, 1 means a
//! step failed (or a job did not finish in time).

mod commands;
mod logging;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{dm_test, job_chain, rdkit_props, token, units_products};

#[derive(Parser)]
#[command(name = "squonk2")]
#[command(about = "Squonk2 Data Manager and Account Server drivers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get and print a Keycloak access token
    Token(token::TokenArgs),

    /// Developer test of the Data Manager (files, jobs and clean-up)
    DmTest(dm_test::DmTestArgs),

    /// Run a YAML list of Jobs, one after the other
    JobChain(job_chain::JobChainArgs),

    /// Calculate RDKit molecular properties for an uploaded file
    RdkitProps(rdkit_props::RdkitPropsArgs),

    /// Create (and delete) an Account Server Unit and Product
    UnitsProducts(units_products::UnitsProductsArgs),
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Token(args) => token::run(args).await,
        Commands::DmTest(args) => dm_test::run(args).await,
        Commands::JobChain(args) => job_chain::run(args).await,
        Commands::RdkitProps(args) => rdkit_props::run(args).await,
        Commands::UnitsProducts(args) => units_products::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "FAILED".red().bold(), e);
        std::process::exit(1);
    }
}
