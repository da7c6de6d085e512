mod cli;
mod config;
mod logging;
mod run;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    match cli.command {
        Command::Contract { input, depth } => run::contract(input, depth),
        Command::Compliance { input, regulations } => run::compliance(input, regulations),
        Command::Vendor { input } => run::vendor(input),
        Command::Rfq { input } => run::rfq(input),
        Command::Negotiation { input } => run::negotiation(input),
        Command::Savings { input } => run::savings(input),
        Command::Batch { input, extensions } => run::batch(input, extensions),
    }
}
