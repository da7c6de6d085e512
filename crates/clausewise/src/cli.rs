use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clausewise", about = "Clausewise contract analysis CLI")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one contract document for risk.
    Contract {
        input: String,
        #[arg(long, default_value = "standard")]
        depth: String,
    },
    /// Check a document against regulatory requirement sets.
    Compliance {
        input: String,
        #[arg(long, default_value = "")]
        regulations: String,
    },
    /// Score a vendor from a JSON request (metrics plus risk findings).
    Vendor { input: String },
    /// Evaluate RFQ proposals from a JSON request.
    Rfq { input: String },
    /// Prepare a negotiation brief from a JSON request.
    Negotiation { input: String },
    /// Summarize savings records from a JSON request.
    Savings { input: String },
    /// Run contract analysis over every matching file under a directory.
    Batch {
        input: String,
        #[arg(long, default_value = "txt,md,text")]
        extensions: String,
    },
}
