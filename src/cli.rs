//! CLI struct definitions for the `faqledger` binary.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "faqledger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Per-group FAQ ledger with versioned answers, soft delete and rollback, driven by chat commands."
)]
pub(crate) struct Cli {
    /// Settings file (defaults to $FAQLEDGER_CONFIG, then ./faqledger.toml).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SenderArgs {
    /// Chat group id (the FAQ namespace).
    #[clap(long)]
    pub group: String,
    /// Sending user id.
    #[clap(long)]
    pub user: String,
    /// Treat the message as a private (non-group) message.
    #[clap(long)]
    pub private: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the database and bootstrap the global namespace
    Init,
    /// Dispatch a single message through the FAQ plugin group
    Send {
        #[clap(flatten)]
        sender: SenderArgs,
        /// Message text; multiple words are joined with spaces.
        #[clap(required = true)]
        text: Vec<String>,
    },
    /// Dispatch every stdin line as a message
    Repl {
        #[clap(flatten)]
        sender: SenderArgs,
    },
    /// List allocated namespaces
    Namespaces {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
}
