//! Document commands

use clap::{Args, Subcommand};
use folio_engine::commands::version::{create_document, load_document};

use super::{parse_state, print_json, CliResult, GlobalOpts, Session};

#[derive(Debug, Args)]
pub struct DocArgs {
    #[command(subcommand)]
    pub command: DocCommand,
}

#[derive(Debug, Subcommand)]
pub enum DocCommand {
    /// Create a document with an initial state
    Create {
        /// Document id (UUIDv7 when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Field bag as JSON, or @path to a JSON file
        #[arg(long)]
        state: String,
    },
    /// Print a document's current state and lease fields
    Show {
        #[arg(long)]
        id: String,
    },
}

pub fn execute(args: DocArgs, global: &GlobalOpts) -> CliResult {
    let session = Session::open(global)?;
    match args.command {
        DocCommand::Create { id, state } => {
            let state = parse_state(&state)?;
            let document = create_document(&session.conn, &session.ctx, id, state)?;
            print_json(&document)
        }
        DocCommand::Show { id } => print_json(&load_document(&session.conn, &id)?),
    }
}
