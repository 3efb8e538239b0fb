//! folio CLI
//!
//! Command-line interface for document versioning and edit leases

use clap::{Parser, Subcommand};
use folio_core::logging_facility::{self, Profile};

mod commands;

use commands::GlobalOpts;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(about = "folio - document version history with edit leases", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create and inspect documents
    Doc(commands::doc::DocArgs),
    /// Acquire, release and inspect edit leases
    Lease(commands::lease::LeaseArgs),
    /// Save, list, compare and restore versions
    Version(commands::version::VersionArgs),
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(if cli.global.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Doc(args) => commands::doc::execute(args, &cli.global),
        Commands::Lease(args) => commands::lease::execute(args, &cli.global),
        Commands::Version(args) => commands::version::execute(args, &cli.global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
