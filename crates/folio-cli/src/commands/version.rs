//! Version history commands

use clap::{Args, Subcommand};
use folio_core::model::Actor;
use folio_core::policy::AllowAllAccessPolicy;
use folio_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};
use folio_engine::commands::version::{compare_versions, get_history, get_version};

use super::{parse_state, print_json, CliResult, GlobalOpts, Session};

#[derive(Debug, Args)]
pub struct VersionArgs {
    #[command(subcommand)]
    pub command: VersionCommand,
}

#[derive(Debug, Subcommand)]
pub enum VersionCommand {
    /// Save a new state as the lease holder; releases the lease
    Save {
        #[arg(long)]
        doc: String,
        #[arg(long)]
        actor: String,
        /// Field bag as JSON, or @path to a JSON file
        #[arg(long)]
        state: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List versions, newest first
    History {
        #[arg(long)]
        doc: String,
        #[arg(long, default_value_t = 20)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Print one version
    Show {
        #[arg(long)]
        doc: String,
        #[arg(long)]
        version: u64,
    },
    /// Diff two versions
    Compare {
        #[arg(long)]
        doc: String,
        #[arg(long)]
        from: u64,
        #[arg(long)]
        to: u64,
    },
    /// Restore a document to an earlier version
    Restore {
        #[arg(long)]
        doc: String,
        #[arg(long)]
        version: u64,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        admin: bool,
    },
}

pub fn execute(args: VersionArgs, global: &GlobalOpts) -> CliResult {
    let mut session = Session::open(global)?;
    match args.command {
        VersionCommand::Save {
            doc,
            actor,
            state,
            reason,
        } => {
            let cmd = EngineCommand::SaveWithVersion {
                document_id: doc,
                actor: Actor::new(actor),
                state: parse_state(&state)?,
                reason,
            };
            match apply_engine_command(
                cmd,
                &mut session.conn,
                &session.ctx,
                &AllowAllAccessPolicy,
                &session.request,
            )? {
                EngineCommandResult::Saved(version) => print_json(&version),
                other => Err(format!("unexpected result: {:?}", other).into()),
            }
        }
        VersionCommand::History { doc, limit, offset } => print_json(&get_history(
            &session.conn,
            &session.ctx,
            &doc,
            limit,
            offset,
        )?),
        VersionCommand::Show { doc, version } => {
            print_json(&get_version(&session.conn, &doc, version)?)
        }
        VersionCommand::Compare { doc, from, to } => print_json(&compare_versions(
            &session.conn,
            &session.ctx,
            &doc,
            from,
            to,
        )?),
        VersionCommand::Restore {
            doc,
            version,
            actor,
            reason,
            admin,
        } => {
            let cmd = EngineCommand::RestoreVersion {
                document_id: doc,
                actor: Actor {
                    id: actor,
                    is_admin: admin,
                },
                version,
                reason,
            };
            match apply_engine_command(
                cmd,
                &mut session.conn,
                &session.ctx,
                &AllowAllAccessPolicy,
                &session.request,
            )? {
                EngineCommandResult::Restored(document) => print_json(&document),
                other => Err(format!("unexpected result: {:?}", other).into()),
            }
        }
    }
}
