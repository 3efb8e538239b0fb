//! Edit lease commands

use clap::{Args, Subcommand};
use folio_core::model::Actor;
use folio_core::policy::AllowAllAccessPolicy;
use folio_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};
use folio_engine::commands::lease::lease_status;

use super::{print_json, CliResult, GlobalOpts, Session};

#[derive(Debug, Args)]
pub struct LeaseArgs {
    #[command(subcommand)]
    pub command: LeaseCommand,
}

#[derive(Debug, Args)]
pub struct ActorArgs {
    #[arg(long)]
    pub doc: String,
    #[arg(long)]
    pub actor: String,
    /// Act with admin rights (release override)
    #[arg(long)]
    pub admin: bool,
}

impl ActorArgs {
    fn actor(&self) -> Actor {
        Actor {
            id: self.actor.clone(),
            is_admin: self.admin,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum LeaseCommand {
    /// Take the edit lease; exits non-zero when someone else holds it
    Acquire(ActorArgs),
    /// Give up the edit lease (holder or admin)
    Release(ActorArgs),
    /// Show who holds the lease and when it expires
    Status {
        #[arg(long)]
        doc: String,
    },
}

pub fn execute(args: LeaseArgs, global: &GlobalOpts) -> CliResult {
    let mut session = Session::open(global)?;
    match args.command {
        LeaseCommand::Acquire(a) => {
            let cmd = EngineCommand::AcquireLease {
                document_id: a.doc.clone(),
                actor: a.actor(),
            };
            match apply_engine_command(
                cmd,
                &mut session.conn,
                &session.ctx,
                &AllowAllAccessPolicy,
                &session.request,
            )? {
                EngineCommandResult::Lease(outcome) => {
                    print_json(&outcome)?;
                    outcome.into_result(&a.doc)?;
                    Ok(())
                }
                other => Err(format!("unexpected result: {:?}", other).into()),
            }
        }
        LeaseCommand::Release(a) => {
            let cmd = EngineCommand::ReleaseLease {
                document_id: a.doc.clone(),
                actor: a.actor(),
            };
            match apply_engine_command(
                cmd,
                &mut session.conn,
                &session.ctx,
                &AllowAllAccessPolicy,
                &session.request,
            )? {
                EngineCommandResult::Released(outcome) => print_json(&outcome),
                other => Err(format!("unexpected result: {:?}", other).into()),
            }
        }
        LeaseCommand::Status { doc } => {
            print_json(&lease_status(&session.conn, &session.ctx, &doc)?)
        }
    }
}
