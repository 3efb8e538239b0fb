//! Subcommand implementations and the state they share.

pub mod doc;
pub mod lease;
pub mod version;

use clap::Args;
use folio_core::config::EngineConfig;
use folio_core::model::FieldBag;
use folio_core::notifier::TracingChangeNotifier;
use folio_core_types::RequestContext;
use folio_engine::EngineContext;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// SQLite store path
    #[arg(long, global = true, default_value = ".folio/store.db")]
    pub db: String,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Age after which another actor may take over a lease
    #[arg(long, global = true)]
    pub lease_timeout_minutes: Option<i64>,
}

/// An open store plus the engine context built from the global options.
pub struct Session {
    pub conn: Connection,
    pub ctx: EngineContext,
    pub request: RequestContext,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = EngineConfig::default();
        if let Some(minutes) = global.lease_timeout_minutes {
            if minutes <= 0 {
                return Err("--lease-timeout-minutes must be positive".into());
            }
            let timeout = chrono::Duration::try_minutes(minutes)
                .ok_or("--lease-timeout-minutes is out of range")?;
            config = config.with_lease_timeout(timeout);
        }

        let conn = folio_store::db::open_store(&global.db)?;
        let ctx = EngineContext::new(config).with_notifier(Arc::new(TracingChangeNotifier));
        Ok(Self {
            conn,
            ctx,
            request: RequestContext::new(),
        })
    }
}

/// Parse a field bag from inline JSON, or from a file when prefixed with `@`.
pub fn parse_state(raw: &str) -> Result<FieldBag, Box<dyn std::error::Error>> {
    let json = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => raw.to_string(),
    };
    Ok(serde_json::from_str(&json)?)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
