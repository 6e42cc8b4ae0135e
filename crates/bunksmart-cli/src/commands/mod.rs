pub mod auth;
pub mod calendar;
pub mod challenge;
pub mod completions;
pub mod config;
pub mod data;
pub mod mark;
pub mod settings;
pub mod stats;

use bunksmart_core::storage::session;
use bunksmart_core::store::open_configured;
use bunksmart_core::{AttendanceEngine, Config, Database, RecordStore};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Engine = AttendanceEngine<Box<dyn RecordStore>>;

/// Engine for the configured store, signed in as the session user if any.
pub async fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let store = open_configured(&config)?;
    tracing::debug!(backend = ?config.store.backend, "opened record store");

    let mut engine = AttendanceEngine::new(store)
        .with_default_week_start(config.ui.week_start)
        .with_loading_timeout(config.loading_timeout());

    match session::current_user(&db)? {
        Some(user) => engine.sign_in(user).await?,
        None => tracing::debug!("no stored session"),
    }
    Ok(engine)
}

/// Error for a skipped operation: nobody is signed in.
pub fn not_signed_in() -> Box<dyn std::error::Error> {
    "not signed in (run `bunksmart auth login <user>`)".into()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
