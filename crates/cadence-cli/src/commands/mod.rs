pub mod config;
pub mod journal;
pub mod prompt;
pub mod watch;

use cadence_core::{Config, Journal, Session, SqliteJournalStore, SystemClock};
use chrono::Utc;

/// kv key holding the growth prompt chosen with `prompt next`.
pub const PROMPT_OVERRIDE_KEY: &str = "growth_prompt_override";

pub type CliJournal = Journal<SqliteJournalStore, SystemClock>;

/// Open the owner's journal with the saved configuration and restore the
/// pending growth prompt choice.
pub fn open_journal(owner: &str) -> Result<CliJournal, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteJournalStore::open_default(owner)?;
    let saved = store
        .kv_get(PROMPT_OVERRIDE_KEY)?
        .and_then(|v| v.parse::<u32>().ok());

    let mut journal = Journal::open(Session::start(owner, Utc::now()), store, SystemClock, config)?;
    journal.set_prompt_override(saved);
    Ok(journal)
}

/// Persist (or clear) the growth prompt choice for the next invocation.
pub fn save_prompt_override(journal: &CliJournal) -> Result<(), Box<dyn std::error::Error>> {
    match journal.prompt_override() {
        Some(day) => journal.store().kv_set(PROMPT_OVERRIDE_KEY, &day.to_string())?,
        None => journal.store().kv_delete(PROMPT_OVERRIDE_KEY)?,
    }
    Ok(())
}
