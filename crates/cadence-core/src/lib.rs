//! # Cadence Core Library
//!
//! Core logic for time-gated journaling. Three independent tracks (daily
//! growth prompts, weekly actions, a 100 day selfie journal) each accept a
//! new entry only after a cooldown since their latest one.
//!
//! ## Architecture
//!
//! - **Cadence**: the pure gate that turns entry history plus the current
//!   instant into writability and a countdown, the notice display state
//!   machine, and deadline-based countdown wakeups
//! - **Prompts**: fixed prompt/action tables indexed by sequence number
//! - **Storage**: the `JournalStore` contract with SQLite and in-memory
//!   implementations, plus TOML configuration
//! - **Journal**: the service tying a session, a store and a clock together
//!
//! ## Key Components
//!
//! - [`CadenceGate`]: cooldown and capacity rules for one track
//! - [`Journal`]: per-session journal service
//! - [`JournalStore`]: persistence contract
//! - [`Config`]: application configuration management

pub mod cadence;
pub mod entry;
pub mod error;
pub mod format;
pub mod journal;
pub mod prompts;
pub mod session;
pub mod storage;
pub mod track;

pub use cadence::{CadenceGate, CadenceState, Clock, Countdown, FixedClock, NoticeMachine, NoticeState, SystemClock};
pub use entry::{Draft, EntryId, JournalEntry, NewEntry, SelfiePayload};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use format::format_remaining;
pub use journal::{ExportRecord, Journal, PromptView, TrackStatus};
pub use prompts::{GrowthPrompt, PromptBook, PromptTable, WeeklyAction};
pub use session::Session;
pub use storage::{Config, JournalStore, MemoryJournalStore, SqliteJournalStore};
pub use track::{Granularity, Track};
