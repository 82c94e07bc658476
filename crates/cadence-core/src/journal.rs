//! Journal service - wires a store, a clock and the cadence gate together.
//!
//! The service keeps the last history it managed to load for each track.
//! When the store is unreachable it keeps answering from that history and
//! flags the track as stale instead of blocking.
//!
//! ## Usage
//!
//! ```ignore
//! let session = Session::start("client-42", Utc::now());
//! let mut journal = Journal::open(session, store, SystemClock, Config::load()?)?;
//!
//! let status = journal.status(Track::Growth)?;
//! if status.writable {
//!     journal.submit(Track::Growth, Draft::text("Today I noticed..."))?;
//! }
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::cadence::{CadenceState, Clock, Countdown, NoticeMachine, NoticeState};
use crate::entry::{backfill_sequences, Draft, EntryId, JournalEntry, NewEntry};
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::format::format_remaining;
use crate::prompts::PromptBook;
use crate::session::Session;
use crate::storage::{Config, JournalStore};
use crate::track::Track;

/// Prompt or action shown for the next entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PromptView {
    Growth { day: u32, number: u32, text: String },
    Weekly { week: u32, number: u32, title: String, text: String },
}

/// Everything a track view needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct TrackStatus {
    pub track: Track,
    pub writable: bool,
    pub capacity_reached: bool,
    pub capacity: Option<u32>,
    pub completed: u32,
    /// Sequence number the next entry will get.
    pub next_sequence: u32,
    /// "Day 4", "Week 2".
    pub label: String,
    pub remaining_secs: Option<i64>,
    pub remaining_display: Option<String>,
    pub available_at: Option<DateTime<Utc>>,
    pub notice: NoticeState,
    pub prompt: Option<PromptView>,
    /// History could not be refreshed; values come from the last good load.
    pub stale: bool,
    pub error: Option<String>,
}

/// One exported entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub title: String,
    pub content: String,
    pub date: String,
}

#[derive(Debug, Default)]
struct TrackCache {
    entries: Vec<JournalEntry>,
    /// Highest sequence number the store has ever recorded for the track.
    high_water: u32,
    loaded: bool,
    stale: bool,
    error: Option<String>,
    notice: NoticeMachine,
}

pub struct Journal<S, C> {
    session: Session,
    store: S,
    clock: C,
    config: Config,
    prompts: PromptBook,
    tracks: HashMap<Track, TrackCache>,
    /// Growth sequence whose prompt is shown instead of the next day's.
    growth_override: Option<u32>,
}

impl<S: JournalStore, C: Clock> Journal<S, C> {
    pub fn new(session: Session, store: S, clock: C, config: Config, prompts: PromptBook) -> Self {
        Self {
            session,
            store,
            clock,
            config,
            prompts,
            tracks: HashMap::new(),
            growth_override: None,
        }
    }

    /// Build a journal with prompt tables taken from `config`.
    pub fn open(session: Session, store: S, clock: C, config: Config) -> Result<Self> {
        let prompts = PromptBook::load(
            config.prompts.growth_path.as_deref(),
            config.prompts.weekly_path.as_deref(),
        )?;
        Ok(Self::new(session, store, clock, config, prompts))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Log out: end the session and drop all cached history.
    pub fn end_session(&mut self) {
        self.session.end(self.clock.now());
        self.tracks.clear();
        self.growth_override = None;
    }

    fn cache(&mut self, track: Track) -> &mut TrackCache {
        let dwell = self.config.notice_dwell();
        self.tracks.entry(track).or_insert_with(|| TrackCache {
            notice: NoticeMachine::new(dwell),
            ..TrackCache::default()
        })
    }

    /// Reload `track` from the store.
    ///
    /// Store failures do not surface as errors: the previous history is kept
    /// and the track is marked stale. Only an ended session fails.
    pub fn refresh(&mut self, track: Track) -> Result<()> {
        self.session.ensure_active()?;
        let result = self
            .store
            .list(track)
            .and_then(|entries| Ok((entries, self.store.highest_sequence(track)?)));
        let cache = self.cache(track);
        match result {
            Ok((mut entries, high_water)) => {
                backfill_sequences(&mut entries);
                tracing::debug!("loaded {} {} entries", entries.len(), track.key());
                cache.entries = entries;
                cache.high_water = high_water;
                cache.loaded = true;
                cache.stale = false;
                cache.error = None;
            }
            Err(e) => {
                tracing::warn!("keeping last known {} history: {e}", track.key());
                cache.stale = true;
                cache.error = Some(e.to_string());
            }
        }
        Ok(())
    }

    fn ensure_loaded(&mut self, track: Track) -> Result<()> {
        let loaded = self.tracks.get(&track).is_some_and(|c| c.loaded);
        if !loaded {
            self.refresh(track)?;
        }
        Ok(())
    }

    /// Entries for `track`, oldest first, each carrying its sequence number.
    pub fn entries(&mut self, track: Track) -> Result<Vec<JournalEntry>> {
        self.session.ensure_active()?;
        self.ensure_loaded(track)?;
        Ok(self.cache(track).entries.clone())
    }

    /// Gate result for `track` plus the sequence number the next entry gets.
    ///
    /// The number is normally `count + 1`. Numbers are never reused, so
    /// after a deletion it continues past the highest one ever recorded. A
    /// capped track is complete once that number would exceed the capacity.
    fn track_state(&mut self, track: Track, now: DateTime<Utc>) -> (CadenceState, u32) {
        let gate = self.config.gate(track);
        let cache = self.cache(track);
        let state = gate.evaluate_entries(&cache.entries, now);
        let highest = cache
            .entries
            .iter()
            .filter_map(|e| e.sequence)
            .max()
            .unwrap_or(0)
            .max(cache.high_water);
        let next = state.next_sequence.max(highest.saturating_add(1));

        if gate.capacity().is_some_and(|cap| next > cap) {
            let complete = CadenceState {
                writable: false,
                remaining: None,
                available_at: None,
                capacity_reached: true,
                ..state
            };
            return (complete, next);
        }
        (state, next)
    }

    fn prompt_for(&self, track: Track, sequence: u32) -> Result<Option<PromptView>> {
        let view = match track {
            Track::Growth => {
                let day = self.growth_override.unwrap_or(sequence);
                let prompt = self.prompts.growth.lookup(day)?;
                Some(PromptView::Growth {
                    day,
                    number: prompt.number,
                    text: prompt.text.clone(),
                })
            }
            Track::Weekly => {
                let action = self.prompts.weekly.lookup(sequence)?;
                Some(PromptView::Weekly {
                    week: sequence,
                    number: action.number,
                    title: action.title.clone(),
                    text: action.text.clone(),
                })
            }
            Track::Selfie => None,
        };
        Ok(view)
    }

    /// Current state of `track`.
    pub fn status(&mut self, track: Track) -> Result<TrackStatus> {
        self.session.ensure_active()?;
        self.ensure_loaded(track)?;

        let now = self.clock.now();
        let (state, next_sequence) = self.track_state(track, now);
        let prompt = if state.capacity_reached {
            None
        } else {
            self.prompt_for(track, next_sequence)?
        };

        let capacity = self.config.capacity(track);
        let cache = self.cache(track);
        let notice = cache.notice.observe(state.is_locked(), now);
        let stale = cache.stale;
        let error = cache.error.clone();
        tracing::debug!(
            "{} writable={} next={} notice={:?}",
            track.key(),
            state.writable,
            next_sequence,
            notice
        );

        Ok(TrackStatus {
            track,
            writable: state.writable,
            capacity_reached: state.capacity_reached,
            capacity,
            completed: state.completed(),
            next_sequence,
            label: track.label(next_sequence),
            remaining_secs: state.remaining.map(|d| d.num_seconds()),
            remaining_display: state.remaining.map(|d| format_remaining(track, d)),
            available_at: state.available_at,
            notice,
            prompt,
            stale,
            error,
        })
    }

    /// Countdown for a locked track, `None` if it is writable or complete.
    pub fn countdown(&mut self, track: Track) -> Result<Option<Countdown>> {
        self.session.ensure_active()?;
        self.ensure_loaded(track)?;
        let now = self.clock.now();
        let (state, _) = self.track_state(track, now);
        let gate = self.config.gate(track);
        Ok(Countdown::from_state(&gate, &state, track.granularity()))
    }

    /// Write a new entry if the track is open.
    ///
    /// # Errors
    /// [`CoreError::Locked`] during a cooldown, [`CoreError::TrackComplete`]
    /// once a capped track is full, a validation error for an empty draft,
    /// or the store's error if the write fails.
    pub fn submit(&mut self, track: Track, draft: Draft) -> Result<JournalEntry> {
        self.session.ensure_active()?;
        self.refresh(track)?;

        let now = self.clock.now();
        let (state, sequence) = self.track_state(track, now);
        self.ensure_open(track, &state)?;

        let content = draft.into_content(track)?;
        let prompt_number = match self.prompt_for(track, sequence)? {
            Some(PromptView::Growth { number, .. }) => Some(number),
            _ => None,
        };

        let entry = self.store.create(
            track,
            NewEntry {
                content,
                sequence,
                prompt_number,
            },
        )?;
        tracing::info!("{} entry {} written as {}", track.key(), entry.id, track.label(sequence));

        let cache = self.cache(track);
        cache.entries.push(entry.clone());
        cache.high_water = cache.high_water.max(sequence);
        if track == Track::Growth {
            self.growth_override = None;
        }
        Ok(entry)
    }

    fn ensure_open(&self, track: Track, state: &CadenceState) -> Result<()> {
        if state.capacity_reached {
            return Err(CoreError::TrackComplete {
                track,
                capacity: self.config.capacity(track).unwrap_or(state.completed()),
            });
        }
        if let Some(remaining) = state.remaining {
            return Err(CoreError::Locked {
                track,
                remaining_secs: remaining.num_seconds(),
            });
        }
        Ok(())
    }

    /// Replace an entry's content. Editing never touches the cooldown.
    ///
    /// A selfie edit without a new image keeps the stored one.
    pub fn edit(&mut self, id: &EntryId, mut draft: Draft) -> Result<JournalEntry> {
        self.session.ensure_active()?;
        let mut entry = self
            .store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if entry.track == Track::Selfie && draft.image.is_none() {
            let existing = entry.selfie().selfie;
            if !existing.is_empty() {
                draft.image = Some(existing);
            }
        }
        let content = draft.into_content(entry.track)?;
        self.store.update(id, &content)?;
        tracing::info!("{} entry {} updated", entry.track.key(), id);

        entry.content = content;
        entry.updated_at = self.clock.now();
        if let Some(cached) = self
            .cache(entry.track)
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
        {
            cached.content = entry.content.clone();
            cached.updated_at = entry.updated_at;
        }
        Ok(entry)
    }

    /// Delete an entry. Remaining entries keep their sequence numbers.
    pub fn remove(&mut self, id: &EntryId) -> Result<()> {
        self.session.ensure_active()?;
        let entry = self
            .store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.store.delete(id)?;
        tracing::info!("{} entry {} deleted", entry.track.key(), id);
        self.cache(entry.track).entries.retain(|e| &e.id != id);
        Ok(())
    }

    /// Show the next growth prompt instead of today's.
    ///
    /// Only offered while the growth track is open. Repeated calls keep
    /// stepping forward through the table. The choice lasts until the next
    /// growth entry is written or it is cleared.
    pub fn another_prompt(&mut self) -> Result<PromptView> {
        self.session.ensure_active()?;
        self.ensure_loaded(Track::Growth)?;
        let now = self.clock.now();
        let (state, next) = self.track_state(Track::Growth, now);
        self.ensure_open(Track::Growth, &state)?;
        let current = self.growth_override.unwrap_or(next);
        self.growth_override = Some(current + 1);
        self.prompt_for(Track::Growth, current + 1)?
            .ok_or_else(|| ValidationError::EmptyCollection("growth prompts".into()).into())
    }

    pub fn clear_prompt_override(&mut self) {
        self.growth_override = None;
    }

    /// Use a growth prompt chosen earlier (e.g. restored from saved state).
    pub fn set_prompt_override(&mut self, day: Option<u32>) {
        self.growth_override = day.filter(|d| *d > 0);
    }

    pub fn prompt_override(&self) -> Option<u32> {
        self.growth_override
    }

    /// Case-insensitive search. Selfie entries match on their note only.
    /// An empty query returns every entry.
    pub fn search(&mut self, track: Track, query: &str) -> Result<Vec<JournalEntry>> {
        let needle = query.trim().to_lowercase();
        let entries = self.entries(track)?;
        if needle.is_empty() {
            return Ok(entries);
        }
        Ok(entries
            .into_iter()
            .filter(|e| e.searchable_text().to_lowercase().contains(&needle))
            .collect())
    }

    /// Entries grouped by calendar date in the configured display offset.
    pub fn grouped_by_date(&mut self, track: Track) -> Result<BTreeMap<NaiveDate, Vec<JournalEntry>>> {
        let offset = self.config.display_offset();
        Ok(group_by_date(self.entries(track)?, offset))
    }

    /// JSON export of a track's entries.
    pub fn export(&mut self, track: Track) -> Result<String> {
        let offset = self.config.display_offset();
        let records: Vec<ExportRecord> = self
            .entries(track)?
            .into_iter()
            .map(|e| ExportRecord {
                title: e.title().to_string(),
                content: e.content,
                date: e.created_at.with_timezone(&offset).to_rfc3339(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// `journal-<track>-<YYYY-MM-DD>.json` for today.
    pub fn export_file_name(&self, track: Track) -> String {
        let today = self
            .clock
            .now()
            .with_timezone(&self.config.display_offset())
            .format("%Y-%m-%d");
        format!("journal-{}-{today}.json", track.key())
    }
}

/// Group entries by the calendar date they were written on.
pub fn group_by_date(
    entries: Vec<JournalEntry>,
    offset: FixedOffset,
) -> BTreeMap<NaiveDate, Vec<JournalEntry>> {
    let mut groups: BTreeMap<NaiveDate, Vec<JournalEntry>> = BTreeMap::new();
    for entry in entries {
        let date = entry.created_at.with_timezone(&offset).date_naive();
        groups.entry(date).or_default().push(entry);
    }
    groups
}
