//! In-process journal store.
//!
//! Useful for tests and previews. Can be switched offline to exercise the
//! journal's stale-history path.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::store::JournalStore;
use crate::cadence::{Clock, SystemClock};
use crate::entry::{EntryId, JournalEntry, NewEntry};
use crate::error::StoreError;
use crate::track::Track;

pub struct MemoryJournalStore {
    entries: Mutex<Vec<JournalEntry>>,
    high_water: Mutex<HashMap<Track, u32>>,
    clock: Arc<dyn Clock + Send + Sync>,
    offline: AtomicBool,
}

impl Default for MemoryJournalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store that stamps new entries with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            high_water: Mutex::new(HashMap::new()),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    /// Insert an entry verbatim, keeping its id and timestamps.
    pub fn import(&self, entry: JournalEntry) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::QueryFailed(format!("duplicate entry id {}", entry.id)));
        }
        let (track, sequence) = (entry.track, entry.sequence);
        entries.push(entry);
        drop(entries);
        if let Some(sequence) = sequence {
            self.record_sequence(track, sequence);
        }
        Ok(())
    }

    fn record_sequence(&self, track: Track, sequence: u32) {
        let mut high = self.high_water.lock().unwrap_or_else(|e| e.into_inner());
        let mark = high.entry(track).or_insert(0);
        *mark = (*mark).max(sequence);
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<JournalEntry>>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        self.entries
            .lock()
            .map_err(|_| StoreError::QueryFailed("Failed to lock entries".into()))
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl JournalStore for MemoryJournalStore {
    fn list(&self, track: Track) -> Result<Vec<JournalEntry>, StoreError> {
        let entries = self.lock()?;
        Ok(entries.iter().filter(|e| e.track == track).cloned().collect())
    }

    fn create(&self, track: Track, entry: NewEntry) -> Result<JournalEntry, StoreError> {
        let now = self.now();
        let created = JournalEntry {
            id: uuid::Uuid::new_v4().to_string(),
            track,
            content: entry.content,
            created_at: now,
            updated_at: now,
            sequence: Some(entry.sequence),
            prompt_number: entry.prompt_number,
            legacy_title: None,
        };
        self.lock()?.push(created.clone());
        self.record_sequence(track, entry.sequence);
        Ok(created)
    }

    fn update(&self, id: &EntryId, content: &str) -> Result<(), StoreError> {
        let now = self.now();
        let mut entries = self.lock()?;
        let entry = entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        entry.content = content.to_string();
        entry.updated_at = now;
        Ok(())
    }

    fn delete(&self, id: &EntryId) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        if entries.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self.lock()?.iter().find(|e| &e.id == id).cloned())
    }

    fn highest_sequence(&self, track: Track) -> Result<u32, StoreError> {
        let stored = self
            .lock()?
            .iter()
            .filter(|e| e.track == track)
            .filter_map(|e| e.sequence)
            .max()
            .unwrap_or(0);
        let high = self.high_water.lock().unwrap_or_else(|e| e.into_inner());
        Ok(stored.max(high.get(&track).copied().unwrap_or(0)))
    }
}
