//! SQLite-backed journal store.
//!
//! Rows are scoped to an owner, so one database file can hold several
//! users' journals. Entries are filed by title the way the web backend
//! files them; legacy titles are folded into their track on read.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::data_dir;
use super::store::JournalStore;
use crate::cadence::{Clock, SystemClock};
use crate::entry::{EntryId, JournalEntry, NewEntry};
use crate::error::{CoreError, StoreError};
use crate::track::Track;

const COLUMNS: &str = "id, title, content, created_at, updated_at, sequence, prompt_number";

/// Raw row before timestamps and title are validated.
struct Row {
    id: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
    sequence: Option<u32>,
    prompt_number: Option<u32>,
}

pub struct SqliteJournalStore {
    conn: Mutex<Connection>,
    owner: String,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SqliteJournalStore {
    /// Open `~/.config/cadence/journal.db` for `owner`.
    pub fn open_default(owner: &str) -> Result<Self, CoreError> {
        let path = data_dir()?.join("journal.db");
        Ok(Self::open(&path, owner)?)
    }

    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path, owner: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_connection(conn, owner)
    }

    /// Open an in-memory database.
    pub fn open_memory(owner: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, owner)
    }

    fn from_connection(conn: Connection, owner: &str) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
            owner: owner.to_string(),
            clock: Arc::new(SystemClock),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Stamp new entries with `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS journal_entries (
                id            TEXT PRIMARY KEY,
                owner         TEXT NOT NULL,
                title         TEXT NOT NULL,
                content       TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL,
                sequence      INTEGER,
                prompt_number INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_entries_owner_title ON journal_entries(owner, title);
            CREATE INDEX IF NOT EXISTS idx_entries_owner_created_at ON journal_entries(owner, created_at);

            CREATE TABLE IF NOT EXISTS kv (
                owner TEXT NOT NULL,
                key   TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (owner, key)
            );",
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::QueryFailed("Failed to lock connection".into()))
    }

    /// Insert an entry verbatim, keeping its id, title and timestamps.
    pub fn import(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO journal_entries (id, owner, title, content, created_at, updated_at, sequence, prompt_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                self.owner,
                entry.title(),
                entry.content,
                timestamp(entry.created_at),
                timestamp(entry.updated_at),
                entry.sequence,
                entry.prompt_number,
            ],
        )?;
        if let Some(sequence) = entry.sequence {
            self.record_sequence(entry.track, sequence)?;
        }
        Ok(())
    }

    /// Raise the track's high-water mark to `sequence`.
    fn record_sequence(&self, track: Track, sequence: u32) -> Result<(), StoreError> {
        let key = high_water_key(track);
        let current = self
            .kv_get(&key)?
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        if sequence > current {
            self.kv_set(&key, &sequence.to_string())?;
        }
        Ok(())
    }

    /// Get a value from the owner's kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM kv WHERE owner = ?1 AND key = ?2",
                params![self.owner, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (owner, key, value) VALUES (?1, ?2, ?3)",
            params![self.owner, key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "DELETE FROM kv WHERE owner = ?1 AND key = ?2",
            params![self.owner, key],
        )?;
        Ok(())
    }

    fn read_row(row: &rusqlite::Row) -> rusqlite::Result<Row> {
        Ok(Row {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
            sequence: row.get(5)?,
            prompt_number: row.get(6)?,
        })
    }
}

impl JournalStore for SqliteJournalStore {
    fn list(&self, track: Track) -> Result<Vec<JournalEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM journal_entries WHERE owner = ?1 ORDER BY created_at ASC"
        ))?;
        let rows = stmt
            .query_map(params![self.owner], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .filter(|row| track.accepted_titles().contains(&row.title.as_str()))
            .map(to_entry)
            .collect()
    }

    fn create(&self, track: Track, entry: NewEntry) -> Result<JournalEntry, StoreError> {
        let now = to_millis(self.clock.now());
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
        self.import(&created)?;
        Ok(created)
    }

    fn update(&self, id: &EntryId, content: &str) -> Result<(), StoreError> {
        let now = timestamp(self.clock.now());
        let changed = self.conn()?.execute(
            "UPDATE journal_entries SET content = ?1, updated_at = ?2 WHERE id = ?3 AND owner = ?4",
            params![content, now, id, self.owner],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn delete(&self, id: &EntryId) -> Result<(), StoreError> {
        let changed = self.conn()?.execute(
            "DELETE FROM journal_entries WHERE id = ?1 AND owner = ?2",
            params![id, self.owner],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                &format!("SELECT {COLUMNS} FROM journal_entries WHERE id = ?1 AND owner = ?2"),
                params![id, self.owner],
                Self::read_row,
            )
            .optional()?;
        row.map(to_entry).transpose()
    }

    fn highest_sequence(&self, track: Track) -> Result<u32, StoreError> {
        let mut highest = self
            .kv_get(&high_water_key(track))?
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let conn = self.conn()?;
        for title in track.accepted_titles() {
            let stored: Option<u32> = conn.query_row(
                "SELECT MAX(sequence) FROM journal_entries WHERE owner = ?1 AND title = ?2",
                params![self.owner, title],
                |row| row.get(0),
            )?;
            highest = highest.max(stored.unwrap_or(0));
        }
        Ok(highest)
    }
}

fn high_water_key(track: Track) -> String {
    format!("high_water.{}", track.key())
}

/// Drop sub-millisecond precision so a created entry equals its reloaded row.
fn to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// Fixed-width RFC 3339 so that text order matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(id: &str, field: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            message: format!("{field} '{raw}': {e}"),
        })
}

fn to_entry(row: Row) -> Result<JournalEntry, StoreError> {
    let track = Track::from_title(&row.title).ok_or_else(|| StoreError::Corrupt {
        id: row.id.clone(),
        message: format!("unknown title '{}'", row.title),
    })?;
    let legacy_title = (row.title != track.title()).then(|| row.title.clone());
    let created_at = parse_timestamp(&row.id, "created_at", &row.created_at)?;
    let updated_at = parse_timestamp(&row.id, "updated_at", &row.updated_at)?;
    Ok(JournalEntry {
        id: row.id,
        track,
        content: row.content,
        created_at,
        updated_at,
        sequence: row.sequence,
        prompt_number: row.prompt_number,
        legacy_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::FixedClock;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 4, hour, 0, 0).unwrap()
    }

    fn new_entry(content: &str, sequence: u32) -> NewEntry {
        NewEntry {
            content: content.into(),
            sequence,
            prompt_number: Some(sequence),
        }
    }

    #[test]
    fn storage_basic_operations() {
        let clock = Arc::new(FixedClock::new(at(8)));
        let store = SqliteJournalStore::open_memory("ana").unwrap().with_clock(clock.clone());

        let entry = store.create(Track::Growth, new_entry("morning pages", 1)).unwrap();
        let fetched = store.get(&entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);

        clock.advance(Duration::minutes(5));
        store.update(&entry.id, "morning pages, revised").unwrap();
        let updated = store.get(&entry.id).unwrap().unwrap();
        assert_eq!(updated.content, "morning pages, revised");
        assert_eq!(updated.updated_at, at(8) + Duration::minutes(5));

        store.delete(&entry.id).unwrap();
        assert!(store.get(&entry.id).unwrap().is_none());
        assert!(matches!(store.delete(&entry.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn rows_are_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let ana = SqliteJournalStore::open(&path, "ana").unwrap();
        let ben = SqliteJournalStore::open(&path, "ben").unwrap();

        let entry = ana.create(Track::Weekly, new_entry("plan", 1)).unwrap();
        assert_eq!(ana.list(Track::Weekly).unwrap().len(), 1);
        assert!(ben.list(Track::Weekly).unwrap().is_empty());
        assert!(ben.get(&entry.id).unwrap().is_none());
        assert!(matches!(ben.update(&entry.id, "x"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn legacy_titles_list_under_their_track() {
        let store = SqliteJournalStore::open_memory("ana").unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO journal_entries (id, owner, title, content, created_at, updated_at)
                 VALUES ('old-1', 'ana', 'Weekly Review', 'legacy', ?1, ?1)",
                params![timestamp(at(6))],
            )
            .unwrap();
        }
        store.create(Track::Weekly, new_entry("current", 2)).unwrap();

        let weekly = store.list(Track::Weekly).unwrap();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].id, "old-1");
        assert_eq!(weekly[0].sequence, None);
        assert!(store.list(Track::Growth).unwrap().is_empty());
    }

    #[test]
    fn malformed_timestamp_is_corrupt() {
        let store = SqliteJournalStore::open_memory("ana").unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO journal_entries (id, owner, title, content, created_at, updated_at)
                 VALUES ('bad', 'ana', '365 Growth Journal', 'x', 'yesterday', 'yesterday')",
                [],
            )
            .unwrap();
        assert!(matches!(store.list(Track::Growth), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn kv_is_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let ana = SqliteJournalStore::open(&path, "ana").unwrap();
        let ben = SqliteJournalStore::open(&path, "ben").unwrap();

        assert!(ana.kv_get("prompt").unwrap().is_none());
        ana.kv_set("prompt", "3").unwrap();
        ana.kv_set("prompt", "4").unwrap();
        assert_eq!(ana.kv_get("prompt").unwrap().as_deref(), Some("4"));
        assert!(ben.kv_get("prompt").unwrap().is_none());

        ana.kv_delete("prompt").unwrap();
        assert!(ana.kv_get("prompt").unwrap().is_none());
    }

    #[test]
    fn created_entry_matches_reloaded_row() {
        let stamp = at(8) + Duration::nanoseconds(123_456_789);
        let clock = Arc::new(FixedClock::new(stamp));
        let store = SqliteJournalStore::open_memory("ana").unwrap().with_clock(clock);

        let entry = store.create(Track::Growth, new_entry("precise", 1)).unwrap();
        assert_eq!(entry.created_at.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(store.get(&entry.id).unwrap().unwrap(), entry);
        assert_eq!(store.list(Track::Growth).unwrap(), vec![entry]);
    }

    #[test]
    fn highest_sequence_outlives_deleted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let store = SqliteJournalStore::open(&path, "ana").unwrap();
        store.create(Track::Growth, new_entry("one", 1)).unwrap();
        let two = store.create(Track::Growth, new_entry("two", 2)).unwrap();
        store.delete(&two.id).unwrap();
        assert_eq!(store.highest_sequence(Track::Growth).unwrap(), 2);

        let reopened = SqliteJournalStore::open(&path, "ana").unwrap();
        assert_eq!(reopened.highest_sequence(Track::Growth).unwrap(), 2);
        assert_eq!(reopened.highest_sequence(Track::Weekly).unwrap(), 0);
        let ben = SqliteJournalStore::open(&path, "ben").unwrap();
        assert_eq!(ben.highest_sequence(Track::Growth).unwrap(), 0);
    }

    #[test]
    fn legacy_title_is_kept() {
        let store = SqliteJournalStore::open_memory("ana").unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO journal_entries (id, owner, title, content, created_at, updated_at, sequence)
                 VALUES ('old-1', 'ana', 'Growth Prompts', 'legacy', ?1, ?1, 4)",
                params![timestamp(at(6))],
            )
            .unwrap();
        }
        let entry = store.get(&"old-1".to_string()).unwrap().unwrap();
        assert_eq!(entry.track, Track::Growth);
        assert_eq!(entry.title(), "Growth Prompts");
        assert_eq!(store.highest_sequence(Track::Growth).unwrap(), 4);

        let fresh = store.create(Track::Growth, new_entry("new", 5)).unwrap();
        assert_eq!(fresh.legacy_title, None);
        assert_eq!(fresh.title(), "365 Growth Journal");
    }

    #[test]
    fn list_is_chronological() {
        let clock = Arc::new(FixedClock::new(at(9)));
        let store = SqliteJournalStore::open_memory("ana").unwrap().with_clock(clock.clone());
        store.create(Track::Selfie, new_entry("later", 2)).unwrap();
        clock.set(at(7));
        store.create(Track::Selfie, new_entry("earlier", 1)).unwrap();

        let selfies = store.list(Track::Selfie).unwrap();
        assert_eq!(selfies[0].content, "earlier");
        assert_eq!(selfies[1].content, "later");
    }
}
