use crate::entry::{EntryId, JournalEntry, NewEntry};
use crate::error::StoreError;
use crate::track::Track;

/// Persistence collaborator for journal entries.
///
/// Implementations assign `id` and `created_at` on create. Nothing here
/// knows about cooldowns; the gate only consumes what `list` returns.
pub trait JournalStore {
    /// Entries filed under `track`, in any order.
    fn list(&self, track: Track) -> Result<Vec<JournalEntry>, StoreError>;

    fn create(&self, track: Track, entry: NewEntry) -> Result<JournalEntry, StoreError>;

    /// Replace an entry's content.
    fn update(&self, id: &EntryId, content: &str) -> Result<(), StoreError>;

    fn delete(&self, id: &EntryId) -> Result<(), StoreError>;

    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// Highest sequence number ever stored under `track`, 0 if none.
    /// Deleting entries never lowers it.
    fn highest_sequence(&self, track: Track) -> Result<u32, StoreError>;
}

impl<S: JournalStore + ?Sized> JournalStore for &S {
    fn list(&self, track: Track) -> Result<Vec<JournalEntry>, StoreError> {
        (**self).list(track)
    }

    fn create(&self, track: Track, entry: NewEntry) -> Result<JournalEntry, StoreError> {
        (**self).create(track, entry)
    }

    fn update(&self, id: &EntryId, content: &str) -> Result<(), StoreError> {
        (**self).update(id, content)
    }

    fn delete(&self, id: &EntryId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>, StoreError> {
        (**self).get(id)
    }

    fn highest_sequence(&self, track: Track) -> Result<u32, StoreError> {
        (**self).highest_sequence(track)
    }
}

impl<S: JournalStore + ?Sized> JournalStore for std::sync::Arc<S> {
    fn list(&self, track: Track) -> Result<Vec<JournalEntry>, StoreError> {
        (**self).list(track)
    }

    fn create(&self, track: Track, entry: NewEntry) -> Result<JournalEntry, StoreError> {
        (**self).create(track, entry)
    }

    fn update(&self, id: &EntryId, content: &str) -> Result<(), StoreError> {
        (**self).update(id, content)
    }

    fn delete(&self, id: &EntryId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>, StoreError> {
        (**self).get(id)
    }

    fn highest_sequence(&self, track: Track) -> Result<u32, StoreError> {
        (**self).highest_sequence(track)
    }
}
