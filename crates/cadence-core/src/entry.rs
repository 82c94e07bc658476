//! Journal entry types and content payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::track::Track;

/// Unique identifier for a journal entry, assigned by the store.
pub type EntryId = String;

/// A persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub track: Track,
    /// Free text, or a serialized [`SelfiePayload`] on the selfie track.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 1-based position within the track, fixed when the entry was written.
    /// `None` only for entries imported from stores that never recorded one.
    #[serde(default)]
    pub sequence: Option<u32>,
    /// Growth prompt that was shown when the entry was written.
    #[serde(default)]
    pub prompt_number: Option<u32>,
    /// Older title the entry was filed under, when it differs from the
    /// track's current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_title: Option<String>,
}

impl JournalEntry {
    /// Title the entry is filed under.
    pub fn title(&self) -> &str {
        self.legacy_title.as_deref().unwrap_or(self.track.title())
    }

    /// Selfie payload view of the content. Plain-text content becomes the note.
    pub fn selfie(&self) -> SelfiePayload {
        SelfiePayload::parse(&self.content)
    }

    /// Text that searches and previews should see.
    pub fn searchable_text(&self) -> String {
        match self.track {
            Track::Selfie => self.selfie().note,
            Track::Growth | Track::Weekly => self.content.clone(),
        }
    }
}

/// Fields the caller supplies when creating an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub content: String,
    pub sequence: u32,
    #[serde(default)]
    pub prompt_number: Option<u32>,
}

/// Structured selfie content: optional note plus image data URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfiePayload {
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub selfie: String,
}

impl SelfiePayload {
    /// Decode stored content. Anything that is not a JSON object is treated
    /// as a bare note with no image.
    pub fn parse(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            if let Ok(payload) = serde_json::from_str::<SelfiePayload>(content) {
                return payload;
            }
        }
        SelfiePayload {
            note: content.to_string(),
            selfie: String::new(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn has_image(&self) -> bool {
        !self.selfie.is_empty()
    }
}

/// What the user typed before submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    /// Image data URL, selfie track only.
    pub image: Option<String>,
}

impl Draft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn selfie(note: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            text: note.into(),
            image: Some(image.into()),
        }
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    /// Render the draft into stored content for `track`.
    ///
    /// Selfie drafts need a note or an image; other tracks need text.
    pub fn into_content(self, track: Track) -> Result<String, ValidationError> {
        match track {
            Track::Selfie => {
                let note = self.text.trim().to_string();
                let selfie = self.image.unwrap_or_default();
                if note.is_empty() && selfie.is_empty() {
                    return Err(ValidationError::EmptyDraft(track));
                }
                SelfiePayload { note, selfie }
                    .encode()
                    .map_err(|e| ValidationError::InvalidValue {
                        field: "selfie".into(),
                        message: e.to_string(),
                    })
            }
            Track::Growth | Track::Weekly => {
                if self.text.trim().is_empty() {
                    return Err(ValidationError::EmptyDraft(track));
                }
                Ok(self.text)
            }
        }
    }
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sort entries oldest first. Equal timestamps fall back to the stored
/// sequence, then the id, so display order is stable.
pub fn sort_chronological(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.sequence.cmp(&b.sequence))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Sort chronologically and fill in missing sequence numbers from rank.
///
/// Entries that already carry a sequence keep it.
pub fn backfill_sequences(entries: &mut [JournalEntry]) {
    sort_chronological(entries);
    for (rank, entry) in entries.iter_mut().enumerate() {
        if entry.sequence.is_none() {
            entry.sequence = Some(rank as u32 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(id: &str, minutes: i64, sequence: Option<u32>) -> JournalEntry {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let at = base + Duration::minutes(minutes);
        JournalEntry {
            id: id.into(),
            track: Track::Growth,
            content: format!("entry {id}"),
            created_at: at,
            updated_at: at,
            sequence,
            prompt_number: None,
            legacy_title: None,
        }
    }

    #[test]
    fn selfie_payload_parses_json() {
        let payload = SelfiePayload::parse(r#"{"note":"day one","selfie":"data:image/png;base64,AAA"}"#);
        assert_eq!(payload.note, "day one");
        assert!(payload.has_image());
    }

    #[test]
    fn selfie_payload_falls_back_to_note() {
        let payload = SelfiePayload::parse("just words");
        assert_eq!(payload.note, "just words");
        assert!(!payload.has_image());

        let broken = SelfiePayload::parse("{not json");
        assert_eq!(broken.note, "{not json");
    }

    #[test]
    fn selfie_draft_needs_note_or_image() {
        assert!(Draft::text("   ").into_content(Track::Selfie).is_err());

        let content = Draft::selfie("", "data:image/png;base64,AAA")
            .into_content(Track::Selfie)
            .unwrap();
        assert_eq!(SelfiePayload::parse(&content).selfie, "data:image/png;base64,AAA");
    }

    #[test]
    fn text_draft_rejects_blank() {
        assert!(matches!(
            Draft::text("\n\t").into_content(Track::Growth),
            Err(ValidationError::EmptyDraft(Track::Growth))
        ));
        assert_eq!(Draft::text("hello").into_content(Track::Weekly).unwrap(), "hello");
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  one two\n three  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn backfill_keeps_stored_numbers() {
        let mut entries = vec![
            entry("c", 20, None),
            entry("a", 0, Some(1)),
            entry("b", 10, None),
        ];
        backfill_sequences(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(entries[1].sequence, Some(2));
        assert_eq!(entries[2].sequence, Some(3));
    }

    #[test]
    fn equal_timestamps_order_by_id() {
        let mut entries = vec![entry("z", 5, None), entry("m", 5, None)];
        sort_chronological(&mut entries);
        assert_eq!(entries[0].id, "m");
    }
}
