//! Cadence gate - decides whether a track accepts a new entry.
//!
//! ## Rules
//!
//! - No history: writable immediately.
//! - Otherwise the newest entry starts a cooldown; the track unlocks once
//!   `now - newest.created_at >= cooldown`.
//! - An entry stamped in the future (clock skew) locks the track for a full
//!   cooldown rather than producing a negative countdown.
//! - A capped track that holds `capacity` entries is complete: it never
//!   becomes writable again and shows no countdown.

use chrono::{DateTime, Duration, Utc};

use crate::entry::JournalEntry;
use crate::track::Track;

/// Derived writability for one track at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceState {
    pub writable: bool,
    /// Always `count(entries) + 1`.
    pub next_sequence: u32,
    /// Time until the track unlocks; `None` when writable or complete.
    pub remaining: Option<Duration>,
    /// Instant the running cooldown ends, if one is running.
    pub available_at: Option<DateTime<Utc>>,
    pub capacity_reached: bool,
}

impl CadenceState {
    /// Entries already written.
    pub fn completed(&self) -> u32 {
        self.next_sequence - 1
    }

    pub fn is_locked(&self) -> bool {
        !self.writable && !self.capacity_reached
    }
}

/// Cooldown and capacity for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceGate {
    cooldown: Duration,
    capacity: Option<u32>,
}

impl CadenceGate {
    pub fn new(cooldown: Duration, capacity: Option<u32>) -> Self {
        Self { cooldown, capacity }
    }

    /// Gate with the track's built-in cooldown and capacity.
    pub fn for_track(track: Track) -> Self {
        Self::new(track.default_cooldown(), track.default_capacity())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    /// Evaluate a history given as creation instants, in any order.
    pub fn evaluate<I>(&self, created: I, now: DateTime<Utc>) -> CadenceState
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut count: u32 = 0;
        let mut last: Option<DateTime<Utc>> = None;
        for at in created {
            count = count.saturating_add(1);
            last = Some(match last {
                Some(prev) if prev >= at => prev,
                _ => at,
            });
        }

        let next_sequence = count.saturating_add(1);

        if self.capacity.is_some_and(|cap| count >= cap) {
            return CadenceState {
                writable: false,
                next_sequence,
                remaining: None,
                available_at: None,
                capacity_reached: true,
            };
        }

        let Some(last) = last else {
            return CadenceState {
                writable: true,
                next_sequence,
                remaining: None,
                available_at: None,
                capacity_reached: false,
            };
        };

        let elapsed = now - last;
        if elapsed >= self.cooldown {
            return CadenceState {
                writable: true,
                next_sequence,
                remaining: None,
                available_at: None,
                capacity_reached: false,
            };
        }

        let remaining = if elapsed < Duration::zero() {
            self.cooldown
        } else {
            self.cooldown - elapsed
        };

        CadenceState {
            writable: false,
            next_sequence,
            remaining: Some(remaining),
            available_at: Some(last + self.cooldown),
            capacity_reached: false,
        }
    }

    /// Evaluate a list of stored entries.
    pub fn evaluate_entries(&self, entries: &[JournalEntry], now: DateTime<Utc>) -> CadenceState {
        self.evaluate(entries.iter().map(|e| e.created_at), now)
    }
}
