//! "Come back later" notice display state.
//!
//! ```text
//! Hidden -> Prominent -> Compact -> Hidden
//! ```
//!
//! The prominent notice appears once per cooldown. It collapses to the
//! compact reminder after the dwell time and stays compact until the track
//! becomes writable again, which also re-arms the prominent notice.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeState {
    Hidden,
    Prominent,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeMachine {
    state: NoticeState,
    dwell: Duration,
    prominent_since: Option<DateTime<Utc>>,
    shown_this_cooldown: bool,
}

impl Default for NoticeMachine {
    fn default() -> Self {
        Self::new(Duration::seconds(5))
    }
}

impl NoticeMachine {
    pub fn new(dwell: Duration) -> Self {
        Self {
            state: NoticeState::Hidden,
            dwell,
            prominent_since: None,
            shown_this_cooldown: false,
        }
    }

    pub fn state(&self) -> NoticeState {
        self.state
    }

    /// Feed the latest gate result and return the resulting display state.
    ///
    /// `locked` is true while a cooldown is running. A complete track has
    /// no cooldown and keeps the notice hidden.
    pub fn observe(&mut self, locked: bool, now: DateTime<Utc>) -> NoticeState {
        if !locked {
            self.state = NoticeState::Hidden;
            self.prominent_since = None;
            self.shown_this_cooldown = false;
            return self.state;
        }

        self.state = match self.state {
            NoticeState::Hidden if !self.shown_this_cooldown => {
                self.shown_this_cooldown = true;
                self.prominent_since = Some(now);
                NoticeState::Prominent
            }
            NoticeState::Hidden | NoticeState::Compact => NoticeState::Compact,
            NoticeState::Prominent => match self.prominent_since {
                Some(since) if now - since < self.dwell => NoticeState::Prominent,
                _ => NoticeState::Compact,
            },
        };
        self.state
    }

    /// When the prominent notice should collapse, if it is showing.
    pub fn collapse_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            NoticeState::Prominent => self.prominent_since.map(|since| since + self.dwell),
            NoticeState::Hidden | NoticeState::Compact => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn starts_hidden_while_writable() {
        let mut notice = NoticeMachine::default();
        assert_eq!(notice.observe(false, t()), NoticeState::Hidden);
    }

    #[test]
    fn prominent_then_compact_after_dwell() {
        let mut notice = NoticeMachine::default();
        assert_eq!(notice.observe(true, t()), NoticeState::Prominent);
        assert_eq!(notice.collapse_at(), Some(t() + Duration::seconds(5)));
        assert_eq!(notice.observe(true, t() + Duration::seconds(4)), NoticeState::Prominent);
        assert_eq!(notice.observe(true, t() + Duration::seconds(5)), NoticeState::Compact);
        assert_eq!(notice.collapse_at(), None);
        assert_eq!(notice.observe(true, t() + Duration::hours(3)), NoticeState::Compact);
    }

    #[test]
    fn prominent_shows_once_per_cooldown() {
        let mut notice = NoticeMachine::default();
        notice.observe(true, t());
        notice.observe(true, t() + Duration::seconds(10));
        // Re-observing the same cooldown never brings the prominent notice back.
        for minutes in 1..5 {
            assert_eq!(
                notice.observe(true, t() + Duration::minutes(minutes)),
                NoticeState::Compact
            );
        }
    }

    #[test]
    fn unlocking_rearms_prominent_notice() {
        let mut notice = NoticeMachine::default();
        notice.observe(true, t());
        notice.observe(true, t() + Duration::seconds(6));
        assert_eq!(notice.observe(false, t() + Duration::days(1)), NoticeState::Hidden);

        let next = t() + Duration::days(1) + Duration::minutes(1);
        assert_eq!(notice.observe(true, next), NoticeState::Prominent);
    }

    #[test]
    fn custom_dwell() {
        let mut notice = NoticeMachine::new(Duration::seconds(30));
        notice.observe(true, t());
        assert_eq!(notice.observe(true, t() + Duration::seconds(29)), NoticeState::Prominent);
        assert_eq!(notice.observe(true, t() + Duration::seconds(30)), NoticeState::Compact);
    }
}
