//! Journaling tracks and their fixed cadence parameters.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// One of the three independent journaling cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    /// Daily growth prompts
    Growth,
    /// Weekly actions
    Weekly,
    /// 100 day selfie journal
    Selfie,
}

/// Tick size used when displaying a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
}

impl Granularity {
    pub fn as_duration(self) -> Duration {
        match self {
            Granularity::Minute => Duration::minutes(1),
            Granularity::Hour => Duration::hours(1),
        }
    }
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Growth, Track::Weekly, Track::Selfie];

    /// Short machine key (`growth`, `weekly`, `selfie`).
    pub fn key(self) -> &'static str {
        match self {
            Track::Growth => "growth",
            Track::Weekly => "weekly",
            Track::Selfie => "selfie",
        }
    }

    /// Title the persistence layer files entries under.
    pub fn title(self) -> &'static str {
        match self {
            Track::Growth => "365 Growth Journal",
            Track::Weekly => "Weekly Actions",
            Track::Selfie => "100 Day Selfie Journal",
        }
    }

    /// Resolve a stored title, accepting the legacy names older entries used.
    pub fn from_title(title: &str) -> Option<Track> {
        match title {
            "365 Growth Journal" | "Growth Prompts" => Some(Track::Growth),
            "Weekly Actions" | "Weekly Review" => Some(Track::Weekly),
            "100 Day Selfie Journal" => Some(Track::Selfie),
            _ => None,
        }
    }

    /// Every title that files an entry under this track, current one first.
    pub fn accepted_titles(self) -> &'static [&'static str] {
        match self {
            Track::Growth => &["365 Growth Journal", "Growth Prompts"],
            Track::Weekly => &["Weekly Actions", "Weekly Review"],
            Track::Selfie => &["100 Day Selfie Journal"],
        }
    }

    pub fn default_cooldown(self) -> Duration {
        match self {
            Track::Growth | Track::Selfie => Duration::hours(24),
            Track::Weekly => Duration::days(7),
        }
    }

    /// Upper bound on entries, if the track has one.
    pub fn default_capacity(self) -> Option<u32> {
        match self {
            Track::Selfie => Some(100),
            Track::Growth | Track::Weekly => None,
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            Track::Growth | Track::Selfie => Granularity::Minute,
            Track::Weekly => Granularity::Hour,
        }
    }

    /// Singular unit a sequence number counts ("day" or "week").
    pub fn unit(self) -> &'static str {
        match self {
            Track::Growth | Track::Selfie => "day",
            Track::Weekly => "week",
        }
    }

    /// Display label for a sequence number, e.g. "Day 3" or "Week 2".
    pub fn label(self, sequence: u32) -> String {
        match self {
            Track::Growth | Track::Selfie => format!("Day {sequence}"),
            Track::Weekly => format!("Week {sequence}"),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Track {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "growth" | "daily" => Ok(Track::Growth),
            "weekly" | "week" => Ok(Track::Weekly),
            "selfie" => Ok(Track::Selfie),
            _ => Track::from_title(s.trim()).ok_or_else(|| ValidationError::UnknownTrack(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldowns_match_cadence() {
        assert_eq!(Track::Growth.default_cooldown(), Duration::hours(24));
        assert_eq!(Track::Weekly.default_cooldown(), Duration::hours(7 * 24));
        assert_eq!(Track::Selfie.default_cooldown(), Duration::hours(24));
    }

    #[test]
    fn only_selfie_is_capped() {
        assert_eq!(Track::Selfie.default_capacity(), Some(100));
        assert_eq!(Track::Growth.default_capacity(), None);
        assert_eq!(Track::Weekly.default_capacity(), None);
    }

    #[test]
    fn legacy_titles_resolve() {
        assert_eq!(Track::from_title("Growth Prompts"), Some(Track::Growth));
        assert_eq!(Track::from_title("Weekly Review"), Some(Track::Weekly));
        assert_eq!(Track::from_title("Something Else"), None);
        for track in Track::ALL {
            assert_eq!(track.accepted_titles()[0], track.title());
            for title in track.accepted_titles() {
                assert_eq!(Track::from_title(title), Some(track));
            }
        }
    }

    #[test]
    fn parse_accepts_keys_and_titles() {
        assert_eq!("growth".parse::<Track>().unwrap(), Track::Growth);
        assert_eq!("Weekly".parse::<Track>().unwrap(), Track::Weekly);
        assert_eq!("100 Day Selfie Journal".parse::<Track>().unwrap(), Track::Selfie);
        assert!("monthly".parse::<Track>().is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(Track::Growth.label(3), "Day 3");
        assert_eq!(Track::Weekly.label(2), "Week 2");
        assert_eq!(Track::Weekly.granularity(), Granularity::Hour);
    }
}
