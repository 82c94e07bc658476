//! Human-readable countdowns.

use chrono::Duration;

use crate::track::{Granularity, Track};

/// Format time left for `track`'s countdown.
///
/// Minute-granularity tracks read `"13h 59m"`; hour-granularity tracks read
/// `"4d 6h"`, or just `"6h"` under a day. Values are floored.
pub fn format_remaining(track: Track, remaining: Duration) -> String {
    let remaining = remaining.max(Duration::zero());
    match track.granularity() {
        Granularity::Minute => {
            let hours = remaining.num_hours();
            let minutes = remaining.num_minutes() - hours * 60;
            format!("{hours}h {minutes}m")
        }
        Granularity::Hour => {
            let days = remaining.num_days();
            let hours = remaining.num_hours() - days * 24;
            if days > 0 {
                format!("{days}d {hours}h")
            } else {
                format!("{hours}h")
            }
        }
    }
}
