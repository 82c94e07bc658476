//! Countdown wakeups derived from an absolute deadline.
//!
//! A countdown never stores "time left". Each query recomputes it from the
//! deadline, so ticks of any size (or missed ticks) cannot drift.

use chrono::{DateTime, Duration, Utc};

use super::clock::Clock;
use super::gate::{CadenceGate, CadenceState};
use crate::track::Granularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    deadline: DateTime<Utc>,
    /// Upper bound on the reported remaining time (the cooldown length).
    cap: Duration,
    granularity: Granularity,
}

impl Countdown {
    pub fn new(deadline: DateTime<Utc>, cap: Duration, granularity: Granularity) -> Self {
        Self {
            deadline,
            cap,
            granularity,
        }
    }

    /// Countdown for a locked gate result, `None` if nothing is running.
    pub fn from_state(
        gate: &CadenceGate,
        state: &CadenceState,
        granularity: Granularity,
    ) -> Option<Self> {
        state
            .available_at
            .map(|deadline| Self::new(deadline, gate.cooldown(), granularity))
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Time left at `now`, `None` once the deadline has passed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let left = self.deadline - now;
        if left <= Duration::zero() {
            None
        } else {
            Some(left.min(self.cap))
        }
    }

    /// Next instant the displayed value changes: the next granularity
    /// boundary, or the deadline itself. `None` once expired.
    pub fn next_wakeup(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let left = self.remaining(now)?;
        let step = self.granularity.as_duration();
        let step_ms = step.num_milliseconds();
        let partial = left.num_milliseconds() % step_ms;
        let wait = if partial == 0 {
            step
        } else {
            Duration::milliseconds(partial)
        };
        Some(now + wait.min(left))
    }
}

/// Drive a countdown until it expires, calling `on_tick` with the remaining
/// time at every wakeup. Returns once the track unlocks.
pub async fn watch<C, F>(countdown: Countdown, clock: C, mut on_tick: F)
where
    C: Clock,
    F: FnMut(Duration),
{
    loop {
        let now = clock.now();
        let Some(left) = countdown.remaining(now) else {
            tracing::debug!("countdown reached {}", countdown.deadline);
            return;
        };
        on_tick(left);

        let Some(wake) = countdown.next_wakeup(now) else {
            return;
        };
        let wait = (wake - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;
    use chrono::TimeZone;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 18, 0, 0).unwrap()
    }

    #[test]
    fn remaining_rederives_from_deadline() {
        let countdown = Countdown::new(t() + Duration::hours(14), Duration::hours(24), Granularity::Minute);
        assert_eq!(countdown.remaining(t()), Some(Duration::hours(14)));
        assert_eq!(
            countdown.remaining(t() + Duration::minutes(90)),
            Some(Duration::hours(12) + Duration::minutes(30))
        );
        assert_eq!(countdown.remaining(t() + Duration::hours(14)), None);
    }

    #[test]
    fn remaining_is_capped_for_future_deadlines() {
        let countdown = Countdown::new(t() + Duration::hours(30), Duration::hours(24), Granularity::Minute);
        assert_eq!(countdown.remaining(t()), Some(Duration::hours(24)));
    }

    #[test]
    fn wakeup_lands_on_minute_boundary() {
        let deadline = t() + Duration::minutes(10) + Duration::seconds(20);
        let countdown = Countdown::new(deadline, Duration::hours(24), Granularity::Minute);
        assert_eq!(countdown.next_wakeup(t()), Some(t() + Duration::seconds(20)));
        let on_boundary = t() + Duration::seconds(20);
        assert_eq!(countdown.next_wakeup(on_boundary), Some(on_boundary + Duration::minutes(1)));
    }

    #[test]
    fn hourly_wakeup_stops_at_deadline() {
        let deadline = t() + Duration::minutes(30);
        let countdown = Countdown::new(deadline, Duration::days(7), Granularity::Hour);
        assert_eq!(countdown.next_wakeup(t()), Some(deadline));
        assert_eq!(countdown.next_wakeup(deadline), None);
    }

    #[test]
    fn built_from_locked_state() {
        let gate = CadenceGate::for_track(Track::Weekly);
        let state = gate.evaluate([t() - Duration::days(1)], t());
        let countdown = Countdown::from_state(&gate, &state, Track::Weekly.granularity()).unwrap();
        assert_eq!(countdown.deadline(), t() + Duration::days(6));

        let open = gate.evaluate([], t());
        assert!(Countdown::from_state(&gate, &open, Granularity::Hour).is_none());
    }

    struct SteppingClock {
        inner: crate::cadence::FixedClock,
        step: Duration,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let now = self.inner.now();
            self.inner.advance(self.step);
            now
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watch_ticks_until_expiry() {
        let countdown = Countdown::new(t() + Duration::minutes(3), Duration::hours(24), Granularity::Minute);
        let clock = SteppingClock {
            inner: crate::cadence::FixedClock::new(t()),
            step: Duration::minutes(1),
        };
        let mut seen = Vec::new();
        watch(countdown, &clock, |left| seen.push(left.num_minutes())).await;
        assert_eq!(seen, vec![3, 2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_returns_immediately_when_expired() {
        let countdown = Countdown::new(t(), Duration::hours(24), Granularity::Minute);
        let clock = crate::cadence::FixedClock::new(t());
        let mut ticks = 0;
        watch(countdown, &clock, |_| ticks += 1).await;
        assert_eq!(ticks, 0);
    }
}
