//! Explicit user session.
//!
//! Whoever signs in gets a `Session`; everything that acts on their journal
//! takes it by value or reference instead of looking the user up from
//! ambient state. Ending the session makes further journal calls fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    owner: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Begin a session at login.
    pub fn start(owner: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            owner: owner.into(),
            started_at: now,
            ended_at: None,
        }
    }

    /// End the session at logout. Ending twice keeps the first instant.
    pub fn end(&mut self, now: DateTime<Utc>) {
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Fail with [`CoreError::SessionEnded`] once logged out.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CoreError::SessionEnded {
                owner: self.owner.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn session_lifecycle() {
        let login = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();
        let mut session = Session::start("coach-client-7", login);
        assert!(session.ensure_active().is_ok());
        assert_eq!(session.owner(), "coach-client-7");

        session.end(login + Duration::hours(1));
        session.end(login + Duration::hours(2));
        assert!(!session.is_active());
        assert!(matches!(
            session.ensure_active(),
            Err(CoreError::SessionEnded { .. })
        ));
    }
}
