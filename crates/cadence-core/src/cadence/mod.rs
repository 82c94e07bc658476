//! Cadence engine: cooldown gate, notice display state, countdown wakeups.
//!
//! Everything in here is a pure derivation over timestamps. Callers pass the
//! current instant in explicitly (or through a [`Clock`]), so the same
//! inputs always give the same answer.

mod clock;
mod countdown;
mod gate;
mod notice;

pub use clock::{Clock, FixedClock, SystemClock};
pub use countdown::{watch, Countdown};
pub use gate::{CadenceGate, CadenceState};
pub use notice::{NoticeMachine, NoticeState};
