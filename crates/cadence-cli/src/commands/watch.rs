use cadence_core::cadence::watch;
use cadence_core::{format_remaining, SystemClock, Track};
use std::io::Write;

use super::open_journal;

/// Print the countdown for `track` until it reopens.
pub fn run(owner: &str, track: Track) -> Result<(), Box<dyn std::error::Error>> {
    let mut journal = open_journal(owner)?;
    let Some(countdown) = journal.countdown(track)? else {
        let status = journal.status(track)?;
        if status.capacity_reached {
            println!("{track} is complete.");
        } else {
            println!("{} is open.", status.label);
        }
        return Ok(());
    };

    tracing::info!("watching {} until {}", track.key(), countdown.deadline());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(countdown, SystemClock, |left| {
        print!("\r{track}: next entry in {}   ", format_remaining(track, left));
        let _ = std::io::stdout().flush();
    }));
    println!();

    let status = journal.status(track)?;
    println!("{} is open.", status.label);
    Ok(())
}
