use base64::Engine;
use cadence_core::{Draft, JournalEntry, JournalStore, PromptView, Track, TrackStatus};
use std::path::Path;

use super::{open_journal, save_prompt_override};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Read an image file into a `data:` URI.
fn image_data_uri(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        other => return Err(format!("unsupported image type: {other:?}").into()),
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

fn draft(track: Track, content: String, image: Option<&Path>) -> Result<Draft, Box<dyn std::error::Error>> {
    match image {
        Some(path) => {
            if track != Track::Selfie {
                return Err(format!("{track} entries cannot carry an image").into());
            }
            Ok(Draft::selfie(content, image_data_uri(path)?))
        }
        None => Ok(Draft::text(content)),
    }
}

fn print_status(status: &TrackStatus) {
    println!("{}", status.track);
    if status.stale {
        println!("  (offline: showing last known entries)");
    }
    match status.capacity {
        Some(capacity) => println!("  {}/{} entries", status.completed, capacity),
        None => println!("  {} entries", status.completed),
    }

    if status.capacity_reached {
        println!("  Journal complete.");
        return;
    }
    if status.writable {
        println!("  {} is open.", status.label);
    } else if let Some(remaining) = &status.remaining_display {
        println!("  Next entry ({}) in {remaining}.", status.label);
    }

    match &status.prompt {
        Some(PromptView::Growth { number, text, .. }) => println!("  Prompt #{number}: {text}"),
        Some(PromptView::Weekly { title, text, .. }) => println!("  {title}: {text}"),
        None => {}
    }
}

fn print_entry(entry: &JournalEntry) {
    let label = entry
        .sequence
        .map(|n| entry.track.label(n))
        .unwrap_or_default();
    let text = match entry.track {
        Track::Selfie => {
            let payload = entry.selfie();
            if payload.has_image() {
                format!("{} [image]", payload.note)
            } else {
                payload.note
            }
        }
        _ => entry.content.clone(),
    };
    println!(
        "{}  {:<8} {}  {}",
        entry.created_at.format("%Y-%m-%d %H:%M"),
        label,
        entry.id,
        text
    );
}

pub fn status(owner: &str, track: Track, json: bool) -> CmdResult {
    let mut journal = open_journal(owner)?;
    let status = journal.status(track)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

pub fn write(owner: &str, track: Track, content: String, image: Option<&Path>) -> CmdResult {
    let mut journal = open_journal(owner)?;
    let entry = journal.submit(track, draft(track, content, image)?)?;
    save_prompt_override(&journal)?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

pub fn edit(owner: &str, id: String, content: String, image: Option<&Path>) -> CmdResult {
    let mut journal = open_journal(owner)?;
    let existing = journal
        .store()
        .get(&id)?
        .ok_or_else(|| format!("entry not found: {id}"))?;
    let entry = journal.edit(&id, draft(existing.track, content, image)?)?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

pub fn delete(owner: &str, id: String) -> CmdResult {
    let mut journal = open_journal(owner)?;
    journal.remove(&id)?;
    println!("deleted {id}");
    Ok(())
}

pub fn list(owner: &str, track: Track, json: bool) -> CmdResult {
    let mut journal = open_journal(owner)?;
    let entries = journal.entries(track)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for (date, group) in cadence_core::journal::group_by_date(entries, journal.config().display_offset()) {
        println!("{date}");
        for entry in &group {
            print_entry(entry);
        }
    }
    Ok(())
}

pub fn search(owner: &str, track: Track, query: &str) -> CmdResult {
    let mut journal = open_journal(owner)?;
    let hits = journal.search(track, query)?;
    if hits.is_empty() {
        println!("no entries match {query:?}");
    }
    for entry in &hits {
        print_entry(entry);
    }
    Ok(())
}

pub fn export(owner: &str, track: Track, output: Option<&Path>) -> CmdResult {
    let mut journal = open_journal(owner)?;
    let json = journal.export(track)?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => journal.export_file_name(track).into(),
    };
    std::fs::write(&path, json)?;
    println!("exported to {}", path.display());
    Ok(())
}
