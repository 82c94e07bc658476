use clap::Subcommand;
use cadence_core::PromptView;

use super::{open_journal, save_prompt_override};

#[derive(Subcommand)]
pub enum PromptAction {
    /// Show the next growth prompt instead of today's
    Next,
    /// Go back to today's growth prompt
    Reset,
}

pub fn run(owner: &str, action: PromptAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut journal = open_journal(owner)?;
    match action {
        PromptAction::Next => {
            let prompt = journal.another_prompt()?;
            save_prompt_override(&journal)?;
            if let PromptView::Growth { number, text, .. } = &prompt {
                println!("Prompt #{number}: {text}");
            }
        }
        PromptAction::Reset => {
            journal.clear_prompt_override();
            save_prompt_override(&journal)?;
            println!("prompt reset");
        }
    }
    Ok(())
}
