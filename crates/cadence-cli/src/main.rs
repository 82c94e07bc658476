use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cadence_core::Track;

mod commands;

#[derive(Parser)]
#[command(name = "cadence", version, about = "Time-gated journaling from the terminal")]
struct Cli {
    /// Journal owner (one database holds many owners)
    #[arg(long, global = true, env = "CADENCE_OWNER", default_value = "local")]
    owner: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a track is open, its countdown and its prompt
    Status {
        track: Track,
        /// Print the full status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a new entry
    Write {
        track: Track,
        /// Entry text (the note, for selfies)
        content: String,
        /// Image file attached to a selfie entry
        #[arg(long)]
        image: Option<std::path::PathBuf>,
    },
    /// Replace an entry's content
    Edit {
        id: String,
        content: String,
        /// New image for a selfie entry
        #[arg(long)]
        image: Option<std::path::PathBuf>,
    },
    /// Delete an entry
    Delete { id: String },
    /// List a track's entries, oldest first
    List {
        track: Track,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Case-insensitive search within a track
    Search { track: Track, query: String },
    /// Export a track as JSON
    Export {
        track: Track,
        /// Output file (defaults to journal-<track>-<date>.json)
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
    },
    /// Growth prompt selection
    Prompt {
        #[command(subcommand)]
        action: commands::prompt::PromptAction,
    },
    /// Live countdown until a track reopens
    Watch { track: Track },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

fn init_tracing(default_level: tracing::Level) {
    let filter = EnvFilter::from_default_env().add_directive(default_level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    init_tracing(level);

    let owner = cli.owner;
    let result = match cli.command {
        Commands::Status { track, json } => commands::journal::status(&owner, track, json),
        Commands::Write {
            track,
            content,
            image,
        } => commands::journal::write(&owner, track, content, image.as_deref()),
        Commands::Edit { id, content, image } => {
            commands::journal::edit(&owner, id, content, image.as_deref())
        }
        Commands::Delete { id } => commands::journal::delete(&owner, id),
        Commands::List { track, json } => commands::journal::list(&owner, track, json),
        Commands::Search { track, query } => commands::journal::search(&owner, track, &query),
        Commands::Export { track, output } => {
            commands::journal::export(&owner, track, output.as_deref())
        }
        Commands::Prompt { action } => commands::prompt::run(&owner, action),
        Commands::Watch { track } => commands::watch::run(&owner, track),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "cadence", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
