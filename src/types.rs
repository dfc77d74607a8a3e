//! Shared types for the notepad application.
//!
//! Holds the crate-wide `Result` alias and the subcommands understood by the
//! command line front end.
use clap::Subcommand;

use crate::NotepadError;

/// A specialized Result type for notepad operations.
pub type Result<T> = std::result::Result<T, NotepadError>;

/// Available subcommands for the notepad application
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a new note
    New {
        /// Title of the note (blank titles are saved as "Untitled")
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note
        #[clap(short, long)]
        content: Option<String>,

        /// Write the content in the configured editor
        #[clap(short, long)]
        edit: bool,
    },

    /// List notes, most recently created first
    List {
        /// Only show notes whose title or content contains this text
        #[clap(short, long)]
        search: Option<String>,

        /// Limit the number of notes shown
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Only show note IDs and titles
        #[clap(short, long)]
        brief: bool,
    },

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// Open the content in the configured editor
        #[clap(short, long)]
        edit: bool,
    },

    /// Mark a note as completed, or back as open
    Toggle {
        /// ID of the note to toggle
        id: String,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Search notes by title or content
    Search {
        /// Search text (case-insensitive substring match)
        term: String,

        /// Rank results with fuzzy matching instead
        #[clap(long)]
        fuzzy: bool,

        /// Limit the number of search results
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Interactive session: select, edit, save and cancel notes
    Shell,

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
