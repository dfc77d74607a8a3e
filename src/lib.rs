//! Note-taking library
//!
//! This library keeps an ordered list of short notes, persists it as a single
//! JSON document under a fixed key, tracks which note is selected or being
//! edited, and filters notes by a search term.

mod cli;
mod config;
mod errors;
mod helper;
mod note;
mod notepad;
mod repository;
mod search;
mod session;
mod storage;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use notepad::*;
pub use repository::*;
pub use search::*;
pub use session::*;
pub use storage::*;
pub use types::*;
