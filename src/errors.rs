//! Error types for the notepad application.
//!
//! This module defines the error type shared by the store, the repository
//! and the command line front end.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the notepad application.
#[derive(Error, Debug)]
pub enum NotepadError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Note with the same ID already exists.
    #[error("Note already exists: {id}")]
    NoteAlreadyExists { id: String },

    /// Invalid input or output format.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
