use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;

use crate::{Note, NotepadError, Result};

/// Key the note list is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "notepad-notes";

/// Checks that `key` can name a single file inside the data directory.
pub fn validate_storage_key(key: &str) -> Result<()> {
    if key.trim().is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(NotepadError::InvalidFormat {
            message: format!("Invalid storage key: '{}'", key),
        });
    }
    Ok(())
}

/// A durable string slot store, addressed by key.
pub trait KeyValueBackend {
    /// Returns the value stored under `key`, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Keeps each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens the backend rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            debug!("Data directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create data directory {}: {}", dir.display(), e);
                NotepadError::DirectoryError { path: dir.clone() }
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_storage_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            trace!("No stored value at {}", path.display());
            return Ok(None);
        }
        let value = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            NotepadError::Io(e)
        })?;
        Ok(Some(value))
    }

    /// Writes through a temporary file in the same directory and renames it
    /// over the target, so readers never see a partial list.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                error!("Failed to create directory {}: {}", self.dir.display(), e);
                NotepadError::Io(e)
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotepadError::Io(e)
        })?;

        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NotepadError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            NotepadError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NotepadError::Io(e.error)
        })?;

        trace!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Process-local backend; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persists the whole ordered note list as one JSON array under a fixed key.
#[derive(Debug, Clone)]
pub struct NoteStore<B> {
    backend: B,
    key: String,
}

impl<B: KeyValueBackend> NoteStore<B> {
    /// Creates a store over `backend` using [`DEFAULT_STORAGE_KEY`].
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Reads the stored note list.
    ///
    /// An absent key yields an empty list. A value that cannot be read, or
    /// is not a JSON array, is logged and treated as "no saved notes".
    /// Individual records that fail to parse are logged and skipped while
    /// the rest of the list is kept.
    pub fn load(&self) -> Vec<Note> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No saved notes under key '{}'", self.key);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read saved notes under key '{}': {}", self.key, e);
                return Vec::new();
            }
        };

        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Saved notes under key '{}' are malformed, starting empty: {}",
                    self.key, e
                );
                return Vec::new();
            }
        };

        let total = records.len();
        let notes: Vec<Note> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<Note>(record) {
                Ok(note) => Some(note),
                Err(e) => {
                    warn!(
                        "Skipping unreadable note #{} under key '{}': {}",
                        index, self.key, e
                    );
                    None
                }
            })
            .collect();

        if notes.len() < total {
            warn!(
                "Loaded {} of {} saved notes from key '{}'",
                notes.len(),
                total,
                self.key
            );
        } else {
            info!("Loaded {} notes from key '{}'", notes.len(), self.key);
        }
        notes
    }

    /// Serializes the full list and overwrites the stored value.
    pub fn save(&mut self, notes: &[Note]) -> Result<()> {
        let json = serde_json::to_string(notes).map_err(|e| {
            error!("Failed to serialize notes: {}", e);
            NotepadError::Serialization(e)
        })?;
        self.backend.set(&self.key, &json)?;
        debug!("Saved {} notes under key '{}'", notes.len(), self.key);
        Ok(())
    }
}
