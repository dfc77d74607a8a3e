use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{validate_storage_key, NotepadError, Result, DEFAULT_STORAGE_KEY};

const CONFIG_FILE_NAME: &str = "config.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the note list
    pub data_dir: PathBuf,

    /// Key the note list is stored under
    pub storage_key: String,

    /// Editor command used by `--edit`
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".notepad"));

        Self {
            data_dir,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            editor_command: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "notepad")
}

impl Config {
    /// Platform config location, e.g. `~/.config/notepad/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration from `path`, or from [`default_path`](Self::default_path)
    /// when none is given. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| NotepadError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

        validate_storage_key(&config.storage_key).map_err(|e| NotepadError::ConfigError {
            message: format!("{} in {}", e, path.display()),
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| NotepadError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Editor to launch: the configured command, then `$EDITOR`, then a
    /// platform default.
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            if !editor.trim().is_empty() {
                return editor;
            }
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            data_dir: dir.path().join("data"),
            storage_key: "work-notes".to_string(),
            editor_command: Some("vim".to_string()),
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"editor_command":"micro"}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.editor_command.as_deref(), Some("micro"));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.get_editor_command(), "micro");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(NotepadError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_unusable_storage_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        for key in ["  ", "notes/work", "..\\\\notes", ".notes"] {
            fs::write(&path, format!(r#"{{"storage_key":"{}"}}"#, key)).unwrap();
            assert!(
                matches!(
                    Config::load(Some(&path)),
                    Err(NotepadError::ConfigError { .. })
                ),
                "accepted {:?}",
                key
            );
        }
    }
}
