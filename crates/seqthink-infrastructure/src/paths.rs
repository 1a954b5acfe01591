//! Platform paths for seqthink configuration and session data.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/seqthink/          # Config directory
//! └── config.toml              # RootConfig
//!
//! ~/.local/share/seqthink/     # Data directory (default session store)
//! ├── sessions/                # One JSON file per saved session
//! ├── sessions.json            # Session index
//! └── active_session.txt       # Id of the session commands apply to
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_NAME: &str = "seqthink";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Cannot determine the {0} directory for this platform")]
    DirNotFound(&'static str),
}

pub struct SeqThinkPaths;

impl SeqThinkPaths {
    /// Returns the configuration directory (e.g. `~/.config/seqthink/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::DirNotFound("config"))
    }

    /// Returns the data directory (e.g. `~/.local/share/seqthink/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::DirNotFound("data"))
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Resolves the session store root. An explicit override wins over the
    /// platform data directory.
    pub fn session_base_dir(override_dir: Option<&Path>) -> Result<PathBuf, PathError> {
        match override_dir {
            Some(dir) => Ok(dir.to_path_buf()),
            None => Self::data_dir(),
        }
    }
}
