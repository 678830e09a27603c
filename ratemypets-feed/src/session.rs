//! Keeping the signed-in session across restarts.

use ratemypets_common::model::auth::Session;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionFileError {
    #[error("Error accessing session file: {0}")]
    Io(#[from] io::Error),
    #[error("Session file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session. A missing file means nobody is signed in.
    pub fn load(&self) -> Result<Session, SessionFileError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored session");
                Ok(Session::Anonymous)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionFileError> {
        if !session.is_authenticated() {
            return self.clear();
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(session)?)?;

        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionFileError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
