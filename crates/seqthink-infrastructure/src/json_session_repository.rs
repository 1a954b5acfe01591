//! JSON-file SessionRepository implementation with a sessions index.

use crate::storage::{AtomicFileError, AtomicJsonFile, FileLock};
use anyhow::{Context, Result};
use async_trait::async_trait;
use seqthink_core::session::{Session, SessionEntry, SessionLock, SessionRepository};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of `sessions.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndex {
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
    #[serde(default)]
    pub last_updated: String,
}

impl SessionIndex {
    /// Files to delete for `id_or_name`: every copy of a session id, otherwise
    /// the single copy saved under that name.
    fn copies_of(&self, id_or_name: &str) -> Vec<String> {
        let by_id: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.session_id == id_or_name)
            .map(|entry| entry.filename.clone())
            .collect();
        if !by_id.is_empty() {
            return by_id;
        }
        self.sessions
            .iter()
            .filter(|entry| entry.name == id_or_name)
            .map(|entry| entry.filename.clone())
            .collect()
    }

    fn resolve(&self, id_or_name: &str) -> Option<&SessionEntry> {
        self.sessions
            .iter()
            .find(|entry| entry.name == id_or_name)
            .or_else(|| {
                self.sessions
                    .iter()
                    .find(|entry| entry.session_id == id_or_name)
            })
    }

    fn upsert(&mut self, entry: SessionEntry) {
        match self.sessions.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.sessions.push(entry),
        }
        self.last_updated = chrono::Utc::now().to_rfc3339();
    }
}

/// Stores each session as a JSON document.
///
/// ```text
/// base_dir/
/// ├── sessions/
/// │   ├── <session-id>.json
/// │   └── <saved-name>.json
/// ├── locks/
/// │   └── <session-id>.lock
/// ├── sessions.json
/// ├── sessions.lock
/// └── active_session.txt
/// ```
///
/// The index maps names to files. It is rebuilt from the session files
/// when it is missing or cannot be parsed. Writers serialize per session on
/// `locks/<session-id>.lock` and on `sessions.lock` for the index.
pub struct JsonSessionRepository {
    base_dir: PathBuf,
}

impl JsonSessionRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(base_dir.join("sessions"))
            .with_context(|| format!("Failed to create sessions directory under {:?}", base_dir))?;
        Ok(Self { base_dir })
    }

    fn sessions_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    fn lock_file(&self, session_id: &str) -> PathBuf {
        self.base_dir.join("locks").join(Self::filename_for(session_id))
    }

    fn active_file(&self) -> PathBuf {
        self.base_dir.join("active_session.txt")
    }

    fn index_file(&self) -> AtomicJsonFile<SessionIndex> {
        AtomicJsonFile::new(self.base_dir.join("sessions.json"))
    }

    fn session_file(&self, filename: &str) -> AtomicJsonFile<Session> {
        AtomicJsonFile::new(self.sessions_dir().join(filename))
    }

    /// File name for a session name: anything outside `[A-Za-z0-9_-]` becomes `_`.
    fn filename_for(name: &str) -> String {
        let stem: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}.json")
    }

    fn read_session(&self, filename: &str) -> Result<Option<Session>> {
        let file = self.session_file(filename);
        let Some(session) = file.load()? else {
            return Ok(None);
        };
        session
            .verify()
            .with_context(|| format!("Session file {:?} is inconsistent", file.path()))?;
        Ok(Some(session))
    }

    fn load_index(&self) -> Result<SessionIndex> {
        match self.index_file().load() {
            Ok(Some(index)) => Ok(index),
            Ok(None) => self.rebuild_index(),
            Err(e) => {
                tracing::warn!("[JsonSessionRepository] Rebuilding unreadable index: {}", e);
                self.rebuild_index()
            }
        }
    }

    /// Reconstructs `sessions.json` from the files in `sessions/`.
    pub fn rebuild_index(&self) -> Result<SessionIndex> {
        let index_file = self.index_file();
        let _lock = index_file.lock()?;
        // Another writer may have rebuilt it while we waited.
        if let Ok(Some(index)) = index_file.load() {
            return Ok(index);
        }

        let mut index = SessionIndex::default();

        for entry in fs::read_dir(self.sessions_dir()).context("Failed to read sessions directory")? {
            let path = entry.context("Failed to read directory entry")?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let (Some(stem), Some(filename)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            match self.read_session(filename) {
                Ok(Some(session)) => index.upsert(SessionEntry::describe(&session, stem, filename)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("[JsonSessionRepository] Skipping {:?}: {:#}", path, e);
                }
            }
        }

        index_file.save(&index)?;
        tracing::debug!(
            "[JsonSessionRepository] Rebuilt index with {} session(s)",
            index.sessions.len()
        );
        Ok(index)
    }

    fn write(&self, session: &Session, name: &str, filename: &str) -> Result<()> {
        // The index must be loaded (or rebuilt) before the new file exists.
        let current = self.load_index()?;
        self.session_file(filename)
            .save(session)
            .with_context(|| format!("Failed to write session '{}'", name))?;

        let entry = SessionEntry::describe(session, name, filename);
        self.index_file().update(current, |index| {
            index.upsert(entry);
            Ok(())
        })?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn find(&self, id_or_name: &str) -> Result<Option<Session>> {
        let index = self.load_index()?;
        let filename = match index.resolve(id_or_name) {
            Some(entry) => entry.filename.clone(),
            None => Self::filename_for(id_or_name),
        };
        self.read_session(&filename)
    }

    /// Rewrites every stored copy of the session, or stores it under its id
    /// when it has none yet.
    async fn save(&self, session: &Session) -> Result<()> {
        let targets: Vec<(String, String)> = self
            .load_index()?
            .sessions
            .iter()
            .filter(|entry| entry.session_id == session.id)
            .map(|entry| (entry.name.clone(), entry.filename.clone()))
            .collect();

        if targets.is_empty() {
            return self.write(session, &session.id, &Self::filename_for(&session.id));
        }
        for (name, filename) in targets {
            self.write(session, &name, &filename)?;
        }
        Ok(())
    }

    async fn save_as(&self, session: &Session, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            anyhow::bail!("Session name must not be empty");
        }
        self.write(session, name, &Self::filename_for(name))
    }

    /// Deletes every copy of a session id, or the one copy saved under a name.
    async fn delete(&self, id_or_name: &str) -> Result<bool> {
        let index = self.load_index()?;
        let mut filenames = index.copies_of(id_or_name);
        if filenames.is_empty() {
            filenames.push(Self::filename_for(id_or_name));
        }

        let mut removed = false;
        for filename in &filenames {
            removed |= self.session_file(filename).remove()?;
        }
        let dropped = self.index_file().update(index, |index| {
            let before = index.sessions.len();
            index
                .sessions
                .retain(|entry| !filenames.contains(&entry.filename));
            Ok::<_, AtomicFileError>(before != index.sessions.len())
        })?;

        if removed || dropped {
            tracing::debug!("[JsonSessionRepository] Deleted session '{}'", id_or_name);
        }
        Ok(removed || dropped)
    }

    async fn list_all(&self) -> Result<Vec<SessionEntry>> {
        let mut sessions = self.load_index()?.sessions;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn active_session_id(&self) -> Result<Option<String>> {
        let active_file = self.active_file();
        if !active_file.exists() {
            return Ok(None);
        }

        let session_id =
            fs::read_to_string(&active_file).context("Failed to read active session ID")?;
        let session_id = session_id.trim();
        Ok((!session_id.is_empty()).then(|| session_id.to_string()))
    }

    async fn set_active_session_id(&self, session_id: &str) -> Result<()> {
        fs::write(self.active_file(), session_id).context("Failed to write active session ID")?;
        Ok(())
    }

    async fn lock(&self, session_id: &str) -> Result<SessionLock> {
        let path = self.lock_file(session_id);
        let lock = FileLock::acquire(&path)
            .with_context(|| format!("Failed to lock session '{}'", session_id))?;
        tracing::trace!("[JsonSessionRepository] Locked session '{}'", session_id);
        Ok(SessionLock::new(lock))
    }
}
