//! Session repository trait.
//!
//! Defines the interface for session persistence operations. The core never
//! calls it; use cases hand sessions to a repository after mutating them.

use super::model::Session;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Index entry describing one stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    /// Name the session was saved under (the session id when unnamed)
    pub name: String,
    pub session_id: String,
    pub topic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub thought_count: usize,
    pub branch_count: usize,
    pub revision_count: usize,
    /// File name relative to the sessions directory
    pub filename: String,
}

impl SessionEntry {
    pub fn describe(session: &Session, name: impl Into<String>, filename: impl Into<String>) -> Self {
        let metadata = session.metadata();
        Self {
            name: name.into(),
            session_id: session.id.clone(),
            topic: session.topic.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            thought_count: metadata.total_thoughts,
            branch_count: metadata.branch_count,
            revision_count: metadata.revision_count,
            filename: filename.into(),
        }
    }
}

/// Guard returned by [`SessionRepository::lock`]. Dropping it releases the lock.
pub struct SessionLock {
    _guard: Box<dyn Send + Sync>,
}

impl SessionLock {
    pub fn new(guard: impl Send + Sync + 'static) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    /// A guard that excludes nobody, for repositories without shared storage.
    pub fn unlocked() -> Self {
        Self::new(())
    }
}

impl std::fmt::Debug for SessionLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionLock")
    }
}

/// An abstract repository for managing session persistence.
///
/// # Implementation Notes
///
/// Writers hold [`lock`] across their find, mutate and save cycle, so
/// implementations backed by shared storage must make it exclude every other
/// holder for the same session id, including other processes.
/// Lookups accept either a session id or a name given to [`save_as`].
///
/// [`lock`]: SessionRepository::lock
/// [`save_as`]: SessionRepository::save_as
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by id or saved name.
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    async fn find(&self, id_or_name: &str) -> Result<Option<Session>>;

    /// Saves a session, keeping the name it was last saved under.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Saves a session under an explicit name.
    async fn save_as(&self, session: &Session, name: &str) -> Result<()>;

    /// Deletes a session.
    ///
    /// Returns `false` when nothing matched `id_or_name`.
    async fn delete(&self, id_or_name: &str) -> Result<bool>;

    /// Lists index entries, most recently updated first.
    async fn list_all(&self) -> Result<Vec<SessionEntry>>;

    /// Gets the ID of the currently active session.
    async fn active_session_id(&self) -> Result<Option<String>>;

    /// Sets the ID of the currently active session.
    async fn set_active_session_id(&self, session_id: &str) -> Result<()>;

    /// Takes the exclusive write lock for `session_id`, waiting for it if held.
    async fn lock(&self, _session_id: &str) -> Result<SessionLock> {
        Ok(SessionLock::unlocked())
    }
}
