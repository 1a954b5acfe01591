//! Session updater helper.
//!
//! `SessionUpdater` wraps the "find → mutate → save" cycle shared by every
//! use case that changes a stored session. The cycle runs under the
//! repository's per-session lock.

use seqthink_core::error::{Result, SeqThinkError};
use seqthink_core::session::{Session, SessionRepository};
use std::sync::Arc;

pub struct SessionUpdater {
    repository: Arc<dyn SessionRepository>,
}

impl SessionUpdater {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Loads `session_id`, applies `updater` and saves the result.
    ///
    /// Nothing is saved when `updater` fails. On success the updated session
    /// is returned together with the updater's own result.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no session matches `session_id`
    /// - whatever `updater` returns
    /// - repository failures
    pub async fn update<F, R>(&self, session_id: &str, updater: F) -> Result<(Session, R)>
    where
        F: FnOnce(&mut Session) -> Result<R>,
    {
        tracing::debug!("[SessionUpdater] update() called for session_id: {}", session_id);

        let found = self
            .repository
            .find(session_id)
            .await?
            .ok_or_else(|| SeqThinkError::not_found("Session", session_id))?;

        // `session_id` may be a name, so lock on the resolved id and re-read.
        let _lock = self.repository.lock(&found.id).await?;
        let mut session = self
            .repository
            .find(&found.id)
            .await?
            .ok_or_else(|| SeqThinkError::not_found("Session", &found.id))?;

        let output = updater(&mut session).inspect_err(|e| {
            tracing::debug!("[SessionUpdater] Update of {} rejected: {}", session_id, e);
        })?;

        session.updated_at = chrono::Utc::now().to_rfc3339();
        self.repository.save(&session).await?;

        tracing::debug!(
            "[SessionUpdater] Session saved: id={}, thoughts={}",
            session.id,
            session.thoughts().len()
        );
        Ok((session, output))
    }
}
