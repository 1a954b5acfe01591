//! Session use case implementation.
//!
//! `SessionUseCase` is what the command-line front ends talk to. It keeps
//! track of the active session through the repository and routes every
//! change through the core [`SessionController`].

use crate::session::SessionUpdater;
use anyhow::{Result, anyhow};
use seqthink_core::controller::{SessionController, ThoughtOutcome, ThoughtResponse};
use seqthink_core::export::{self, ExportFormat};
use seqthink_core::session::{
    Session, SessionEntry, SessionRepository, SessionSummary, ThoughtOptions,
};
use seqthink_core::validation::{self, ThoughtRequest};
use serde_json::Value;
use std::sync::Arc;

/// Flags for [`SessionUseCase::think`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThinkOptions {
    /// Total-thoughts estimate. Falls back to the latest thought's estimate,
    /// then to the configured default.
    pub estimate: Option<u32>,
    pub revise: Option<u32>,
    pub branch: Option<(u32, String)>,
    /// Marks the thought as the last one needed
    pub complete: bool,
}

pub struct SessionUseCase {
    session_repository: Arc<dyn SessionRepository>,
    session_updater: SessionUpdater,
    default_estimate: u32,
}

impl SessionUseCase {
    pub fn new(session_repository: Arc<dyn SessionRepository>, default_estimate: u32) -> Self {
        Self {
            session_updater: SessionUpdater::new(session_repository.clone()),
            session_repository,
            default_estimate: default_estimate.max(1),
        }
    }

    /// Creates and activates a new session.
    ///
    /// With a topic, the session opens with a `Starting analysis: <topic>` thought.
    pub async fn start(&self, topic: Option<String>, estimate: Option<u32>) -> Result<Session> {
        let mut session = Session::new(None);
        if let Some(topic) = topic {
            let estimate = estimate.unwrap_or(self.default_estimate);
            session.set_topic(topic.clone());
            session.add_thought(
                format!("Starting analysis: {topic}"),
                ThoughtOptions::default().with_estimate(estimate),
            )?;
        }

        self.session_repository.save(&session).await?;
        self.session_repository
            .set_active_session_id(&session.id)
            .await?;
        tracing::info!("[SessionUseCase] Started session {}", session.id);
        Ok(session)
    }

    /// Returns the active session, starting an empty one when there is none.
    pub async fn active_session(&self) -> Result<Session> {
        if let Some(id) = self.session_repository.active_session_id().await? {
            match self.session_repository.find(&id).await? {
                Some(session) => return Ok(session),
                None => tracing::warn!(
                    "[SessionUseCase] Active session {} is gone, starting a new one",
                    id
                ),
            }
        }
        self.start(None, None).await
    }

    async fn active_id(&self) -> Result<String> {
        Ok(self.active_session().await?.id)
    }

    /// Runs a typed request against the active session.
    pub async fn submit(&self, request: ThoughtRequest) -> Result<ThoughtOutcome> {
        let id = self.active_id().await?;
        let (_, outcome) = self
            .session_updater
            .update(&id, |session| {
                let mut controller = SessionController::new(session.clone());
                let outcome = controller.submit_request(request)?;
                *session = controller.into_session();
                Ok(outcome)
            })
            .await?;
        Ok(outcome)
    }

    /// Runs a raw JSON request against the active session.
    ///
    /// Rejected requests produce a failure response and leave the stored session untouched.
    pub async fn submit_json(&self, submission: &Value) -> Result<ThoughtResponse> {
        let request = match validation::validate(submission) {
            Ok(request) => request,
            Err(e) => return Ok(ThoughtResponse::failed(&e.into())),
        };

        let id = self.active_id().await?;
        let mut rejected = None;
        let result = self
            .session_updater
            .update(&id, |session| {
                let mut controller = SessionController::new(session.clone());
                let outcome = controller.submit_request(request).inspect_err(|e| {
                    rejected = Some(ThoughtResponse::failed(e));
                })?;
                *session = controller.into_session();
                Ok(outcome)
            })
            .await;

        match (result, rejected) {
            (Ok((_, outcome)), _) => Ok(ThoughtResponse::succeeded(outcome)),
            (Err(e), Some(response)) => {
                tracing::debug!("[SessionUseCase] Submission rejected: {}", e);
                Ok(response)
            }
            (Err(e), None) => Err(anyhow::Error::new(e).context("Failed to save session")),
        }
    }

    /// Adds, revises or branches from a thought given only its text.
    ///
    /// The position is taken from the log: the thought is numbered after the
    /// last one recorded.
    pub async fn think(&self, text: &str, options: ThinkOptions) -> Result<ThoughtOutcome> {
        let session = self.active_session().await?;
        let thought_number = u32::try_from(session.thoughts().len())
            .map_err(|_| anyhow!("session log is full"))?
            .saturating_add(1);
        let estimate = options
            .estimate
            .or_else(|| session.latest_thought().and_then(|t| t.estimate))
            .unwrap_or(self.default_estimate);

        let mut request = ThoughtRequest::new(text, thought_number, estimate.max(thought_number))
            .with_next_thought_needed(!options.complete);
        if let Some(target) = options.revise {
            request = request.revising(target);
        }
        if let Some((from, branch_id)) = options.branch {
            request = request.branching(from, branch_id);
        }

        self.submit(request).await
    }

    pub async fn create_branch(&self, from_thought: u32, branch_id: &str) -> Result<Session> {
        let id = self.active_id().await?;
        let (session, _) = self
            .session_updater
            .update(&id, |session| {
                session.create_branch(from_thought, branch_id).map(|_| ())
            })
            .await?;
        Ok(session)
    }

    pub async fn switch_branch(&self, branch_id: &str) -> Result<Session> {
        let id = self.active_id().await?;
        let (session, _) = self
            .session_updater
            .update(&id, |session| session.switch_branch(branch_id))
            .await?;
        Ok(session)
    }

    pub async fn set_topic(&self, topic: &str) -> Result<Session> {
        let id = self.active_id().await?;
        let (session, _) = self
            .session_updater
            .update(&id, |session| {
                session.set_topic(topic);
                Ok(())
            })
            .await?;
        Ok(session)
    }

    /// Empties the active session's log. Id and topic are kept.
    pub async fn clear(&self) -> Result<Session> {
        let id = self.active_id().await?;
        let (session, _) = self
            .session_updater
            .update(&id, |session| {
                session.clear();
                Ok(())
            })
            .await?;
        Ok(session)
    }

    pub async fn history(&self) -> Result<Vec<String>> {
        Ok(export::history_lines(&self.active_session().await?))
    }

    pub async fn summary(&self) -> Result<SessionSummary> {
        Ok(self.active_session().await?.summary())
    }

    /// Renders a stored session, or the active one when `id_or_name` is `None`.
    pub async fn export(&self, id_or_name: Option<&str>, format: ExportFormat) -> Result<String> {
        let session = match id_or_name {
            Some(key) => self.find(key).await?,
            None => self.active_session().await?,
        };
        Ok(export::render(&session, format)?)
    }

    pub async fn list(&self) -> Result<Vec<SessionEntry>> {
        self.session_repository.list_all().await
    }

    async fn find(&self, id_or_name: &str) -> Result<Session> {
        self.session_repository
            .find(id_or_name)
            .await?
            .ok_or_else(|| anyhow!("Session {} not found", id_or_name))
    }

    /// Makes a stored session the active one.
    pub async fn load(&self, id_or_name: &str) -> Result<Session> {
        let session = self.find(id_or_name).await?;
        self.session_repository
            .set_active_session_id(&session.id)
            .await?;
        tracing::info!("[SessionUseCase] Loaded session {} as active", session.id);
        Ok(session)
    }

    /// Stores the active session under `name`.
    pub async fn save_as(&self, name: &str) -> Result<SessionEntry> {
        let id = self.active_id().await?;
        let _lock = self.session_repository.lock(&id).await?;
        let session = self.find(&id).await?;
        self.session_repository.save_as(&session, name).await?;
        self.session_repository
            .list_all()
            .await?
            .into_iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| anyhow!("Session {} missing from the index after saving", name))
    }

    /// Stores a session held outside the repository and makes it active.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let _lock = self.session_repository.lock(&session.id).await?;
        self.session_repository.save(session).await?;
        self.session_repository
            .set_active_session_id(&session.id)
            .await
    }

    pub async fn delete(&self, id_or_name: &str) -> Result<bool> {
        self.session_repository.delete(id_or_name).await
    }
}
