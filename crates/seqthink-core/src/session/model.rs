//! Session domain model.
//!
//! A [`Session`] is the full reasoning record for one task: an append-only log
//! of [`Thought`]s, the registry of named [`Branch`]es, and the branch new
//! thoughts are attributed to. The log is private to this module tree so the
//! numbering invariants can only be changed through the store operations.

use crate::error::{Result, SeqThinkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};

/// Name of the branch a fresh session attributes thoughts to.
pub const MAIN_BRANCH: &str = "main";

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// One immutable reasoning step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    /// Position in the log, starting at 1. Never reused.
    pub number: u32,
    pub text: String,
    /// Creation time (RFC 3339)
    pub timestamp: String,
    /// Branch this thought is attributed to
    pub branch: String,
    #[serde(default)]
    pub is_revision: bool,
    #[serde(default)]
    pub revises_thought: Option<u32>,
    /// Text of the revised thought at the time of revision
    #[serde(default)]
    pub original_text: Option<String>,
    #[serde(default)]
    pub branch_from_thought: Option<u32>,
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Caller's total-thoughts estimate at submission time
    #[serde(default)]
    pub estimate: Option<u32>,
    pub next_thought_needed: bool,
    pub needs_more_thoughts: bool,
}

/// An alternate reasoning line diverging from an existing thought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub created_at: String,
    pub from_thought: u32,
    /// Seeded with the diverging thought's number. Later thoughts stay in the
    /// session log, tagged with this branch id.
    pub thoughts: Vec<u32>,
}

/// Counters derived from the log on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub total_thoughts: usize,
    pub completed_thoughts: usize,
    pub revision_count: usize,
    pub branch_count: usize,
}

/// Status of a session, determined solely by its latest thought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum SessionStatus {
    #[serde(rename = "Not Started")]
    #[strum(serialize = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    #[serde(rename = "Complete")]
    #[strum(serialize = "Complete")]
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub topic: Option<String>,
    pub total_thoughts: usize,
    pub created_at: String,
    pub updated_at: String,
    pub current_status: SessionStatus,
    pub branches: usize,
    pub revisions: usize,
}

/// The unit of reasoning state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    pub topic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub(super) thoughts: Vec<Thought>,
    #[serde(default)]
    pub(super) branches: BTreeMap<String, Branch>,
    #[serde(default = "default_branch")]
    pub(super) current_branch: String,
}

fn default_branch() -> String {
    MAIN_BRANCH.to_string()
}

impl Session {
    /// Creates an empty session with a fresh identifier.
    pub fn new(topic: Option<String>) -> Self {
        let timestamp = now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            thoughts: Vec::new(),
            branches: BTreeMap::new(),
            current_branch: default_branch(),
        }
    }

    pub fn thoughts(&self) -> &[Thought] {
        &self.thoughts
    }

    pub fn branches(&self) -> &BTreeMap<String, Branch> {
        &self.branches
    }

    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    /// Looks up a thought by its log number.
    pub fn thought(&self, number: u32) -> Option<&Thought> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.thoughts.get(index)
    }

    pub fn has_revisions(&self) -> bool {
        self.thoughts.iter().any(|t| t.is_revision)
    }

    pub fn has_branches(&self) -> bool {
        !self.branches.is_empty()
    }

    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            total_thoughts: self.thoughts.len(),
            completed_thoughts: self
                .thoughts
                .iter()
                .filter(|t| !t.next_thought_needed)
                .count(),
            revision_count: self.thoughts.iter().filter(|t| t.is_revision).count(),
            branch_count: self.branches.len(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.thoughts.last() {
            None => SessionStatus::NotStarted,
            Some(latest) if latest.next_thought_needed => SessionStatus::InProgress,
            Some(_) => SessionStatus::Complete,
        }
    }

    /// Thought numbers belonging to a branch: the diverging thought followed by
    /// every logged thought attributed to the branch.
    pub fn branch_thoughts(&self, branch_id: &str) -> Vec<u32> {
        let Some(branch) = self.branches.get(branch_id) else {
            return Vec::new();
        };
        branch
            .thoughts
            .iter()
            .copied()
            .chain(
                self.thoughts
                    .iter()
                    .filter(|t| t.branch == branch_id)
                    .map(|t| t.number),
            )
            .collect()
    }

    /// Checks the log invariants on a session that did not come from the store
    /// operations (for example one read back from disk).
    pub fn verify(&self) -> Result<()> {
        for (index, thought) in self.thoughts.iter().enumerate() {
            let expected = index + 1;
            if thought.number as usize != expected {
                return Err(SeqThinkError::internal(format!(
                    "session {}: thought at position {} is numbered {}",
                    self.id, expected, thought.number
                )));
            }
            if thought.is_revision {
                match thought.revises_thought {
                    Some(target) if target >= 1 && target < thought.number => {}
                    _ => {
                        return Err(SeqThinkError::internal(format!(
                            "session {}: revision {} has no earlier target",
                            self.id, thought.number
                        )));
                    }
                }
            }
            if thought.estimate.is_some_and(|estimate| estimate < thought.number) {
                return Err(SeqThinkError::internal(format!(
                    "session {}: thought {} has an estimate below its number",
                    self.id, thought.number
                )));
            }
        }
        for branch in self.branches.values() {
            if self.thought(branch.from_thought).is_none() {
                return Err(SeqThinkError::internal(format!(
                    "session {}: branch '{}' diverges from missing thought {}",
                    self.id, branch.id, branch.from_thought
                )));
            }
        }
        Ok(())
    }
}
