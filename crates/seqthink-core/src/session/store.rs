//! Mutation protocol over a [`Session`]: append, revise, branch.
//!
//! Every operation either applies completely or returns an error before
//! touching the session. Thoughts are only ever appended.

use super::model::{now, Branch, Session, SessionSummary, Thought, MAIN_BRANCH};
use crate::error::{Result, SeqThinkError};
use crate::validation::ValidationError;
use std::collections::btree_map::Entry;

/// Optional flags carried by an appended thought.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThoughtOptions {
    pub is_revision: bool,
    pub revises_thought: Option<u32>,
    pub branch_from_thought: Option<u32>,
    /// Branch to attribute the thought to instead of the current branch
    pub branch_id: Option<String>,
    pub estimate: Option<u32>,
    /// Defaults to `true` when unset
    pub next_thought_needed: Option<bool>,
    /// Defaults to `true` when unset
    pub needs_more_thoughts: Option<bool>,
}

impl ThoughtOptions {
    pub fn with_estimate(mut self, estimate: u32) -> Self {
        self.estimate = Some(estimate);
        self
    }

    pub fn with_next_thought_needed(mut self, next_thought_needed: bool) -> Self {
        self.next_thought_needed = Some(next_thought_needed);
        self
    }

    pub fn on_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }
}

impl Session {
    fn next_number(&self) -> u32 {
        u32::try_from(self.thoughts.len()).map_or(u32::MAX, |len| len.saturating_add(1))
    }

    fn touch(&mut self) {
        self.updated_at = now();
    }

    fn require_thought(&self, number: u32) -> Result<&Thought> {
        self.thought(number)
            .ok_or_else(|| SeqThinkError::thought_not_found(number))
    }

    /// Appends a new thought to the log.
    ///
    /// A thought flagged as a revision must name an existing earlier thought;
    /// its text is recorded as the revision's `original_text`.
    pub fn add_thought(&mut self, text: impl Into<String>, options: ThoughtOptions) -> Result<Thought> {
        let number = self.next_number();

        let original_text = if options.is_revision {
            let target = options
                .revises_thought
                .ok_or(ValidationError::MissingRevisionTarget)?;
            Some(self.require_thought(target)?.text.clone())
        } else {
            None
        };
        if let Some(from) = options.branch_from_thought {
            self.require_thought(from)?;
        }

        let thought = Thought {
            number,
            text: text.into(),
            timestamp: now(),
            branch: options
                .branch_id
                .clone()
                .unwrap_or_else(|| self.current_branch.clone()),
            is_revision: options.is_revision,
            revises_thought: options.revises_thought.filter(|_| options.is_revision),
            original_text,
            branch_from_thought: options.branch_from_thought,
            branch_id: options.branch_id,
            estimate: options.estimate.map(|estimate| estimate.max(number)),
            next_thought_needed: options.next_thought_needed.unwrap_or(true),
            needs_more_thoughts: options.needs_more_thoughts.unwrap_or(true),
        };

        tracing::debug!(
            "[ThoughtStore] Session {}: appended thought {} on '{}'",
            self.id,
            number,
            thought.branch
        );
        self.thoughts.push(thought.clone());
        self.touch();
        Ok(thought)
    }

    /// Appends a revision of thought `number`. The original entry is left as is.
    pub fn revise_thought(
        &mut self,
        number: u32,
        new_text: impl Into<String>,
        options: ThoughtOptions,
    ) -> Result<Thought> {
        let original = self.require_thought(number)?.clone();
        let assigned = self.next_number();

        let revision = Thought {
            number: assigned,
            text: new_text.into(),
            timestamp: now(),
            is_revision: true,
            revises_thought: Some(number),
            original_text: Some(original.text.clone()),
            estimate: options
                .estimate
                .or(original.estimate)
                .map(|estimate| estimate.max(assigned)),
            next_thought_needed: options
                .next_thought_needed
                .unwrap_or(original.next_thought_needed),
            needs_more_thoughts: options
                .needs_more_thoughts
                .unwrap_or(original.needs_more_thoughts),
            ..original
        };

        tracing::debug!(
            "[ThoughtStore] Session {}: thought {} revises {}",
            self.id,
            assigned,
            number
        );
        self.thoughts.push(revision.clone());
        self.touch();
        Ok(revision)
    }

    /// Opens branch `branch_id` at thought `number` and makes it current.
    ///
    /// An existing branch with the same id is replaced.
    pub fn create_branch(&mut self, number: u32, branch_id: impl Into<String>) -> Result<&Branch> {
        self.require_thought(number)?;
        let branch_id = branch_id.into();
        let branch = Branch {
            id: branch_id.clone(),
            created_at: now(),
            from_thought: number,
            thoughts: vec![number],
        };

        self.current_branch = branch_id.clone();
        self.touch();

        let session_id = &self.id;
        let branch = match self.branches.entry(branch_id) {
            Entry::Occupied(mut slot) => {
                tracing::warn!(
                    "[ThoughtStore] Session {}: branch '{}' (from thought {}) overwritten by branch from thought {}",
                    session_id,
                    slot.key(),
                    slot.get().from_thought,
                    number
                );
                slot.insert(branch);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(branch),
        };
        Ok(branch)
    }

    /// Makes `branch_id` the branch new thoughts are attributed to.
    pub fn switch_branch(&mut self, branch_id: &str) -> Result<()> {
        if branch_id != MAIN_BRANCH && !self.branches.contains_key(branch_id) {
            return Err(SeqThinkError::not_found("Branch", branch_id));
        }
        self.current_branch = branch_id.to_string();
        self.touch();
        Ok(())
    }

    pub fn latest_thought(&self) -> Option<&Thought> {
        self.thoughts.last()
    }

    pub fn summary(&self) -> SessionSummary {
        let metadata = self.metadata();
        SessionSummary {
            id: self.id.clone(),
            topic: self.topic.clone(),
            total_thoughts: metadata.total_thoughts,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            current_status: self.status(),
            branches: metadata.branch_count,
            revisions: metadata.revision_count,
        }
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        if let Some(previous) = &self.topic {
            tracing::debug!(
                "[ThoughtStore] Session {}: topic '{}' replaced by '{}'",
                self.id,
                previous,
                topic
            );
        }
        self.topic = Some(topic);
        self.touch();
    }

    /// Drops every thought and branch. The id and topic survive.
    pub fn clear(&mut self) {
        self.thoughts.clear();
        self.branches.clear();
        self.current_branch = MAIN_BRANCH.to_string();
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;

    fn session_with(texts: &[&str]) -> Session {
        let mut session = Session::new(Some("test".to_string()));
        for text in texts {
            session
                .add_thought(*text, ThoughtOptions::default())
                .unwrap();
        }
        session
    }

    #[test]
    fn test_add_thought_numbers_densely() {
        let session = session_with(&["first", "second", "third"]);
        let numbers: Vec<u32> = session.thoughts().iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(session.metadata().total_thoughts, 3);
        assert!(session.thoughts().iter().all(|t| t.branch == MAIN_BRANCH));
        assert!(session.thoughts().iter().all(|t| t.next_thought_needed));
    }

    #[test]
    fn test_add_thought_raises_low_estimate() {
        let mut session = session_with(&["a", "b"]);
        let thought = session
            .add_thought("c", ThoughtOptions::default().with_estimate(1))
            .unwrap();
        assert_eq!(thought.number, 3);
        assert_eq!(thought.estimate, Some(3));
    }

    #[test]
    fn test_add_thought_rejects_dangling_revision() {
        let mut session = session_with(&["a"]);
        let options = ThoughtOptions {
            is_revision: true,
            revises_thought: Some(4),
            ..Default::default()
        };
        let err = session.add_thought("b", options).unwrap_err();
        assert!(err.is_thought_not_found());
        assert_eq!(session.thoughts().len(), 1);

        let options = ThoughtOptions {
            is_revision: true,
            ..Default::default()
        };
        assert!(session.add_thought("b", options).unwrap_err().is_validation());
    }

    #[test]
    fn test_revise_preserves_original() {
        let mut session = session_with(&["original idea", "second"]);
        let before = session.thoughts()[0].clone();

        let revision = session
            .revise_thought(1, "better idea", ThoughtOptions::default())
            .unwrap();

        assert_eq!(revision.number, 3);
        assert!(revision.is_revision);
        assert_eq!(revision.revises_thought, Some(1));
        assert_eq!(revision.original_text.as_deref(), Some("original idea"));
        assert_eq!(session.thoughts()[0], before);
        assert_eq!(session.metadata().revision_count, 1);
    }

    #[test]
    fn test_revise_missing_thought() {
        let mut session = session_with(&["only one"]);
        let before = session.clone();
        let err = session
            .revise_thought(2, "updated text", ThoughtOptions::default())
            .unwrap_err();
        assert_eq!(err, SeqThinkError::thought_not_found(2));
        assert_eq!(session, before);
    }

    #[test]
    fn test_create_branch_sets_current() {
        let mut session = session_with(&["root", "next"]);
        let branch = session.create_branch(1, "alt").unwrap();
        assert_eq!(branch.from_thought, 1);
        assert_eq!(branch.thoughts, vec![1]);
        assert_eq!(session.current_branch(), "alt");

        let thought = session.add_thought("on alt", ThoughtOptions::default()).unwrap();
        assert_eq!(thought.branch, "alt");
        assert_eq!(session.branch_thoughts("alt"), vec![1, 3]);
    }

    #[test]
    fn test_create_branch_missing_thought() {
        let mut session = session_with(&["root"]);
        let err = session.create_branch(5, "alt").unwrap_err();
        assert!(err.is_thought_not_found());
        assert!(session.branches().is_empty());
        assert_eq!(session.current_branch(), MAIN_BRANCH);
    }

    #[test]
    fn test_create_branch_overwrites_same_id() {
        let mut session = session_with(&["a", "b"]);
        session.create_branch(1, "alt").unwrap();
        session.create_branch(2, "alt").unwrap();
        assert_eq!(session.branches().len(), 1);
        assert_eq!(session.branches()["alt"].from_thought, 2);
    }

    #[test]
    fn test_switch_branch() {
        let mut session = session_with(&["a"]);
        session.create_branch(1, "alt").unwrap();
        session.switch_branch(MAIN_BRANCH).unwrap();
        assert_eq!(session.current_branch(), MAIN_BRANCH);
        assert!(session.switch_branch("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_status_follows_latest_thought() {
        let mut session = session_with(&[]);
        assert_eq!(session.summary().current_status, SessionStatus::NotStarted);

        session
            .add_thought("done", ThoughtOptions::default().with_next_thought_needed(false))
            .unwrap();
        assert_eq!(session.summary().current_status, SessionStatus::Complete);

        session.add_thought("reopened", ThoughtOptions::default()).unwrap();
        assert_eq!(session.summary().current_status, SessionStatus::InProgress);
    }

    #[test]
    fn test_clear_keeps_identity() {
        let mut session = session_with(&["a", "b"]);
        session.create_branch(1, "alt").unwrap();
        let id = session.id.clone();
        session.clear();
        assert_eq!(session.id, id);
        assert_eq!(session.topic.as_deref(), Some("test"));
        assert!(session.latest_thought().is_none());
        assert!(!session.has_branches());
        assert_eq!(session.current_branch(), MAIN_BRANCH);
    }

    #[test]
    fn test_set_topic_twice() {
        let mut session = Session::new(None);
        session.set_topic("first");
        session.set_topic("second");
        assert_eq!(session.topic.as_deref(), Some("second"));
    }
}
