//! Structural validation of thought submissions.
//!
//! The validator is a pure gate: it never touches a session, and a rejected
//! submission leaves the caller's state exactly as it was.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Named failures produced by the validator, in the order they are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Thought is required and must be a non-empty string")]
    MissingThought,

    #[error("nextThoughtNeeded must be a boolean")]
    InvalidFlag,

    #[error("thoughtNumber must be a positive integer")]
    InvalidNumber,

    #[error("totalThoughts must be an integer >= thoughtNumber")]
    InvalidEstimate,

    #[error("{field} must be {expected}")]
    InvalidOptional {
        field: &'static str,
        expected: &'static str,
    },

    #[error("revisesThought is required when isRevision is true")]
    MissingRevisionTarget,

    #[error("branchId is required when branchFromThought is set")]
    MissingBranchId,
}

/// A thought submission as sent by a caller.
///
/// `thought_number` / `total_thoughts` are the caller's view of its position in
/// the reasoning process; they drive analysis and recommendations. The log
/// assigns its own dense numbers when the thought is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtRequest {
    pub thought: String,
    pub thought_number: u32,
    pub total_thoughts: u32,
    pub next_thought_needed: bool,
    #[serde(default)]
    pub is_revision: bool,
    #[serde(default)]
    pub revises_thought: Option<u32>,
    #[serde(default)]
    pub branch_from_thought: Option<u32>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub needs_more_thoughts: Option<bool>,
}

impl ThoughtRequest {
    pub fn new(thought: impl Into<String>, thought_number: u32, total_thoughts: u32) -> Self {
        Self {
            thought: thought.into(),
            thought_number,
            total_thoughts,
            next_thought_needed: true,
            is_revision: false,
            revises_thought: None,
            branch_from_thought: None,
            branch_id: None,
            needs_more_thoughts: None,
        }
    }

    /// Marks the request as a revision of `thought_number`.
    pub fn revising(mut self, thought_number: u32) -> Self {
        self.is_revision = true;
        self.revises_thought = Some(thought_number);
        self
    }

    /// Marks the request as opening (or continuing) branch `branch_id` at `from_thought`.
    pub fn branching(mut self, from_thought: u32, branch_id: impl Into<String>) -> Self {
        self.branch_from_thought = Some(from_thought);
        self.branch_id = Some(branch_id.into());
        self
    }

    pub fn with_next_thought_needed(mut self, next_thought_needed: bool) -> Self {
        self.next_thought_needed = next_thought_needed;
        self
    }

    /// Runs the structural checks on an already-typed request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.thought.is_empty() {
            return Err(ValidationError::MissingThought);
        }
        if self.thought_number < 1 {
            return Err(ValidationError::InvalidNumber);
        }
        if self.total_thoughts < self.thought_number {
            return Err(ValidationError::InvalidEstimate);
        }
        if self.revises_thought == Some(0) {
            return Err(ValidationError::InvalidOptional {
                field: "revisesThought",
                expected: "a positive integer",
            });
        }
        if self.branch_from_thought == Some(0) {
            return Err(ValidationError::InvalidOptional {
                field: "branchFromThought",
                expected: "a positive integer",
            });
        }
        if self
            .branch_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(ValidationError::InvalidOptional {
                field: "branchId",
                expected: "a non-empty string",
            });
        }
        if self.is_revision && self.revises_thought.is_none() {
            return Err(ValidationError::MissingRevisionTarget);
        }
        if self.branch_from_thought.is_some() && self.branch_id.is_none() {
            return Err(ValidationError::MissingBranchId);
        }
        Ok(())
    }
}

/// Validates a raw JSON submission and converts it into a [`ThoughtRequest`].
///
/// Checks run in a fixed order and the first failure wins:
/// `thought`, `nextThoughtNeeded`, `thoughtNumber`, `totalThoughts`, then the
/// optional fields.
pub fn validate(submission: &Value) -> Result<ThoughtRequest, ValidationError> {
    let thought = match submission.get("thought") {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        _ => return Err(ValidationError::MissingThought),
    };

    let next_thought_needed = submission
        .get("nextThoughtNeeded")
        .and_then(Value::as_bool)
        .ok_or(ValidationError::InvalidFlag)?;

    let thought_number = submission
        .get("thoughtNumber")
        .and_then(whole_number)
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(ValidationError::InvalidNumber)?;

    let total_thoughts = submission
        .get("totalThoughts")
        .and_then(whole_number)
        .filter(|n| *n >= u64::from(thought_number))
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(ValidationError::InvalidEstimate)?;

    let request = ThoughtRequest {
        thought,
        thought_number,
        total_thoughts,
        next_thought_needed,
        is_revision: optional_bool(submission, "isRevision")?.unwrap_or(false),
        revises_thought: optional_number(submission, "revisesThought")?,
        branch_from_thought: optional_number(submission, "branchFromThought")?,
        branch_id: optional_string(submission, "branchId")?,
        needs_more_thoughts: optional_bool(submission, "needsMoreThoughts")?,
    };

    request.validate()?;
    Ok(request)
}

/// Reads a non-negative integer, accepting floats without a fractional part (`3.0`).
fn whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    })
}

fn present<'a>(submission: &'a Value, field: &str) -> Option<&'a Value> {
    submission.get(field).filter(|value| !value.is_null())
}

fn optional_bool(submission: &Value, field: &'static str) -> Result<Option<bool>, ValidationError> {
    match present(submission, field) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or(ValidationError::InvalidOptional {
                field,
                expected: "a boolean",
            }),
    }
}

fn optional_number(
    submission: &Value,
    field: &'static str,
) -> Result<Option<u32>, ValidationError> {
    match present(submission, field) {
        None => Ok(None),
        Some(value) => whole_number(value)
            .filter(|n| *n >= 1)
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or(ValidationError::InvalidOptional {
                field,
                expected: "a positive integer",
            }),
    }
}

fn optional_string(
    submission: &Value,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match present(submission, field) {
        None => Ok(None),
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(Some(text.clone())),
        Some(_) => Err(ValidationError::InvalidOptional {
            field,
            expected: "a non-empty string",
        }),
    }
}
