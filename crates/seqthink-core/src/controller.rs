//! Request pipeline: validate, route, mutate, analyze, recommend.

use crate::analysis::{
    self, Analysis, AnalysisContext, RecommendationContext, ResponseContext,
};
use crate::error::{Result, SeqThinkError};
use crate::session::{Branch, Session, SessionSummary, Thought, ThoughtOptions};
use crate::validation::{self, ThoughtRequest, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtOutcome {
    pub thought_data: Thought,
    pub analysis: Analysis,
    pub recommendations: Vec<String>,
    pub context: ResponseContext,
}

/// Response envelope: `{ success: true, ...outcome }` or `{ success: false, error }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: Option<ThoughtOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ThoughtResponse {
    pub fn succeeded(outcome: ThoughtOutcome) -> Self {
        Self {
            success: true,
            outcome: Some(outcome),
            error: None,
        }
    }

    pub fn failed(error: &SeqThinkError) -> Self {
        Self {
            success: false,
            outcome: None,
            error: Some(error.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": e.to_string() })
        })
    }
}

/// Owns one [`Session`] and drives every change to it.
#[derive(Debug, Clone)]
pub struct SessionController {
    session: Session,
}

impl SessionController {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Handles a raw JSON submission. Failures leave the session unchanged.
    pub fn submit(&mut self, submission: &Value) -> ThoughtResponse {
        let result = validation::validate(submission)
            .map_err(SeqThinkError::from)
            .and_then(|request| self.submit_request(request));

        match result {
            Ok(outcome) => ThoughtResponse::succeeded(outcome),
            Err(e) => {
                tracing::debug!("[SessionController] Submission rejected: {}", e);
                ThoughtResponse::failed(&e)
            }
        }
    }

    pub fn submit_request(&mut self, request: ThoughtRequest) -> Result<ThoughtOutcome> {
        request.validate()?;
        let thought = self.record(&request)?;

        let analysis_context = AnalysisContext::new(request.thought_number, request.total_thoughts);
        let analysis = analysis::analyze(&request.thought, &analysis_context);
        let recommendations = analysis::recommend(&RecommendationContext {
            progress: analysis.progress,
            is_revision: request.is_revision,
            branch_from_thought: request.branch_from_thought,
            next_thought_needed: request.next_thought_needed,
        });
        let context = ResponseContext {
            session_progress: analysis.progress,
            has_revisions: self.session.has_revisions(),
            has_branches: self.session.has_branches(),
            estimated_completion: analysis::estimated_completion(
                request.thought_number,
                request.total_thoughts,
            ),
            suggested_next_steps: analysis::suggested_next_steps(
                request.thought_number,
                request.total_thoughts,
                request.is_revision,
                request.branch_from_thought,
            ),
        };

        Ok(ThoughtOutcome {
            thought_data: thought,
            analysis,
            recommendations,
            context,
        })
    }

    fn record(&mut self, request: &ThoughtRequest) -> Result<Thought> {
        let options = ThoughtOptions {
            estimate: Some(request.total_thoughts),
            next_thought_needed: Some(request.next_thought_needed),
            needs_more_thoughts: request.needs_more_thoughts,
            ..Default::default()
        };

        if request.is_revision {
            let target = request
                .revises_thought
                .ok_or(ValidationError::MissingRevisionTarget)?;
            return self
                .session
                .revise_thought(target, request.thought.clone(), options);
        }

        if let Some(from) = request.branch_from_thought {
            let branch_id = request
                .branch_id
                .clone()
                .ok_or(ValidationError::MissingBranchId)?;
            let continues = self
                .session
                .branches()
                .get(&branch_id)
                .is_some_and(|branch| branch.from_thought == from);
            if continues {
                self.session.switch_branch(&branch_id)?;
            } else {
                self.session.create_branch(from, branch_id.clone())?;
            }
            return self.session.add_thought(
                request.thought.clone(),
                ThoughtOptions {
                    branch_from_thought: Some(from),
                    branch_id: Some(branch_id),
                    ..options
                },
            );
        }

        self.session.add_thought(request.thought.clone(), options)
    }

    pub fn add_thought(&mut self, text: impl Into<String>, options: ThoughtOptions) -> Result<Thought> {
        self.session.add_thought(text, options)
    }

    pub fn revise_thought(
        &mut self,
        number: u32,
        new_text: impl Into<String>,
        options: ThoughtOptions,
    ) -> Result<Thought> {
        self.session.revise_thought(number, new_text, options)
    }

    pub fn create_branch(&mut self, number: u32, branch_id: impl Into<String>) -> Result<&Branch> {
        self.session.create_branch(number, branch_id)
    }

    pub fn summary(&self) -> SessionSummary {
        self.session.summary()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(Session::new(None))
    }
}
