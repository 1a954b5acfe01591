//! Process guidance derived from a thought's position and flags.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Inputs to [`recommend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationContext {
    pub progress: f64,
    pub is_revision: bool,
    pub branch_from_thought: Option<u32>,
    pub next_thought_needed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum EstimatedCompletion {
    #[serde(rename = "early")]
    #[strum(serialize = "early")]
    Early,
    #[serde(rename = "developing")]
    #[strum(serialize = "developing")]
    Developing,
    #[serde(rename = "advanced")]
    #[strum(serialize = "advanced")]
    Advanced,
    #[serde(rename = "nearing completion")]
    #[strum(serialize = "nearing completion")]
    NearingCompletion,
    #[serde(rename = "complete")]
    #[strum(serialize = "complete")]
    Complete,
}

/// The `context` block of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseContext {
    pub session_progress: f64,
    pub has_revisions: bool,
    pub has_branches: bool,
    pub estimated_completion: EstimatedCompletion,
    pub suggested_next_steps: Vec<String>,
}

/// Ordered guidance: one progress-band item, the revision and branch notes
/// when they apply, then one closing item.
pub fn recommend(context: &RecommendationContext) -> Vec<String> {
    let mut recommendations = Vec::with_capacity(4);

    let band = if context.progress < 0.2 {
        "Consider establishing clear objectives and scope"
    } else if context.progress < 0.5 {
        "Focus on understanding core constraints and requirements"
    } else if context.progress < 0.8 {
        "Begin synthesizing insights and forming conclusions"
    } else {
        "Ensure all aspects have been thoroughly considered"
    };
    recommendations.push(band.to_string());

    if context.is_revision {
        recommendations.push("Document what changed in this revision and why".to_string());
    }
    if context.branch_from_thought.is_some() {
        recommendations
            .push("Clearly distinguish this branch from the original reasoning path".to_string());
    }

    let closing = if context.next_thought_needed {
        "Consider what logical next step follows from this thought"
    } else {
        "Prepare to summarize conclusions and next steps"
    };
    recommendations.push(closing.to_string());

    recommendations
}

pub fn estimated_completion(thought_number: u32, total_thoughts: u32) -> EstimatedCompletion {
    if thought_number >= total_thoughts {
        return EstimatedCompletion::Complete;
    }
    let progress = f64::from(thought_number) / f64::from(total_thoughts);
    if progress < 0.25 {
        EstimatedCompletion::Early
    } else if progress < 0.5 {
        EstimatedCompletion::Developing
    } else if progress < 0.75 {
        EstimatedCompletion::Advanced
    } else {
        EstimatedCompletion::NearingCompletion
    }
}

pub fn suggested_next_steps(
    thought_number: u32,
    total_thoughts: u32,
    is_revision: bool,
    branch_from_thought: Option<u32>,
) -> Vec<String> {
    let mut steps = Vec::new();
    if is_revision {
        steps.push("Validate the revised thought against original objectives".to_string());
    }
    if branch_from_thought.is_some() {
        steps.push("Explore implications of the new reasoning branch".to_string());
    }

    let position = f64::from(thought_number);
    let total = f64::from(total_thoughts);
    let step = if position < total * 0.5 {
        "Continue analysis of remaining aspects"
    } else if position < total * 0.8 {
        "Begin synthesizing findings into coherent conclusions"
    } else {
        "Finalize reasoning and prepare actionable recommendations"
    };
    steps.push(step.to_string());
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(progress: f64) -> RecommendationContext {
        RecommendationContext {
            progress,
            is_revision: false,
            branch_from_thought: None,
            next_thought_needed: true,
        }
    }

    #[test]
    fn test_progress_bands() {
        assert_eq!(
            recommend(&context(0.1))[0],
            "Consider establishing clear objectives and scope"
        );
        assert_eq!(
            recommend(&context(0.2))[0],
            "Focus on understanding core constraints and requirements"
        );
        assert_eq!(
            recommend(&context(0.5))[0],
            "Begin synthesizing insights and forming conclusions"
        );
        assert_eq!(
            recommend(&context(0.8))[0],
            "Ensure all aspects have been thoroughly considered"
        );
    }

    #[test]
    fn test_revision_near_end() {
        let recommendations = recommend(&RecommendationContext {
            progress: 4.0 / 5.0,
            is_revision: true,
            ..context(0.0)
        });
        assert_eq!(recommendations.len(), 3);
        assert!(recommendations[0].contains("thoroughly"));
        assert_eq!(
            recommendations[1],
            "Document what changed in this revision and why"
        );
    }

    #[test]
    fn test_branch_and_closing() {
        let recommendations = recommend(&RecommendationContext {
            branch_from_thought: Some(2),
            next_thought_needed: false,
            ..context(0.3)
        });
        assert_eq!(
            recommendations,
            vec![
                "Focus on understanding core constraints and requirements",
                "Clearly distinguish this branch from the original reasoning path",
                "Prepare to summarize conclusions and next steps",
            ]
        );
    }

    #[test]
    fn test_estimated_completion() {
        assert_eq!(estimated_completion(1, 5), EstimatedCompletion::Early);
        assert_eq!(estimated_completion(2, 5), EstimatedCompletion::Developing);
        assert_eq!(estimated_completion(3, 5), EstimatedCompletion::Advanced);
        assert_eq!(estimated_completion(4, 5), EstimatedCompletion::NearingCompletion);
        assert_eq!(estimated_completion(5, 5), EstimatedCompletion::Complete);
        assert_eq!(
            EstimatedCompletion::NearingCompletion.to_string(),
            "nearing completion"
        );
    }

    #[test]
    fn test_suggested_next_steps() {
        assert_eq!(
            suggested_next_steps(1, 10, false, None),
            vec!["Continue analysis of remaining aspects"]
        );
        assert_eq!(
            suggested_next_steps(6, 10, true, Some(3)),
            vec![
                "Validate the revised thought against original objectives",
                "Explore implications of the new reasoning branch",
                "Begin synthesizing findings into coherent conclusions",
            ]
        );
        assert_eq!(
            suggested_next_steps(9, 10, false, None),
            vec!["Finalize reasoning and prepare actionable recommendations"]
        );
    }
}
