//! Text and JSON rendering for command results.

use anyhow::Result;
use seqthink_core::SeqThinkError;
use seqthink_core::controller::ThoughtOutcome;
use seqthink_core::session::{Session, SessionEntry, SessionSummary};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = SeqThinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(SeqThinkError::unsupported_format(s)),
        }
    }
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn status_lines(session: &Session) -> Vec<String> {
    let metadata = session.metadata();
    vec![
        format!("Session ID: {}", session.id),
        format!("Topic: {}", session.topic.as_deref().unwrap_or("Not set")),
        format!("Thoughts: {}", metadata.total_thoughts),
        format!("Status: {}", session.status()),
        format!("Current branch: {}", session.current_branch()),
        format!("Branches: {}", metadata.branch_count),
        format!("Revisions: {}", metadata.revision_count),
    ]
}

pub fn summary_lines(summary: &SessionSummary) -> Vec<String> {
    vec![
        format!("Session ID: {}", summary.id),
        format!("Topic: {}", summary.topic.as_deref().unwrap_or("Not set")),
        format!("Thoughts: {}", summary.total_thoughts),
        format!("Status: {}", summary.current_status),
        format!("Branches: {}", summary.branches),
        format!("Revisions: {}", summary.revisions),
        format!("Created: {}", summary.created_at),
        format!("Updated: {}", summary.updated_at),
    ]
}

/// Renders the outcome of one recorded thought.
pub fn outcome_lines(outcome: &ThoughtOutcome) -> Vec<String> {
    let thought = &outcome.thought_data;
    let mut heading = format!("Thought {}", thought.number);
    if let Some(estimate) = thought.estimate {
        heading.push_str(&format!("/{}", estimate));
    }
    if let Some(target) = thought.revises_thought {
        heading.push_str(&format!(" (revises #{})", target));
    }
    if let Some(branch_id) = &thought.branch_id {
        heading.push_str(&format!(" [branch: {}]", branch_id));
    }

    let analysis = &outcome.analysis;
    let mut lines = vec![
        heading,
        format!(
            "Analysis: type={}, complexity={}, scope={}, confidence={:.2}, progress={:.0}%",
            analysis.thought_type,
            analysis.complexity,
            analysis.scope,
            analysis.confidence,
            analysis.progress * 100.0
        ),
        format!("Stage: {}", outcome.context.estimated_completion),
    ];

    if !outcome.recommendations.is_empty() {
        lines.push("Recommendations:".to_string());
        lines.extend(outcome.recommendations.iter().map(|r| format!("  - {}", r)));
    }
    if !outcome.context.suggested_next_steps.is_empty() {
        lines.push("Next steps:".to_string());
        lines.extend(
            outcome
                .context
                .suggested_next_steps
                .iter()
                .map(|s| format!("  - {}", s)),
        );
    }
    lines
}

pub fn entry_line(entry: &SessionEntry) -> String {
    format!(
        "{}  {}  thoughts={} branches={} revisions={}  updated {}{}",
        entry.name,
        entry.session_id,
        entry.thought_count,
        entry.branch_count,
        entry.revision_count,
        entry.updated_at,
        entry
            .topic
            .as_deref()
            .map(|topic| format!("  \"{}\"", topic))
            .unwrap_or_default()
    )
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqthink_core::SessionController;
    use seqthink_core::session::ThoughtOptions;
    use seqthink_core::validation::ThoughtRequest;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!(" JSON ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);

        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(err.is_unsupported_format());
        assert_eq!(err.to_string(), "Unsupported format: yaml");
    }

    #[test]
    fn test_status_lines_without_topic() {
        let session = Session::new(None);
        let lines = status_lines(&session);
        assert_eq!(lines[1], "Topic: Not set");
        assert_eq!(lines[2], "Thoughts: 0");
        assert_eq!(lines[3], "Status: Not Started");
        assert_eq!(lines[4], "Current branch: main");
    }

    #[test]
    fn test_outcome_lines() {
        let mut controller = SessionController::new(Session::new(Some("Cache".to_string())));
        controller
            .add_thought("Measure the hit rate", ThoughtOptions::default())
            .unwrap();
        let outcome = controller
            .submit_request(ThoughtRequest::new("Revise the hit-rate notes", 2, 4).revising(1))
            .unwrap();

        let lines = outcome_lines(&outcome);
        assert_eq!(lines[0], "Thought 2/4 (revises #1)");
        assert!(lines[1].starts_with("Analysis: type=revision"));
        assert!(lines.iter().any(|l| l == "Recommendations:"));
    }
}
