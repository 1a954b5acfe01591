//! Text renderings of a session.

use crate::error::{Result, SeqThinkError};
use crate::session::{Session, SessionMetadata};
use serde::Serialize;
use std::str::FromStr;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
    Compact,
}

impl ExportFormat {
    /// Conventional file extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Compact => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = SeqThinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "compact" => Ok(Self::Compact),
            _ => Err(SeqThinkError::unsupported_format(s)),
        }
    }
}

/// JSON export shape: the stored session plus its derived counters.
#[derive(Serialize)]
struct SessionDocument<'a> {
    #[serde(flatten)]
    session: &'a Session,
    metadata: SessionMetadata,
}

/// Renders `session` in `format`. Either the whole rendering is returned or an error.
pub fn render(session: &Session, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&SessionDocument {
            session,
            metadata: session.metadata(),
        })?),
        ExportFormat::Markdown => Ok(to_markdown(session)),
        ExportFormat::Compact => Ok(to_compact(session)),
    }
}

fn display_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

pub fn to_markdown(session: &Session) -> String {
    let metadata = session.metadata();
    let mut lines = vec![
        "# Sequential Thinking Session".to_string(),
        String::new(),
        format!("**Session ID:** {}", session.id),
        format!(
            "**Topic:** {}",
            session.topic.as_deref().unwrap_or("No topic specified")
        ),
        format!("**Created:** {}", display_time(&session.created_at)),
        format!("**Last Updated:** {}", display_time(&session.updated_at)),
        format!("**Total Thoughts:** {}", metadata.total_thoughts),
        format!("**Revisions:** {}", metadata.revision_count),
        format!("**Branches:** {}", metadata.branch_count),
        String::new(),
        "## Thoughts".to_string(),
        String::new(),
    ];

    for thought in session.thoughts() {
        let revision_tag = match (thought.is_revision, thought.revises_thought) {
            (true, Some(target)) => format!(" (revises #{target})"),
            _ => String::new(),
        };
        let branch_tag = thought
            .branch_id
            .as_deref()
            .map(|id| format!(" [branch: {id}]"))
            .unwrap_or_default();

        lines.push(format!(
            "### Thought #{}{}{}",
            thought.number, revision_tag, branch_tag
        ));
        lines.push(String::new());
        lines.push(format!("**Time:** {}", display_time(&thought.timestamp)));
        lines.push(format!(
            "**Next Needed:** {}",
            if thought.next_thought_needed { "Yes" } else { "No" }
        ));
        if let Some(estimate) = thought.estimate {
            lines.push(format!("**Estimated Total:** {estimate} thoughts"));
        }
        lines.extend([String::new(), thought.text.clone(), String::new()]);

        if let Some(original) = thought.original_text.as_deref().filter(|_| thought.is_revision) {
            lines.extend([
                "**Original Text:**".to_string(),
                format!("> {original}"),
                String::new(),
            ]);
        }
    }

    if session.has_branches() {
        lines.extend(["## Branches".to_string(), String::new()]);
        for (id, branch) in session.branches() {
            lines.extend([
                format!("### Branch: {id}"),
                String::new(),
                format!("**From Thought:** #{}", branch.from_thought),
                format!("**Created:** {}", display_time(&branch.created_at)),
                format!(
                    "**Thoughts in Branch:** {}",
                    session.branch_thoughts(id).len()
                ),
                String::new(),
            ]);
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn to_compact(session: &Session) -> String {
    let mut lines = vec![
        format!("Session: {}", session.id),
        format!("Topic: {}", session.topic.as_deref().unwrap_or("No topic")),
        format!("Thoughts: {}", session.thoughts().len()),
        String::new(),
    ];
    lines.extend(session.thoughts().iter().map(|thought| {
        match (thought.is_revision, thought.revises_thought) {
            (true, Some(target)) => format!("REV[#{}][{}]: {}", target, thought.number, thought.text),
            _ => format!("THOUGHT[{}]: {}", thought.number, thought.text),
        }
    }));
    lines.join("\n")
}

/// One line per thought: `n. text [REVISED m] [BRANCH: id]`.
pub fn history_lines(session: &Session) -> Vec<String> {
    session
        .thoughts()
        .iter()
        .map(|thought| {
            let mut line = format!("{}. {}", thought.number, thought.text);
            if let (true, Some(target)) = (thought.is_revision, thought.revises_thought) {
                line.push_str(&format!(" [REVISED {target}]"));
            }
            if let Some(id) = &thought.branch_id {
                line.push_str(&format!(" [BRANCH: {id}]"));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ThoughtOptions;

    fn sample() -> Session {
        let mut session = Session::new(Some("Caching".to_string()));
        session
            .add_thought("Measure hit rate", ThoughtOptions::default().with_estimate(3))
            .unwrap();
        session
            .revise_thought(1, "Measure hit rate per tenant", ThoughtOptions::default())
            .unwrap();
        session.create_branch(1, "lru").unwrap();
        session
            .add_thought("Try LRU", ThoughtOptions::default().on_branch("lru"))
            .unwrap();
        session
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("compact".parse::<ExportFormat>().unwrap(), ExportFormat::Compact);

        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(err.is_unsupported_format());
        assert_eq!(err.to_string(), "Unsupported format: pdf");
    }

    #[test]
    fn test_compact() {
        let text = to_compact(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "Topic: Caching");
        assert_eq!(lines[4], "THOUGHT[1]: Measure hit rate");
        assert_eq!(lines[5], "REV[#1][2]: Measure hit rate per tenant");
        assert_eq!(lines[6], "THOUGHT[3]: Try LRU");
    }

    #[test]
    fn test_markdown_sections() {
        let text = to_markdown(&sample());
        assert!(text.starts_with("# Sequential Thinking Session"));
        assert!(text.contains("**Total Thoughts:** 3"));
        assert!(text.contains("### Thought #2 (revises #1)"));
        assert!(text.contains("> Measure hit rate\n"));
        assert!(text.contains("### Thought #3 [branch: lru]"));
        assert!(text.contains("### Branch: lru"));
        assert!(text.contains("**Thoughts in Branch:** 2"));
        assert!(text.contains("**Estimated Total:** 3 thoughts"));
    }

    #[test]
    fn test_json_roundtrip() {
        let session = sample();
        let text = render(&session, ExportFormat::Json).unwrap();
        let back: Session = serde_json::from_str(&text).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_json_includes_metadata() {
        let text = render(&sample(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["metadata"]["totalThoughts"], 3);
        assert_eq!(value["metadata"]["revisionCount"], 1);
        assert_eq!(value["metadata"]["branchCount"], 1);
        assert_eq!(value["metadata"]["completedThoughts"], 0);
        assert_eq!(value["thoughts"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_history_lines() {
        let lines = history_lines(&sample());
        assert_eq!(lines[0], "1. Measure hit rate");
        assert_eq!(lines[1], "2. Measure hit rate per tenant [REVISED 1]");
        assert_eq!(lines[2], "3. Try LRU [BRANCH: lru]");
    }
}
