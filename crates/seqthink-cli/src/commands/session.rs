//! Commands acting on the active session.

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use seqthink_application::{SessionUseCase, ThinkOptions};
use seqthink_core::export::ExportFormat;
use std::fs;
use std::path::PathBuf;

pub async fn start(
    usecase: &SessionUseCase,
    format: OutputFormat,
    topic: Option<String>,
    estimate: Option<u32>,
) -> Result<()> {
    let session = usecase.start(topic, estimate).await?;
    match format {
        OutputFormat::Json => output::print_json(&session.summary()),
        OutputFormat::Text => {
            println!("Started session {}", session.id);
            if let Some(topic) = &session.topic {
                println!("Topic: {}", topic);
            }
            Ok(())
        }
    }
}

pub async fn think(
    usecase: &SessionUseCase,
    format: OutputFormat,
    text: &str,
    options: ThinkOptions,
) -> Result<()> {
    let outcome = usecase.think(text, options).await?;
    match format {
        OutputFormat::Json => output::print_json(&outcome),
        OutputFormat::Text => {
            output::print_lines(&output::outcome_lines(&outcome));
            Ok(())
        }
    }
}

pub async fn topic(usecase: &SessionUseCase, format: OutputFormat, topic: &str) -> Result<()> {
    let session = usecase.set_topic(topic).await?;
    match format {
        OutputFormat::Json => output::print_json(&session.summary()),
        OutputFormat::Text => {
            println!("Topic: {}", session.topic.as_deref().unwrap_or(topic));
            Ok(())
        }
    }
}

pub async fn branch(
    usecase: &SessionUseCase,
    format: OutputFormat,
    from_thought: u32,
    branch_id: &str,
) -> Result<()> {
    let session = usecase.create_branch(from_thought, branch_id).await?;
    match format {
        OutputFormat::Json => output::print_json(&session.branches().get(branch_id)),
        OutputFormat::Text => {
            println!(
                "Created branch '{}' from thought {}",
                branch_id, from_thought
            );
            Ok(())
        }
    }
}

pub async fn switch(usecase: &SessionUseCase, format: OutputFormat, branch_id: &str) -> Result<()> {
    let session = usecase.switch_branch(branch_id).await?;
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "currentBranch": session.current_branch(),
        })),
        OutputFormat::Text => {
            println!("Switched to branch '{}'", session.current_branch());
            Ok(())
        }
    }
}

pub async fn history(usecase: &SessionUseCase, format: OutputFormat) -> Result<()> {
    let lines = usecase.history().await?;
    match format {
        OutputFormat::Json => output::print_json(&lines),
        OutputFormat::Text => {
            if lines.is_empty() {
                println!("No thoughts recorded yet");
            } else {
                output::print_lines(&lines);
            }
            Ok(())
        }
    }
}

pub async fn summary(usecase: &SessionUseCase, format: OutputFormat) -> Result<()> {
    let summary = usecase.summary().await?;
    match format {
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Text => {
            output::print_lines(&output::summary_lines(&summary));
            Ok(())
        }
    }
}

pub async fn status(usecase: &SessionUseCase, format: OutputFormat) -> Result<()> {
    let session = usecase.active_session().await?;
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "id": session.id,
            "topic": session.topic,
            "status": session.status(),
            "currentBranch": session.current_branch(),
            "metadata": session.metadata(),
        })),
        OutputFormat::Text => {
            output::print_lines(&output::status_lines(&session));
            Ok(())
        }
    }
}

/// Writes the rendering to `path`, or to stdout without one.
pub async fn export(
    usecase: &SessionUseCase,
    export_format: ExportFormat,
    path: Option<PathBuf>,
    session: Option<&str>,
) -> Result<()> {
    let rendered = usecase.export(session, export_format).await?;

    match path {
        Some(path) => {
            fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write export to {:?}", path))?;
            eprintln!("Exported {} to {}", export_format, path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

pub async fn clear(usecase: &SessionUseCase, format: OutputFormat) -> Result<()> {
    let session = usecase.clear().await?;
    match format {
        OutputFormat::Json => output::print_json(&session.summary()),
        OutputFormat::Text => {
            println!("Cleared session {}", session.id);
            Ok(())
        }
    }
}
