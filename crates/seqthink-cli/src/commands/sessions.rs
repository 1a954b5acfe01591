//! Saved-session management.

use super::output::{self, OutputFormat};
use anyhow::{Result, bail};
use seqthink_application::SessionUseCase;

pub async fn list(usecase: &SessionUseCase, format: OutputFormat) -> Result<()> {
    let entries = usecase.list().await?;
    match format {
        OutputFormat::Json => output::print_json(&entries),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No saved sessions");
            }
            for entry in &entries {
                println!("{}", output::entry_line(entry));
            }
            Ok(())
        }
    }
}

pub async fn load(usecase: &SessionUseCase, format: OutputFormat, name: &str) -> Result<()> {
    let session = usecase.load(name).await?;
    match format {
        OutputFormat::Json => output::print_json(&session.summary()),
        OutputFormat::Text => {
            println!("Loaded session {}", session.id);
            output::print_lines(&output::status_lines(&session));
            Ok(())
        }
    }
}

pub async fn save(usecase: &SessionUseCase, format: OutputFormat, name: &str) -> Result<()> {
    let entry = usecase.save_as(name).await?;
    match format {
        OutputFormat::Json => output::print_json(&entry),
        OutputFormat::Text => {
            println!("Saved session {} as '{}'", entry.session_id, entry.name);
            Ok(())
        }
    }
}

pub async fn delete(usecase: &SessionUseCase, format: OutputFormat, name: &str) -> Result<()> {
    if !usecase.delete(name).await? {
        bail!("Session {} not found", name);
    }
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({ "deleted": name })),
        OutputFormat::Text => {
            println!("Deleted session '{}'", name);
            Ok(())
        }
    }
}
