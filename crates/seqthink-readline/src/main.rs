use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use seqthink_application::SessionUseCase;
use seqthink_infrastructure::{ConfigService, JsonSessionRepository, SeqThinkPaths};

mod helper;
mod repl;

use helper::CliHelper;
use repl::{LineEditor, Repl};

/// Interactive sequential-thinking session.
///
/// Asks for a topic, starts a session with it and hands over to the
/// thinking loop. Log output goes to stderr so it never interleaves with
/// the prompt line.
#[tokio::main]
async fn main() -> Result<()> {
    // Tracing needs the configured filter, so a broken config file is only
    // reported once the subscriber exists.
    let config_service = ConfigService::new();
    let log_filter = config_service
        .try_get_config()
        .ok()
        .and_then(|config| config.log_filter);

    let filter = EnvFilter::try_from_env("SEQTHINK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(log_filter.as_deref().unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config_service.get_config();

    let base_dir = SeqThinkPaths::session_base_dir(config.session_dir.as_deref())?;
    let repository = JsonSessionRepository::new(&base_dir)
        .with_context(|| format!("Failed to open session store at {:?}", base_dir))?;
    let usecase = SessionUseCase::new(Arc::new(repository), config.default_estimate);

    let mut editor: LineEditor = LineEditor::new()?;
    editor.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Sequential Thinking ===".bright_magenta().bold());

    let topic = match editor.readline("Topic: ") {
        Ok(line) => Some(line.trim().to_string()).filter(|topic| !topic.is_empty()),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            println!("{}", "Goodbye!".bright_green());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let session = usecase.start(topic, None).await?;
    println!(
        "{}",
        format!("Session {} started", session.id).bright_black()
    );

    let repl = Repl::new(session, config.default_estimate);
    repl::run(&usecase, &mut editor, repl).await
}
