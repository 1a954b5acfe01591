use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seqthink_application::SessionUseCase;
use seqthink_core::export::ExportFormat;
use seqthink_infrastructure::{ConfigService, JsonSessionRepository, SeqThinkPaths};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::output::OutputFormat;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "SEQTHINK_LOG";

#[derive(Parser)]
#[command(name = "seqthink")]
#[command(about = "Sequential thinking sessions with revisions, branches and heuristic guidance", long_about = None)]
struct Cli {
    /// Directory holding saved sessions
    #[arg(long, global = true)]
    session_dir: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Log more (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session and make it active
    Start {
        #[arg(long)]
        topic: Option<String>,
        /// Estimated total number of thoughts
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// Add a thought to the active session
    Think {
        text: String,
        #[arg(long)]
        estimate: Option<u32>,
        /// Revise the given thought number
        #[arg(long, value_name = "N")]
        revise: Option<u32>,
        /// Branch from the given thought number (requires --branch-id)
        #[arg(long, value_name = "N", requires = "branch_id")]
        branch: Option<u32>,
        #[arg(long, value_name = "ID", requires = "branch")]
        branch_id: Option<String>,
        /// Mark this as the final thought
        #[arg(long)]
        complete: bool,
    },
    /// Set or replace the active session's topic
    Topic { topic: String },
    /// Create a branch from a thought and switch to it
    Branch { from: u32, id: String },
    /// Switch the branch new thoughts are attributed to
    Switch { id: String },
    /// Show the thought history
    History,
    /// Show the session summary
    Summary,
    /// Show the active session status
    Status,
    /// Export a session as json, markdown or compact text
    Export {
        /// Defaults to the configured export format
        format: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Session id or name (defaults to the active session)
        #[arg(long)]
        session: Option<String>,
    },
    /// Clear all thoughts from the active session
    Clear,
    /// Read one JSON thought request from stdin and print the JSON response
    Api,
    /// Manage saved sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List saved sessions
    List,
    /// Make a saved session active
    Load { name: String },
    /// Save the active session under a name
    Save { name: String },
    /// Delete a saved session
    Delete { name: String },
}

fn init_tracing(verbose: u8, config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new(config_filter.unwrap_or("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // A broken config file is only reported once the subscriber exists.
    let config_service = ConfigService::new();
    let log_filter = config_service
        .try_get_config()
        .ok()
        .and_then(|config| config.log_filter);
    init_tracing(cli.verbose, log_filter.as_deref());
    let config = config_service.get_config();

    let output: OutputFormat = cli.format.parse()?;

    let session_dir = cli.session_dir.or(config.session_dir.clone());
    let base_dir = SeqThinkPaths::session_base_dir(session_dir.as_deref())?;
    let repository = JsonSessionRepository::new(&base_dir)
        .with_context(|| format!("Failed to open session store at {:?}", base_dir))?;
    tracing::debug!("Session store: {:?}", base_dir);

    let usecase = SessionUseCase::new(Arc::new(repository), config.default_estimate);

    match cli.command {
        Commands::Start { topic, estimate } => {
            commands::session::start(&usecase, output, topic, estimate).await?
        }
        Commands::Think {
            text,
            estimate,
            revise,
            branch,
            branch_id,
            complete,
        } => {
            let options = seqthink_application::ThinkOptions {
                estimate,
                revise,
                branch: branch.zip(branch_id),
                complete,
            };
            commands::session::think(&usecase, output, &text, options).await?
        }
        Commands::Topic { topic } => commands::session::topic(&usecase, output, &topic).await?,
        Commands::Branch { from, id } => {
            commands::session::branch(&usecase, output, from, &id).await?
        }
        Commands::Switch { id } => commands::session::switch(&usecase, output, &id).await?,
        Commands::History => commands::session::history(&usecase, output).await?,
        Commands::Summary => commands::session::summary(&usecase, output).await?,
        Commands::Status => commands::session::status(&usecase, output).await?,
        Commands::Export {
            format,
            output: path,
            session,
        } => {
            let export_format = match format {
                Some(format) => format.parse::<ExportFormat>()?,
                None => config.export_format()?,
            };
            commands::session::export(&usecase, export_format, path, session.as_deref()).await?
        }
        Commands::Clear => commands::session::clear(&usecase, output).await?,
        Commands::Api => return commands::api::run(&usecase).await,
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(&usecase, output).await?,
            SessionsAction::Load { name } => {
                commands::sessions::load(&usecase, output, &name).await?
            }
            SessionsAction::Save { name } => {
                commands::sessions::save(&usecase, output, &name).await?
            }
            SessionsAction::Delete { name } => {
                commands::sessions::delete(&usecase, output, &name).await?
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_think_flags() {
        let cli = Cli::try_parse_from([
            "seqthink",
            "think",
            "Try the canary",
            "--branch",
            "2",
            "--branch-id",
            "canary",
            "--complete",
        ])
        .unwrap();
        match cli.command {
            Commands::Think {
                text,
                branch,
                branch_id,
                complete,
                ..
            } => {
                assert_eq!(text, "Try the canary");
                assert_eq!(branch, Some(2));
                assert_eq!(branch_id.as_deref(), Some("canary"));
                assert!(complete);
            }
            _ => panic!("expected think"),
        }
    }

    #[test]
    fn test_branch_requires_id() {
        assert!(Cli::try_parse_from(["seqthink", "think", "x", "--branch", "2"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["seqthink", "status", "--format", "json", "-vv"]).unwrap();
        assert_eq!(cli.format, "json");
        assert_eq!(cli.verbose, 2);
    }
}
