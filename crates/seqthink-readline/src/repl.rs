//! Line-oriented thinking loop.
//!
//! The session lives in memory for the duration of the loop and is written
//! back through the repository when the loop ends.

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use seqthink_application::SessionUseCase;
use seqthink_core::controller::{SessionController, ThoughtOutcome};
use seqthink_core::export;
use seqthink_core::session::Session;
use seqthink_core::validation::ThoughtRequest;

use crate::helper::CliHelper;

pub type LineEditor = Editor<CliHelper, DefaultHistory>;

/// Command words recognized at the start of a line.
pub const COMMANDS: [&str; 7] = [
    "help", "revise", "branch", "history", "summary", "exit", "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Revise { target: u32, text: String },
    Branch {
        from: u32,
        id: String,
        text: Option<String>,
    },
    History,
    Summary,
    Exit,
    Thought(String),
}

/// Parses one input line. Blank lines yield `None`.
///
/// `revise` and `branch` only act as commands when followed by a thought
/// number, so a thought such as "revise the rollout plan" is kept as text.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match (word.to_lowercase().as_str(), rest.is_empty()) {
        ("help", true) => ReplCommand::Help,
        ("history", true) => ReplCommand::History,
        ("summary", true) => ReplCommand::Summary,
        ("exit" | "quit", true) => ReplCommand::Exit,
        ("revise", false) => match split_number(rest) {
            Some((target, text)) if !text.is_empty() => ReplCommand::Revise {
                target,
                text: text.to_string(),
            },
            Some(_) => return Err("Usage: revise <n> <text>".to_string()),
            None => ReplCommand::Thought(trimmed.to_string()),
        },
        ("branch", false) => match split_number(rest) {
            Some((from, rest)) => {
                let (id, text) = match rest.split_once(char::is_whitespace) {
                    Some((id, text)) => (id, Some(text.trim().to_string())),
                    None => (rest, None),
                };
                if id.is_empty() {
                    return Err("Usage: branch <n> <id> [text]".to_string());
                }
                ReplCommand::Branch {
                    from,
                    id: id.to_string(),
                    text: text.filter(|t| !t.is_empty()),
                }
            }
            None => ReplCommand::Thought(trimmed.to_string()),
        },
        _ => ReplCommand::Thought(trimmed.to_string()),
    };
    Ok(Some(command))
}

fn split_number(input: &str) -> Option<(u32, &str)> {
    let (number, rest) = match input.split_once(char::is_whitespace) {
        Some((number, rest)) => (number, rest.trim()),
        None => (input, ""),
    };
    number.parse().ok().map(|n| (n, rest))
}

/// In-memory session state for the loop.
pub struct Repl {
    controller: SessionController,
    estimate: u32,
}

impl Repl {
    pub fn new(session: Session, default_estimate: u32) -> Self {
        let estimate = session
            .latest_thought()
            .and_then(|t| t.estimate)
            .unwrap_or(default_estimate)
            .max(1);
        Self {
            controller: SessionController::new(session),
            estimate,
        }
    }

    pub fn session(&self) -> &Session {
        self.controller.session()
    }

    pub fn into_session(self) -> Session {
        self.controller.into_session()
    }

    fn next_number(&self) -> u32 {
        u32::try_from(self.session().thoughts().len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    pub fn estimate(&self) -> u32 {
        self.estimate.max(self.next_number())
    }

    pub fn set_estimate(&mut self, estimate: u32) {
        self.estimate = estimate.max(1);
    }

    pub fn prompt(&self) -> String {
        format!("Thought {}/{} > ", self.next_number(), self.estimate())
    }

    /// Records a thought at the next position in the log.
    pub fn submit(
        &mut self,
        text: &str,
        revise: Option<u32>,
        branch: Option<(u32, String)>,
        more_needed: bool,
    ) -> seqthink_core::Result<ThoughtOutcome> {
        let mut request = ThoughtRequest::new(text, self.next_number(), self.estimate())
            .with_next_thought_needed(more_needed);
        if let Some(target) = revise {
            request = request.revising(target);
        }
        if let Some((from, id)) = branch {
            request = request.branching(from, id);
        }
        self.controller.submit_request(request)
    }

    pub fn create_branch(&mut self, from: u32, id: &str) -> seqthink_core::Result<()> {
        self.controller.create_branch(from, id).map(|_| ())
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    println!("  {}                 show this help", "help".bright_cyan());
    println!("  {}     replace thought n", "revise <n> <text>".bright_cyan());
    println!(
        "  {} branch from thought n (text optional)",
        "branch <n> <id> [text]".bright_cyan()
    );
    println!("  {}              list recorded thoughts", "history".bright_cyan());
    println!("  {}              show session summary", "summary".bright_cyan());
    println!("  {}         save and leave", "exit | quit".bright_cyan());
    println!("{}", "Anything else is recorded as the next thought.".bright_black());
}

fn print_outcome(outcome: &ThoughtOutcome) {
    let analysis = &outcome.analysis;
    println!(
        "{}",
        format!(
            "[{}] {} complexity, {} scope, confidence {:.2}",
            analysis.thought_type, analysis.complexity, analysis.scope, analysis.confidence
        )
        .bright_blue()
    );
    for recommendation in &outcome.recommendations {
        println!("  {}", format!("- {}", recommendation).yellow());
    }
    println!(
        "{}",
        format!("Stage: {}", outcome.context.estimated_completion).bright_black()
    );
}

/// Reads one answer, treating Ctrl-C and Ctrl-D as "no answer".
fn ask(editor: &mut LineEditor, prompt: &str) -> Option<String> {
    match editor.readline(prompt) {
        Ok(line) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}

/// Asks whether more thoughts follow and for an optional new estimate.
fn ask_followup(editor: &mut LineEditor, repl: &mut Repl) -> Option<bool> {
    let answer = ask(editor, "More thoughts needed? [Y/n] ")?;
    let more_needed = !matches!(answer.to_lowercase().as_str(), "n" | "no");

    if more_needed {
        let prompt = format!("Estimated total [{}]: ", repl.estimate());
        let answer = ask(editor, &prompt)?;
        if !answer.is_empty() {
            match answer.parse::<u32>() {
                Ok(estimate) => repl.set_estimate(estimate),
                Err(_) => println!("{}", "Not a number, keeping the estimate".yellow()),
            }
        }
    }
    Some(more_needed)
}

fn report(result: seqthink_core::Result<ThoughtOutcome>) {
    match result {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => println!("{}", format!("Error: {}", e).red()),
    }
}

/// Runs the loop until `exit`, Ctrl-D or a terminal error, then saves.
pub async fn run(usecase: &SessionUseCase, editor: &mut LineEditor, mut repl: Repl) -> Result<()> {
    println!(
        "{}",
        "Type 'help' for commands, or 'quit' to exit.".bright_black()
    );

    loop {
        let prompt = repl.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(usage) => {
                        println!("{}", usage.yellow());
                        continue;
                    }
                };
                let _ = editor.add_history_entry(line.trim());

                match command {
                    ReplCommand::Help => print_help(),
                    ReplCommand::Exit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    ReplCommand::History => {
                        let lines = export::history_lines(repl.session());
                        if lines.is_empty() {
                            println!("{}", "No thoughts recorded yet".bright_black());
                        }
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                    ReplCommand::Summary => {
                        let summary = repl.session().summary();
                        println!(
                            "{}",
                            format!(
                                "{} | {} thoughts | {} | branches {} | revisions {}",
                                summary.topic.as_deref().unwrap_or("Not set"),
                                summary.total_thoughts,
                                summary.current_status,
                                summary.branches,
                                summary.revisions
                            )
                            .bright_magenta()
                        );
                    }
                    ReplCommand::Revise { target, text } => {
                        report(repl.submit(&text, Some(target), None, true));
                    }
                    ReplCommand::Branch { from, id, text } => match text {
                        Some(text) => report(repl.submit(&text, None, Some((from, id)), true)),
                        None => match repl.create_branch(from, &id) {
                            Ok(()) => println!(
                                "{}",
                                format!("Branch '{}' created from thought {}", id, from).green()
                            ),
                            Err(e) => println!("{}", format!("Error: {}", e).red()),
                        },
                    },
                    ReplCommand::Thought(text) => {
                        let Some(more_needed) = ask_followup(editor, &mut repl) else {
                            println!("{}", "Thought discarded".yellow());
                            continue;
                        };
                        report(repl.submit(&text, None, None, more_needed));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    let session = repl.into_session();
    usecase.save(&session).await?;
    println!(
        "{}",
        format!("Session {} saved", session.id).bright_black()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_commands() {
        assert_eq!(parse_line("  ").unwrap(), None);
        assert_eq!(parse_line("help").unwrap(), Some(ReplCommand::Help));
        assert_eq!(parse_line("QUIT").unwrap(), Some(ReplCommand::Exit));
        assert_eq!(parse_line("history").unwrap(), Some(ReplCommand::History));
        assert_eq!(
            parse_line("history shows a pattern").unwrap(),
            Some(ReplCommand::Thought("history shows a pattern".to_string()))
        );
    }

    #[test]
    fn test_parse_revise() {
        assert_eq!(
            parse_line("revise 2 Use a read replica").unwrap(),
            Some(ReplCommand::Revise {
                target: 2,
                text: "Use a read replica".to_string()
            })
        );
        assert_eq!(
            parse_line("revise the rollout plan").unwrap(),
            Some(ReplCommand::Thought("revise the rollout plan".to_string()))
        );
        assert!(parse_line("revise 2").is_err());
    }

    #[test]
    fn test_parse_branch() {
        assert_eq!(
            parse_line("branch 1 canary").unwrap(),
            Some(ReplCommand::Branch {
                from: 1,
                id: "canary".to_string(),
                text: None
            })
        );
        assert_eq!(
            parse_line("branch 3 alt Try a queue instead").unwrap(),
            Some(ReplCommand::Branch {
                from: 3,
                id: "alt".to_string(),
                text: Some("Try a queue instead".to_string())
            })
        );
        assert!(parse_line("branch 3").is_err());
    }

    #[test]
    fn test_repl_numbering_and_prompt() {
        let mut repl = Repl::new(Session::new(Some("Queues".to_string())), 3);
        assert_eq!(repl.prompt(), "Thought 1/3 > ");

        repl.submit("What is the backlog?", None, None, true).unwrap();
        repl.submit("Examine the consumers", None, None, true).unwrap();
        repl.submit("Build a second worker", None, None, true).unwrap();
        assert_eq!(repl.prompt(), "Thought 4/4 > ");

        repl.set_estimate(6);
        assert_eq!(repl.prompt(), "Thought 4/6 > ");
    }

    #[test]
    fn test_repl_revision_and_branch() {
        let mut repl = Repl::new(Session::new(None), 5);
        repl.submit("Start with the cache", None, None, true).unwrap();

        let outcome = repl
            .submit("Start with the index", Some(1), None, true)
            .unwrap();
        assert!(outcome.thought_data.is_revision);
        assert_eq!(repl.session().thoughts()[0].text, "Start with the cache");

        assert!(repl.submit("nothing there", Some(9), None, true).is_err());
        assert_eq!(repl.session().thoughts().len(), 2);

        repl.create_branch(1, "alt").unwrap();
        assert_eq!(repl.session().current_branch(), "alt");
    }
}
