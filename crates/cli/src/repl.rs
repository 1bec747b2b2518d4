//! Interactive command loop for `playground run`.
//!
//! create and send run as background tasks so the loop keeps reading
//! commands (and can report `Busy`) while a request is in flight. delete is
//! awaited inline because its confirmation reads from the same input.

use std::io::Write;
use std::sync::Arc;

use console::style;
use playground_client::{
    Orchestrator, Outcome, Rejection, SettingsField, StoreError, CONFIRM_DELETE_PROMPT,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::render;

/// Result of a background lifecycle task.
enum Finished {
    Create(Result<Outcome, Rejection>),
    Send(Outcome),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Create,
    Ask(String),
    Prompt(String),
    Send,
    Delete,
    Sample,
    Status,
    Files,
    Transcript,
    Settings,
    Set(SettingsField, String),
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head {
            "" => Command::Empty,
            "help" | "?" => Command::Help,
            "create" => Command::Create,
            "ask" => Command::Ask(rest.to_string()),
            "prompt" => Command::Prompt(rest.to_string()),
            "send" => Command::Send,
            "delete" => Command::Delete,
            "sample" => Command::Sample,
            "status" => Command::Status,
            "files" => Command::Files,
            "transcript" => Command::Transcript,
            "settings" => Command::Settings,
            "set" => {
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (rest, ""),
                };
                match field.parse::<SettingsField>() {
                    Ok(field) => Command::Set(field, value.to_string()),
                    Err(_) => Command::Unknown(line.to_string()),
                }
            }
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

struct Repl {
    orchestrator: Arc<Orchestrator>,
    tasks: JoinSet<Finished>,
    /// Transcript entries already printed to the terminal.
    shown: usize,
}

pub async fn run(orchestrator: Orchestrator) -> anyhow::Result<()> {
    let shown = orchestrator.transcript().await.len();
    let mut repl = Repl::new(orchestrator, shown);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_banner();
    render::print_status(&repl.orchestrator.status_view());

    loop {
        print_input_marker();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if repl.handle(Command::parse(&line), &mut lines).await {
                    break;
                }
            }
            Some(joined) = repl.tasks.join_next() => {
                println!();
                match joined {
                    Ok(finished) => repl.report(finished).await,
                    Err(e) => warn!(
                        component = "repl",
                        event = "repl.task_failed",
                        error = %e,
                        "Background task failed"
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    repl.tasks.shutdown().await;
    match Arc::try_unwrap(repl.orchestrator) {
        Ok(orchestrator) => orchestrator.shutdown().await,
        // Still shared; dropping the last handle cancels the poller.
        Err(_) => debug!(component = "repl", event = "repl.shutdown_shared"),
    }
    Ok(())
}

impl Repl {
    fn new(orchestrator: Orchestrator, shown: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            tasks: JoinSet::new(),
            shown,
        }
    }

    /// Returns true when the loop should exit.
    async fn handle<R>(&mut self, command: Command, lines: &mut Lines<R>) -> bool
    where
        R: AsyncBufRead + Unpin,
    {
        match command {
            Command::Empty => {}
            Command::Help => print_help(),
            Command::Quit => return true,
            Command::Unknown(line) => {
                println!("  Unknown command: {line} (type `help`)");
            }
            Command::Create => {
                let orchestrator = self.orchestrator.clone();
                self.tasks
                    .spawn(async move { Finished::Create(orchestrator.create().await) });
                println!("  Creating assistant…");
            }
            Command::Ask(text) => {
                self.orchestrator.set_prompt(text);
                self.spawn_send();
            }
            Command::Send => self.spawn_send(),
            Command::Prompt(text) => {
                self.orchestrator.set_prompt(text);
                println!("  Prompt buffer set");
            }
            Command::Delete => {
                let outcome = self.orchestrator.delete(|| confirm(lines)).await;
                if outcome == Outcome::Completed {
                    self.shown = 0;
                }
                render::print_outcome("delete", outcome);
                render::print_status(&self.orchestrator.status_view());
            }
            Command::Sample => match self.orchestrator.load_sample().await {
                Ok(()) => {
                    render::print_settings(&self.orchestrator.settings());
                    println!("  Prompt: {}", self.orchestrator.prompt());
                }
                Err(e) => report_store_error("sample", &e),
            },
            Command::Status => {
                render::print_status(&self.orchestrator.status_view());
                let prompt = self.orchestrator.prompt();
                if !prompt.is_empty() {
                    println!("  Prompt: {prompt}");
                }
            }
            Command::Files => render::print_files(&self.orchestrator.status_view().files),
            Command::Transcript => {
                let entries = self.orchestrator.transcript().await;
                render::print_transcript(&entries);
                self.shown = entries.len();
            }
            Command::Settings => render::print_settings(&self.orchestrator.settings()),
            Command::Set(field, value) => {
                let updated = self.orchestrator.settings().with_field(field, value);
                match self.orchestrator.update_settings(updated).await {
                    Ok(()) => println!("  {field} updated"),
                    Err(e) => report_store_error("set", &e),
                }
            }
        }
        false
    }

    fn spawn_send(&mut self) {
        let orchestrator = self.orchestrator.clone();
        self.tasks
            .spawn(async move { Finished::Send(orchestrator.process_pending().await) });
        println!("  Sending prompt…");
    }

    async fn report(&mut self, finished: Finished) {
        match finished {
            Finished::Create(Ok(outcome)) => render::print_outcome("create", outcome),
            Finished::Create(Err(rejection)) => render::print_rejection(rejection),
            Finished::Send(outcome) => {
                if outcome == Outcome::Completed {
                    let entries = self.orchestrator.transcript().await;
                    for entry in entries.iter().skip(self.shown) {
                        render::print_entry(entry);
                    }
                    self.shown = entries.len();
                }
                render::print_outcome("send", outcome);
            }
        }
        render::print_status(&self.orchestrator.status_view());
    }
}

fn report_store_error(command: &str, error: &StoreError) {
    warn!(
        component = "repl",
        event = "repl.store_failed",
        command = command,
        error = %error,
        "Settings write failed"
    );
    println!("  {} {command} failed: {error}", style("!").red().bold());
}

async fn confirm<R>(lines: &mut Lines<R>) -> bool
where
    R: AsyncBufRead + Unpin,
{
    print!("  {CONFIRM_DELETE_PROMPT} [y/N] ");
    let _ = std::io::stdout().flush();
    match lines.next_line().await {
        Ok(Some(answer)) => is_yes(&answer),
        _ => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_input_marker() {
    print!("{} ", style(">").cyan().bold());
    let _ = std::io::stdout().flush();
}

fn print_banner() {
    println!();
    println!("  {}", style("Assistant Playground").bold());
    println!("  Type `help` for commands.");
    println!();
}

fn print_help() {
    println!();
    println!("  create                 create an assistant from the current settings");
    println!("  ask <text>             set the prompt and send it");
    println!("  prompt <text>          set the prompt buffer without sending");
    println!("  send                   send the prompt buffer");
    println!("  delete                 delete the assistant and clear the transcript");
    println!("  sample                 load the sample settings and prompt");
    println!("  status                 show the status bar");
    println!("  files                  list attached files");
    println!("  transcript             print the conversation");
    println!("  settings               show settings");
    println!("  set <field> <value>    edit a setting (user, name, instructions, files)");
    println!("  quit                   exit");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_client::{ApiClient, Database, PersistedSettings, TranscriptStore};

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            Command::parse("ask  what is in the csv? "),
            Command::Ask("what is in the csv?".to_string())
        );
        assert_eq!(Command::parse("prompt"), Command::Prompt(String::new()));
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("exit"), Command::Quit);
    }

    #[test]
    fn parses_set_with_multi_word_value() {
        assert_eq!(
            Command::parse("set name My Assistant"),
            Command::Set(SettingsField::Name, "My Assistant".to_string())
        );
        assert_eq!(
            Command::parse("set files"),
            Command::Set(SettingsField::Files, String::new())
        );
    }

    #[test]
    fn unknown_field_is_unknown_command() {
        assert_eq!(
            Command::parse("set color blue"),
            Command::Unknown("set color blue".to_string())
        );
        assert_eq!(Command::parse("launch"), Command::Unknown("launch".to_string()));
    }

    async fn repl_over(dir: &tempfile::TempDir) -> Repl {
        let db = Database::open(dir.path().join("playground.db")).await.unwrap();
        let settings = PersistedSettings::load(db.clone()).await.unwrap();
        let transcript = TranscriptStore::load(db).await.unwrap();
        let api = ApiClient::new("http://127.0.0.1:9/api/");
        Repl::new(Orchestrator::new(api, settings, transcript), 0)
    }

    #[tokio::test]
    async fn settings_write_failure_keeps_loop_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut repl = repl_over(&dir).await;
        let before = repl.orchestrator.settings();

        // Replace the database file so every later connection fails to open
        let db_path = dir.path().join("playground.db");
        std::fs::remove_file(&db_path).unwrap();
        std::fs::create_dir(&db_path).unwrap();

        let mut lines = BufReader::new(&b""[..]).lines();
        let quit = repl
            .handle(
                Command::Set(SettingsField::Name, "Renamed".to_string()),
                &mut lines,
            )
            .await;
        assert!(!quit);
        assert!(!repl.handle(Command::Sample, &mut lines).await);
        assert_eq!(repl.orchestrator.settings(), before);
        assert!(repl.handle(Command::Quit, &mut lines).await);
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES \n"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
