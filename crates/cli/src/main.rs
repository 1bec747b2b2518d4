//! Assistant Playground CLI
//!
//! Drives a server-hosted assistant from the terminal: edit settings, create
//! the assistant, chat with it and tear it down.

mod cmd_settings;
mod cmd_status;
mod cmd_transcript;
mod logging;
mod paths;
mod render;
mod repl;

use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use playground_client::{
    ApiClient, Database, Orchestrator, PersistedSettings, SettingsField, TranscriptStore,
};
use tracing::info;

use crate::paths::DataDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "playground", version = VERSION, about = "Assistant Playground")]
struct Cli {
    /// Data directory (default: $PLAYGROUND_DATA_DIR or ~/.assistant-playground)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL of the assistant API; must end with `/`
    #[arg(
        long,
        global = true,
        env = "PLAYGROUND_API_URL",
        default_value = "http://127.0.0.1:8000/api/"
    )]
    base_url: String,

    /// Status poll interval in milliseconds
    #[arg(
        long,
        global = true,
        env = "PLAYGROUND_POLL_INTERVAL_MS",
        default_value_t = 2000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_ms: u64,

    /// Transport timeout for API requests (none unless set)
    #[arg(long, global = true, env = "PLAYGROUND_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session (default)
    Run,

    /// Show or edit assistant settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Inspect the stored conversation
    Transcript {
        #[command(subcommand)]
        action: TranscriptAction,
    },

    /// Read the assistant status from the server once
    Status,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Change one field
    Set { field: SettingsField, value: String },
    /// Replace the settings with the sample preset
    Sample,
}

#[derive(Subcommand)]
enum TranscriptAction {
    /// Print every stored message
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    if let Command::Completions { shell } = command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "playground",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    data_dir.ensure_dirs()?;
    let logging = logging::init_logging(&data_dir.log_dir())?;

    info!(
        component = "cli",
        event = "cli.start",
        version = VERSION,
        run_id = %logging.run_id,
        data_dir = %data_dir.root().display(),
        base_url = %cli.base_url,
    );

    let db = Database::open(data_dir.db_path()).await?;

    match command {
        Command::Settings { action } => {
            let settings = PersistedSettings::load(db).await?;
            match action {
                SettingsAction::Show => cmd_settings::show(&settings),
                SettingsAction::Set { field, value } => {
                    cmd_settings::set(&settings, field, value).await
                }
                SettingsAction::Sample => cmd_settings::sample(&settings).await,
            }
        }
        Command::Transcript {
            action: TranscriptAction::Show,
        } => {
            let transcript = TranscriptStore::load(db).await?;
            cmd_transcript::show(&transcript)
        }
        Command::Status => {
            let orchestrator =
                build_orchestrator(db, &cli.base_url, cli.request_timeout_secs).await?;
            cmd_status::run(&orchestrator, &cli.base_url).await?;
            orchestrator.shutdown().await;
            Ok(())
        }
        Command::Run => {
            let mut orchestrator =
                build_orchestrator(db, &cli.base_url, cli.request_timeout_secs).await?;
            orchestrator.start_polling(Duration::from_millis(cli.poll_interval_ms));
            repl::run(orchestrator).await
        }
        Command::Completions { .. } => Ok(()),
    }
}

async fn build_orchestrator(
    db: Database,
    base_url: &str,
    request_timeout_secs: Option<u64>,
) -> anyhow::Result<Orchestrator> {
    let api = match request_timeout_secs {
        Some(secs) => ApiClient::with_timeout(base_url, Duration::from_secs(secs))?,
        None => ApiClient::new(base_url),
    };
    let settings = PersistedSettings::load(db.clone()).await?;
    let transcript = TranscriptStore::load(db).await?;
    Ok(Orchestrator::new(api, settings, transcript))
}
