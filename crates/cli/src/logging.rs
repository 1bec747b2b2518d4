//! File logging for the CLI. The terminal belongs to the REPL, so every
//! tracing event goes to `{data_dir}/logs/playground.log`.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";
const LOG_FILE: &str = "playground.log";

/// Keeps the non-blocking writer alive; logs stop flushing once dropped.
pub struct LoggingHandle {
    pub run_id: String,
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

/// `PLAYGROUND_LOG_FILTER` > `RUST_LOG` > built-in default. Blank values and
/// directives `EnvFilter` rejects fall through to the next source.
fn filter_directive(playground: Option<&str>, rust_log: Option<&str>) -> String {
    [playground, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty() && EnvFilter::try_new(value).is_ok())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

pub fn init_logging(log_dir: &Path) -> anyhow::Result<LoggingHandle> {
    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);

    if std::env::var("PLAYGROUND_TRUNCATE_LOG_ON_START").as_deref() == Ok("1") {
        std::fs::File::create(&log_path)?;
    }

    let directive = filter_directive(
        std::env::var("PLAYGROUND_LOG_FILTER").ok().as_deref(),
        std::env::var("RUST_LOG").ok().as_deref(),
    );
    let format =
        LogFormat::from_env_value(std::env::var("PLAYGROUND_LOG_FORMAT").ok().as_deref());

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));
    let registry = tracing_subscriber::registry().with(EnvFilter::new(&directive));

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .pretty()
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()?,
    }

    let started_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let run_id = format!("pid-{}-{}", std::process::id(), started_ms);

    tracing::info!(
        component = "logging",
        event = "logging.initialized",
        run_id = %run_id,
        log_path = %log_path.display(),
        format = format.as_str(),
        filter = %directive,
    );

    Ok(LoggingHandle {
        run_id,
        _guard: guard,
    })
}
