//! tracing subscriber setup for the command-line front end

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LogConfig, LogFormat, log_path};

/// Build the filter; RUST_LOG takes precedence over the configured level
pub fn env_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))
}

/// Install the global subscriber
///
/// Logs go to stderr so stdout stays reserved for query results. When file
/// logging is enabled the returned guard must be held until exit, otherwise
/// buffered lines are lost.
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();
    let mut guard = None;

    layers.push(match config.format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    });

    if config.file {
        let path = log_path();
        let dir = path.parent().context("Log path has no parent directory")?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let file_name = path.file_name().context("Log path has no file name")?;

        let (writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        layers.push(match config.format {
            LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        });
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
