//! Structured logging setup using tracing.

use crate::config::{FileLoggingConfig, LogFormat, LogRotation, LoggingConfig};
use std::fs;
use std::io;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program.
/// When dropped, flushes and closes the file writer.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
///
/// Stdout gets either the text or the JSON formatter. A configured log file
/// always receives JSON. Returns a guard that must be kept alive for file
/// logging to work. A second call leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> LogGuard {
    if !config.log_requests {
        return LogGuard { _file_guard: None };
    }

    let (stdout_text, stdout_json) = match config.format {
        LogFormat::Text => (Some(fmt::layer().with_writer(io::stdout)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(io::stdout))),
    };

    let (file_layer, file_guard) = match &config.file {
        Some(file_config) => {
            let (writer, guard) = create_file_writer(file_config);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(stdout_text)
        .with(stdout_json)
        .with(file_layer)
        .try_init();
    if let Err(e) = installed {
        eprintln!("logging already initialized: {}", e);
    }

    LogGuard {
        _file_guard: file_guard,
    }
}

/// RUST_LOG wins over the configured level; an unparsable level falls back to info.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn rotation_for(rotation: &LogRotation) -> Rotation {
    match rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => Rotation::NEVER,
    }
}

fn create_file_writer(config: &FileLoggingConfig) -> (NonBlocking, WorkerGuard) {
    // Ensure log directory exists
    fs::create_dir_all(&config.log_dir).ok();

    let file_appender = RollingFileAppender::new(
        rotation_for(&config.rotation),
        &config.log_dir,
        &config.file_prefix,
    );

    tracing_appender::non_blocking(file_appender)
}
