use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps the non-blocking writer flushing for the lifetime of the process
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

const DEFAULT_LEVEL: &str = "info";

fn env_filter(log_level: Option<&str>) -> EnvFilter {
    let level = log_level.unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Log to `log_file_path` (appending, created with its parent directories).
/// `RUST_LOG` wins over `log_level` when set. Calling this twice is an error.
pub fn init_tracing(log_file_path: &str, log_level: Option<&str>) -> Result<()> {
    let path = Path::new(log_file_path);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Tracing(format!("{log_file_path} is not a file path")))?;

    std::fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))?;

    // try_init succeeded, so this is the first and only guard
    let _ = LOG_GUARD.set(guard);

    tracing::info!(log_file_path, "Tracing initialized");
    Ok(())
}

/// Log to stderr, for interactive hosts that have no log file
pub fn init_stderr_tracing(log_level: Option<&str>) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))
}

/// Route panics through tracing before the default hook prints them, so
/// they end up in the log file of hosts that swallow stderr.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_string());

        tracing::error!(%location, %message, "Panic");
        default_hook(info);
    }));
}
