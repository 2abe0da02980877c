//! Structured logging setup.
//!
//! Writes to both stderr and the configured log file, leveled by
//! `RUST_LOG` if set, falling back to `log_level` otherwise. The returned
//! [`WorkerGuard`] must be held for the lifetime of the process — dropping it
//! stops the background thread that flushes the file writer.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logger(log_level: &str, log_file_path: &str, json_logs: bool) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let path = Path::new(log_file_path);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("log_file_path {log_file_path:?} has no file name"))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer.json())
            .with(file_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    }

    Ok(guard)
}
