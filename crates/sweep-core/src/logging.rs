//! File logging for storage-sweep
//!
//! One daily-rolling file under the platform data directory. Nothing is
//! written to the terminal; user-facing output belongs to the binary.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Overrides the default filter, e.g. `SWEEP_LOG=sweep_emulator=trace`
pub const LOG_ENV_VAR: &str = "SWEEP_LOG";

const LOG_FILE_PREFIX: &str = "storage-sweep.log";

/// Crates whose events are kept at `info` by default
const LOG_TARGETS: &[&str] = &[
    "storage_sweep",
    "sweep_app",
    "sweep_core",
    "sweep_emulator",
    "sweep_storage",
];

/// `info` for every storage-sweep crate, `warn` for dependencies
pub fn default_filter() -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}=info", target))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber writing to [`log_directory()`]
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(RollingFileAppender::new(
                    Rotation::DAILY,
                    &log_dir,
                    LOG_FILE_PREFIX,
                ))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(
        "storage-sweep {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(())
}

/// `<data dir>/storage-sweep/logs`, or `./storage-sweep/logs` without one
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storage-sweep")
        .join("logs")
}
