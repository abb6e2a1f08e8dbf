use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Verbosity;

/// Initialize file-based logging with daily log rotation.
///
/// Logs are written to `logs/kitsetup.YYYY-MM-DD.log` next to the data file.
/// The level defaults to `info` (`debug` with `--verbose`) and can be
/// overridden via the `KITSETUP_LOG` or `RUST_LOG` environment variables.
///
/// Returns a [`WorkerGuard`] that **must** be held for the lifetime of the
/// program to flush buffered records on shutdown, or `None` when the log
/// directory cannot be created (logging is then disabled).
pub fn init(data_dir: &Path, verbosity: Verbosity) -> Option<WorkerGuard> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("kitsetup")
        .filename_suffix("log")
        .build(data_dir.join("logs"))
        .ok()?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = match verbosity {
        Verbosity::Verbose => "debug",
        Verbosity::Normal | Verbosity::Quiet => "info",
    };
    let env_filter = EnvFilter::try_from_env("KITSETUP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(env_filter)
        .try_init()
        .ok()?;

    Some(guard)
}
