//! Logging Module
//!
//! Structured logging with file output for diagnostics.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "vehicle-finder.log";

/// Initialize logging with console and file output under `log_dir`
pub fn init(log_dir: &Path) {
    // Ensure log directory exists
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_appender);

    // Console output in debug builds only, on stderr so command output stays clean
    #[cfg(debug_assertions)]
    let console_layer = Some(
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .pretty(),
    );

    #[cfg(not(debug_assertions))]
    let console_layer: Option<fmt::Layer<_>> = None;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn default_filter() -> EnvFilter {
    #[cfg(debug_assertions)]
    {
        EnvFilter::new("debug,hyper=warn,reqwest=warn")
    }
    #[cfg(not(debug_assertions))]
    {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    }
}
