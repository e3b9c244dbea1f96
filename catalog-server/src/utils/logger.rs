//! Logging Infrastructure
//!
//! Console logging via `tracing-subscriber`, with an optional daily-rolling
//! file output for deployments that keep logs on disk.

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system.
///
/// `level` seeds the filter; `RUST_LOG` overrides it per target. With a
/// `log_dir` set, a daily-rolling `catalog-server.YYYY-MM-DD` file is written
/// alongside the console output.
pub fn init_logger(level: &str, log_dir: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer().with_target(false);

    let file_layer = log_dir.map(|dir| {
        let dir = Path::new(dir);
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {e}", dir.display());
        }
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "catalog-server");
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(appender))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}
