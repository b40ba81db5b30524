use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Keeps the non-blocking file writer flushing until dropped
#[allow(dead_code)]
pub struct LoggerGuard(WorkerGuard);

/// Console + daily rolling file logging. `RUST_LOG` overrides `level`.
///
/// Must be called inside a tokio runtime: old log files are pruned by a
/// background task.
pub fn init_logging(
    log_dir: impl AsRef<Path>,
    prefix: &str,
    level: &str,
    retention_days: u64,
) -> Result<LoggerGuard> {
    let log_dir = log_dir.as_ref().to_path_buf();

    let (default_level, bad_level) = match LevelFilter::from_str(level) {
        Ok(filter) => (filter, false),
        Err(_) => (LevelFilter::INFO, true),
    };
    let env_directives = std::env::var("RUST_LOG").unwrap_or_default();
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .parse_lossy(&env_directives)
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| format!("Failed to create log appender in {:?}", log_dir))?;
    let (non_blocking, guard) = NonBlocking::new(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(filter());
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("Global tracing subscriber already set")?;

    if bad_level {
        tracing::warn!("Invalid log level '{}', defaulting to 'info'", level);
    }

    let max_age = Duration::from_secs(60 * 60 * 24 * retention_days.max(1));
    start_log_cleanup_task(log_dir, prefix.to_string(), max_age);

    Ok(LoggerGuard(guard))
}

fn start_log_cleanup_task(log_dir: PathBuf, prefix: String, max_age: Duration) {
    tokio::task::spawn(async move {
        loop {
            match prune_old_logs(&log_dir, &prefix, max_age, SystemTime::now()) {
                Ok(0) => {}
                Ok(n) => tracing::info!("Deleted {} old log file(s)", n),
                Err(e) => tracing::warn!("Failed to prune old log files: {}", e),
            }
            tokio::time::sleep(CLEANUP_INTERVAL).await;
        }
    });
}

/// Delete `<prefix>*.log` files in `log_dir` last modified more than
/// `max_age` before `now`. Returns how many were removed.
pub fn prune_old_logs(log_dir: &Path, prefix: &str, max_age: Duration, now: SystemTime) -> std::io::Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.starts_with(prefix) || !file_name.ends_with(".log") {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            fs::remove_file(&path)?;
            tracing::debug!("Old log file deleted: {}", file_name);
            removed += 1;
        }
    }
    Ok(removed)
}
