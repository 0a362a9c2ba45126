//! Logging for a run.
//!
//! Every run writes a fresh log file next to its artifacts (the file is
//! truncated, not appended to). The file receives this crate's debug output
//! and everything at INFO or above from dependencies. A compact console layer
//! on stderr shows warnings and errors by default and honours `RUST_LOG`.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let _guard = oraload::logging::init(Path::new("script_execution.log"))?;
//! tracing::info!("Run started");
//! # Ok::<(), oraload::error::OraloadError>(())
//! ```

use crate::error::{OraloadError, Result, ResultExt as _};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Targets, fmt, layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

/// Keeps the background log writer alive. Buffered lines are flushed when it
/// is dropped, so hold it until the run is over.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    path: PathBuf,
    _worker: WorkerGuard,
}

impl LogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Installs the global subscriber, logging to `log_path` and to stderr.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or a global subscriber
/// is already installed.
pub fn init(log_path: &Path) -> Result<LogGuard> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = File::create(log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
    let (writer, worker) = tracing_appender::non_blocking(file);

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .map_err(|e| OraloadError::Config(format!("Invalid log filter: {e}")))?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(file_targets());

    let console_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| OraloadError::Other(format!("Failed to install logger: {e}")))?;

    tracing::info!("Logging to {}", log_path.display());

    Ok(LogGuard {
        path: log_path.to_path_buf(),
        _worker: worker,
    })
}

/// Debug for this crate, INFO for everything else.
fn file_targets() -> Targets {
    Targets::new()
        .with_target(env!("CARGO_CRATE_NAME"), LevelFilter::DEBUG)
        .with_default(LevelFilter::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_file_targets_levels() {
        let targets = file_targets();
        assert!(targets.would_enable("oraload::extract", &Level::DEBUG));
        assert!(!targets.would_enable("polars_io::csv", &Level::DEBUG));
        assert!(targets.would_enable("polars_io::csv", &Level::INFO));
    }

    #[test]
    fn test_init_truncates_previous_log() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("logs").join("run.log");
        std::fs::create_dir_all(dir.path().join("logs"))?;
        std::fs::write(&path, "old run\n")?;

        let guard = init(&path)?;
        tracing::info!("fresh run");
        assert_eq!(guard.path(), path.as_path());
        drop(guard);

        let content = std::fs::read_to_string(&path)?;
        assert!(!content.contains("old run"));
        assert!(content.contains("fresh run"));
        Ok(())
    }
}
