//! Logging setup.
//!
//! Logs go to stderr so they never mix with rendered output on stdout.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when neither `RUST_LOG` nor `QUILL_LOG` is set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Picks the filter directive: `RUST_LOG`, then `QUILL_LOG`, then the flag.
pub fn filter_directive(rust_log: Option<&str>, quill_log: Option<&str>, verbose: bool) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .or_else(|| quill_log.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| default_directive(verbose))
        .to_string()
}

/// Installs the global subscriber.
///
/// Keep the returned guard alive until exit so the file log is flushed.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let directive = filter_directive(
        std::env::var("RUST_LOG").ok().as_deref(),
        std::env::var("QUILL_LOG").ok().as_deref(),
        verbose,
    );
    let filter = EnvFilter::try_new(&directive)
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .context("Failed to build log filter")?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rust_log_wins() {
        assert_eq!(filter_directive(Some("trace"), Some("info"), true), "trace");
    }

    #[test]
    fn test_quill_log_second() {
        assert_eq!(filter_directive(None, Some("quill_render=debug"), false), "quill_render=debug");
        assert_eq!(filter_directive(Some(" "), Some("info"), false), "info");
    }

    #[test]
    fn test_verbose_flag_last() {
        assert_eq!(filter_directive(None, None, true), "debug");
        assert_eq!(filter_directive(None, None, false), "warn");
    }
}
