//! Logging: console diagnostics plus one log file per reconciliation run.
//!
//! Each run gets its own [`RunLog`]. Reconcilers call the usual `tracing`
//! macros; inside [`RunLog::in_scope`] those events go to the run's file
//! instead of the process-wide subscriber.

use crate::error::{HotsheetError, HotsheetResult};
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the console subscriber used outside of a run scope.
pub fn init_console(verbose: bool) {
    let default = if verbose { "hotsheet_sync=info" } else { "hotsheet_sync=warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// File name for a run log: `<YYYY-MM-DD_HH-MM-SS>_<product>_<selection>.log`.
pub fn log_file_name(started: NaiveDateTime, product: &str, selection: &str) -> String {
    format!(
        "{}_{}_{}.log",
        started.format("%Y-%m-%d_%H-%M-%S"),
        sanitize(product),
        sanitize(selection)
    )
}

fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "all".to_string()
    } else {
        cleaned
    }
}

/// The log of one reconciliation run.
pub struct RunLog {
    path: Option<PathBuf>,
    dispatch: Dispatch,
}

impl RunLog {
    /// Create `<dir>/<timestamp>_<product>_<selection>.log` (appending if present).
    ///
    /// With `echo`, info-level events are also printed to stderr.
    pub fn create(
        dir: &Path,
        product: &str,
        selection: &str,
        started: NaiveDateTime,
        echo: bool,
    ) -> HotsheetResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            HotsheetError::Log(format!("cannot create log directory {}: {}", dir.display(), e))
        })?;
        let path = dir.join(log_file_name(started, product, selection));
        let file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                HotsheetError::Log(format!("cannot open log file {}: {}", path.display(), e))
            })?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_filter(LevelFilter::DEBUG);
        let console_layer = echo.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(LevelFilter::INFO)
        });
        let subscriber = tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer);

        Ok(Self {
            path: Some(path),
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// A run log that discards everything.
    pub fn discard() -> Self {
        Self {
            path: None,
            dispatch: Dispatch::none(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with this log as the active subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn started() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_log_file_name() {
        assert_eq!(
            log_file_name(started(), "BJP", "everyday"),
            "2026-10-19_14-05-09_BJP_everyday.log"
        );
        assert_eq!(
            log_file_name(started(), "BSC", "Winter Holiday"),
            "2026-10-19_14-05-09_BSC_Winter_Holiday.log"
        );
        assert_eq!(
            log_file_name(started(), "SMD", ""),
            "2026-10-19_14-05-09_SMD_all.log"
        );
    }

    #[test]
    fn test_events_land_in_run_file() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::create(&dir.path().join("logs"), "BJP", "all", started(), false).unwrap();

        log.in_scope(|| {
            tracing::info!("Match found for SKU: ABC-1");
            tracing::debug!("Comparing hotsheet SKU 'ABC-1'");
        });

        let content = std::fs::read_to_string(log.path().unwrap()).unwrap();
        assert!(content.contains("Match found for SKU: ABC-1"));
        assert!(content.contains("Comparing hotsheet SKU"));
        assert!(!content.contains("\u{1b}["), "no ANSI colors in log files");
    }

    #[test]
    fn test_discard_has_no_path() {
        let log = RunLog::discard();
        assert!(log.path().is_none());
        assert_eq!(log.in_scope(|| 7), 7);
    }
}
