//! Hooks notified when a data file is loaded or rejected.
//!
//! [`ingest_from_path`](super::ingest_from_path) reports each attempt to the observer in
//! [`IngestionOptions`](super::IngestionOptions). Failures at or above the configured
//! threshold are additionally raised as alerts.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::AnalysisError;
use crate::store::ColumnStore;

/// How serious a loading failure is, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    Warning,
    /// The file was read but its content was rejected.
    Error,
    /// The file could not be read at all.
    Critical,
}

impl IngestionSeverity {
    /// Severity of a failed load.
    pub fn of(error: &AnalysisError) -> Self {
        match error {
            AnalysisError::Io(_) => Self::Critical,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for IngestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

/// The load being reported.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    /// Delimiter forced by the caller; `None` when auto-detected.
    pub delimiter: Option<String>,
}

/// Shape of a successfully loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    pub columns: usize,
    pub timestep_column: Option<String>,
}

impl IngestionStats {
    pub fn of(store: &ColumnStore) -> Self {
        Self {
            rows: store.row_count(),
            columns: store.column_count(),
            timestep_column: store.timestep_column().map(|c| c.name().to_string()),
        }
    }
}

/// Receives the outcome of every load. All methods default to no-ops.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &AnalysisError) {}

    /// Raised after [`Self::on_failure`] when the severity meets the alert threshold.
    /// Unless overridden it is treated as one more failure.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every event to each of its observers in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn IngestionObserver>) {
        self.observers.push(observer);
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeObserver({} observers)", self.observers.len())
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.observers
            .iter()
            .for_each(|o| o.on_success(ctx, stats.clone()));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        self.observers
            .iter()
            .for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        self.observers
            .iter()
            .for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Sends events to the `log` facade: successes at info, failures at warn, alerts at error.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        log::info!(
            "loaded {}: {} rows, {} columns, timestep column {}",
            ctx.path.display(),
            stats.rows,
            stats.columns,
            stats.timestep_column.as_deref().unwrap_or("none")
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        log::warn!("could not load {} ({severity}): {error}", ctx.path.display());
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        log::error!("ALERT {severity} loading {}: {error}", ctx.path.display());
    }
}

/// Appends one line per event to a log file, prefixed with a unix timestamp.
///
/// A log file that cannot be opened or written is skipped silently.
#[derive(Debug)]
pub struct FileObserver {
    target: PathBuf,
    guard: Mutex<()>,
}

impl FileObserver {
    pub fn new(target: impl AsRef<Path>) -> Self {
        Self {
            target: target.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    fn record(&self, event: &str, ctx: &IngestionContext, detail: fmt::Arguments<'_>) {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let _held = self.guard.lock();
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.target) else {
            return;
        };
        let _ = writeln!(file, "{stamp} {event} path={} {detail}", ctx.path.display());
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.record("ok", ctx, format_args!("rows={} columns={}", stats.rows, stats.columns));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        self.record("fail", ctx, format_args!("severity={severity} err={error}"));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &AnalysisError) {
        self.record("ALERT", ctx, format_args!("severity={severity} err={error}"));
    }
}
