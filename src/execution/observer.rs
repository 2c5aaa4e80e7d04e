use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Events emitted by the engine while a batch runs.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { columns: usize, statistics: usize },
    ColumnStarted { column: String },
    ColumnFinished { column: String, calculations: usize },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to the `log` facade at debug level.
#[derive(Debug, Default)]
pub struct LogExecutionObserver;

impl ExecutionObserver for LogExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunFinished { metrics, .. } => log::debug!("[exec] finished {metrics}"),
            other => log::debug!("[exec] {other:?}"),
        }
    }
}

/// Live counters for the current run; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,
    columns_processed: AtomicU64,
    calculations: AtomicU64,
    active_columns: AtomicUsize,
    max_active_columns: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            columns_processed: AtomicU64::new(0),
            calculations: AtomicU64::new(0),
            active_columns: AtomicUsize::new(0),
            max_active_columns: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.columns_processed.store(0, Ordering::SeqCst);
        self.calculations.store(0, Ordering::SeqCst);
        self.active_columns.store(0, Ordering::SeqCst);
        self.max_active_columns.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_column_start(&self) {
        let now = self.active_columns.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_columns, now);
    }

    pub fn on_column_end(&self, calculations: usize) {
        let _ = self.columns_processed.fetch_add(1, Ordering::SeqCst);
        let _ = self
            .calculations
            .fetch_add(calculations as u64, Ordering::SeqCst);
        let _ = self.active_columns.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            columns_processed: self.columns_processed.load(Ordering::SeqCst),
            calculations: self.calculations.load(Ordering::SeqCst),
            max_active_columns: self.max_active_columns.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub columns_processed: u64,
    pub calculations: u64,
    pub max_active_columns: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, columns={}, calculations={}, max_active_columns={}, elapsed={:?}",
            self.run_id, self.columns_processed, self.calculations, self.max_active_columns, self.elapsed
        )
    }
}
