//! Parallel evaluation of statistics over many columns.
//!
//! [`ExecutionEngine`] owns a rayon pool and runs a [`StatisticsBatch`] (columns × statistics
//! over one row range) with one task per column. Results keep the column order of the batch.
//! Progress is published as [`ExecutionEvent`]s to an optional observer and counted in
//! [`ExecutionMetrics`].

mod observer;

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};
use crate::processing::Statistic;
use crate::types::{DoubleColumn, RowRange};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, LogExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// Statistics to evaluate for a set of columns over a shared range.
#[derive(Debug, Clone)]
pub struct StatisticsBatch<'a> {
    pub columns: Vec<&'a DoubleColumn>,
    pub statistics: Vec<Statistic>,
    pub range: RowRange,
}

/// One computed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticValue {
    pub statistic: Statistic,
    pub value: f64,
}

/// Results for one column, in the batch's statistic order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnResults {
    pub column: String,
    pub number: usize,
    pub values: Vec<StatisticValue>,
}

impl ColumnResults {
    /// Value of `statistic`, if it was requested.
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.statistic == statistic)
            .map(|v| v.value)
    }
}

/// Runs statistics batches on a dedicated thread pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    pub fn new(opts: ExecutionOptions) -> AnalysisResult<Self> {
        if opts.num_threads == Some(0) {
            return Err(AnalysisError::configuration("num_threads must be > 0 when set"));
        }
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| AnalysisError::configuration(format!("failed to build thread pool: {e}")))?;

        Ok(Self {
            pool,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events.
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Evaluate every statistic of the batch for every column.
    ///
    /// The first failing calculation aborts the batch with its error.
    pub fn run_statistics(&self, batch: &StatisticsBatch<'_>) -> AnalysisResult<Vec<ColumnResults>> {
        self.pool.install(|| self.run_statistics_impl(batch))
    }

    fn run_statistics_impl(&self, batch: &StatisticsBatch<'_>) -> AnalysisResult<Vec<ColumnResults>> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            columns: batch.columns.len(),
            statistics: batch.statistics.len(),
        });

        let out = batch
            .columns
            .par_iter()
            .map(|column| -> AnalysisResult<ColumnResults> {
                self.metrics.on_column_start();
                self.emit(ExecutionEvent::ColumnStarted {
                    column: column.name().to_string(),
                });

                let values = batch
                    .statistics
                    .iter()
                    .map(|&statistic| {
                        statistic
                            .apply(column, batch.range)
                            .map(|value| StatisticValue { statistic, value })
                    })
                    .collect::<AnalysisResult<Vec<_>>>();

                let calculations = values.as_ref().map(Vec::len).unwrap_or(0);
                self.metrics.on_column_end(calculations);
                self.emit(ExecutionEvent::ColumnFinished {
                    column: column.name().to_string(),
                    calculations,
                });

                Ok(ColumnResults {
                    column: column.name().to_string(),
                    number: column.number(),
                    values: values?,
                })
            })
            .collect::<AnalysisResult<Vec<_>>>();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
