//! One analysis run: load, select, compute.
//!
//! [`run`] ingests the requested file and hands the store to [`analyze`], which resolves the
//! selected columns and rows, extracts cycles when asked (their rows then become the analyzed
//! range), evaluates the statistics batch and the optional spectrum. Nothing here writes
//! output; rendering lives in [`crate::report`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{AnalysisRequest, RangeSelection};
use crate::error::AnalysisResult;
use crate::execution::{
    ColumnResults, ExecutionEngine, ExecutionOptions, LogExecutionObserver, StatisticsBatch,
};
use crate::ingestion::{ingest_from_path, IngestionOptions, LogObserver};
use crate::processing::{extract_cycles, spectrum, CycleData, CycleParams, Spectrum, Statistic};
use crate::store::ColumnStore;
use crate::types::{ColumnDescriptor, Delimitation, DoubleColumn, RowRange, TimestepRange};

/// Layout of the analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub path: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub header_delimitation: Delimitation,
    pub data_delimitation: Delimitation,
    pub rows: usize,
    pub columns: Vec<ColumnDescriptor>,
    pub timestep_column: Option<String>,
    pub timestep_range: Option<TimestepRange>,
}

impl InputSummary {
    /// Describe a loaded store.
    pub fn of(store: &ColumnStore) -> Self {
        let source = store.source();
        Self {
            path: source.path.clone(),
            delimiter: source.delimiter.clone(),
            header_delimitation: source.header_delimitation,
            data_delimitation: source.data_delimitation,
            rows: store.row_count(),
            columns: store.descriptors(),
            timestep_column: store.timestep_column().map(|c| c.name().to_string()),
            timestep_range: store.timestep_range(),
        }
    }
}

/// Everything computed by one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub input: InputSummary,
    /// Rows the statistics were computed over.
    pub rows: RowRange,
    /// Timesteps of those rows, when the file has a timestep column.
    pub timesteps: Option<TimestepRange>,
    pub statistics: Vec<Statistic>,
    /// One entry per selected column, in selection order.
    pub results: Vec<ColumnResults>,
    pub cycle: Option<CycleData>,
    pub spectrum: Option<Spectrum>,
}

/// Load the request's file and analyze it.
pub fn run(request: &AnalysisRequest) -> AnalysisResult<(ColumnStore, AnalysisReport)> {
    request.validate()?;
    let options = IngestionOptions {
        delimiter: request.delimiter.clone(),
        observer: Some(Arc::new(LogObserver)),
        ..IngestionOptions::default()
    };
    let store = ingest_from_path(&request.path, &options)?;
    let report = analyze(&store, request)?;
    Ok((store, report))
}

/// Analyze an already loaded store.
pub fn analyze(store: &ColumnStore, request: &AnalysisRequest) -> AnalysisResult<AnalysisReport> {
    request.validate()?;
    let columns = selected_columns(store, request)?;

    let (rows, cycle) = match &request.cycle {
        Some(c) => {
            let search = resolve_range(store, c.range)?;
            let params = CycleParams {
                center: c.center,
                range: search,
                count: c.count,
                init: c.init,
                min_amplitude: c.min_amplitude,
                min_row_interval: c.min_row_interval,
                time: c.time_basis(),
            };
            let data = extract_cycles(store, &c.column, &params)?;
            log::info!(
                "{} cycles of '{}' found over rows {}",
                data.cycle_count,
                data.column,
                data.rows
            );
            (data.rows, Some(data))
        }
        None => (resolve_range(store, request.range)?, None),
    };

    let statistics = request.statistics_or_all();
    let engine = ExecutionEngine::new(ExecutionOptions {
        num_threads: request.num_threads,
    })?
    .with_observer(Arc::new(LogExecutionObserver));
    let results = engine.run_statistics(&StatisticsBatch {
        columns: columns.clone(),
        statistics: statistics.clone(),
        range: rows,
    })?;

    let spectrum = match &request.spectrum {
        Some(s) => {
            let column = store.double_column(&s.column)?;
            Some(spectrum(column, rows, s.sample_interval)?)
        }
        None => None,
    };

    Ok(AnalysisReport {
        input: InputSummary::of(store),
        rows,
        timesteps: store.timesteps_of(rows),
        statistics,
        results,
        cycle,
        spectrum,
    })
}

/// Selected data columns, every data column when the selection is empty.
pub fn selected_columns<'a>(
    store: &'a ColumnStore,
    request: &AnalysisRequest,
) -> AnalysisResult<Vec<&'a DoubleColumn>> {
    if request.columns.is_empty() {
        return Ok(store.data_columns().collect());
    }
    request
        .columns
        .iter()
        .map(|id| store.double_column(id))
        .collect()
}

/// Rows covered by a selection, the whole file when there is none.
pub fn resolve_range(store: &ColumnStore, selection: Option<RangeSelection>) -> AnalysisResult<RowRange> {
    match selection {
        None => store.full_range(),
        Some(RangeSelection::Rows(r)) => {
            store.check_range(r)?;
            Ok(r)
        }
        Some(RangeSelection::Timesteps(t)) => store.timestep_rows(t),
    }
}
