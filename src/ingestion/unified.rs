//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which loads a whole file and builds an
//! immutable [`crate::store::ColumnStore`]:
//!
//! - header and data lines are located by [`super::format`]
//! - the header is split by [`super::header`]
//! - columns are typed and the timestep column chosen by [`super::classify`]
//! - if an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AnalysisError, AnalysisResult};
use crate::store::{Column, ColumnStore, SourceInfo};
use crate::types::{ColumnKind, DoubleColumn, IntegerColumn};

use super::classify::{
    check_zone_delimitation, classify_columns, find_timestep_column, split_data_lines, DataLine,
    DEFAULT_SAMPLE_ROWS,
};
use super::format::{
    detect_delimiter, effective_delimiter, find_line_positions, line_at, DEFAULT_LOOKAHEAD_LINES,
};
use super::header::{classify_line, parse_header};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Options controlling ingestion.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Field delimiter. If `None`, a common delimiter is auto-detected, falling back to
    /// whitespace.
    pub delimiter: Option<String>,
    /// Number of leading data rows used to type columns.
    pub sample_rows: usize,
    /// Maximum number of lines scanned for the header and the first data line.
    pub lookahead_lines: usize,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("delimiter", &self.delimiter)
            .field("sample_rows", &self.sample_rows)
            .field("lookahead_lines", &self.lookahead_lines)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            lookahead_lines: DEFAULT_LOOKAHEAD_LINES,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    /// Options with an explicit delimiter.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: Some(delimiter.into()),
            ..Default::default()
        }
    }
}

/// Load a file into a [`ColumnStore`].
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use coldata::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), coldata::AnalysisError> {
/// let store = ingest_from_path("forces.dat", &IngestionOptions::default())?;
/// println!("rows={} columns={}", store.row_count(), store.column_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> AnalysisResult<ColumnStore> {
    let path = path.as_ref();
    let ctx = IngestionContext {
        path: path.to_path_buf(),
        delimiter: options.delimiter.clone(),
    };

    let result = fs::read_to_string(path)
        .map_err(AnalysisError::from)
        .and_then(|text| build_store(&text, Some(path.to_path_buf()), options));

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(store) => obs.on_success(&ctx, IngestionStats::of(store)),
            Err(e) => {
                let sev = IngestionSeverity::of(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// Load in-memory text into a [`ColumnStore`].
pub fn ingest_from_str(text: &str, options: &IngestionOptions) -> AnalysisResult<ColumnStore> {
    build_store(text, None, options)
}

/// Read everything from `reader` and load it into a [`ColumnStore`].
pub fn ingest_from_reader<R: Read>(
    mut reader: R,
    options: &IngestionOptions,
) -> AnalysisResult<ColumnStore> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    build_store(&text, None, options)
}

fn build_store(
    text: &str,
    path: Option<PathBuf>,
    options: &IngestionOptions,
) -> AnalysisResult<ColumnStore> {
    let requested = effective_delimiter(options.delimiter.as_deref());
    let positions = find_line_positions(text, requested, options.lookahead_lines)?;
    let header_line = line_at(text, positions.header_offset);
    let first_data_line = line_at(text, positions.data_offset);

    let delimiter: Option<String> = match requested {
        Some(d) => Some(d.to_string()),
        None => detect_delimiter(header_line, first_data_line).map(str::to_string),
    };
    let delimiter = delimiter.as_deref();

    let header = parse_header(header_line, delimiter)?;
    let data_delimitation = classify_line(first_data_line, delimiter);
    check_zone_delimitation(header.delimitation, data_delimitation)?;

    let rows = split_data_lines(
        text,
        positions.data_offset,
        positions.data_line,
        delimiter,
        data_delimitation,
        header.column_count,
    )?;
    let kinds = classify_columns(&rows, header.column_count, options.sample_rows);
    let columns = populate_columns(&rows, &header.names, &kinds)?;

    log::info!(
        "loaded {} rows x {} columns ({} delimitation)",
        rows.len(),
        header.column_count,
        data_delimitation
    );

    ColumnStore::from_columns(
        columns,
        SourceInfo {
            path,
            delimiter: delimiter.map(str::to_string),
            header_delimitation: header.delimitation,
            data_delimitation,
        },
    )
}

enum ColumnBuilder {
    Integer(Vec<i64>),
    Double(Vec<f64>),
}

impl ColumnBuilder {
    fn new(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Integer => Self::Integer(Vec::with_capacity(capacity)),
            ColumnKind::Double => Self::Double(Vec::with_capacity(capacity)),
        }
    }

    /// Append a token; an integer builder meeting a non-integer literal becomes a double one.
    /// Returns `None` when the token is not a number.
    fn push(&mut self, token: &str) -> Option<()> {
        match self {
            ColumnBuilder::Integer(values) => {
                if let Ok(v) = token.parse::<i64>() {
                    values.push(v);
                    return Some(());
                }
                let v = parse_double(token)?;
                let mut promoted: Vec<f64> = values.iter().map(|x| *x as f64).collect();
                promoted.push(v);
                *self = ColumnBuilder::Double(promoted);
            }
            ColumnBuilder::Double(values) => values.push(parse_double(token)?),
        }
        Some(())
    }
}

fn parse_double(token: &str) -> Option<f64> {
    if !super::format::is_numeric_literal(token) {
        return None;
    }
    token.parse().ok()
}

fn populate_columns(
    rows: &[DataLine<'_>],
    names: &[String],
    kinds: &[ColumnKind],
) -> AnalysisResult<Vec<Column>> {
    let mut builders: Vec<ColumnBuilder> = kinds
        .iter()
        .map(|k| ColumnBuilder::new(*k, rows.len()))
        .collect();

    for row in rows {
        for (col, (builder, token)) in builders.iter_mut().zip(&row.tokens).enumerate() {
            builder
                .push(token)
                .ok_or_else(|| AnalysisError::DataFormatIncorrect {
                    line: row.line_no,
                    column: names[col].clone(),
                    raw: (*token).to_string(),
                })?;
        }
    }

    let timestep = find_timestep_column(builders.iter().enumerate().filter_map(|(i, b)| match b {
        ColumnBuilder::Integer(values) => Some((i + 1, values.as_slice())),
        ColumnBuilder::Double(_) => None,
    }));

    let columns = builders
        .into_iter()
        .enumerate()
        .map(|(i, b)| {
            let number = i + 1;
            let name = names[i].clone();
            match b {
                ColumnBuilder::Integer(values) if Some(number) == timestep => {
                    Column::Integer(IntegerColumn::new(number, name, values).into_timestep())
                }
                ColumnBuilder::Integer(values) => Column::Double(DoubleColumn::new(
                    number,
                    name,
                    values.into_iter().map(|v| v as f64).collect(),
                )),
                ColumnBuilder::Double(values) => Column::Double(DoubleColumn::new(number, name, values)),
            }
        })
        .collect();
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnId, Delimitation};

    #[test]
    fn comma_file_with_timestep() {
        let text = "step,x,y\n1,0.5,2.5\n2,0.25,3\n3,-1e-1,4\n";
        let store = ingest_from_str(text, &IngestionOptions::with_delimiter(",")).unwrap();
        assert_eq!(store.row_count(), 3);
        assert_eq!(store.column_count(), 3);
        assert_eq!(store.source().data_delimitation, Delimitation::Delimiter);
        assert_eq!(store.timestep_column().unwrap().name(), "step");

        let text = "step,flag,x\n1,0,0.5\n2,1,0.25\n3,1,-1\n";
        let store = ingest_from_str(text, &IngestionOptions::default()).unwrap();
        assert_eq!(store.source().delimiter.as_deref(), Some(","));
        assert_eq!(store.timestep_column().unwrap().name(), "step");
        let flag = store.double_column(&ColumnId::name("flag")).unwrap();
        assert_eq!(flag.values(), &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn two_increasing_integer_columns_give_no_timestep() {
        let text = "a b x\n1 10 0.5\n2 20 0.5\n";
        let store = ingest_from_str(text, &IngestionOptions::default()).unwrap();
        assert!(store.timestep_column().is_none());
        assert_eq!(store.data_columns().count(), 3);
    }

    #[test]
    fn column_builder_promotes_on_fraction_and_rejects_text() {
        let mut b = ColumnBuilder::new(ColumnKind::Integer, 4);
        assert_eq!(b.push("3"), Some(()));
        assert_eq!(b.push("4.5"), Some(()));
        assert!(matches!(&b, ColumnBuilder::Double(v) if v == &[3.0, 4.5]));
        assert_eq!(b.push("nan?"), None);
        assert_eq!(b.push("1e2"), Some(()));
        assert!(matches!(&b, ColumnBuilder::Double(v) if v.len() == 3));
    }

    #[test]
    fn timestep_found_among_borrowed_integer_columns() {
        let text = "flag step x\n1 10 0.5\n1 20 0.25\n0 30 -1\n";
        let store = ingest_from_str(text, &IngestionOptions::default()).unwrap();
        let ts = store.timestep_column().unwrap();
        assert_eq!((ts.number(), ts.name()), (2, "step"));
        assert_eq!(ts.values(), &[10, 20, 30]);
    }

    #[test]
    fn integer_column_demoted_after_sample() {
        let text = "t v\n1 1\n2 2\n3 2.5\n";
        let opts = IngestionOptions {
            sample_rows: 2,
            ..Default::default()
        };
        let store = ingest_from_str(text, &opts).unwrap();
        let v = store.double_column(&ColumnId::name("v")).unwrap();
        assert_eq!(v.values(), &[1.0, 2.0, 2.5]);
        assert_eq!(store.timestep_column().unwrap().name(), "t");
    }

    #[test]
    fn non_numeric_token_is_data_format_error() {
        let text = "t x\n1 0.5\n2 abc\n3 0.7\n4 0.8\n";
        let err = ingest_from_str(text, &IngestionOptions::default()).unwrap_err();
        match err {
            AnalysisError::DataFormatIncorrect { line, column, raw } => {
                assert_eq!(line, 3);
                assert_eq!(column, "x");
                assert_eq!(raw, "abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn header_and_data_zone_mismatch_fails() {
        let text = "a,b\n1 2\n";
        let err = ingest_from_str(text, &IngestionOptions::with_delimiter(",")).unwrap_err();
        assert!(matches!(err, AnalysisError::DelimitationMismatch { .. }));
    }

    #[test]
    fn duplicate_header_names_fail() {
        let text = "x x\n1.0 2.0\n";
        let err = ingest_from_str(text, &IngestionOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateColumnName { .. }));
    }
}
