//! Analysis requests.
//!
//! An [`AnalysisRequest`] is everything one run needs: the input file, which columns and rows
//! to look at, which statistics to compute and the optional cycle/spectrum/output features.
//! It is built by the CLI or deserialized from JSON, and checked with
//! [`AnalysisRequest::validate`] before any file is read.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::processing::{CycleInit, Statistic, TimeBasis};
use crate::types::{ColumnId, RowRange, TimestepRange};

/// Explicit selection of the analyzed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSelection {
    /// 0-based inclusive row numbers.
    Rows(RowRange),
    /// Inclusive timestep values; needs a timestep column.
    Timesteps(TimestepRange),
}

/// Cycle analysis of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleRequest {
    pub column: ColumnId,
    #[serde(default)]
    pub center: f64,
    /// Number of cycles wanted; all complete cycles when absent.
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub init: CycleInit,
    /// Rows the cycles are searched in; the whole file when absent.
    #[serde(default)]
    pub range: Option<RangeSelection>,
    #[serde(default)]
    pub min_amplitude: Option<f64>,
    #[serde(default)]
    pub min_row_interval: Option<usize>,
    /// Constant time between rows, for the frequency.
    #[serde(default)]
    pub time_increment: Option<f64>,
    /// Column holding the time of each row, for the frequency.
    #[serde(default)]
    pub time_column: Option<ColumnId>,
    /// Where to write the peak/crest/trough table.
    #[serde(default)]
    pub peaks_output: Option<PathBuf>,
}

impl CycleRequest {
    /// A request for every cycle of `column` around `center`.
    pub fn new(column: ColumnId, center: f64) -> Self {
        Self {
            column,
            center,
            count: None,
            init: CycleInit::First,
            range: None,
            min_amplitude: None,
            min_row_interval: None,
            time_increment: None,
            time_column: None,
            peaks_output: None,
        }
    }

    /// Time basis for the frequency.
    pub fn time_basis(&self) -> TimeBasis {
        match (&self.time_increment, &self.time_column) {
            (Some(dt), _) => TimeBasis::Increment(*dt),
            (None, Some(id)) => TimeBasis::Column(id.clone()),
            (None, None) => TimeBasis::Auto,
        }
    }

    fn validate(&self) -> AnalysisResult<()> {
        if self.count == Some(0) {
            return Err(AnalysisError::configuration("the number of cycles must be at least 1"));
        }
        if !self.center.is_finite() {
            return Err(AnalysisError::configuration("the cycle center must be a finite number"));
        }
        if let Some(a) = self.min_amplitude {
            if !a.is_finite() || a < 0.0 {
                return Err(AnalysisError::configuration(format!(
                    "the minimum amplitude must be a non-negative number, got {a}"
                )));
            }
        }
        if self.time_increment.is_some() && self.time_column.is_some() {
            return Err(AnalysisError::configuration(
                "a time increment and a time column cannot both be used for the cycle frequency",
            ));
        }
        if let Some(dt) = self.time_increment {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(AnalysisError::configuration(format!(
                    "the time increment must be a positive number, got {dt}"
                )));
            }
        }
        if let Some(p) = &self.peaks_output {
            check_output_path(p)?;
        }
        Ok(())
    }
}

/// Amplitude spectrum of one column over the analyzed rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpectrumRequest {
    pub column: ColumnId,
    /// Time between samples; 1 when absent.
    #[serde(default)]
    pub sample_interval: Option<f64>,
    /// Number of dominant bins to report.
    #[serde(default = "default_top_bins")]
    pub top: usize,
    /// Where to write the full spectrum.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_top_bins() -> usize {
    5
}

impl SpectrumRequest {
    pub fn new(column: ColumnId) -> Self {
        Self {
            column,
            sample_interval: None,
            top: default_top_bins(),
            output: None,
        }
    }
}

/// One analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisRequest {
    /// Input file.
    pub path: PathBuf,
    /// Field delimiter; auto-detected when absent.
    pub delimiter: Option<String>,
    /// Columns to analyze; every data column when empty.
    pub columns: Vec<ColumnId>,
    /// Explicit rows to analyze; the whole file when absent.
    pub range: Option<RangeSelection>,
    /// Statistics to compute; all of them when empty.
    pub statistics: Vec<Statistic>,
    pub cycle: Option<CycleRequest>,
    pub spectrum: Option<SpectrumRequest>,
    /// CSV files the results are appended to.
    pub outputs: Vec<PathBuf>,
    /// CSV file receiving the selected columns over the analyzed rows.
    pub data_output: Option<PathBuf>,
    /// Print the selected data to the terminal.
    pub print_data: bool,
    /// Worker threads for the statistics batch.
    pub num_threads: Option<usize>,
}

impl AnalysisRequest {
    /// A request analyzing every column of `path` with every statistic.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Load a request from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Parse a request from JSON text.
    pub fn from_json_str(text: &str) -> AnalysisResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Statistics to compute, defaulting to all of them.
    pub fn statistics_or_all(&self) -> Vec<Statistic> {
        if self.statistics.is_empty() {
            Statistic::ALL.to_vec()
        } else {
            self.statistics.clone()
        }
    }

    /// Reject contradictory or out-of-domain options.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(AnalysisError::configuration("no input file was given"));
        }
        if let Some(cycle) = &self.cycle {
            if self.range.is_some() {
                return Err(AnalysisError::configuration(
                    "a row or timestep range cannot be combined with a cycle request; \
                     use the cycle's own range instead",
                ));
            }
            cycle.validate()?;
        }
        if let Some(RangeSelection::Rows(r)) = self.range {
            if r.begin > r.end {
                return Err(AnalysisError::RowRangeInvalid {
                    begin: r.begin,
                    end: r.end,
                    row_count: 0,
                });
            }
        }
        if let Some(spectrum) = &self.spectrum {
            if let Some(dt) = spectrum.sample_interval {
                if !dt.is_finite() || dt <= 0.0 {
                    return Err(AnalysisError::configuration(format!(
                        "the sample interval must be a positive number, got {dt}"
                    )));
                }
            }
            if let Some(p) = &spectrum.output {
                check_output_path(p)?;
            }
        }
        for p in self.outputs.iter().chain(self.data_output.iter()) {
            check_output_path(p)?;
        }
        if self.num_threads == Some(0) {
            return Err(AnalysisError::configuration("num_threads must be > 0 when set"));
        }
        Ok(())
    }
}

fn check_output_path(path: &Path) -> AnalysisResult<()> {
    if path.as_os_str().is_empty() {
        return Err(AnalysisError::configuration("an empty output file name was given"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_with_cycle() {
        let req = AnalysisRequest::from_json_str(
            r#"{
                "path": "run.dat",
                "columns": ["Fx", 3],
                "statistics": ["mean", "abs-max"],
                "cycle": {
                    "column": "Fx",
                    "center": 1.5,
                    "count": 4,
                    "init": "last",
                    "range": {"timesteps": {"begin": 100, "end": 900}},
                    "time_increment": 0.01
                },
                "outputs": ["results.csv"]
            }"#,
        )
        .unwrap();
        assert_eq!(req.columns, vec![ColumnId::name("Fx"), ColumnId::Number(3)]);
        assert_eq!(req.statistics, vec![Statistic::Mean, Statistic::AbsMax]);
        let cycle = req.cycle.as_ref().unwrap();
        assert_eq!(cycle.init, CycleInit::Last);
        assert_eq!(
            cycle.range,
            Some(RangeSelection::Timesteps(TimestepRange::new(100, 900)))
        );
        assert_eq!(cycle.time_basis(), TimeBasis::Increment(0.01));
        req.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AnalysisRequest::from_json_str(r#"{"path": "a", "colums": []}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Json(_)));
    }

    #[test]
    fn range_and_cycle_are_exclusive() {
        let mut req = AnalysisRequest::new("a.dat");
        req.range = Some(RangeSelection::Rows(RowRange::new(0, 10)));
        req.cycle = Some(CycleRequest::new(ColumnId::Number(2), 0.0));
        assert!(matches!(req.validate(), Err(AnalysisError::Configuration { .. })));
    }

    #[test]
    fn time_increment_and_time_column_are_exclusive() {
        let mut cycle = CycleRequest::new(ColumnId::Number(2), 0.0);
        cycle.time_increment = Some(0.1);
        cycle.time_column = Some(ColumnId::name("t"));
        let mut req = AnalysisRequest::new("a.dat");
        req.cycle = Some(cycle);
        assert!(matches!(req.validate(), Err(AnalysisError::Configuration { .. })));
    }

    #[test]
    fn zero_cycles_and_reversed_rows_are_rejected() {
        let mut req = AnalysisRequest::new("a.dat");
        let mut cycle = CycleRequest::new(ColumnId::Number(2), 0.0);
        cycle.count = Some(0);
        req.cycle = Some(cycle);
        assert!(req.validate().is_err());

        let mut req = AnalysisRequest::new("a.dat");
        req.range = Some(RangeSelection::Rows(RowRange::new(5, 2)));
        assert!(matches!(req.validate(), Err(AnalysisError::RowRangeInvalid { .. })));
    }

    #[test]
    fn empty_statistics_means_all() {
        let req = AnalysisRequest::new("a.dat");
        assert_eq!(req.statistics_or_all(), Statistic::ALL.to_vec());
        assert!(AnalysisRequest::default().validate().is_err());
    }
}
