//! Oscillation cycle extraction.
//!
//! A signal is split into half-waves around a center value: the upper side holds samples
//! strictly above the center, the lower side everything else (so touching the center ends an
//! upper half-wave). The first cycle starts at the initiation edge of the range, and a cycle
//! is complete when the signal crosses back to the side it started on. Each cycle yields one
//! crest (largest value on the upper side) and one trough (smallest value on the lower side).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::store::{Column, ColumnStore};
use crate::types::{ColumnId, DoubleColumn, RowRange};

/// Edge of the row range the walk starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleInit {
    /// Walk forward from the first row.
    #[default]
    First,
    /// Walk backward from the last row.
    Last,
}

impl FromStr for CycleInit {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(CycleInit::First),
            "last" => Ok(CycleInit::Last),
            other => Err(AnalysisError::configuration(format!(
                "invalid cycle initiation '{other}' (expected 'first' or 'last')"
            ))),
        }
    }
}

impl fmt::Display for CycleInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleInit::First => f.write_str("first"),
            CycleInit::Last => f.write_str("last"),
        }
    }
}

/// Where elapsed time for the cycle frequency comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    /// Use the timestep column when the file has one.
    #[default]
    Auto,
    /// Constant time between consecutive rows.
    Increment(f64),
    /// Time values taken from a column (integer timestep or double simulation time).
    Column(ColumnId),
}

/// Parameters of one cycle extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleParams {
    /// Reference value the signal oscillates around.
    pub center: f64,
    /// Rows to analyze.
    pub range: RowRange,
    /// Number of cycles wanted; `None` takes every complete cycle.
    pub count: Option<usize>,
    /// Edge the walk starts from.
    pub init: CycleInit,
    /// Minimum crest-to-trough amplitude for a cycle to stand on its own.
    pub min_amplitude: Option<f64>,
    /// Minimum number of rows a cycle must span to stand on its own.
    pub min_row_interval: Option<usize>,
    /// Source of elapsed time for the frequency.
    pub time: TimeBasis,
}

impl CycleParams {
    /// Every complete cycle over `range`, walking forward, without filters.
    pub fn new(center: f64, range: RowRange) -> Self {
        Self {
            center,
            range,
            count: None,
            init: CycleInit::First,
            min_amplitude: None,
            min_row_interval: None,
            time: TimeBasis::Auto,
        }
    }
}

/// Crest/trough/peak series of the extracted cycles and their reductions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleData {
    /// Name of the analyzed column.
    pub column: String,
    /// Center value used.
    pub center: f64,
    /// Edge the walk started from.
    pub init: CycleInit,
    /// One crest per cycle, in walk order.
    pub crests: Vec<f64>,
    /// One trough per cycle, in walk order.
    pub troughs: Vec<f64>,
    /// Absolute deviations of every crest and trough from the center, descending.
    pub peaks: Vec<f64>,
    pub crests_mean: f64,
    pub troughs_mean: f64,
    pub peaks_mean: f64,
    /// Mean of the largest third of the peaks, when there are at least three.
    pub peaks_one_third_mean: Option<f64>,
    /// Mean of the largest tenth of the peaks, when there are at least ten.
    pub peaks_one_tenth_mean: Option<f64>,
    /// Number of complete cycles.
    pub cycle_count: usize,
    /// Cycles per unit time, when elapsed time is known.
    pub frequency: Option<f64>,
    /// Rows spanned by the counted cycles, in file order.
    pub rows: RowRange,
}

impl CycleData {
    /// Largest peak.
    pub fn peaks_max(&self) -> Option<f64> {
        self.peaks.first().copied()
    }
}

/// Time lookup resolved from a [`TimeBasis`].
#[derive(Debug, Clone, Copy)]
pub enum TimeAxis<'a> {
    /// No time information; frequency is left unset.
    Unknown,
    /// Constant increment between rows.
    Increment(f64),
    /// Per-row time values.
    Column(&'a Column),
}

impl TimeAxis<'_> {
    fn elapsed(&self, from_row: usize, to_row: usize) -> Option<f64> {
        match self {
            TimeAxis::Unknown => None,
            TimeAxis::Increment(dt) => Some(dt * from_row.abs_diff(to_row) as f64),
            TimeAxis::Column(c) => Some((c.value_f64(to_row)? - c.value_f64(from_row)?).abs()),
        }
    }
}

/// Resolve the column and time basis in `store` and extract cycles.
pub fn extract_cycles(
    store: &ColumnStore,
    column: &ColumnId,
    params: &CycleParams,
) -> AnalysisResult<CycleData> {
    let signal = store.double_column(column)?;
    store.check_range(params.range)?;
    let time = match &params.time {
        TimeBasis::Auto => match store.timestep_column() {
            Some(ts) => store
                .resolve(&ColumnId::Number(ts.number()))
                .map(TimeAxis::Column)?,
            None => TimeAxis::Unknown,
        },
        TimeBasis::Increment(dt) => TimeAxis::Increment(*dt),
        TimeBasis::Column(id) => TimeAxis::Column(store.resolve(id)?),
    };
    extract_cycles_from(signal, params, time)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Upper,
    Lower,
}

fn side_of(deviation: f64) -> Side {
    if deviation > 0.0 { Side::Upper } else { Side::Lower }
}

/// Cycle being accumulated; merged micro-cycles keep extending it.
struct Candidate {
    start_row: usize,
    start_side: Side,
    crest: Option<f64>,
    trough: Option<f64>,
}

impl Candidate {
    fn new(row: usize, side: Side) -> Self {
        Self {
            start_row: row,
            start_side: side,
            crest: None,
            trough: None,
        }
    }

    fn record(&mut self, value: f64, side: Side) {
        match side {
            Side::Upper => self.crest = Some(self.crest.map_or(value, |c| c.max(value))),
            Side::Lower => self.trough = Some(self.trough.map_or(value, |t| t.min(value))),
        }
    }
}

struct Completed {
    crest: f64,
    trough: f64,
    closing_row: usize,
}

/// Extract cycles from a column over `params.range` (which must be valid for the column).
pub fn extract_cycles_from(
    column: &DoubleColumn,
    params: &CycleParams,
    time: TimeAxis<'_>,
) -> AnalysisResult<CycleData> {
    if params.count == Some(0) {
        return Err(AnalysisError::configuration("the number of cycles must be positive"));
    }
    params.range.validate(column.len())?;
    let values = column.values();
    let center = params.center;
    let RowRange { begin, end } = params.range;

    let order: Box<dyn Iterator<Item = usize>> = match params.init {
        CycleInit::First => Box::new(begin..=end),
        CycleInit::Last => Box::new((begin..=end).rev()),
    };
    let mut order = order.peekable();

    let Some(&first_row) = order.peek() else {
        return Err(AnalysisError::RowRangeInvalid {
            begin,
            end,
            row_count: column.len(),
        });
    };
    let first_side = side_of(values[first_row] - center);
    let mut candidate = Candidate::new(first_row, first_side);
    let mut prev_side = first_side;
    let mut crossings = 0usize;
    let mut completed: Vec<Completed> = Vec::new();
    let min_amplitude = params.min_amplitude.unwrap_or(0.0);
    let min_rows = params.min_row_interval.unwrap_or(0);

    for row in order {
        let value = values[row];
        let side = side_of(value - center);
        if side != prev_side {
            crossings += 1;
            if side == candidate.start_side {
                if let (Some(crest), Some(trough)) = (candidate.crest, candidate.trough) {
                    let span = candidate.start_row.abs_diff(row);
                    if crest - trough >= min_amplitude && span >= min_rows {
                        completed.push(Completed {
                            crest,
                            trough,
                            closing_row: row,
                        });
                        if params.count.is_some_and(|n| completed.len() >= n) {
                            break;
                        }
                        candidate = Candidate::new(row, side);
                    } else {
                        log::debug!(
                            "merging micro-cycle at row {row} (amplitude {}, span {span})",
                            crest - trough
                        );
                    }
                }
            }
        }
        candidate.record(value, side);
        prev_side = side;
    }

    if crossings == 0 {
        return Err(AnalysisError::DataInvalid {
            column: column.name().to_string(),
            center,
        });
    }
    let requested = params.count.unwrap_or(1);
    if completed.is_empty() || completed.len() < requested {
        return Err(AnalysisError::CycleNotAvailable {
            column: column.name().to_string(),
            requested,
            available: completed.len(),
        });
    }

    let mut crests = Vec::with_capacity(completed.len());
    let mut troughs = Vec::with_capacity(completed.len());
    let mut peaks: Vec<f64> = Vec::with_capacity(completed.len() * 2);
    for c in &completed {
        crests.push(c.crest);
        troughs.push(c.trough);
        peaks.push((c.crest - center).abs());
        peaks.push((c.trough - center).abs());
    }
    peaks.sort_by(|a, b| b.total_cmp(a));

    let last_closing = completed
        .last()
        .map(|c| c.closing_row)
        .unwrap_or(first_row);
    let rows = match params.init {
        CycleInit::First => RowRange::new(first_row, last_closing - 1),
        CycleInit::Last => RowRange::new(last_closing + 1, first_row),
    };
    let frequency = time
        .elapsed(first_row, last_closing)
        .filter(|t| *t > 0.0)
        .map(|t| completed.len() as f64 / t);

    log::debug!(
        "{} cycles of '{}' around {center} over rows {rows}",
        completed.len(),
        column.name()
    );

    Ok(CycleData {
        column: column.name().to_string(),
        center,
        init: params.init,
        crests_mean: mean_of(&crests),
        troughs_mean: mean_of(&troughs),
        peaks_mean: mean_of(&peaks),
        peaks_one_third_mean: top_fraction_mean(&peaks, 3),
        peaks_one_tenth_mean: top_fraction_mean(&peaks, 10),
        cycle_count: completed.len(),
        frequency,
        rows,
        crests,
        troughs,
        peaks,
    })
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the first `len / divisor` entries of an already descending slice.
fn top_fraction_mean(peaks: &[f64], divisor: usize) -> Option<f64> {
    let n = peaks.len() / divisor;
    (n > 0).then(|| mean_of(&peaks[..n]))
}
