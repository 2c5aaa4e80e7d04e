//! Core data model types.
//!
//! The store owns one typed column per header field. Double columns carry prefix arrays so
//! that ranged sums (and the means built on them) are O(1) after an O(n) build.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Which tokenizing scheme separates the fields of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimitation {
    /// Not determined yet.
    Undefined,
    /// Fields separated by runs of whitespace only.
    Whitespace,
    /// Fields separated by the delimiter only.
    Delimiter,
    /// Fields separated by the delimiter, padded with whitespace.
    WhitespaceAndDelimiter,
}

impl Delimitation {
    /// Whether this scheme splits on the delimiter.
    pub fn uses_delimiter(self) -> bool {
        matches!(
            self,
            Delimitation::Delimiter | Delimitation::WhitespaceAndDelimiter
        )
    }
}

impl fmt::Display for Delimitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Delimitation::Undefined => "undefined",
            Delimitation::Whitespace => "whitespace",
            Delimitation::Delimiter => "delimiter",
            Delimitation::WhitespaceAndDelimiter => "whitespace and delimiter",
        };
        f.write_str(s)
    }
}

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// 64-bit signed integers.
    Integer,
    /// 64-bit floating point values.
    Double,
}

/// Position, name and type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// 1-based column number as it appears in the file.
    pub number: usize,
    /// Column name from the header line.
    pub name: String,
    /// Storage type.
    pub kind: ColumnKind,
}

/// Identifies a column either by 1-based number or by exact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnId {
    /// 1-based column number.
    Number(usize),
    /// Exact column name.
    Name(String),
}

impl ColumnId {
    /// Build a name identifier.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnId::Number(n) => write!(f, "#{n}"),
            ColumnId::Name(s) => f.write_str(s),
        }
    }
}

impl FromStr for ColumnId {
    type Err = std::convert::Infallible;

    /// All-digit strings are column numbers; anything else is a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = s.parse::<usize>() {
                return Ok(ColumnId::Number(n));
            }
        }
        Ok(ColumnId::Name(s.to_string()))
    }
}

/// Inclusive, 0-based range of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    /// First row.
    pub begin: usize,
    /// Last row (inclusive).
    pub end: usize,
}

impl RowRange {
    /// Create a range; not validated until [`RowRange::validate`].
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Range covering every row. `row_count` must be at least 1.
    pub fn full(row_count: usize) -> Self {
        Self {
            begin: 0,
            end: row_count.saturating_sub(1),
        }
    }

    /// Number of rows in the range.
    pub fn len(&self) -> usize {
        self.end - self.begin + 1
    }

    /// Ranges are never empty once validated.
    pub fn is_empty(&self) -> bool {
        self.end < self.begin
    }

    /// Checks `begin <= end < row_count`.
    pub fn validate(&self, row_count: usize) -> AnalysisResult<()> {
        if self.begin <= self.end && self.end < row_count {
            Ok(())
        } else {
            Err(AnalysisError::RowRangeInvalid {
                begin: self.begin,
                end: self.end,
                row_count,
            })
        }
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.begin, self.end)
    }
}

/// Inclusive range expressed in timestep column units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestepRange {
    /// First timestep.
    pub begin: i64,
    /// Last timestep (inclusive).
    pub end: i64,
}

impl TimestepRange {
    /// Create a timestep range.
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }
}

/// A column of integers, one per row.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerColumn {
    number: usize,
    name: String,
    values: Vec<i64>,
    min: i64,
    max: i64,
    is_timestep: bool,
}

impl IntegerColumn {
    /// Create an integer column, tracking its observed min/max.
    pub fn new(number: usize, name: impl Into<String>, values: Vec<i64>) -> Self {
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        Self {
            number,
            name: name.into(),
            values,
            min,
            max,
            is_timestep: false,
        }
    }

    /// Flag this column as the timestep column.
    pub fn into_timestep(mut self) -> Self {
        self.is_timestep = true;
        self
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest observed value.
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Largest observed value.
    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn is_timestep(&self) -> bool {
        self.is_timestep
    }

    /// True when every value is strictly greater than the previous one.
    pub fn is_strictly_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[0] < w[1])
    }
}

/// A column of doubles with cumulative sum, sum-of-squares and sum-of-cubes arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleColumn {
    number: usize,
    name: String,
    values: Vec<f64>,
    prefix_sum: Vec<f64>,
    prefix_squares: Vec<f64>,
    prefix_cubes: Vec<f64>,
}

impl DoubleColumn {
    /// Create a double column and build its prefix arrays.
    pub fn new(number: usize, name: impl Into<String>, values: Vec<f64>) -> Self {
        let n = values.len();
        let mut prefix_sum = Vec::with_capacity(n);
        let mut prefix_squares = Vec::with_capacity(n);
        let mut prefix_cubes = Vec::with_capacity(n);

        let (mut s, mut sq, mut cb) = (0.0_f64, 0.0_f64, 0.0_f64);
        for &v in &values {
            s += v;
            sq += v * v;
            cb += v * v * v;
            prefix_sum.push(s);
            prefix_squares.push(sq);
            prefix_cubes.push(cb);
        }

        Self {
            number,
            name: name.into(),
            values,
            prefix_sum,
            prefix_squares,
            prefix_cubes,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values of `range`, which must be valid for this column.
    pub fn slice(&self, range: RowRange) -> &[f64] {
        &self.values[range.begin..=range.end]
    }

    /// Sum over `range` in O(1). `range` must be valid for this column.
    pub fn sum(&self, range: RowRange) -> f64 {
        prefix_delta(&self.prefix_sum, range)
    }

    /// Sum of squares over `range` in O(1).
    pub fn sum_of_squares(&self, range: RowRange) -> f64 {
        prefix_delta(&self.prefix_squares, range)
    }

    /// Sum of cubes over `range` in O(1).
    pub fn sum_of_cubes(&self, range: RowRange) -> f64 {
        prefix_delta(&self.prefix_cubes, range)
    }

    /// Sum of `(x - mean)^2` over `range`, rescanning the values.
    pub fn sum_of_squared_deviations(&self, mean: f64, range: RowRange) -> f64 {
        self.slice(range)
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum()
    }
}

fn prefix_delta(prefix: &[f64], range: RowRange) -> f64 {
    let upper = prefix[range.end];
    if range.begin == 0 {
        upper
    } else {
        upper - prefix[range.begin - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnId, DoubleColumn, IntegerColumn, RowRange};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn prefix_sums_match_rescan_for_every_range() {
        let values = vec![1.5, -2.25, 3.0, 0.125, -7.5, 4.0, 2.0];
        let col = DoubleColumn::new(2, "x", values.clone());
        for b in 0..values.len() {
            for e in b..values.len() {
                let r = RowRange::new(b, e);
                let s: f64 = values[b..=e].iter().sum();
                let sq: f64 = values[b..=e].iter().map(|v| v * v).sum();
                let cb: f64 = values[b..=e].iter().map(|v| v * v * v).sum();
                assert!(close(col.sum(r), s), "sum {b}..={e}");
                assert!(close(col.sum_of_squares(r), sq), "squares {b}..={e}");
                assert!(close(col.sum_of_cubes(r), cb), "cubes {b}..={e}");
            }
        }
    }

    #[test]
    fn integer_column_tracks_min_max_and_monotonicity() {
        let col = IntegerColumn::new(1, "step", vec![3, 5, 9]);
        assert_eq!(col.min(), 3);
        assert_eq!(col.max(), 9);
        assert!(col.is_strictly_increasing());
        assert!(!col.is_timestep());
        assert!(col.into_timestep().is_timestep());

        let flat = IntegerColumn::new(2, "n", vec![1, 1, 2]);
        assert!(!flat.is_strictly_increasing());
    }

    #[test]
    fn row_range_validation() {
        assert!(RowRange::new(0, 4).validate(5).is_ok());
        assert!(RowRange::new(5, 2).validate(10).is_err());
        assert!(RowRange::new(0, 5).validate(5).is_err());
        assert_eq!(RowRange::new(2, 4).len(), 3);
    }

    #[test]
    fn column_id_parses_numbers_and_names() {
        assert_eq!("3".parse::<ColumnId>().unwrap(), ColumnId::Number(3));
        assert_eq!(
            "Force x".parse::<ColumnId>().unwrap(),
            ColumnId::Name("Force x".to_string())
        );
        assert_eq!(
            "x1".parse::<ColumnId>().unwrap(),
            ColumnId::Name("x1".to_string())
        );
    }
}
