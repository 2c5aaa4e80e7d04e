//! The column store: owns every column of a loaded file and answers lookups.
//!
//! A [`ColumnStore`] is built once by [`crate::ingestion`] and is immutable afterwards, so a
//! shared reference can be handed to any number of (possibly parallel) queries.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{
    ColumnDescriptor, ColumnId, ColumnKind, Delimitation, DoubleColumn, IntegerColumn, RowRange,
    TimestepRange,
};

/// A typed column owned by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Integer column (the timestep column).
    Integer(IntegerColumn),
    /// Double data column.
    Double(DoubleColumn),
}

impl Column {
    pub fn number(&self) -> usize {
        match self {
            Column::Integer(c) => c.number(),
            Column::Double(c) => c.number(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Integer(c) => c.name(),
            Column::Double(c) => c.name(),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Integer(_) => ColumnKind::Integer,
            Column::Double(_) => ColumnKind::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Integer(c) => c.len(),
            Column::Double(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row` as a double.
    pub fn value_f64(&self, row: usize) -> Option<f64> {
        match self {
            Column::Integer(c) => c.values().get(row).map(|v| *v as f64),
            Column::Double(c) => c.values().get(row).copied(),
        }
    }

    fn descriptor(&self) -> ColumnDescriptor {
        ColumnDescriptor {
            number: self.number(),
            name: self.name().to_string(),
            kind: self.kind(),
        }
    }
}

/// Layout facts recorded while ingesting a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Input path, when loaded from a file.
    pub path: Option<PathBuf>,
    /// Delimiter in effect (`None` for whitespace separated files).
    pub delimiter: Option<String>,
    /// Delimitation of the header line.
    pub header_delimitation: Delimitation,
    /// Delimitation of the data lines.
    pub data_delimitation: Delimitation,
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: None,
            header_delimitation: Delimitation::Undefined,
            data_delimitation: Delimitation::Undefined,
        }
    }
}

/// Registry owning all columns of one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStore {
    source: SourceInfo,
    row_count: usize,
    columns: Vec<Column>,
}

impl ColumnStore {
    /// Build a store from fully populated columns.
    ///
    /// Columns must share one row count and have unique names. At most one integer column may
    /// be present and it must be flagged as the timestep column.
    pub fn from_columns(columns: Vec<Column>, source: SourceInfo) -> AnalysisResult<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name()) {
                return Err(AnalysisError::DuplicateColumnName {
                    name: col.name().to_string(),
                });
            }
            if col.len() != row_count {
                return Err(AnalysisError::configuration(format!(
                    "column '{}' has {} rows, expected {row_count}",
                    col.name(),
                    col.len()
                )));
            }
            if let Column::Integer(c) = col {
                if !c.is_timestep() {
                    return Err(AnalysisError::configuration(format!(
                        "integer column '{}' is not a timestep column",
                        c.name()
                    )));
                }
            }
        }
        let integer_columns = columns
            .iter()
            .filter(|c| matches!(c, Column::Integer(_)))
            .count();
        if integer_columns > 1 {
            return Err(AnalysisError::configuration(
                "a store holds at most one timestep column",
            ));
        }

        Ok(Self {
            source,
            row_count,
            columns,
        })
    }

    /// Convenience constructor for in-memory double columns, numbered from 1.
    pub fn from_double_columns<N: Into<String>>(
        columns: impl IntoIterator<Item = (N, Vec<f64>)>,
    ) -> AnalysisResult<Self> {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, (name, values))| Column::Double(DoubleColumn::new(i + 1, name, values)))
            .collect();
        Self::from_columns(columns, SourceInfo::default())
    }

    /// Layout facts of the input.
    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    /// Input path, if loaded from a file.
    pub fn path(&self) -> Option<&Path> {
        self.source.path.as_deref()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns in file order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Descriptors of all columns in file order.
    pub fn descriptors(&self) -> Vec<ColumnDescriptor> {
        self.columns.iter().map(Column::descriptor).collect()
    }

    /// Range covering every row.
    pub fn full_range(&self) -> AnalysisResult<RowRange> {
        let range = RowRange::full(self.row_count);
        self.check_range(range)?;
        Ok(range)
    }

    /// Checks `begin <= end < row_count`.
    pub fn check_range(&self, range: RowRange) -> AnalysisResult<()> {
        range.validate(self.row_count)
    }

    /// Resolve a column by 1-based number or exact name.
    pub fn resolve(&self, id: &ColumnId) -> AnalysisResult<&Column> {
        let found = match id {
            ColumnId::Number(n) => self.columns.iter().find(|c| c.number() == *n),
            ColumnId::Name(name) => self.columns.iter().find(|c| c.name() == name),
        };
        found.ok_or_else(|| AnalysisError::ColumnNotFound {
            column: id.to_string(),
        })
    }

    /// Resolve a column that can be used for statistics and cycles.
    pub fn double_column(&self, id: &ColumnId) -> AnalysisResult<&DoubleColumn> {
        match self.resolve(id)? {
            Column::Double(c) => Ok(c),
            Column::Integer(c) => Err(AnalysisError::ColumnAbsent {
                column: c.name().to_string(),
                reason: "calculations cannot be performed on the timestep column".to_string(),
            }),
        }
    }

    /// Data (double) columns in file order.
    pub fn data_columns(&self) -> impl Iterator<Item = &DoubleColumn> + '_ {
        self.columns.iter().filter_map(|c| match c {
            Column::Double(d) => Some(d),
            Column::Integer(_) => None,
        })
    }

    /// The timestep column, if one was identified.
    pub fn timestep_column(&self) -> Option<&IntegerColumn> {
        self.columns.iter().find_map(|c| match c {
            Column::Integer(i) if i.is_timestep() => Some(i),
            _ => None,
        })
    }

    /// Available timestep range, if a timestep column exists.
    pub fn timestep_range(&self) -> Option<TimestepRange> {
        self.timestep_column()
            .map(|c| TimestepRange::new(c.min(), c.max()))
    }

    /// Timestep range covered by `rows`, if a timestep column exists.
    pub fn timesteps_of(&self, rows: RowRange) -> Option<TimestepRange> {
        let ts = self.timestep_column()?;
        let values = ts.values();
        Some(TimestepRange::new(
            *values.get(rows.begin)?,
            *values.get(rows.end)?,
        ))
    }

    /// Convert a timestep range into the rows it covers.
    ///
    /// The first row is the first with a timestep `>= begin`, the last row the last with a
    /// timestep `<= end`.
    pub fn timestep_rows(&self, range: TimestepRange) -> AnalysisResult<RowRange> {
        let ts = self
            .timestep_column()
            .ok_or(AnalysisError::DataTimestepInconsistent)?;
        if range.begin > range.end {
            return Err(AnalysisError::TimestepRangeInvalid {
                begin: range.begin,
                end: range.end,
            });
        }
        if range.begin < ts.min() {
            return Err(AnalysisError::TimestepTooSmall {
                requested: range.begin,
                min: ts.min(),
            });
        }
        if range.end > ts.max() {
            return Err(AnalysisError::TimestepTooLarge {
                requested: range.end,
                max: ts.max(),
            });
        }

        let values = ts.values();
        let begin = values.partition_point(|v| *v < range.begin);
        let after_end = values.partition_point(|v| *v <= range.end);
        if after_end == 0 || begin >= after_end {
            // No sample falls inside the requested window.
            return Err(AnalysisError::TimestepRangeInvalid {
                begin: range.begin,
                end: range.end,
            });
        }
        let rows = RowRange::new(begin, after_end - 1);
        self.check_range(rows)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_timestep() -> ColumnStore {
        let columns = vec![
            Column::Integer(IntegerColumn::new(1, "step", vec![10, 20, 30, 40, 50]).into_timestep()),
            Column::Double(DoubleColumn::new(2, "x", vec![1.0, 2.0, 3.0, 4.0, 5.0])),
            Column::Double(DoubleColumn::new(3, "y", vec![0.5, 0.5, 0.5, 0.5, 0.5])),
        ];
        ColumnStore::from_columns(columns, SourceInfo::default()).unwrap()
    }

    #[test]
    fn resolves_by_number_and_name() {
        let store = store_with_timestep();
        assert_eq!(store.resolve(&ColumnId::Number(2)).unwrap().name(), "x");
        assert_eq!(store.resolve(&ColumnId::name("y")).unwrap().number(), 3);
        assert!(matches!(
            store.resolve(&ColumnId::name("missing")),
            Err(AnalysisError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            store.resolve(&ColumnId::Number(9)),
            Err(AnalysisError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn timestep_column_is_not_a_data_column() {
        let store = store_with_timestep();
        assert!(matches!(
            store.double_column(&ColumnId::name("step")),
            Err(AnalysisError::ColumnAbsent { .. })
        ));
        let names: Vec<&str> = store.data_columns().map(DoubleColumn::name).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn timestep_range_maps_to_rows() {
        let store = store_with_timestep();
        assert_eq!(store.timestep_range(), Some(TimestepRange::new(10, 50)));
        assert_eq!(
            store.timestep_rows(TimestepRange::new(20, 40)).unwrap(),
            RowRange::new(1, 3)
        );
        assert_eq!(
            store.timestep_rows(TimestepRange::new(15, 45)).unwrap(),
            RowRange::new(1, 3)
        );
        assert!(matches!(
            store.timestep_rows(TimestepRange::new(5, 20)),
            Err(AnalysisError::TimestepTooSmall { .. })
        ));
        assert!(matches!(
            store.timestep_rows(TimestepRange::new(20, 60)),
            Err(AnalysisError::TimestepTooLarge { .. })
        ));
        assert!(matches!(
            store.timestep_rows(TimestepRange::new(40, 20)),
            Err(AnalysisError::TimestepRangeInvalid { .. })
        ));
        assert!(matches!(
            store.timestep_rows(TimestepRange::new(21, 29)),
            Err(AnalysisError::TimestepRangeInvalid { .. })
        ));
    }

    #[test]
    fn timestep_queries_require_a_timestep_column() {
        let store = ColumnStore::from_double_columns([("x", vec![1.0, 2.0])]).unwrap();
        assert!(store.timestep_column().is_none());
        assert!(matches!(
            store.timestep_rows(TimestepRange::new(0, 1)),
            Err(AnalysisError::DataTimestepInconsistent)
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ColumnStore::from_double_columns([("x", vec![1.0]), ("x", vec![2.0])]).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateColumnName { .. }));
    }

    #[test]
    fn row_range_is_checked_against_row_count() {
        let store = store_with_timestep();
        assert!(store.check_range(RowRange::new(0, 4)).is_ok());
        assert!(matches!(
            store.check_range(RowRange::new(5, 2)),
            Err(AnalysisError::RowRangeInvalid { .. })
        ));
        assert_eq!(store.full_range().unwrap(), RowRange::new(0, 4));
    }
}
