//! Column typing and timestep column selection.

use rayon::prelude::*;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{ColumnKind, Delimitation};

use super::format::{lines_with_offsets, tokenize};

/// Number of leading data rows inspected when typing columns.
pub const DEFAULT_SAMPLE_ROWS: usize = 1_000;

/// A non-blank data line split into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLine<'a> {
    /// 1-based line number in the input.
    pub line_no: usize,
    /// Field tokens, one per column.
    pub tokens: Vec<&'a str>,
}

/// Fails when one zone splits on the delimiter and the other does not.
pub fn check_zone_delimitation(header: Delimitation, data: Delimitation) -> AnalysisResult<()> {
    let compatible = data != Delimitation::Undefined
        && header.uses_delimiter() == data.uses_delimiter();
    if compatible {
        Ok(())
    } else {
        Err(AnalysisError::DelimitationMismatch {
            header: header.to_string(),
            data: data.to_string(),
        })
    }
}

/// Tokenize every non-blank line from `data_offset` to the end of `text`.
///
/// Every row must have exactly `column_count` tokens.
pub fn split_data_lines<'a>(
    text: &'a str,
    data_offset: usize,
    first_line_no: usize,
    delimiter: Option<&str>,
    delimitation: Delimitation,
    column_count: usize,
) -> AnalysisResult<Vec<DataLine<'a>>> {
    let mut rows = Vec::new();
    for (_, idx, line) in lines_with_offsets(&text[data_offset..]) {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = first_line_no + idx - 1;
        let tokens = tokenize(line, delimiter, delimitation);
        if tokens.len() != column_count {
            return Err(AnalysisError::DlmFormatIncorrect {
                line: line_no,
                expected: column_count,
                found: tokens.len(),
            });
        }
        rows.push(DataLine { line_no, tokens });
    }
    Ok(rows)
}

/// Type each column from a bounded sample of rows.
///
/// A column is [`ColumnKind::Integer`] only if every sampled token parses as an integer.
pub fn classify_columns(
    rows: &[DataLine<'_>],
    column_count: usize,
    sample_rows: usize,
) -> Vec<ColumnKind> {
    let sample = &rows[..rows.len().min(sample_rows.max(1))];
    (0..column_count)
        .into_par_iter()
        .map(|col| {
            let all_integer = sample
                .iter()
                .all(|row| row.tokens.get(col).is_some_and(|t| t.parse::<i64>().is_ok()));
            if all_integer && !sample.is_empty() {
                ColumnKind::Integer
            } else {
                ColumnKind::Double
            }
        })
        .collect()
}

/// Values can serve as timestep column when they are non-negative and strictly increasing
/// across the whole file.
pub fn is_timestep_candidate(values: &[i64]) -> bool {
    values.first().is_some_and(|v| *v >= 0) && values.windows(2).all(|w| w[0] < w[1])
}

/// Column number of the unique timestep candidate among `(number, values)` pairs, if exactly
/// one exists.
pub fn find_timestep_column<'v>(
    columns: impl IntoIterator<Item = (usize, &'v [i64])>,
) -> Option<usize> {
    let candidates: Vec<usize> = columns
        .into_iter()
        .filter(|(_, values)| is_timestep_candidate(values))
        .map(|(number, _)| number)
        .collect();
    match candidates.as_slice() {
        [only] => Some(*only),
        [] => {
            log::debug!("no integer column increases strictly; no timestep column");
            None
        }
        many => {
            log::debug!("timestep column is ambiguous between columns {many:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows<'a>(lines: &[&'a str]) -> Vec<DataLine<'a>> {
        lines
            .iter()
            .enumerate()
            .map(|(i, l)| DataLine {
                line_no: i + 2,
                tokens: l.split_whitespace().collect(),
            })
            .collect()
    }

    #[test]
    fn integer_and_double_columns_are_typed_from_sample() {
        let data = rows(&["1 1.5 3", "2 2.0 4", "3 2.5 5e1", "4 3.0 6"]);
        let kinds = classify_columns(&data, 3, DEFAULT_SAMPLE_ROWS);
        assert_eq!(
            kinds,
            vec![ColumnKind::Integer, ColumnKind::Double, ColumnKind::Double]
        );
    }

    #[test]
    fn sampling_is_bounded() {
        let data = rows(&["1", "2", "2.5"]);
        assert_eq!(classify_columns(&data, 1, 2), vec![ColumnKind::Integer]);
        assert_eq!(classify_columns(&data, 1, 3), vec![ColumnKind::Double]);
    }

    #[test]
    fn unique_strictly_increasing_column_is_timestep() {
        let step = [1, 2, 3, 4];
        let flag = [0, 1, 1, 0];
        assert_eq!(find_timestep_column([(1, &step[..]), (3, &flag[..])]), Some(1));
    }

    #[test]
    fn ambiguous_or_missing_timestep_yields_none() {
        let a = [1, 2, 3];
        let b = [10, 20, 30];
        assert_eq!(find_timestep_column([(1, &a[..]), (2, &b[..])]), None);

        let negative = [-2, -1, 0];
        assert_eq!(find_timestep_column([(1, &negative[..])]), None);
        assert_eq!(find_timestep_column(std::iter::empty()), None);
        assert!(!is_timestep_candidate(&[]));
    }

    #[test]
    fn row_with_wrong_token_count_fails() {
        let text = "1 2 3\n4 5\n";
        let err = split_data_lines(text, 0, 2, None, Delimitation::Whitespace, 3).unwrap_err();
        match err {
            AnalysisError::DlmFormatIncorrect {
                line,
                expected,
                found,
            } => {
                assert_eq!((line, expected, found), (3, 3, 2));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zone_mismatch_is_detected() {
        assert!(check_zone_delimitation(Delimitation::Delimiter, Delimitation::Delimiter).is_ok());
        assert!(check_zone_delimitation(
            Delimitation::WhitespaceAndDelimiter,
            Delimitation::Delimiter
        )
        .is_ok());
        assert!(check_zone_delimitation(Delimitation::Delimiter, Delimitation::Whitespace).is_err());
    }
}
