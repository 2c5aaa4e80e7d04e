//! Header line parsing.

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Delimitation;

use super::format::{effective_delimiter, split_delimited, split_whitespace};

/// Column names and delimitation of the header zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Ordered column names.
    pub names: Vec<String>,
    /// Number of columns.
    pub column_count: usize,
    /// Scheme that split the header.
    pub delimitation: Delimitation,
}

/// Determine the delimitation scheme of a single line.
///
/// Schemes are tested in order: whitespace-only (the line does not contain the delimiter),
/// delimiter-only (fields carry no padding) and combined (fields padded with whitespace).
/// A scheme producing an empty field is unusable, giving [`Delimitation::Undefined`].
pub fn classify_line(line: &str, delimiter: Option<&str>) -> Delimitation {
    let line = line.trim();
    if line.is_empty() {
        return Delimitation::Undefined;
    }

    let Some(d) = effective_delimiter(delimiter).filter(|d| line.contains(*d)) else {
        return Delimitation::Whitespace;
    };

    let body = line.strip_suffix(d).unwrap_or(line);
    let fields: Vec<&str> = body.split(d).collect();
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Delimitation::Undefined;
    }
    if fields.iter().any(|f| f.trim().len() != f.len()) {
        Delimitation::WhitespaceAndDelimiter
    } else {
        Delimitation::Delimiter
    }
}

/// Split the header line into column names.
pub fn parse_header(line: &str, delimiter: Option<&str>) -> AnalysisResult<HeaderInfo> {
    let delimitation = classify_line(line, delimiter);
    let names: Vec<String> = match delimitation {
        Delimitation::Undefined => Vec::new(),
        Delimitation::Whitespace => split_whitespace(line)
            .into_iter()
            .map(str::to_string)
            .collect(),
        Delimitation::Delimiter | Delimitation::WhitespaceAndDelimiter => {
            // classify_line only reports these when a delimiter is present.
            let d = effective_delimiter(delimiter).unwrap_or_default();
            split_delimited(line, d)
                .into_iter()
                .map(str::to_string)
                .collect()
        }
    };

    if names.is_empty() {
        return Err(AnalysisError::HeaderFormatIncorrect {
            line: line.to_string(),
        });
    }

    log::debug!(
        "header split into {} columns using {delimitation} delimitation",
        names.len()
    );

    Ok(HeaderInfo {
        column_count: names.len(),
        names,
        delimitation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_header_is_delimited() {
        let info = parse_header("a,b,c", Some(",")).unwrap();
        assert_eq!(info.delimitation, Delimitation::Delimiter);
        assert_eq!(info.column_count, 3);
        assert_eq!(info.names, vec!["a", "b", "c"]);
    }

    #[test]
    fn spaced_header_without_delimiter_is_whitespace() {
        let info = parse_header("a b   c", None).unwrap();
        assert_eq!(info.delimitation, Delimitation::Whitespace);
        assert_eq!(info.names, vec!["a", "b", "c"]);

        // Delimiter supplied but absent from the line.
        let info = parse_header("a b c", Some(",")).unwrap();
        assert_eq!(info.delimitation, Delimitation::Whitespace);
    }

    #[test]
    fn padded_fields_are_whitespace_and_delimiter() {
        let info = parse_header("Time step , Force x, Force y", Some(",")).unwrap();
        assert_eq!(info.delimitation, Delimitation::WhitespaceAndDelimiter);
        assert_eq!(info.names, vec!["Time step", "Force x", "Force y"]);
    }

    #[test]
    fn empty_field_is_rejected() {
        let err = parse_header("a,,b", Some(",")).unwrap_err();
        assert!(matches!(err, AnalysisError::HeaderFormatIncorrect { .. }));
    }

    #[test]
    fn trailing_delimiter_is_tolerated() {
        let info = parse_header("t,x,", Some(",")).unwrap();
        assert_eq!(info.names, vec!["t", "x"]);
    }
}
