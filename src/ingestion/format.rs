//! Format detection: where the header and the first data line are, and how lines split.

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Delimitation;

/// Maximum number of lines scanned while looking for the header and first data line.
pub const DEFAULT_LOOKAHEAD_LINES: usize = 1_000;

/// Delimiters tried, in order, when the caller does not supply one.
pub const DELIMITER_CANDIDATES: [&str; 4] = [",", ";", "|", "\t"];

/// Byte offsets (and 1-based line numbers) of the header line and the first data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePositions {
    /// Byte offset of the header line.
    pub header_offset: usize,
    /// Byte offset of the first data line.
    pub data_offset: usize,
    /// 1-based line number of the header.
    pub header_line: usize,
    /// 1-based line number of the first data line.
    pub data_line: usize,
}

/// Iterate `(byte_offset, 1-based line number, line without terminator)`.
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    let mut offset = 0usize;
    text.split_inclusive('\n')
        .enumerate()
        .map(move |(idx, raw)| {
            let start = offset;
            offset += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);
            (start, idx + 1, line)
        })
}

/// Returns the line starting at `offset`, without its terminator.
pub(crate) fn line_at(text: &str, offset: usize) -> &str {
    let rest = &text[offset..];
    let end = rest.find('\n').unwrap_or(rest.len());
    rest[..end].trim_end_matches('\r')
}

/// Treats an empty delimiter or a lone space as "no delimiter".
pub fn effective_delimiter(delimiter: Option<&str>) -> Option<&str> {
    delimiter.filter(|d| !d.is_empty() && *d != " ")
}

/// Split on runs of whitespace.
pub fn split_whitespace(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Split on `delimiter`, trimming the surrounding whitespace of every field.
///
/// A single trailing delimiter (as written by many exporters) does not produce a field.
pub fn split_delimited<'a>(line: &'a str, delimiter: &str) -> Vec<&'a str> {
    let trimmed = line.trim();
    let body = trimmed.strip_suffix(delimiter).unwrap_or(trimmed);
    if body.is_empty() {
        return Vec::new();
    }
    body.split(delimiter).map(str::trim).collect()
}

/// Split a line according to an already-established delimitation.
pub fn tokenize<'a>(
    line: &'a str,
    delimiter: Option<&str>,
    delimitation: Delimitation,
) -> Vec<&'a str> {
    match (delimitation.uses_delimiter(), delimiter) {
        (true, Some(d)) => split_delimited(line, d),
        _ => split_whitespace(line),
    }
}

/// Integer or floating point literal, including exponent form (`1`, `-2.5`, `.5`, `3e-4`).
///
/// Words such as `inf` or `NaN` are not accepted even though `f64::from_str` would take them.
pub fn is_numeric_literal(token: &str) -> bool {
    let has_digit = token.bytes().any(|b| b.is_ascii_digit());
    let charset_ok = token
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    has_digit && charset_ok && token.parse::<f64>().is_ok()
}

/// Tokens of a candidate data line, using the first scheme that yields more than one token.
///
/// An explicit delimiter is preferred over whitespace. Without one, the common delimiters are
/// tried before whitespace.
fn number_line_tokens<'a>(line: &'a str, delimiter: Option<&str>) -> Vec<&'a str> {
    match effective_delimiter(delimiter) {
        Some(d) => {
            let toks = split_delimited(line, d);
            if toks.len() > 1 {
                return toks;
            }
        }
        None => {
            for candidate in DELIMITER_CANDIDATES {
                let toks = split_delimited(line, candidate);
                if toks.len() > 1 {
                    return toks;
                }
            }
        }
    }
    split_whitespace(line)
}

/// Whether a majority of the line's tokens are numeric literals.
pub fn is_number_line(line: &str, delimiter: Option<&str>) -> bool {
    let tokens = number_line_tokens(line, delimiter);
    if tokens.is_empty() {
        return false;
    }
    let numeric = tokens.iter().filter(|t| is_numeric_literal(t)).count();
    numeric * 2 > tokens.len()
}

/// Locate the header line and the first data line.
///
/// Blank lines are skipped. The header is the last non-blank text line before the first
/// number line, so title lines above the header are tolerated.
pub fn find_line_positions(
    text: &str,
    delimiter: Option<&str>,
    lookahead: usize,
) -> AnalysisResult<LinePositions> {
    let mut header: Option<(usize, usize)> = None;

    for (offset, line_no, line) in lines_with_offsets(text).take(lookahead) {
        if line.trim().is_empty() {
            continue;
        }
        if is_number_line(line, delimiter) {
            let (header_offset, header_line) = header.ok_or(AnalysisError::MissingHeader)?;
            return Ok(LinePositions {
                header_offset,
                data_offset: offset,
                header_line,
                data_line: line_no,
            });
        }
        header = Some((offset, line_no));
    }

    match header {
        Some(_) => Err(AnalysisError::MissingData),
        None => Err(AnalysisError::MissingHeader),
    }
}

/// Pick a delimiter that splits both the header and the first data line into the same
/// number (more than one) of fields. `None` means plain whitespace.
pub fn detect_delimiter(header: &str, data: &str) -> Option<&'static str> {
    DELIMITER_CANDIDATES.into_iter().find(|candidate| {
        let h = split_delimited(header, candidate).len();
        let d = split_delimited(data, candidate).len();
        h > 1 && h == d
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_literals() {
        for tok in ["1", "-2", "+3.5", ".5", "1e-3", "2.5E+04", "0"] {
            assert!(is_numeric_literal(tok), "{tok}");
        }
        for tok in ["", "abc", "inf", "NaN", "1.2.3", "e", "-", "x1"] {
            assert!(!is_numeric_literal(tok), "{tok}");
        }
    }

    #[test]
    fn number_line_prefers_explicit_delimiter() {
        assert!(is_number_line("1,2,3", Some(",")));
        assert!(is_number_line("1 2 3", None));
        assert!(is_number_line("1, 2, 3", None));
        assert!(is_number_line("1;2.5;abc", Some(";")));
        assert!(!is_number_line("time,x,y", Some(",")));
        assert!(!is_number_line("a 1 b", None));
    }

    #[test]
    fn finds_header_and_data_after_blank_lines() {
        let text = "\n\n  \nstep x y\n\n1 0.5 2\n2 0.6 3\n";
        let pos = find_line_positions(text, None, DEFAULT_LOOKAHEAD_LINES).unwrap();
        assert_eq!(line_at(text, pos.header_offset), "step x y");
        assert_eq!(line_at(text, pos.data_offset), "1 0.5 2");
        assert_eq!(pos.header_line, 4);
        assert_eq!(pos.data_line, 6);
    }

    #[test]
    fn title_line_above_header_is_skipped() {
        let text = "Simulation run 7\nstep,x\n1,2.0\n";
        let pos = find_line_positions(text, Some(","), 10).unwrap();
        assert_eq!(line_at(text, pos.header_offset), "step,x");
    }

    #[test]
    fn data_without_header_fails() {
        let err = find_line_positions("\n1 2 3\n4 5 6\n", None, 10).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingHeader));
    }

    #[test]
    fn header_without_data_fails() {
        let err = find_line_positions("a b c\n\n", None, 10).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingData));

        let err = find_line_positions("", None, 10).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingHeader));
    }

    #[test]
    fn lookahead_cap_bounds_the_scan() {
        let mut text = String::from("a b\n");
        for _ in 0..20 {
            text.push_str("comment line\n");
        }
        text.push_str("1 2\n");
        let err = find_line_positions(&text, None, 10).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingData));
        assert!(find_line_positions(&text, None, 100).is_ok());
    }

    #[test]
    fn detects_common_delimiters() {
        assert_eq!(detect_delimiter("a,b,c", "1,2,3"), Some(","));
        assert_eq!(detect_delimiter("a; b", "1; 2"), Some(";"));
        assert_eq!(detect_delimiter("a b c", "1 2 3"), None);
        assert_eq!(detect_delimiter("a\tb", "1\t2"), Some("\t"));
    }

    #[test]
    fn split_delimited_trims_and_ignores_trailing_delimiter() {
        assert_eq!(split_delimited(" 1 , 2 ,3,", ","), vec!["1", "2", "3"]);
        assert_eq!(split_delimited("a,,b", ","), vec!["a", "", "b"]);
        assert!(split_delimited("   ", ",").is_empty());
    }
}
