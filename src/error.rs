use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type used across the crate.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Pointer appended to user-facing error reports.
pub const HELP_POINTER: &str = "Please use the option -h or --help for additional information, \
or consult the documentation.";

/// Error type returned by ingestion, statistics and cycle analysis.
///
/// Every variant is terminal to the operation that raised it; nothing is retried internally.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Underlying I/O error (e.g. input file missing, output file not writable).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error while exporting results.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error for requests or reports.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Mutually exclusive or missing options.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// No header line was found before the lookahead limit.
    #[error("the header line is missing in the file")]
    MissingHeader,

    /// A header was found but no numeric data line follows it.
    #[error("no numeric data lines were found after the header line")]
    MissingData,

    /// The header line cannot be split by any delimitation scheme.
    #[error("an incorrect format has been used for the header line: '{line}'")]
    HeaderFormatIncorrect { line: String },

    /// Header and data zones use different delimitation schemes.
    #[error("header delimitation ({header}) does not match data delimitation ({data})")]
    DelimitationMismatch { header: String, data: String },

    /// A data row has a different number of fields than the header.
    #[error(
        "incorrect delimiter or data format at line {line}: expected {expected} columns, found {found}"
    )]
    DlmFormatIncorrect {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A token in a numeric column is not a numeric literal.
    #[error("incorrect numeric data at line {line} column '{column}' (raw='{raw}')")]
    DataFormatIncorrect {
        line: usize,
        column: String,
        raw: String,
    },

    /// Two columns share the same name.
    #[error("column name '{name}' is repeated; please rename one of the columns")]
    DuplicateColumnName { name: String },

    /// No column with the requested name or number exists.
    #[error("requested column '{column}' not found")]
    ColumnNotFound { column: String },

    /// The column exists but cannot be used as a data column (e.g. it is the timestep column).
    #[error("requested column '{column}' is not a data column: {reason}")]
    ColumnAbsent { column: String, reason: String },

    /// Requested row range is outside the data or reversed.
    #[error("requested range of rows {begin}..={end} is invalid for {row_count} rows")]
    RowRangeInvalid {
        begin: usize,
        end: usize,
        row_count: usize,
    },

    /// Requested timestep range is reversed.
    #[error("requested range of timesteps {begin}..={end} is invalid")]
    TimestepRangeInvalid { begin: i64, end: i64 },

    /// Requested first timestep is below the smallest timestep in the file.
    #[error("timestep {requested} is less than the smallest timestep {min} in the file")]
    TimestepTooSmall { requested: i64, min: i64 },

    /// Requested last timestep is above the largest timestep in the file.
    #[error("timestep {requested} is larger than the largest timestep {max} in the file")]
    TimestepTooLarge { requested: i64, max: i64 },

    /// No unique, strictly increasing timestep column was identified.
    #[error("a consistent timestep column was not identified in the input file")]
    DataTimestepInconsistent,

    /// Fewer complete cycles than requested exist in the range.
    #[error("requested {requested} cycles but only {available} are available for column '{column}'")]
    CycleNotAvailable {
        column: String,
        requested: usize,
        available: usize,
    },

    /// The signal never crosses the center value in the range.
    #[error("data of column '{column}' does not cross the center value {center} in this range")]
    DataInvalid { column: String, center: f64 },

    /// One or more output destinations could not be written.
    #[error("failed to write {} output destination(s): {}", failures.len(), describe_failures(failures))]
    Output {
        /// Destinations that were written despite the failures.
        written: Vec<PathBuf>,
        failures: Vec<OutputFailure>,
    },
}

/// A single failed output destination.
#[derive(Debug)]
pub struct OutputFailure {
    /// Destination that failed.
    pub path: PathBuf,
    /// Error message for the failure.
    pub message: String,
}

fn describe_failures(failures: &[OutputFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path.display(), f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coarse error taxonomy used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    FileFormat,
    DataFormat,
    ColumnNotFound,
    Range,
    CycleNotAvailable,
    DataInvalid,
    Io,
}

impl AnalysisError {
    /// Shorthand for a [`AnalysisError::Configuration`] error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Category of this error in the reporting taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::Io(_)
            | AnalysisError::Csv(_)
            | AnalysisError::Output { .. } => ErrorCategory::Io,
            AnalysisError::Json(_) | AnalysisError::Configuration { .. } => {
                ErrorCategory::Configuration
            }
            AnalysisError::MissingHeader
            | AnalysisError::MissingData
            | AnalysisError::HeaderFormatIncorrect { .. }
            | AnalysisError::DelimitationMismatch { .. }
            | AnalysisError::DlmFormatIncorrect { .. }
            | AnalysisError::DuplicateColumnName { .. } => ErrorCategory::FileFormat,
            AnalysisError::DataFormatIncorrect { .. } => ErrorCategory::DataFormat,
            AnalysisError::ColumnNotFound { .. } | AnalysisError::ColumnAbsent { .. } => {
                ErrorCategory::ColumnNotFound
            }
            AnalysisError::RowRangeInvalid { .. }
            | AnalysisError::TimestepRangeInvalid { .. }
            | AnalysisError::TimestepTooSmall { .. }
            | AnalysisError::TimestepTooLarge { .. }
            | AnalysisError::DataTimestepInconsistent => ErrorCategory::Range,
            AnalysisError::CycleNotAvailable { .. } => ErrorCategory::CycleNotAvailable,
            AnalysisError::DataInvalid { .. } => ErrorCategory::DataInvalid,
        }
    }

    /// Human-readable message followed by the standard help pointer.
    pub fn user_message(&self) -> String {
        format!("{self}\n\t{HELP_POINTER}")
    }
}
