//! `coldata` loads loosely formatted column data files (simulation logs, sensor dumps) and
//! computes ranged statistics and oscillation cycles over them.
//!
//! Input files are plain text: an optional preamble, one header line with column names, then
//! numeric rows. Fields are separated by whitespace, by a delimiter, or by both; the delimiter
//! is auto-detected when not given. An integer column that increases strictly is taken as the
//! timestep column and can be used to select rows by timestep.
//!
//! ## Quick example
//!
//! ```no_run
//! use coldata::analysis::run;
//! use coldata::config::{AnalysisRequest, CycleRequest};
//! use coldata::types::ColumnId;
//!
//! # fn main() -> Result<(), coldata::AnalysisError> {
//! let mut request = AnalysisRequest::new("forces.dat");
//! request.cycle = Some(CycleRequest::new(ColumnId::name("Fx"), 0.0));
//! let (_store, report) = run(&request)?;
//! for column in &report.results {
//!     println!("{}: {:?}", column.column, column.values);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Statistics can also be computed directly on an ingested store:
//!
//! ```rust
//! use coldata::ingestion::{ingest_from_str, IngestionOptions};
//! use coldata::processing::Statistic;
//! use coldata::types::ColumnId;
//!
//! let store = ingest_from_str("step  Fx\n0  1.5\n1  2.5\n", &IngestionOptions::default()).unwrap();
//! let fx = store.double_column(&ColumnId::name("Fx")).unwrap();
//! let all = store.full_range().unwrap();
//! assert_eq!(Statistic::Mean.apply(fx, all).unwrap(), 2.0);
//! assert!(store.timestep_column().is_some());
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format detection, header parsing, column classification and loading
//! - [`store`]: the column registry every computation borrows from
//! - [`processing`]: statistics, cycle extraction and spectrum
//! - [`execution`]: parallel statistics batches with metrics and observer hooks
//! - [`config`]: analysis requests (CLI or JSON)
//! - [`analysis`]: one run from request to report
//! - [`report`]: terminal, CSV and JSON rendering
//! - [`error`]: the error type shared by all of the above

pub mod analysis;
pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod report;
pub mod store;
pub mod types;

pub use error::{AnalysisError, AnalysisResult};
