//! Ingestion: from loosely formatted text to an indexed [`crate::store::ColumnStore`].
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - locates the header and first data line, auto-detecting the delimiter if none is given
//! - types each column from a bounded sample and picks the timestep column
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The individual stages are also available under:
//! - [`format`]
//! - [`header`]
//! - [`classify`]

pub mod classify;
pub mod format;
pub mod header;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    LogObserver,
};
pub use unified::{ingest_from_path, ingest_from_reader, ingest_from_str, IngestionOptions};
