//! Computations over a loaded [`crate::store::ColumnStore`].
//!
//! - [`stats`]: ranged statistics (extrema, means, RMS variants)
//! - [`cycle`]: oscillation cycles, crests/troughs and peak reductions
//! - [`spectrum`]: one-sided FFT amplitude spectrum
//!
//! ## Example
//!
//! ```rust
//! use coldata::processing::{extract_cycles_from, CycleParams, Statistic, TimeAxis};
//! use coldata::types::{DoubleColumn, RowRange};
//!
//! let col = DoubleColumn::new(1, "x", vec![1.0, -1.0, 1.0, -1.0, 1.0]);
//! let all = RowRange::new(0, 4);
//! assert_eq!(Statistic::Mean.apply(&col, all).unwrap(), 0.2);
//!
//! let cycles = extract_cycles_from(&col, &CycleParams::new(0.0, all), TimeAxis::Unknown).unwrap();
//! assert_eq!(cycles.cycle_count, 2);
//! assert_eq!(cycles.rows, RowRange::new(0, 3));
//! ```

pub mod cycle;
pub mod spectrum;
pub mod stats;

pub use cycle::{extract_cycles, extract_cycles_from, CycleData, CycleInit, CycleParams, TimeAxis, TimeBasis};
pub use spectrum::{spectrum, Spectrum, SpectrumBin};
pub use stats::Statistic;
