//! One-sided amplitude spectrum of a column window.

use num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;

use crate::error::AnalysisResult;
use crate::types::{DoubleColumn, RowRange};

/// One frequency bin of a forward FFT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumBin {
    /// Bin frequency, `k / (n * dt)`.
    pub frequency: f64,
    /// Single-sided amplitude, `2 * |X_k| / n`.
    pub magnitude: f64,
    /// Phase in radians.
    pub phase: f64,
    #[serde(skip)]
    pub value: Complex<f64>,
}

/// Bins `0..=n/2` of the transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    pub column: String,
    pub rows: RowRange,
    pub sample_interval: f64,
    pub bins: Vec<SpectrumBin>,
}

impl Spectrum {
    /// The `k` bins with the largest magnitude, largest first. The DC bin is skipped.
    pub fn dominant(&self, k: usize) -> Vec<&SpectrumBin> {
        let mut bins: Vec<&SpectrumBin> = self.bins.iter().skip(1).collect();
        bins.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        bins.truncate(k);
        bins
    }
}

/// Forward FFT of `column` over `range`. `sample_interval` defaults to 1 row.
pub fn spectrum(
    column: &DoubleColumn,
    range: RowRange,
    sample_interval: Option<f64>,
) -> AnalysisResult<Spectrum> {
    range.validate(column.len())?;
    let samples = column.slice(range);
    let n = samples.len();
    let dt = sample_interval.filter(|dt| *dt > 0.0).unwrap_or(1.0);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut buffer);
    log::debug!("fft of '{}' over {n} samples (dt={dt})", column.name());

    let bins = buffer
        .iter()
        .take(n / 2 + 1)
        .enumerate()
        .map(|(k, x)| SpectrumBin {
            frequency: k as f64 / (n as f64 * dt),
            magnitude: 2.0 * x.norm() / n as f64,
            phase: x.arg(),
            value: *x,
        })
        .collect();

    Ok(Spectrum {
        column: column.name().to_string(),
        rows: range,
        sample_interval: dt,
        bins,
    })
}
