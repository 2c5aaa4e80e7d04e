//! Ranged statistics over a [`crate::types::DoubleColumn`].
//!
//! Every function validates the range first and never mutates the column. `mean`,
//! `quadratic_mean` and `cubic_mean` are O(1) thanks to the column's prefix arrays; the
//! extrema and `fluctuation_rms` scan the range.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{DoubleColumn, RowRange};

fn checked(column: &DoubleColumn, range: RowRange) -> AnalysisResult<&[f64]> {
    range.validate(column.len())?;
    Ok(column.slice(range))
}

/// Largest value in the range.
pub fn max(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    let values = checked(column, range)?;
    Ok(values[1..].iter().fold(values[0], |acc, &v| if v > acc { v } else { acc }))
}

/// Smallest value in the range.
pub fn min(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    let values = checked(column, range)?;
    Ok(values[1..].iter().fold(values[0], |acc, &v| if v < acc { v } else { acc }))
}

/// Largest absolute value in the range.
pub fn abs_max(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    let values = checked(column, range)?;
    Ok(values
        .iter()
        .map(|v| v.abs())
        .fold(values[0].abs(), f64::max))
}

/// Smallest absolute value in the range.
pub fn abs_min(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    let values = checked(column, range)?;
    Ok(values
        .iter()
        .map(|v| v.abs())
        .fold(values[0].abs(), f64::min))
}

/// Arithmetic mean, `sum(range) / count`.
pub fn mean(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    range.validate(column.len())?;
    Ok(column.sum(range) / range.len() as f64)
}

/// Quadratic mean (RMS), `sqrt(sum_of_squares / count)`.
pub fn quadratic_mean(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    range.validate(column.len())?;
    Ok((column.sum_of_squares(range) / range.len() as f64).sqrt())
}

/// RMS of the deviations from the mean.
///
/// The squared deviations are summed by rescanning the range with the mean from [`mean`]
/// rather than derived from the prefix arrays, which keeps full precision for signals with
/// a large offset.
pub fn fluctuation_rms(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    let m = mean(column, range)?;
    Ok((column.sum_of_squared_deviations(m, range) / range.len() as f64).sqrt())
}

/// Cubic mean, `cbrt(sum_of_cubes / count)`.
pub fn cubic_mean(column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
    range.validate(column.len())?;
    Ok((column.sum_of_cubes(range) / range.len() as f64).cbrt())
}

/// Statistic kinds, mapped to their implementation by [`Statistic::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Statistic {
    Min,
    Max,
    #[serde(alias = "absmin")]
    AbsMin,
    #[serde(alias = "absmax")]
    AbsMax,
    Mean,
    #[serde(alias = "rms")]
    QuadraticMean,
    #[serde(alias = "frms")]
    FluctuationRms,
    CubicMean,
}

impl Statistic {
    /// Every statistic in display order.
    pub const ALL: [Statistic; 8] = [
        Statistic::Min,
        Statistic::Max,
        Statistic::AbsMin,
        Statistic::AbsMax,
        Statistic::Mean,
        Statistic::QuadraticMean,
        Statistic::FluctuationRms,
        Statistic::CubicMean,
    ];

    /// Compute this statistic over `range` of `column`.
    pub fn apply(self, column: &DoubleColumn, range: RowRange) -> AnalysisResult<f64> {
        let f: fn(&DoubleColumn, RowRange) -> AnalysisResult<f64> = match self {
            Statistic::Min => min,
            Statistic::Max => max,
            Statistic::AbsMin => abs_min,
            Statistic::AbsMax => abs_max,
            Statistic::Mean => mean,
            Statistic::QuadraticMean => quadratic_mean,
            Statistic::FluctuationRms => fluctuation_rms,
            Statistic::CubicMean => cubic_mean,
        };
        f(column, range)
    }

    /// Identifier accepted by [`FromStr`].
    pub fn id(self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::AbsMin => "absmin",
            Statistic::AbsMax => "absmax",
            Statistic::Mean => "mean",
            Statistic::QuadraticMean => "rms",
            Statistic::FluctuationRms => "frms",
            Statistic::CubicMean => "cubic-mean",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Statistic::Min => "Minimum",
            Statistic::Max => "Maximum",
            Statistic::AbsMin => "Absolute minimum",
            Statistic::AbsMax => "Absolute maximum",
            Statistic::Mean => "Mean",
            Statistic::QuadraticMean => "Quadratic mean (RMS)",
            Statistic::FluctuationRms => "Fluctuation RMS",
            Statistic::CubicMean => "Cubic mean",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Statistic {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "absmin" | "abs-min" => Ok(Statistic::AbsMin),
            "absmax" | "abs-max" => Ok(Statistic::AbsMax),
            "mean" => Ok(Statistic::Mean),
            "rms" | "quadratic-mean" => Ok(Statistic::QuadraticMean),
            "frms" | "fluctuation-rms" => Ok(Statistic::FluctuationRms),
            "cubic-mean" | "cubicmean" => Ok(Statistic::CubicMean),
            other => Err(AnalysisError::configuration(format!(
                "an invalid calculation name has been specified: '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column() -> DoubleColumn {
        DoubleColumn::new(1, "x", vec![2.0, -4.0, 1.0, 3.0, -0.5])
    }

    #[test]
    fn extrema_over_ranges() {
        let c = column();
        let all = RowRange::new(0, 4);
        assert_eq!(max(&c, all).unwrap(), 3.0);
        assert_eq!(min(&c, all).unwrap(), -4.0);
        assert_eq!(abs_max(&c, all).unwrap(), 4.0);
        assert_eq!(abs_min(&c, all).unwrap(), 0.5);
        assert_eq!(max(&c, RowRange::new(1, 2)).unwrap(), 1.0);
        assert_eq!(min(&c, RowRange::new(3, 3)).unwrap(), 3.0);
    }

    #[test]
    fn extrema_are_ordered_for_every_range() {
        let c = column();
        for b in 0..c.len() {
            for e in b..c.len() {
                let r = RowRange::new(b, e);
                assert!(max(&c, r).unwrap() >= min(&c, r).unwrap());
                let (amax, amin) = (abs_max(&c, r).unwrap(), abs_min(&c, r).unwrap());
                assert!(amax >= amin && amin >= 0.0);
            }
        }
    }

    #[test]
    fn mean_equals_prefix_sum_over_count() {
        let c = column();
        let r = RowRange::new(1, 3);
        assert_eq!(mean(&c, r).unwrap(), c.sum(r) / 3.0);
        assert_eq!(mean(&c, r).unwrap(), 0.0);
    }

    #[test]
    fn rms_variants() {
        let c = DoubleColumn::new(1, "x", vec![1.0, -1.0, 1.0, -1.0]);
        let r = RowRange::new(0, 3);
        assert!((quadratic_mean(&c, r).unwrap() - 1.0).abs() < 1e-12);
        assert!((fluctuation_rms(&c, r).unwrap() - 1.0).abs() < 1e-12);

        let offset = DoubleColumn::new(1, "y", vec![11.0, 9.0, 11.0, 9.0]);
        assert!((fluctuation_rms(&offset, r).unwrap() - 1.0).abs() < 1e-12);
        assert!((quadratic_mean(&offset, r).unwrap() - 101.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn cubic_mean_keeps_sign() {
        let c = DoubleColumn::new(1, "x", vec![-2.0, -2.0]);
        assert!((cubic_mean(&c, RowRange::new(0, 1)).unwrap() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn reversed_or_out_of_bounds_range_is_rejected() {
        let c = column();
        for stat in Statistic::ALL {
            assert!(matches!(
                stat.apply(&c, RowRange::new(5, 2)),
                Err(AnalysisError::RowRangeInvalid { .. })
            ));
            assert!(matches!(
                stat.apply(&c, RowRange::new(0, 5)),
                Err(AnalysisError::RowRangeInvalid { .. })
            ));
        }
    }

    #[test]
    fn ids_round_trip_through_from_str() {
        for stat in Statistic::ALL {
            assert_eq!(stat.id().parse::<Statistic>().unwrap(), stat);
        }
        assert_eq!("quadratic-mean".parse::<Statistic>().unwrap(), Statistic::QuadraticMean);
        assert!("median".parse::<Statistic>().is_err());
    }
}
