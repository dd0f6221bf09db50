//! Sample aggregation: reduces one column's item values to a sum and the
//! reference total the column is drawn against.

use crate::utils::{frexp_exponent, pow2_saturating};

/// Sum of all strictly positive values. NaN and non-positive values are
/// ignored. The result saturates at `f64::MAX`.
pub fn compute_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    for &value in values {
        if value > 0.0 {
            sum += value;
            if !(sum <= f64::MAX) {
                return f64::MAX;
            }
        }
    }
    sum
}

/// Aggregated form of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub sum: f64,
    /// Reference magnitude, never below `sum` and never infinite.
    pub total: f64,
    /// `log2(total)` for dynamic charts, 0 for percent charts.
    pub scale_exp: i16,
}

impl Aggregate {
    /// Number of lit dots in a column `height` rows tall (8 dots per row),
    /// rounded up. A positive sum always lights at least one dot.
    pub fn num_dots(&self, height: u16) -> u32 {
        dots_for(self.sum, self.total, height)
    }
}

pub(crate) fn dots_for(sum: f64, total: f64, height: u16) -> u32 {
    let max_dots = u32::from(height) * 8;
    if !(sum > 0.0) || !(total > 0.0) {
        return 0;
    }
    let ratio = (sum / total).min(1.0);
    let dots = (ratio * f64::from(max_dots)).ceil() as u32;
    dots.clamp(1, max_dots)
}

/// Computes sums and totals, keeping the auto-growing percent total
/// between samples.
#[derive(Debug, Clone)]
pub struct SampleAggregator {
    /// Configured total for percent charts; 0 or below means dynamic scale.
    total: f64,
}

impl SampleAggregator {
    pub fn new(configured_total: f64) -> Self {
        Self {
            total: if configured_total > 0.0 {
                configured_total
            } else {
                0.0
            },
        }
    }

    pub fn is_percent(&self) -> bool {
        self.total > 0.0
    }

    pub fn aggregate(&mut self, values: &[f64]) -> Aggregate {
        let sum = compute_sum(values);
        debug_assert!((0.0..=f64::MAX).contains(&sum));

        if self.is_percent() {
            if sum > self.total {
                self.total = sum;
            }
            return Aggregate {
                sum,
                total: self.total,
                scale_exp: 0,
            };
        }

        let exp = frexp_exponent(sum).clamp(0, i32::from(i16::MAX));
        Aggregate {
            sum,
            total: pow2_saturating(exp),
            scale_exp: exp as i16,
        }
    }
}
