//! Descriptive statistics used by both tools.
//!
//! Thin wrappers over `statrs` so that callers share one set of conventions:
//! `std_population` divides by `n`, `std_sample` by `n - 1`, and undefined
//! results are `NaN` rather than errors so that reports can still be printed.

use statrs::statistics::Statistics;

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.mean()
}

/// Standard deviation with `ddof = 0`.
pub fn std_population(values: &[f64]) -> f64 {
    values.population_std_dev()
}

/// Standard deviation with `ddof = 1`; `NaN` for fewer than two values.
pub fn std_sample(values: &[f64]) -> f64 {
    values.std_dev()
}

/// `NaN` when empty.
pub fn max(values: &[f64]) -> f64 {
    Statistics::max(values)
}

pub fn min(values: &[f64]) -> f64 {
    Statistics::min(values)
}

/// Pearson product-moment correlation of two equally long vectors.
///
/// Returns `NaN` when the lengths differ, fewer than two pairs are given, or
/// either vector has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    // statrs panics on unequal lengths
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }

    let denom = x.std_dev() * y.std_dev();
    if denom == 0.0 || !denom.is_finite() {
        return f64::NAN;
    }
    // Rounding can push |r| a hair above one
    (x.covariance(y) / denom).clamp(-1.0, 1.0)
}

/// Fixed-width histogram over `[lo, hi]` with the last bin closed on the right.
#[derive(Debug, Clone)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `n_bins` equal-width bins spanning `[lo, hi]`.
    /// Values outside the range are ignored.
    pub fn with_range(values: &[f64], n_bins: usize, lo: f64, hi: f64) -> Self {
        let n_bins = n_bins.max(1);
        let width = (hi - lo) / n_bins as f64;
        let edges = (0..=n_bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0u64; n_bins];

        for &v in values {
            if !(v >= lo && v <= hi) {
                continue;
            }
            let idx = if v == hi {
                n_bins - 1
            } else {
                (((v - lo) / width).floor() as usize).min(n_bins - 1)
            };
            counts[idx] += 1;
        }

        Self { edges, counts }
    }

    /// Bin `values` over their own `[min, max]`. A degenerate range `v`
    /// is widened to `[v - 0.5, v + 0.5]`, an empty input to `[0, 1]`.
    pub fn auto(values: &[f64], n_bins: usize) -> Self {
        let (lo, hi) = if values.is_empty() {
            (0.0, 1.0)
        } else {
            let lo = min(values);
            let hi = max(values);
            if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) }
        };
        Self::with_range(values, n_bins, lo, hi)
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Bin heights normalised so that the histogram integrates to one.
    pub fn density(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&c, w)| {
                let width = w[1] - w[0];
                if total == 0.0 || width == 0.0 {
                    0.0
                } else {
                    c as f64 / (total * width)
                }
            })
            .collect()
    }
}
