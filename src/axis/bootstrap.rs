//! Bootstrap confidence bands around a fitted probability curve.
//!
//! Resampling is seeded deterministically from the observation count and the
//! success total, so the same trial log always produces the same band. The
//! derivation matches the original estimator; curves are still not expected
//! to be bit-identical across implementations with different generators.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::statistics::compute_quantile;

use super::AxisMethod;

/// Bootstrap resampling rounds used by default.
pub const DEFAULT_BOOTSTRAP_ROUNDS: usize = 64;

/// Band percentiles: 10th and 90th.
const BAND_LO: f64 = 0.1;
const BAND_HI: f64 = 0.9;

/// Fixed half-width used when there is too little data to resample.
const SPARSE_SPREAD: f64 = 0.2;

/// A fitted probability curve with its pointwise uncertainty band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandCurve {
    /// Curve fitted on the full data.
    pub base: Vec<f64>,
    /// 10th-percentile bootstrap curve.
    pub lower: Vec<f64>,
    /// 90th-percentile bootstrap curve.
    pub upper: Vec<f64>,
}

/// Deterministic bootstrap seed from the sample count and success total.
pub fn bootstrap_seed(observations: usize, successes: u64) -> u64 {
    observations as u64 * 7919 + successes * 104_729
}

/// Fit `method` on `(x, y)` and surround it with a bootstrap band over `grid`.
///
/// With no observations the band is a fixed prior (0.5 with a [0.25, 0.75]
/// band); with fewer than 4 the base curve gets a flat +-0.2 band instead of
/// resampling.
pub(crate) fn bootstrap_curve(
    method: AxisMethod,
    x: &[f64],
    y: &[f64],
    grid: &[f64],
    lower: f64,
    upper: f64,
    rounds: usize,
) -> BandCurve {
    if x.is_empty() {
        return BandCurve {
            base: vec![0.5; grid.len()],
            lower: vec![0.25; grid.len()],
            upper: vec![0.75; grid.len()],
        };
    }

    let base = super::fit_curve(method, x, y, grid, lower, upper);

    if x.len() < 4 {
        return sparse_band(base);
    }

    let successes: f64 = y.iter().sum();
    let seed = bootstrap_seed(x.len(), successes as u64);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let n = x.len();
    let mut curves: Vec<Vec<f64>> = Vec::with_capacity(rounds);
    let mut bx = vec![0.0; n];
    let mut by = vec![0.0; n];
    for _ in 0..rounds {
        for slot in 0..n {
            let pick = rng.random_range(0..n);
            bx[slot] = x[pick];
            by[slot] = y[pick];
        }
        curves.push(super::fit_curve(method, &bx, &by, grid, lower, upper));
    }

    if curves.is_empty() {
        return sparse_band(base);
    }

    let mut band_lower = Vec::with_capacity(grid.len());
    let mut band_upper = Vec::with_capacity(grid.len());
    let mut column = vec![0.0; curves.len()];
    for point in 0..grid.len() {
        for (row, curve) in curves.iter().enumerate() {
            column[row] = curve[point];
        }
        band_lower.push(compute_quantile(&mut column, BAND_LO));
        band_upper.push(compute_quantile(&mut column, BAND_HI));
    }

    BandCurve {
        base,
        lower: band_lower,
        upper: band_upper,
    }
}

fn sparse_band(base: Vec<f64>) -> BandCurve {
    let lower = base
        .iter()
        .map(|&p| (p - SPARSE_SPREAD).clamp(0.0, 1.0))
        .collect();
    let upper = base
        .iter()
        .map(|&p| (p + SPARSE_SPREAD).clamp(0.0, 1.0))
        .collect();
    BandCurve { base, lower, upper }
}
