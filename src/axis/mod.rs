//! Axis-regression estimator: the 1-D alternative to rectangle partitioning.
//!
//! Instead of carving up the 2-D space, every trial is classified onto the
//! axis it actually varied (the other axis rides at its maximum), and each
//! axis gets a monotonic probability curve fitted from its raw
//! `(value, success)` pairs — logistic or isotonic — with a bootstrap
//! uncertainty band. The next probe goes wherever the band is widest.

mod bootstrap;
mod isotonic;
mod logistic;

pub use bootstrap::{bootstrap_seed, BandCurve, DEFAULT_BOOTSTRAP_ROUNDS};

use serde::{Deserialize, Serialize};

use crate::report::{
    round_to, AxisAnalysis, AxisCurve, AxisCurves, FixedCounterpart, NextTrial, ThresholdRow,
    ThresholdTable, TrialCounts,
};
use crate::types::{Axis, AxisBounds, TrialRecord};

/// Grid resolution for fitted curves.
pub const GRID_POINTS: usize = 121;

/// Which regression family fits the per-axis curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisMethod {
    /// Logistic regression on normalized values.
    #[serde(rename = "axis_logistic")]
    Logistic,
    /// Isotonic regression (natively monotonic).
    #[serde(rename = "axis_isotonic")]
    Isotonic,
}

/// How the estimator decides which axis to probe next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchPolicy {
    /// Probe the axis whose band is widest.
    Uncertainty,
    /// Probe the axis with fewer observations.
    Alternate,
}

/// Raw observations attributed to one axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisSamples {
    /// Observed parameter values.
    pub x: Vec<f64>,
    /// Observed outcomes as 0.0 / 1.0.
    pub y: Vec<f64>,
}

impl AxisSamples {
    /// Number of observations.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether no observations landed on this axis.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Trial log split into per-axis observation sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisObservations {
    /// Observations that varied the size axis.
    pub size: AxisSamples,
    /// Observations that varied the saturation axis.
    pub saturation: AxisSamples,
}

impl AxisObservations {
    fn get(&self, axis: Axis) -> &AxisSamples {
        match axis {
            Axis::Size => &self.size,
            Axis::Saturation => &self.saturation,
        }
    }
}

/// Decide which axis a trial actually varied.
///
/// A trial is a size-axis observation when its saturation sits at the space
/// maximum (within tolerance) while its size does not, and symmetrically for
/// saturation. A trial at the maximum of both axes counts as saturation (the
/// fixed-counterpart corner is attributed to the axis probed second); a trial
/// at neither maximum belongs to no axis and is discarded.
pub fn infer_axis_from_trial(size: f64, saturation: f64, bounds: &AxisBounds) -> Option<Axis> {
    let size_eps = bounds.value_eps(Axis::Size);
    let sat_eps = bounds.value_eps(Axis::Saturation);
    let on_size_axis = (saturation - bounds.saturation_max).abs() <= sat_eps;
    let on_sat_axis = (size - bounds.size_max).abs() <= size_eps;

    match (on_size_axis, on_sat_axis) {
        (true, false) => Some(Axis::Size),
        (false, true) | (true, true) => Some(Axis::Saturation),
        (false, false) => None,
    }
}

/// Classify a trial log into per-axis observation sets.
pub fn split_axis_samples(trials: &[TrialRecord], bounds: &AxisBounds) -> AxisObservations {
    let mut observations = AxisObservations::default();
    for trial in trials {
        let outcome = f64::from(u8::from(trial.success));
        match infer_axis_from_trial(trial.size, trial.saturation, bounds) {
            Some(Axis::Size) => {
                observations.size.x.push(trial.size);
                observations.size.y.push(outcome);
            }
            Some(Axis::Saturation) => {
                observations.saturation.x.push(trial.saturation);
                observations.saturation.y.push(outcome);
            }
            None => {}
        }
    }
    observations
}

/// Evenly spaced evaluation grid over `[lower, upper]`, at least 3 points.
pub fn make_grid(lower: f64, upper: f64, points: usize) -> Vec<f64> {
    let points = points.max(3);
    let step = (upper - lower) / (points - 1) as f64;
    (0..points).map(|i| lower + step * i as f64).collect()
}

/// Monotonic non-decrease via a running maximum.
fn running_max(mut curve: Vec<f64>) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    for value in &mut curve {
        peak = peak.max(*value);
        *value = peak;
    }
    curve
}

/// First index of the maximum value.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Fit the configured regression family over the grid.
pub(crate) fn fit_curve(
    method: AxisMethod,
    x: &[f64],
    y: &[f64],
    grid: &[f64],
    lower: f64,
    upper: f64,
) -> Vec<f64> {
    match method {
        AxisMethod::Logistic => logistic::fit_logistic(x, y, grid, lower, upper),
        AxisMethod::Isotonic => isotonic::fit_isotonic(x, y, grid),
    }
}

/// Maximum band width over the grid, plus the pointwise width profile.
fn axis_uncertainty_score(
    method: AxisMethod,
    samples: &AxisSamples,
    grid: &[f64],
    lower: f64,
    upper: f64,
) -> (f64, Vec<f64>) {
    let band = bootstrap::bootstrap_curve(
        method,
        &samples.x,
        &samples.y,
        grid,
        lower,
        upper,
        DEFAULT_BOOTSTRAP_ROUNDS,
    );
    let widths: Vec<f64> = band
        .upper
        .iter()
        .zip(&band.lower)
        .map(|(hi, lo)| (hi - lo).max(0.0))
        .collect();
    if widths.is_empty() {
        return (1.0, vec![1.0]);
    }
    let max = widths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (max, widths)
}

/// Pick the axis to probe next.
///
/// Under [`SwitchPolicy::Uncertainty`] the axis with the larger maximum band
/// width wins; a tie (within 1e-9) falls back to the axis with fewer
/// observations. [`SwitchPolicy::Alternate`] always picks the
/// fewer-observations axis. Both prefer size on equal counts.
pub fn choose_next_axis(
    method: AxisMethod,
    policy: SwitchPolicy,
    observations: &AxisObservations,
    bounds: &AxisBounds,
) -> Axis {
    let size_count = observations.size.len();
    let sat_count = observations.saturation.len();
    let fewer = if size_count <= sat_count {
        Axis::Size
    } else {
        Axis::Saturation
    };

    if policy == SwitchPolicy::Alternate {
        return fewer;
    }

    let size_grid = make_grid(bounds.size_min, bounds.size_max, GRID_POINTS);
    let sat_grid = make_grid(bounds.saturation_min, bounds.saturation_max, GRID_POINTS);

    let (size_score, _) = axis_uncertainty_score(
        method,
        &observations.size,
        &size_grid,
        bounds.size_min,
        bounds.size_max,
    );
    let (sat_score, _) = axis_uncertainty_score(
        method,
        &observations.saturation,
        &sat_grid,
        bounds.saturation_min,
        bounds.saturation_max,
    );

    if (size_score - sat_score).abs() <= 1e-9 {
        fewer
    } else if size_score > sat_score {
        Axis::Size
    } else {
        Axis::Saturation
    }
}

/// Choose the next probe: the grid point of maximum uncertainty on the
/// chosen axis, the other axis held at its maximum.
///
/// With no observations (or a degenerate band) the axis midpoint is used.
/// The value is clamped strictly below the axis maximum so the probe cannot
/// collide with the boundary samples that anchor the other axis.
pub fn choose_next_trial(
    method: AxisMethod,
    policy: SwitchPolicy,
    trials: &[TrialRecord],
    bounds: &AxisBounds,
) -> NextTrial {
    let observations = split_axis_samples(trials, bounds);
    let axis = choose_next_axis(method, policy, &observations, bounds);

    let samples = observations.get(axis);
    let (lower, upper) = (bounds.min(axis), bounds.max(axis));
    let grid = make_grid(lower, upper, GRID_POINTS);
    let (score, widths) = axis_uncertainty_score(method, samples, &grid, lower, upper);

    let chosen = if samples.is_empty() || score <= 0.0 {
        bounds.midpoint(axis)
    } else {
        grid[argmax(&widths)]
    };
    let chosen = chosen.min(upper - bounds.value_eps(axis));

    match axis {
        Axis::Size => NextTrial {
            axis,
            size: chosen,
            saturation: bounds.saturation_max,
        },
        Axis::Saturation => NextTrial {
            axis,
            size: bounds.size_max,
            saturation: chosen,
        },
    }
}

/// Interpolate the axis value at which a monotone curve reaches `target`.
///
/// Returns the grid start when the curve begins at or above the target and
/// `None` when it never gets there; flat segments resolve to their right
/// edge.
fn threshold_for_probability(grid: &[f64], probs: &[f64], target: f64) -> Option<f64> {
    if probs.is_empty() {
        return None;
    }
    if target <= probs[0] {
        return Some(grid[0]);
    }
    if target > probs[probs.len() - 1] {
        return None;
    }

    let idx = probs.partition_point(|&p| p < target);
    if idx == 0 {
        return Some(grid[0]);
    }
    if idx >= grid.len() {
        return Some(grid[grid.len() - 1]);
    }

    let (x1, x2) = (grid[idx - 1], grid[idx]);
    let (y1, y2) = (probs[idx - 1], probs[idx]);
    if (y2 - y1).abs() < 1e-9 {
        return Some(x2);
    }
    Some(x1 + (x2 - x1) * (target - y1) / (y2 - y1))
}

fn build_axis_curve(
    method: AxisMethod,
    samples: &AxisSamples,
    lower: f64,
    upper: f64,
    decimals_x: u32,
    fixed_counterpart: FixedCounterpart,
) -> AxisCurve {
    let grid = make_grid(lower, upper, GRID_POINTS);
    let band = bootstrap::bootstrap_curve(
        method,
        &samples.x,
        &samples.y,
        &grid,
        lower,
        upper,
        DEFAULT_BOOTSTRAP_ROUNDS,
    );
    AxisCurve {
        x: grid.iter().map(|&v| round_to(v, decimals_x)).collect(),
        probability: band.base.iter().map(|&v| round_to(v, 6)).collect(),
        lower: band.lower.iter().map(|&v| round_to(v, 6)).collect(),
        upper: band.upper.iter().map(|&v| round_to(v, 6)).collect(),
        fixed_counterpart,
    }
}

fn build_thresholds(
    grid: &[f64],
    probability: &[f64],
    percent_step: u32,
    decimals_x: u32,
) -> Vec<ThresholdRow> {
    (1..)
        .map(|i| i * percent_step)
        .take_while(|&pct| pct < 100)
        .map(|pct| {
            let target = f64::from(pct) / 100.0;
            let value = threshold_for_probability(grid, probability, target)
                .map(|v| round_to(v, decimals_x));
            ThresholdRow {
                percent: pct,
                probability: round_to(target, 4),
                value,
            }
        })
        .collect()
}

/// Fit both axis curves from a trial log and assemble the analysis report:
/// curves with bands, sparse-data warnings, attribution counts, and the
/// threshold crossings at every multiple of `percent_step`.
///
/// # Panics
///
/// Panics if `percent_step` is zero.
pub fn build_axis_analysis(
    method: AxisMethod,
    trials: &[TrialRecord],
    bounds: &AxisBounds,
    percent_step: u32,
) -> AxisAnalysis {
    assert!(percent_step > 0, "percent_step must be positive");

    let observations = split_axis_samples(trials, bounds);

    let mut warnings = Vec::new();
    if observations.size.len() < 4 {
        warnings.push("size axis has sparse data; curve uncertainty is high".to_owned());
    }
    if observations.saturation.len() < 4 {
        warnings.push("saturation axis has sparse data; curve uncertainty is high".to_owned());
    }

    let size_curve = build_axis_curve(
        method,
        &observations.size,
        bounds.size_min,
        bounds.size_max,
        2,
        FixedCounterpart {
            axis: Axis::Saturation,
            value: bounds.saturation_max,
        },
    );
    let saturation_curve = build_axis_curve(
        method,
        &observations.saturation,
        bounds.saturation_min,
        bounds.saturation_max,
        4,
        FixedCounterpart {
            axis: Axis::Size,
            value: bounds.size_max,
        },
    );

    let threshold_table = ThresholdTable {
        percent_step,
        size: build_thresholds(&size_curve.x, &size_curve.probability, percent_step, 2),
        saturation: build_thresholds(
            &saturation_curve.x,
            &saturation_curve.probability,
            percent_step,
            4,
        ),
    };

    AxisAnalysis {
        warnings,
        counts: TrialCounts {
            total: observations.size.len() + observations.saturation.len(),
            size_axis_trials: observations.size.len(),
            saturation_axis_trials: observations.saturation.len(),
        },
        curves: AxisCurves {
            size: size_curve,
            saturation: saturation_curve,
        },
        threshold_table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> AxisBounds {
        AxisBounds::new(10.0, 400.0, 0.0, 1.0).unwrap()
    }

    fn trial(size: f64, saturation: f64, success: bool) -> TrialRecord {
        TrialRecord {
            size,
            saturation,
            success,
        }
    }

    #[test]
    fn classification_rules() {
        let bounds = bounds();
        // Saturation at max, size interior: size-axis observation.
        assert_eq!(
            infer_axis_from_trial(100.0, 1.0, &bounds),
            Some(Axis::Size)
        );
        // Size at max, saturation interior: saturation-axis observation.
        assert_eq!(
            infer_axis_from_trial(400.0, 0.3, &bounds),
            Some(Axis::Saturation)
        );
        // Both at max: tie-break to saturation.
        assert_eq!(
            infer_axis_from_trial(400.0, 1.0, &bounds),
            Some(Axis::Saturation)
        );
        // Neither at max: discarded.
        assert_eq!(infer_axis_from_trial(100.0, 0.3, &bounds), None);
    }

    #[test]
    fn split_respects_classification() {
        let bounds = bounds();
        let trials = vec![
            trial(100.0, 1.0, true),
            trial(200.0, 1.0, false),
            trial(400.0, 0.5, true),
            trial(50.0, 0.5, true), // interior: discarded
        ];
        let observations = split_axis_samples(&trials, &bounds);
        assert_eq!(observations.size.x, vec![100.0, 200.0]);
        assert_eq!(observations.size.y, vec![1.0, 0.0]);
        assert_eq!(observations.saturation.x, vec![0.5]);
    }

    #[test]
    fn grid_is_inclusive_and_floored_at_three() {
        let grid = make_grid(0.0, 1.0, 2);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[2], 1.0);
    }

    #[test]
    fn argmax_returns_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.5, 0.5, 0.2]), 1);
    }

    #[test]
    fn alternate_policy_picks_fewer_observations() {
        let bounds = bounds();
        let trials = vec![
            trial(100.0, 1.0, true),
            trial(200.0, 1.0, true),
            trial(400.0, 0.5, true),
        ];
        let observations = split_axis_samples(&trials, &bounds);
        let axis = choose_next_axis(
            AxisMethod::Isotonic,
            SwitchPolicy::Alternate,
            &observations,
            &bounds,
        );
        assert_eq!(axis, Axis::Saturation);
    }

    #[test]
    fn no_observations_probes_midpoint_of_size_axis() {
        let bounds = bounds();
        let next = choose_next_trial(
            AxisMethod::Isotonic,
            SwitchPolicy::Uncertainty,
            &[],
            &bounds,
        );
        // Empty axes tie at the prior band width; size wins the count tie,
        // and with no data the probe lands at the midpoint.
        assert_eq!(next.axis, Axis::Size);
        assert_eq!(next.size, 205.0);
        assert_eq!(next.saturation, 1.0);
    }

    #[test]
    fn chosen_value_stays_below_axis_maximum() {
        let bounds = bounds();
        let mut trials = Vec::new();
        for i in 0..10 {
            trials.push(trial(400.0, 0.05 + 0.1 * f64::from(i), true));
        }
        let next = choose_next_trial(
            AxisMethod::Isotonic,
            SwitchPolicy::Uncertainty,
            &trials,
            &bounds,
        );
        match next.axis {
            Axis::Size => assert!(next.size < 400.0),
            Axis::Saturation => assert!(next.saturation < 1.0),
        }
    }

    #[test]
    fn threshold_interpolation() {
        let grid = vec![0.0, 1.0, 2.0, 3.0];
        let probs = vec![0.2, 0.4, 0.8, 0.9];
        // Below the curve start: grid start.
        assert_eq!(threshold_for_probability(&grid, &probs, 0.1), Some(0.0));
        // Interpolated halfway between 0.4 and 0.8.
        assert_eq!(threshold_for_probability(&grid, &probs, 0.6), Some(1.5));
        // Never reached.
        assert_eq!(threshold_for_probability(&grid, &probs, 0.95), None);
        // Exact hit on a grid value.
        assert_eq!(threshold_for_probability(&grid, &probs, 0.8), Some(2.0));
    }

    #[test]
    fn flat_segment_resolves_to_right_edge() {
        let grid = vec![0.0, 1.0, 2.0];
        let probs = vec![0.2, 0.5, 0.5 + 1e-12];
        assert_eq!(threshold_for_probability(&grid, &probs, 0.5 + 1e-13), Some(2.0));
    }

    #[test]
    fn analysis_report_shape() {
        let bounds = bounds();
        let mut trials = Vec::new();
        for i in 0..12 {
            let size = 40.0 + 30.0 * f64::from(i);
            trials.push(trial(size, 1.0, size > 150.0));
        }
        for i in 0..3 {
            trials.push(trial(400.0, 0.2 + 0.2 * f64::from(i), true));
        }
        let analysis = build_axis_analysis(AxisMethod::Isotonic, &trials, &bounds, 5);
        assert_eq!(analysis.counts.size_axis_trials, 12);
        assert_eq!(analysis.counts.saturation_axis_trials, 3);
        assert_eq!(analysis.counts.total, 15);
        // Only the saturation axis is sparse.
        assert_eq!(analysis.warnings.len(), 1);
        assert!(analysis.warnings[0].contains("saturation"));
        assert_eq!(analysis.curves.size.x.len(), GRID_POINTS);
        // 5, 10, ..., 95.
        assert_eq!(analysis.threshold_table.size.len(), 19);
        assert_eq!(
            analysis.curves.size.fixed_counterpart,
            FixedCounterpart {
                axis: Axis::Saturation,
                value: 1.0
            }
        );
    }

    #[test]
    fn fitted_curves_are_monotone() {
        let bounds = bounds();
        let mut trials = Vec::new();
        for i in 0..30 {
            let size = 10.0 + 13.0 * f64::from(i);
            trials.push(trial(size, 1.0, i % 3 != 0 && size > 100.0));
        }
        for method in [AxisMethod::Logistic, AxisMethod::Isotonic] {
            let analysis = build_axis_analysis(method, &trials, &bounds, 10);
            for pair in analysis.curves.size.probability.windows(2) {
                assert!(pair[1] >= pair[0]);
            }
        }
    }
}
