//! Behavioral tests for the axis-regression estimator.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use threshold_oracle::axis::{
    build_axis_analysis, choose_next_trial, infer_axis_from_trial, split_axis_samples, AxisMethod,
    SwitchPolicy, GRID_POINTS,
};
use threshold_oracle::{Axis, AxisBounds, TrialRecord};

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

/// Noisy ramp along the size axis at maximum saturation.
fn size_axis_log(seed: u64, n: usize) -> Vec<TrialRecord> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let size = 10.0 + 390.0 * (i as f64 / (n - 1) as f64);
            let p = 0.25 + 0.75 * (size - 10.0) / 390.0;
            trial(size, 1.0, rng.random::<f64>() < p)
        })
        .collect()
}

#[test]
fn classification_tie_break_and_discard() {
    let bounds = bounds();
    assert_eq!(infer_axis_from_trial(120.0, 1.0, &bounds), Some(Axis::Size));
    assert_eq!(
        infer_axis_from_trial(400.0, 0.4, &bounds),
        Some(Axis::Saturation)
    );
    // Corner sample: attributed to saturation, never to both.
    assert_eq!(
        infer_axis_from_trial(400.0, 1.0, &bounds),
        Some(Axis::Saturation)
    );
    assert_eq!(infer_axis_from_trial(120.0, 0.4, &bounds), None);

    // Tolerance is relative to the axis range.
    assert_eq!(
        infer_axis_from_trial(120.0, 1.0 - 0.5e-4, &bounds),
        Some(Axis::Size)
    );
}

#[test]
fn discarded_trials_appear_on_neither_axis() {
    let bounds = bounds();
    let trials = vec![
        trial(100.0, 1.0, true),
        trial(55.0, 0.7, false),
        trial(400.0, 0.7, true),
    ];
    let observations = split_axis_samples(&trials, &bounds);
    assert_eq!(observations.size.len(), 1);
    assert_eq!(observations.saturation.len(), 1);
}

#[test]
fn both_fits_produce_monotone_curves() {
    let bounds = bounds();
    let trials = size_axis_log(31, 80);
    for method in [AxisMethod::Logistic, AxisMethod::Isotonic] {
        let analysis = build_axis_analysis(method, &trials, &bounds, 5);
        let curve = &analysis.curves.size.probability;
        assert_eq!(curve.len(), GRID_POINTS);
        for pair in curve.windows(2) {
            assert!(pair[1] >= pair[0], "curve decreased under {method:?}");
        }
    }
}

#[test]
fn threshold_table_tracks_the_ramp() {
    let bounds = bounds();
    let trials = size_axis_log(47, 400);
    let analysis = build_axis_analysis(AxisMethod::Isotonic, &trials, &bounds, 5);

    let table = &analysis.threshold_table.size;
    assert_eq!(table.len(), 19);
    // Low targets are reached early, and crossings move right with the
    // target.
    let crossings: Vec<f64> = table.iter().filter_map(|row| row.value).collect();
    assert!(crossings.len() >= 10, "most targets should be reachable");
    for pair in crossings.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    // The underlying ramp tops out near 1.0 at the axis maximum, so a 50%
    // crossing must exist and sit inside the axis range.
    let mid = table.iter().find(|row| row.percent == 50).unwrap();
    let value = mid.value.expect("50% crossing must exist");
    assert!(value > 10.0 && value < 400.0);
}

#[test]
fn sparse_axis_produces_warning_and_wide_band() {
    let bounds = bounds();
    let trials = vec![
        trial(100.0, 1.0, false),
        trial(300.0, 1.0, true),
        trial(400.0, 0.5, true),
    ];
    let analysis = build_axis_analysis(AxisMethod::Logistic, &trials, &bounds, 10);
    assert_eq!(analysis.warnings.len(), 2);

    // The sparse fallback band has the fixed +-0.2 spread.
    let curve = &analysis.curves.size;
    for ((lo, hi), base) in curve.lower.iter().zip(&curve.upper).zip(&curve.probability) {
        assert!(*lo >= base - 0.2 - 1e-9);
        assert!(*hi <= base + 0.2 + 1e-9);
    }
}

#[test]
fn analysis_is_deterministic_for_a_given_log() {
    let bounds = bounds();
    let trials = size_axis_log(53, 60);
    let a = build_axis_analysis(AxisMethod::Logistic, &trials, &bounds, 5);
    let b = build_axis_analysis(AxisMethod::Logistic, &trials, &bounds, 5);
    assert_eq!(a, b);
}

#[test]
fn uncertainty_policy_probes_strictly_inside_the_axis() {
    let bounds = bounds();
    for method in [AxisMethod::Logistic, AxisMethod::Isotonic] {
        let mut trials = size_axis_log(61, 20);
        // A few saturation-axis observations so both axes carry data.
        trials.push(trial(400.0, 0.2, false));
        trials.push(trial(400.0, 0.6, true));
        trials.push(trial(400.0, 0.9, true));

        let next = choose_next_trial(method, SwitchPolicy::Uncertainty, &trials, &bounds);
        match next.axis {
            Axis::Size => {
                assert!(next.size < bounds.size_max);
                assert_eq!(next.saturation, bounds.saturation_max);
            }
            Axis::Saturation => {
                assert!(next.saturation < bounds.saturation_max);
                assert_eq!(next.size, bounds.size_max);
            }
        }
    }
}

#[test]
fn alternate_policy_balances_axis_counts() {
    let bounds = bounds();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(71);
    let mut trials: Vec<TrialRecord> = Vec::new();

    for _ in 0..40 {
        let next = choose_next_trial(
            AxisMethod::Isotonic,
            SwitchPolicy::Alternate,
            &trials,
            &bounds,
        );
        let success = rng.random::<f64>() < 0.7;
        trials.push(trial(next.size, next.saturation, success));
    }

    let observations = split_axis_samples(&trials, &bounds);
    // Probes clamped to the guard band beside the axis maximum can
    // tie-break onto the other class, so allow a small imbalance.
    let diff = observations.size.len().abs_diff(observations.saturation.len());
    assert!(
        diff <= 4,
        "alternation drifted: {} size vs {} saturation",
        observations.size.len(),
        observations.saturation.len()
    );
}
