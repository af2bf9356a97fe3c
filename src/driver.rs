//! Closure-driven search loops.
//!
//! The engine itself only answers "what next?" and "what happened?"; these
//! helpers wire those two calls to a responder closure so tuning harnesses
//! and simulations can run a whole session in one call. The responder is
//! anything that maps a stimulus to a binary outcome — a synthetic
//! [`ProbabilityModel`](crate::sim::ProbabilityModel) or a live subject.

use rand::Rng;

use crate::config::{PretestConfig, SplitPolicy};
use crate::error::ConfigError;
use crate::partition::{PartitionState, Rectangle};
use crate::pretest::{PretestState, PretestTrial};
use crate::types::{TrialPoint, TrialRecord};

/// Outcome of a driven partition run.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRun {
    /// Every trial in presentation order.
    pub trials: Vec<TrialRecord>,
    /// Final live leaf rectangles.
    pub rectangles: Vec<Rectangle>,
}

/// Run the adaptive partition sampler against a responder.
///
/// Stops after `iterations` trials, or earlier when the selection mass
/// degenerates to zero.
pub fn run_partition_search<R, F>(
    size_bounds: (f64, f64),
    saturation_bounds: (f64, f64),
    policy: &SplitPolicy,
    iterations: usize,
    rng: &mut R,
    mut responder: F,
) -> Result<PartitionRun, ConfigError>
where
    R: Rng + ?Sized,
    F: FnMut(TrialPoint) -> bool,
{
    policy.validate()?;
    let mut state = PartitionState::new(size_bounds, saturation_bounds, None)?;
    let mut trials = Vec::with_capacity(iterations);

    for _ in 0..iterations {
        let Some((point, index)) = state.next_trial(rng) else {
            break;
        };
        let success = responder(point);
        state.apply_result(index, point, success, policy);
        trials.push(TrialRecord::new(point, success));
    }

    Ok(PartitionRun {
        trials,
        rectangles: state.rectangles,
    })
}

/// Outcome of a driven pretest run.
#[derive(Debug, Clone, PartialEq)]
pub struct PretestRun {
    /// Terminal (or budget-capped) state.
    pub state: PretestState,
    /// Every presented trial with its outcome.
    pub trials: Vec<(PretestTrial, bool)>,
}

/// Drive the pretest state machine against a responder until it completes.
///
/// A hard trial budget of `2 * max_probes_per_axis * 2 * trial_cap` bounds
/// runaway responders; the returned state reports whether the search
/// actually completed.
pub fn run_pretest<R, F>(
    config: &PretestConfig,
    rng: &mut R,
    mut responder: F,
) -> Result<PretestRun, ConfigError>
where
    R: Rng + ?Sized,
    F: FnMut(TrialPoint) -> bool,
{
    let mut state = PretestState::new(config)?;
    let budget = 2 * config.max_probes_per_axis as usize * 2 * config.trial_cap as usize;
    let mut trials = Vec::new();

    while !state.is_complete && trials.len() < budget {
        let Some(trial) = state.next_trial(rng) else {
            break;
        };
        let success = responder(TrialPoint {
            size: trial.size,
            saturation: trial.saturation,
        });
        state.apply_result(success);
        trials.push((trial, success));
    }

    Ok(PretestRun { state, trials })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn partition_run_respects_iteration_budget() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let run = run_partition_search(
            (50.0, 300.0),
            (0.5, 1.0),
            &SplitPolicy::default(),
            200,
            &mut rng,
            |point| point.size > 150.0,
        )
        .unwrap();
        assert_eq!(run.trials.len(), 200);
        assert!(run.rectangles.len() > 1, "failing half should have split");
        let area: f64 = run.rectangles.iter().map(|r| r.area).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partition_run_rejects_bad_policy() {
        let mut policy = SplitPolicy::default();
        policy.success_rate_threshold = 0.0;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        assert!(run_partition_search(
            (0.0, 1.0),
            (0.0, 1.0),
            &policy,
            10,
            &mut rng,
            |_| true
        )
        .is_err());
    }

    #[test]
    fn pretest_run_completes_against_monotonic_responder() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
        let config = PretestConfig::default();
        let run = run_pretest(&config, &mut rng, |point| {
            // Deterministic monotonic responder: accuracy rises with both
            // axes; thresholds sit mid-range.
            point.size / 400.0 + point.saturation * 0.4 > 0.55
        })
        .unwrap();
        assert!(run.state.is_complete);
        let state = &run.state;
        assert!(state.size_lower.unwrap() <= state.size_upper.unwrap());
        assert!(state.saturation_lower.unwrap() <= state.saturation_upper.unwrap());
    }
}
