//! Configuration for the pretest probe search and the partition sampler.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::AxisBounds;

/// Configuration for the bisection pretest.
///
/// Immutable once a [`PretestState`](crate::PretestState) is created from it;
/// the state carries its own snapshot so it can be persisted and resumed
/// without the original config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretestConfig {
    /// Accuracy at the "hard" edge of the transition band. Default: 0.40.
    pub lower_target: f64,
    /// Accuracy at the "easy" edge of the transition band. Default: 0.95.
    pub upper_target: f64,

    /// Correct responses that complete a probe early. Default: 10.
    pub success_target: u32,
    /// Total trials that complete a probe regardless. Default: 30.
    pub trial_cap: u32,

    /// Probes allowed per axis before clamping to global limits. Default: 12.
    pub max_probes_per_axis: u32,
    /// Bisection steps per transition edge. Default: 2.
    pub refine_steps_per_edge: u32,

    /// Global limits of the parameter space.
    pub bounds: AxisBounds,
}

impl Default for PretestConfig {
    fn default() -> Self {
        Self {
            lower_target: 0.40,
            upper_target: 0.95,
            success_target: 10,
            trial_cap: 30,
            max_probes_per_axis: 12,
            refine_steps_per_edge: 2,
            bounds: AxisBounds {
                size_min: 10.0,
                size_max: 400.0,
                saturation_min: 0.0,
                saturation_max: 1.0,
            },
        }
    }
}

impl PretestConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse preset for quick sessions: shorter probes, fewer refinements.
    pub fn coarse() -> Self {
        Self {
            success_target: 5,
            trial_cap: 15,
            max_probes_per_axis: 8,
            refine_steps_per_edge: 1,
            ..Default::default()
        }
    }

    /// Thorough preset: longer probes and an extra refinement step per edge.
    pub fn thorough() -> Self {
        Self {
            success_target: 15,
            trial_cap: 45,
            max_probes_per_axis: 16,
            refine_steps_per_edge: 3,
            ..Default::default()
        }
    }

    /// Set the lower target probability.
    pub fn lower_target(mut self, target: f64) -> Self {
        assert!(
            target > 0.0 && target < 1.0,
            "lower_target must be in (0, 1)"
        );
        assert!(
            target < self.upper_target,
            "lower_target must be < upper_target"
        );
        self.lower_target = target;
        self
    }

    /// Set the upper target probability.
    pub fn upper_target(mut self, target: f64) -> Self {
        assert!(
            target > 0.0 && target < 1.0,
            "upper_target must be in (0, 1)"
        );
        assert!(
            target > self.lower_target,
            "upper_target must be > lower_target"
        );
        self.upper_target = target;
        self
    }

    /// Set the success count that completes a probe early.
    pub fn success_target(mut self, count: u32) -> Self {
        assert!(count > 0, "success_target must be positive");
        self.success_target = count;
        self
    }

    /// Set the trial count that completes a probe regardless of successes.
    pub fn trial_cap(mut self, cap: u32) -> Self {
        assert!(cap > 0, "trial_cap must be positive");
        self.trial_cap = cap;
        self
    }

    /// Set the probe budget per axis.
    pub fn max_probes_per_axis(mut self, probes: u32) -> Self {
        assert!(probes > 0, "max_probes_per_axis must be positive");
        self.max_probes_per_axis = probes;
        self
    }

    /// Set the bisection steps per transition edge.
    pub fn refine_steps_per_edge(mut self, steps: u32) -> Self {
        assert!(steps > 0, "refine_steps_per_edge must be positive");
        self.refine_steps_per_edge = steps;
        self
    }

    /// Set the global parameter-space limits.
    pub fn bounds(mut self, bounds: AxisBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Fail-fast validation of the full configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.validate()?;
        for target in [self.lower_target, self.upper_target] {
            if target <= 0.0 || target >= 1.0 {
                return Err(ConfigError::TargetOutOfRange { value: target });
            }
        }
        if self.lower_target >= self.upper_target {
            return Err(ConfigError::TargetOrder {
                lower: self.lower_target,
                upper: self.upper_target,
            });
        }
        if self.success_target == 0 {
            return Err(ConfigError::ZeroCount {
                field: "success_target",
            });
        }
        if self.trial_cap == 0 {
            return Err(ConfigError::ZeroCount { field: "trial_cap" });
        }
        if self.max_probes_per_axis == 0 {
            return Err(ConfigError::ZeroCount {
                field: "max_probes_per_axis",
            });
        }
        if self.refine_steps_per_edge == 0 {
            return Err(ConfigError::ZeroCount {
                field: "refine_steps_per_edge",
            });
        }
        Ok(())
    }
}

/// When a sampled rectangle is quartered.
///
/// A rectangle splits once its success rate stays below
/// `success_rate_threshold` after `total_samples_threshold` samples, or
/// unconditionally once `max_samples` is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPolicy {
    /// Success rate below which a sufficiently-sampled rectangle splits.
    /// Default: 0.85.
    pub success_rate_threshold: f64,
    /// Sample count that must be exceeded before the rate check applies.
    /// Default: 5.
    pub total_samples_threshold: u32,
    /// Sample count that forces a split regardless of rate. Default: 60.
    pub max_samples: u32,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            success_rate_threshold: 0.85,
            total_samples_threshold: 5,
            max_samples: 60,
        }
    }
}

impl SplitPolicy {
    /// Create a policy with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the success-rate threshold.
    pub fn success_rate_threshold(mut self, rate: f64) -> Self {
        assert!(
            rate > 0.0 && rate < 1.0,
            "success_rate_threshold must be in (0, 1)"
        );
        self.success_rate_threshold = rate;
        self
    }

    /// Set the sample count gating the rate check.
    pub fn total_samples_threshold(mut self, count: u32) -> Self {
        self.total_samples_threshold = count;
        self
    }

    /// Set the unconditional split count.
    pub fn max_samples(mut self, count: u32) -> Self {
        assert!(count > 0, "max_samples must be positive");
        self.max_samples = count;
        self
    }

    /// Fail-fast validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.success_rate_threshold <= 0.0 || self.success_rate_threshold >= 1.0 {
            return Err(ConfigError::RateOutOfRange {
                value: self.success_rate_threshold,
            });
        }
        if self.max_samples == 0 {
            return Err(ConfigError::ZeroCount {
                field: "max_samples",
            });
        }
        Ok(())
    }
}
