//! Bisection pretest: locate the performance-transition band axis by axis.
//!
//! The pretest runs one axis at a time, size first. Each axis goes through
//! three phases:
//!
//! 1. `FindAnchor` — binary-search the full axis range for a probe whose
//!    measured accuracy lands inside `[lower_target, upper_target]`.
//! 2. `RefineLower` — bisect between the hard end and the anchor to tighten
//!    the lower-target crossing.
//! 3. `RefineUpper` — bisect between the anchor and the easy end to tighten
//!    the upper-target crossing.
//!
//! Size is probed at maximum saturation (strongest contrast); saturation is
//! then probed at the size where accuracy reached the upper target
//! (`size_95`). A probe is a sequential mini-experiment: trials accumulate
//! until `success_target` correct responses or `trial_cap` total trials,
//! whichever comes first.
//!
//! The whole machine lives in one serializable [`PretestState`] so a caller
//! can persist it between trials and resume.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PretestConfig;
use crate::error::ConfigError;
use crate::types::{Axis, AxisBounds, Orientation};

/// Phase of the per-axis search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Binary search for an in-band anchor probe.
    FindAnchor,
    /// Bisection toward the lower-target crossing.
    RefineLower,
    /// Bisection toward the upper-target crossing.
    RefineUpper,
}

/// Audit record of one completed probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    /// Axis the probe ran on.
    pub axis: Axis,
    /// Phase the probe served.
    pub phase: SearchPhase,
    /// Probed parameter value.
    pub value: f64,
    /// Correct responses observed.
    pub correct: u32,
    /// Total trials observed.
    pub trials: u32,
    /// Empirical accuracy `correct / trials`.
    pub p_hat: f64,
}

/// The next stimulus the pretest wants presented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PretestTrial {
    /// Size coordinate.
    pub size: f64,
    /// Saturation coordinate.
    pub saturation: f64,
    /// Randomly drawn stimulus orientation.
    pub orientation: Orientation,
}

/// Full state of the pretest search.
///
/// Every field is a primitive, an `Option`, or a list of such, so the state
/// round-trips through serde as a flat mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretestState {
    /// Accuracy target at the hard edge.
    pub lower_target: f64,
    /// Accuracy target at the easy edge.
    pub upper_target: f64,

    /// Correct responses that complete a probe early.
    pub success_target: u32,
    /// Total trials that complete a probe regardless.
    pub trial_cap: u32,

    /// Probe budget per axis.
    pub max_probes_per_axis: u32,
    /// Bisection steps per transition edge.
    pub refine_steps_per_edge: u32,

    /// Global lower size limit.
    pub global_size_min: f64,
    /// Global upper size limit.
    pub global_size_max: f64,
    /// Global lower saturation limit.
    pub global_sat_min: f64,
    /// Global upper saturation limit.
    pub global_sat_max: f64,

    /// Axis currently being searched.
    pub current_axis: Axis,
    /// Phase of the current axis search.
    pub search_phase: SearchPhase,

    /// Parameter value of the probe in flight.
    pub current_probe_value: f64,
    /// Correct responses of the probe in flight.
    pub current_probe_correct: u32,
    /// Trials of the probe in flight.
    pub current_probe_trials: u32,

    /// Probes completed on the current axis.
    pub probes_used: u32,

    /// Lower edge of the refinement bracket.
    pub bracket_lo: f64,
    /// Upper edge of the refinement bracket.
    pub bracket_hi: f64,
    /// Bisection steps taken on the current edge.
    pub refine_step: u32,

    /// Anchor value found during `FindAnchor`, if any.
    pub anchor_value: Option<f64>,
    /// Measured accuracy of the anchor probe.
    pub anchor_p_hat: Option<f64>,

    /// Lower edge of the anchor-search bracket.
    pub search_lo: f64,
    /// Upper edge of the anchor-search bracket.
    pub search_hi: f64,

    /// Size at which accuracy crosses the lower target.
    pub size_lower: Option<f64>,
    /// Size at which accuracy crosses the upper target.
    pub size_upper: Option<f64>,
    /// Alias of `size_upper`; the fixed size used when probing saturation.
    pub size_95: Option<f64>,
    /// Saturation at which accuracy crosses the lower target.
    pub saturation_lower: Option<f64>,
    /// Saturation at which accuracy crosses the upper target.
    pub saturation_upper: Option<f64>,

    /// Diagnostics accumulated along the way (probe exhaustion and the like).
    pub warnings: Vec<String>,
    /// Whether both axes are resolved. Terminal once true.
    pub is_complete: bool,

    /// Append-only log of completed probes.
    pub completed_probes: Vec<ProbeRecord>,
}

impl PretestState {
    /// Build the initial size-axis search from a validated configuration.
    pub fn new(config: &PretestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bounds = config.bounds;
        Ok(Self {
            lower_target: config.lower_target,
            upper_target: config.upper_target,
            success_target: config.success_target,
            trial_cap: config.trial_cap,
            max_probes_per_axis: config.max_probes_per_axis,
            refine_steps_per_edge: config.refine_steps_per_edge,
            global_size_min: bounds.size_min,
            global_size_max: bounds.size_max,
            global_sat_min: bounds.saturation_min,
            global_sat_max: bounds.saturation_max,
            current_axis: Axis::Size,
            search_phase: SearchPhase::FindAnchor,
            current_probe_value: (bounds.size_min + bounds.size_max) / 2.0,
            current_probe_correct: 0,
            current_probe_trials: 0,
            probes_used: 0,
            bracket_lo: 0.0,
            bracket_hi: 0.0,
            refine_step: 0,
            anchor_value: None,
            anchor_p_hat: None,
            search_lo: bounds.size_min,
            search_hi: bounds.size_max,
            size_lower: None,
            size_upper: None,
            size_95: None,
            saturation_lower: None,
            saturation_upper: None,
            warnings: Vec::new(),
            is_complete: false,
            completed_probes: Vec::new(),
        })
    }

    /// Global bounds carried by this state.
    pub fn bounds(&self) -> AxisBounds {
        AxisBounds {
            size_min: self.global_size_min,
            size_max: self.global_size_max,
            saturation_min: self.global_sat_min,
            saturation_max: self.global_sat_max,
        }
    }

    /// The next trial to present, or `None` once the search is complete.
    ///
    /// Size-axis probes ride at maximum saturation; saturation-axis probes
    /// ride at `size_95` (falling back to the global size midpoint if the
    /// size axis was clamped before producing one).
    pub fn next_trial<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PretestTrial> {
        if self.is_complete {
            return None;
        }
        let orientation = Orientation::sample(rng);
        let trial = match self.current_axis {
            Axis::Size => PretestTrial {
                size: self.current_probe_value,
                saturation: self.global_sat_max,
                orientation,
            },
            Axis::Saturation => PretestTrial {
                size: self
                    .size_95
                    .unwrap_or((self.global_size_min + self.global_size_max) / 2.0),
                saturation: self.current_probe_value,
                orientation,
            },
        };
        Some(trial)
    }

    /// Record one trial outcome and advance the machine if the probe ended.
    ///
    /// A no-op on a completed state.
    pub fn apply_result(&mut self, success: bool) {
        if self.is_complete {
            return;
        }
        if success {
            self.current_probe_correct += 1;
        }
        self.current_probe_trials += 1;

        let probe_done = self.current_probe_correct >= self.success_target
            || self.current_probe_trials >= self.trial_cap;
        if !probe_done {
            return;
        }

        let p_hat = if self.current_probe_trials > 0 {
            f64::from(self.current_probe_correct) / f64::from(self.current_probe_trials)
        } else {
            0.0
        };
        self.completed_probes.push(ProbeRecord {
            axis: self.current_axis,
            phase: self.search_phase,
            value: self.current_probe_value,
            correct: self.current_probe_correct,
            trials: self.current_probe_trials,
            p_hat,
        });
        self.probes_used += 1;

        match self.search_phase {
            SearchPhase::FindAnchor => self.handle_find_anchor(p_hat),
            SearchPhase::RefineLower => self.handle_refine_lower(p_hat),
            SearchPhase::RefineUpper => self.handle_refine_upper(p_hat),
        }

        self.current_probe_correct = 0;
        self.current_probe_trials = 0;
    }

    fn hard_end(&self) -> f64 {
        match self.current_axis {
            Axis::Size => self.global_size_min,
            Axis::Saturation => self.global_sat_min,
        }
    }

    fn easy_end(&self) -> f64 {
        match self.current_axis {
            Axis::Size => self.global_size_max,
            Axis::Saturation => self.global_sat_max,
        }
    }

    fn handle_find_anchor(&mut self, p_hat: f64) {
        if p_hat >= self.lower_target && p_hat <= self.upper_target {
            self.anchor_value = Some(self.current_probe_value);
            self.anchor_p_hat = Some(p_hat);
            self.setup_refinement();
        } else if p_hat > self.upper_target {
            // Too easy: move toward the harder side.
            self.search_hi = self.current_probe_value;
            if self.probes_used >= self.max_probes_per_axis {
                self.clamp_and_warn("anchor_not_found");
                return;
            }
            self.current_probe_value = (self.search_lo + self.search_hi) / 2.0;
        } else {
            // Too hard: move toward the easier side.
            self.search_lo = self.current_probe_value;
            if self.probes_used >= self.max_probes_per_axis {
                self.clamp_and_warn("anchor_not_found");
                return;
            }
            self.current_probe_value = (self.search_lo + self.search_hi) / 2.0;
        }
    }

    fn setup_refinement(&mut self) {
        // anchor_value is always set right before this transition.
        let anchor = self.anchor_value.unwrap_or(self.current_probe_value);
        self.search_phase = SearchPhase::RefineLower;
        self.bracket_lo = self.hard_end();
        self.bracket_hi = anchor;
        self.refine_step = 0;
        self.current_probe_value = (self.bracket_lo + self.bracket_hi) / 2.0;
    }

    fn handle_refine_lower(&mut self, p_hat: f64) {
        if p_hat > self.lower_target {
            self.bracket_hi = self.current_probe_value;
        } else {
            self.bracket_lo = self.current_probe_value;
        }

        self.refine_step += 1;
        if self.refine_step >= self.refine_steps_per_edge {
            let lower_bound = (self.bracket_lo + self.bracket_hi) / 2.0;
            match self.current_axis {
                Axis::Size => self.size_lower = Some(lower_bound),
                Axis::Saturation => self.saturation_lower = Some(lower_bound),
            }

            let anchor = self.anchor_value.unwrap_or(lower_bound);
            self.search_phase = SearchPhase::RefineUpper;
            self.bracket_lo = anchor;
            self.bracket_hi = self.easy_end();
            self.refine_step = 0;
        }
        self.current_probe_value = (self.bracket_lo + self.bracket_hi) / 2.0;
    }

    fn handle_refine_upper(&mut self, p_hat: f64) {
        if p_hat < self.upper_target {
            self.bracket_lo = self.current_probe_value;
        } else {
            self.bracket_hi = self.current_probe_value;
        }

        self.refine_step += 1;
        if self.refine_step >= self.refine_steps_per_edge {
            let upper_bound = (self.bracket_lo + self.bracket_hi) / 2.0;
            match self.current_axis {
                Axis::Size => {
                    self.size_upper = Some(upper_bound);
                    self.size_95 = Some(upper_bound);
                    self.switch_to_saturation_axis();
                }
                Axis::Saturation => {
                    self.saturation_upper = Some(upper_bound);
                    self.is_complete = true;
                }
            }
        } else {
            self.current_probe_value = (self.bracket_lo + self.bracket_hi) / 2.0;
        }
    }

    fn switch_to_saturation_axis(&mut self) {
        self.current_axis = Axis::Saturation;
        self.search_phase = SearchPhase::FindAnchor;
        self.probes_used = 0;
        self.search_lo = self.global_sat_min;
        self.search_hi = self.global_sat_max;
        self.current_probe_value = (self.search_lo + self.search_hi) / 2.0;
        self.anchor_value = None;
        self.anchor_p_hat = None;
    }

    /// Probe budget exhausted: fall back to the full global range for this
    /// axis and move on rather than stall.
    fn clamp_and_warn(&mut self, reason: &str) {
        let axis = self.current_axis;
        self.warnings.push(format!(
            "{reason}: Could not find anchor for {axis} axis within {} probes. \
             Clamping to global limits.",
            self.max_probes_per_axis
        ));

        match axis {
            Axis::Size => {
                self.size_lower = Some(self.global_size_min);
                self.size_upper = Some(self.global_size_max);
                self.size_95 = Some(self.global_size_max);
                self.switch_to_saturation_axis();
            }
            Axis::Saturation => {
                self.saturation_lower = Some(self.global_sat_min);
                self.saturation_upper = Some(self.global_sat_max);
                self.is_complete = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(7)
    }

    #[test]
    fn initial_state_probes_size_midpoint_at_max_saturation() {
        let state = PretestState::new(&PretestConfig::default()).unwrap();
        assert_eq!(state.current_axis, Axis::Size);
        assert_eq!(state.search_phase, SearchPhase::FindAnchor);
        assert_eq!(state.current_probe_value, 205.0);

        let trial = state.next_trial(&mut rng()).unwrap();
        assert_eq!(trial.size, 205.0);
        assert_eq!(trial.saturation, 1.0);
    }

    #[test]
    fn probe_completes_on_success_target() {
        let config = PretestConfig::new().success_target(3).trial_cap(100);
        let mut state = PretestState::new(&config).unwrap();
        for _ in 0..3 {
            state.apply_result(true);
        }
        assert_eq!(state.completed_probes.len(), 1);
        let probe = &state.completed_probes[0];
        assert_eq!(probe.correct, 3);
        assert_eq!(probe.trials, 3);
        assert_eq!(probe.p_hat, 1.0);
        // Counters reset for the next probe.
        assert_eq!(state.current_probe_correct, 0);
        assert_eq!(state.current_probe_trials, 0);
    }

    #[test]
    fn probe_completes_on_trial_cap() {
        let config = PretestConfig::new().success_target(100).trial_cap(5);
        let mut state = PretestState::new(&config).unwrap();
        for _ in 0..5 {
            state.apply_result(false);
        }
        assert_eq!(state.completed_probes.len(), 1);
        let probe = &state.completed_probes[0];
        assert_eq!(probe.trials, 5);
        assert_eq!(probe.correct, 0);
        assert_eq!(probe.p_hat, 0.0);
    }

    #[test]
    fn in_band_probe_becomes_anchor() {
        // 6/10 = 0.6 lands inside [0.40, 0.95].
        let config = PretestConfig::new().success_target(100).trial_cap(10);
        let mut state = PretestState::new(&config).unwrap();
        let anchor = state.current_probe_value;
        for i in 0..10 {
            state.apply_result(i < 6);
        }
        assert_eq!(state.anchor_value, Some(anchor));
        assert_eq!(state.anchor_p_hat, Some(0.6));
        assert_eq!(state.search_phase, SearchPhase::RefineLower);
        assert_eq!(state.bracket_lo, 10.0);
        assert_eq!(state.bracket_hi, anchor);
        assert_eq!(state.current_probe_value, (10.0 + anchor) / 2.0);
    }

    #[test]
    fn too_easy_probe_shrinks_toward_hard_side() {
        let config = PretestConfig::new().success_target(10).trial_cap(30);
        let mut state = PretestState::new(&config).unwrap();
        let first = state.current_probe_value;
        for _ in 0..10 {
            state.apply_result(true);
        }
        assert_eq!(state.search_hi, first);
        assert_eq!(state.search_lo, 10.0);
        assert_eq!(state.current_probe_value, (10.0 + first) / 2.0);
        assert_eq!(state.search_phase, SearchPhase::FindAnchor);
    }

    #[test]
    fn clamp_and_warn_after_probe_budget() {
        let config = PretestConfig::new()
            .upper_target(0.5)
            .lower_target(0.4)
            .success_target(3)
            .trial_cap(10)
            .max_probes_per_axis(2);
        let mut state = PretestState::new(&config).unwrap();
        // Two all-success probes: both "too easy", exhausting the budget.
        for _ in 0..2 {
            for _ in 0..3 {
                state.apply_result(true);
            }
        }
        assert_eq!(state.warnings.len(), 1);
        assert!(state.warnings[0].contains("anchor_not_found"));
        assert_eq!(state.size_lower, Some(10.0));
        assert_eq!(state.size_upper, Some(400.0));
        assert_eq!(state.size_95, Some(400.0));
        assert_eq!(state.current_axis, Axis::Saturation);
        assert_eq!(state.search_phase, SearchPhase::FindAnchor);
        assert!(!state.is_complete);
    }

    #[test]
    fn saturation_trials_ride_at_size_95() {
        let config = PretestConfig::new()
            .upper_target(0.5)
            .success_target(3)
            .trial_cap(10)
            .max_probes_per_axis(1);
        let mut state = PretestState::new(&config).unwrap();
        for _ in 0..3 {
            state.apply_result(true);
        }
        assert_eq!(state.current_axis, Axis::Saturation);
        let trial = state.next_trial(&mut rng()).unwrap();
        assert_eq!(trial.size, 400.0);
        assert_eq!(trial.saturation, 0.5);
    }

    #[test]
    fn completed_state_is_terminal() {
        let config = PretestConfig::new()
            .upper_target(0.5)
            .success_target(3)
            .trial_cap(10)
            .max_probes_per_axis(1);
        let mut state = PretestState::new(&config).unwrap();
        // Exhaust both axes through the clamp path.
        for _ in 0..2 {
            for _ in 0..3 {
                state.apply_result(true);
            }
        }
        assert!(state.is_complete);
        assert!(state.next_trial(&mut rng()).is_none());

        let snapshot = state.clone();
        state.apply_result(true);
        assert_eq!(state, snapshot);
    }
}
