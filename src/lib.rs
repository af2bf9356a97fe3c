//! # threshold-oracle
//!
//! Adaptive threshold search over a 2-D stimulus space.
//!
//! Given a size axis and a saturation axis, this crate decides, trial by
//! trial, which `(size, saturation)` combination to present next, and folds
//! binary success/failure outcomes back into its state to localize where
//! detection performance crosses two target probabilities (say 40% and 95%
//! correct). Three strategies share that job:
//!
//! - [`PretestState`] — a bisection state machine that brackets the
//!   performance transition one axis at a time.
//! - [`PartitionState`] — an adaptive spatial partitioner that recursively
//!   quarters the parameter rectangle, concentrating samples where outcomes
//!   are most informative.
//! - [`axis`] — per-axis monotonic regression (logistic or isotonic) with
//!   bootstrap uncertainty bands; the next probe goes where the band is
//!   widest.
//!
//! The engine is synchronous and pure with respect to its state: every
//! operation is "compute next trial" or "apply result", randomness comes in
//! through an explicit `&mut impl Rng`, and the states serialize to flat
//! mappings so callers can persist them between trials. Persistence, HTTP,
//! and plotting live with the caller.
//!
//! ## Quick start
//!
//! ```ignore
//! use threshold_oracle::{PretestConfig, PretestState};
//!
//! let mut rng = rand::rng();
//! let mut state = PretestState::new(&PretestConfig::default())?;
//! while let Some(trial) = state.next_trial(&mut rng) {
//!     let success = present_to_subject(trial.size, trial.saturation);
//!     state.apply_result(success);
//! }
//! println!("transition rectangle: {:?}..{:?} x {:?}..{:?}",
//!     state.size_lower, state.size_upper,
//!     state.saturation_lower, state.saturation_upper);
//! ```
//!
//! Simulated sessions compose the same loop with the ground-truth models in
//! [`sim`]; the [`driver`] module packages both loops behind a responder
//! closure.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod partition;
mod pretest;
mod report;
mod types;

// Functional modules
pub mod axis;
pub mod driver;
pub mod sim;
pub mod statistics;

// Re-exports for the public API
pub use config::{PretestConfig, SplitPolicy};
pub use error::ConfigError;
pub use partition::{PartitionState, RectBounds, Rectangle, SplitEvent};
pub use pretest::{PretestState, PretestTrial, ProbeRecord, SearchPhase};
pub use report::{
    AxisAnalysis, AxisCurve, AxisCurves, FixedCounterpart, NextTrial, ThresholdRow,
    ThresholdTable, TrialCounts,
};
pub use types::{Axis, AxisBounds, Orientation, TrialPoint, TrialRecord};
