//! Construction-time error taxonomy.
//!
//! Only configuration mistakes are errors; everything the search can hit
//! mid-run (probe exhaustion, degenerate selection, sparse axis data) is a
//! warning or a sentinel return, never a fault.

use thiserror::Error;

use crate::types::Axis;

/// A configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An axis with `lo >= hi`.
    #[error("inverted {axis} bounds: {lo} >= {hi}")]
    InvertedBounds {
        /// Offending axis.
        axis: Axis,
        /// Configured lower limit.
        lo: f64,
        /// Configured upper limit.
        hi: f64,
    },

    /// A target probability outside the open unit interval.
    #[error("target probability {value} must lie in (0, 1)")]
    TargetOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// Lower target at or above the upper target.
    #[error("lower_target {lower} must be below upper_target {upper}")]
    TargetOrder {
        /// Configured lower target.
        lower: f64,
        /// Configured upper target.
        upper: f64,
    },

    /// A probe or search counter that would never let a probe complete.
    #[error("{field} must be at least 1")]
    ZeroCount {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A split-policy rate outside the open unit interval.
    #[error("success_rate_threshold {value} must lie in (0, 1)")]
    RateOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// Lookup of a simulation model that is not in the registry.
    #[error("unknown simulation model: {name}")]
    UnknownModel {
        /// The requested model name.
        name: String,
    },
}
