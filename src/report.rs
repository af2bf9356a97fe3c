//! Serializable report types produced by the axis-regression analysis.

use serde::{Deserialize, Serialize};

use crate::types::Axis;

/// Round to a fixed number of decimal places for report output.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// The stimulus the axis estimator wants presented next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextTrial {
    /// Axis the probe varies.
    pub axis: Axis,
    /// Size coordinate.
    pub size: f64,
    /// Saturation coordinate.
    pub saturation: f64,
}

/// Where the other axis was held while this curve's trials ran.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedCounterpart {
    /// The axis held fixed.
    pub axis: Axis,
    /// The value it was held at.
    pub value: f64,
}

/// A fitted probability curve over one axis with its uncertainty band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCurve {
    /// Grid positions along the axis.
    pub x: Vec<f64>,
    /// Fitted success probability at each grid position.
    pub probability: Vec<f64>,
    /// Lower band curve (10th bootstrap percentile).
    pub lower: Vec<f64>,
    /// Upper band curve (90th bootstrap percentile).
    pub upper: Vec<f64>,
    /// Fixed value of the other axis during these trials.
    pub fixed_counterpart: FixedCounterpart,
}

/// Both per-axis curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCurves {
    /// Curve over the size axis.
    pub size: AxisCurve,
    /// Curve over the saturation axis.
    pub saturation: AxisCurve,
}

/// How many trials landed on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialCounts {
    /// Trials attributed to either axis.
    pub total: usize,
    /// Trials attributed to the size axis.
    pub size_axis_trials: usize,
    /// Trials attributed to the saturation axis.
    pub saturation_axis_trials: usize,
}

/// Axis value at which the fitted curve crosses one target probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    /// Target expressed in percent.
    pub percent: u32,
    /// Target expressed as a probability.
    pub probability: f64,
    /// Interpolated axis value, or `None` where the curve never reaches the
    /// target.
    pub value: Option<f64>,
}

/// Threshold crossings for both axes at regular probability steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    /// Spacing of the probability targets, in percent.
    pub percent_step: u32,
    /// Crossings along the size axis.
    pub size: Vec<ThresholdRow>,
    /// Crossings along the saturation axis.
    pub saturation: Vec<ThresholdRow>,
}

/// Complete axis-regression analysis of a trial log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisAnalysis {
    /// Sparse-data and other diagnostics.
    pub warnings: Vec<String>,
    /// Per-axis trial attribution counts.
    pub counts: TrialCounts,
    /// Fitted curves with uncertainty bands.
    pub curves: AxisCurves,
    /// Interpolated threshold crossings.
    pub threshold_table: ThresholdTable,
}
