//! Core types shared across the search strategies.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 2x2 matrix for the logistic-fit normal equations.
pub type Matrix2 = nalgebra::SMatrix<f64, 2, 2>;

/// 2-dimensional vector for logistic coefficients (intercept, slope).
pub type Vector2 = nalgebra::SVector<f64, 2>;

/// The two stimulus-parameter axes of the search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Stimulus size axis. Larger is easier.
    Size,
    /// Color saturation axis. Higher is easier.
    Saturation,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Size => write!(f, "size"),
            Axis::Saturation => write!(f, "saturation"),
        }
    }
}

/// Stimulus orientation presented alongside each pretest trial.
///
/// The orientation does not influence the search; it is drawn uniformly so
/// the subject cannot anticipate the response direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Pointing up.
    #[serde(rename = "N")]
    North,
    /// Pointing right.
    #[serde(rename = "E")]
    East,
    /// Pointing down.
    #[serde(rename = "S")]
    South,
    /// Pointing left.
    #[serde(rename = "W")]
    West,
}

impl Orientation {
    /// Draw a uniformly random orientation.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..4u8) {
            0 => Orientation::North,
            1 => Orientation::East,
            2 => Orientation::South,
            _ => Orientation::West,
        }
    }
}

/// Global limits of the 2-D parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    /// Smallest presentable size.
    pub size_min: f64,
    /// Largest presentable size.
    pub size_max: f64,
    /// Lowest presentable saturation.
    pub saturation_min: f64,
    /// Highest presentable saturation.
    pub saturation_max: f64,
}

impl AxisBounds {
    /// Construct bounds, failing fast on inverted axes.
    pub fn new(
        size_min: f64,
        size_max: f64,
        saturation_min: f64,
        saturation_max: f64,
    ) -> Result<Self, crate::error::ConfigError> {
        let bounds = Self {
            size_min,
            size_max,
            saturation_min,
            saturation_max,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check that both axes are non-degenerate and correctly ordered.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError;
        if self.size_min >= self.size_max {
            return Err(ConfigError::InvertedBounds {
                axis: Axis::Size,
                lo: self.size_min,
                hi: self.size_max,
            });
        }
        if self.saturation_min >= self.saturation_max {
            return Err(ConfigError::InvertedBounds {
                axis: Axis::Saturation,
                lo: self.saturation_min,
                hi: self.saturation_max,
            });
        }
        Ok(())
    }

    /// Lower limit of an axis.
    pub fn min(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Size => self.size_min,
            Axis::Saturation => self.saturation_min,
        }
    }

    /// Upper limit of an axis.
    pub fn max(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Size => self.size_max,
            Axis::Saturation => self.saturation_max,
        }
    }

    /// Midpoint of an axis.
    pub fn midpoint(&self, axis: Axis) -> f64 {
        (self.min(axis) + self.max(axis)) / 2.0
    }

    /// Comparison tolerance for an axis, scaled to its range.
    ///
    /// Used both for classifying which axis a trial varied and for keeping
    /// probe values strictly below the axis maximum.
    pub fn value_eps(&self, axis: Axis) -> f64 {
        let span = self.max(axis) - self.min(axis);
        (span * 1e-4).max(1e-6)
    }
}

/// One candidate stimulus in the 2-D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialPoint {
    /// Size coordinate.
    pub size: f64,
    /// Saturation coordinate.
    pub saturation: f64,
}

/// One observed trial: where it was presented and whether it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Size coordinate of the presented stimulus.
    pub size: f64,
    /// Saturation coordinate of the presented stimulus.
    pub saturation: f64,
    /// Whether the subject responded correctly.
    pub success: bool,
}

impl TrialRecord {
    /// Build a record from a trial point and its outcome.
    pub fn new(point: TrialPoint, success: bool) -> Self {
        Self {
            size: point.size,
            saturation: point.saturation,
            success,
        }
    }
}
