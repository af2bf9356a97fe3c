//! Main-phase sampler: adaptive spatial partitioning of the parameter space.
//!
//! The space starts as a single rectangle. Each step draws a leaf rectangle
//! with probability proportional to its information value, samples a uniform
//! point inside it, and records the outcome. Rectangles that keep failing or
//! accumulate too many samples are quartered, and their raw-sample history
//! is redistributed into the children so no evidence is lost across a split.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SplitPolicy;
use crate::error::ConfigError;
use crate::types::{Axis, TrialPoint, TrialRecord};

/// Containment slack on rectangle edges.
const EDGE_EPS: f64 = 1e-9;

/// Axis-aligned bounds of one rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectBounds {
    /// `(lo, hi)` along the size axis.
    pub size: (f64, f64),
    /// `(lo, hi)` along the saturation axis.
    pub saturation: (f64, f64),
}

impl RectBounds {
    fn size_mid(&self) -> f64 {
        (self.size.0 + self.size.1) / 2.0
    }

    fn saturation_mid(&self) -> f64 {
        (self.saturation.0 + self.saturation.1) / 2.0
    }
}

/// Half-open child containment, closed on the parent's far edge.
///
/// A point exactly on a shared interior boundary belongs to the child whose
/// far edge coincides with the parent's far edge, so redistribution neither
/// double-assigns nor orphans boundary points.
fn in_child_bounds(value: f64, lower: f64, upper: f64, parent_upper: f64) -> bool {
    value >= lower - EDGE_EPS && (value < upper - EDGE_EPS || (upper - parent_upper).abs() <= EDGE_EPS)
}

/// A leaf region of the parameter space with its accumulated evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Region covered by this rectangle.
    pub bounds: RectBounds,
    /// Fraction of the root rectangle's area. Root = 1.0; each split
    /// divides by 4, so sibling areas always sum to the parent's.
    pub area: f64,
    /// Successful trials recorded while this rectangle was live.
    pub true_samples: u32,
    /// Failed trials recorded while this rectangle was live.
    pub false_samples: u32,
    /// Raw history, kept so a split can redistribute evidence by position.
    /// Optional in persisted form; absent means no recorded history.
    #[serde(default)]
    pub samples: Vec<TrialRecord>,
}

impl Rectangle {
    /// Root rectangle over the full space.
    pub fn root(size_bounds: (f64, f64), saturation_bounds: (f64, f64)) -> Self {
        Self {
            bounds: RectBounds {
                size: size_bounds,
                saturation: saturation_bounds,
            },
            area: 1.0,
            true_samples: 0,
            false_samples: 0,
            samples: Vec::new(),
        }
    }

    /// Total trials recorded on this rectangle.
    pub fn total_samples(&self) -> u32 {
        self.true_samples + self.false_samples
    }

    /// Empirical success rate; 0.0 with no samples.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_samples();
        if total == 0 {
            0.0
        } else {
            f64::from(self.true_samples) / f64::from(total)
        }
    }

    /// Unnormalized selection mass: large, under-sampled, or still-failing
    /// rectangles score high.
    ///
    /// `(area / (n + 1)) * (1 - true / (n + 1))` with `n` the total samples.
    pub fn selection_weight(&self) -> f64 {
        let n = f64::from(self.total_samples());
        let smoothed_rate = f64::from(self.true_samples) / (n + 1.0);
        (self.area / (n + 1.0)) * (1.0 - smoothed_rate)
    }

    /// Quarter this rectangle at the midpoint of each axis and redistribute
    /// its sample history into the children.
    fn split(&self) -> Vec<Rectangle> {
        let bounds = self.bounds;
        let size_mid = bounds.size_mid();
        let sat_mid = bounds.saturation_mid();

        let mut children = Vec::with_capacity(4);
        for i in 0..2 {
            for j in 0..2 {
                let size = if i == 0 {
                    (bounds.size.0, size_mid)
                } else {
                    (size_mid, bounds.size.1)
                };
                let saturation = if j == 0 {
                    (bounds.saturation.0, sat_mid)
                } else {
                    (sat_mid, bounds.saturation.1)
                };
                children.push(Rectangle {
                    bounds: RectBounds { size, saturation },
                    area: self.area / 4.0,
                    true_samples: 0,
                    false_samples: 0,
                    samples: Vec::new(),
                });
            }
        }

        for sample in &self.samples {
            if let Some(child) = children.iter_mut().find(|child| {
                in_child_bounds(
                    sample.size,
                    child.bounds.size.0,
                    child.bounds.size.1,
                    bounds.size.1,
                ) && in_child_bounds(
                    sample.saturation,
                    child.bounds.saturation.0,
                    child.bounds.saturation.1,
                    bounds.saturation.1,
                )
            }) {
                child.samples.push(*sample);
                if sample.success {
                    child.true_samples += 1;
                } else {
                    child.false_samples += 1;
                }
            }
        }

        children
    }
}

/// Rectangles created and removed by one state transition, for keeping an
/// external store in sync incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// The parent rectangle removed from the live set.
    pub removed: Rectangle,
    /// The four children that replaced it.
    pub created: Vec<Rectangle>,
}

/// State of the adaptive partition search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Size bounds of the root rectangle.
    pub size_bounds: (f64, f64),
    /// Saturation bounds of the root rectangle.
    pub saturation_bounds: (f64, f64),
    /// Live leaf rectangles; the only ones eligible for sampling.
    pub rectangles: Vec<Rectangle>,
    /// Every rectangle created since this state was built, root included.
    pub created: Vec<Rectangle>,
    /// Every rectangle removed (split) since this state was built.
    pub removed: Vec<Rectangle>,
}

impl PartitionState {
    /// Create a partition over the given space.
    ///
    /// Pass a previously persisted rectangle set to resume; `None` or an
    /// empty set seeds the root rectangle and logs it as created.
    pub fn new(
        size_bounds: (f64, f64),
        saturation_bounds: (f64, f64),
        rectangles: Option<Vec<Rectangle>>,
    ) -> Result<Self, ConfigError> {
        if size_bounds.0 >= size_bounds.1 {
            return Err(ConfigError::InvertedBounds {
                axis: Axis::Size,
                lo: size_bounds.0,
                hi: size_bounds.1,
            });
        }
        if saturation_bounds.0 >= saturation_bounds.1 {
            return Err(ConfigError::InvertedBounds {
                axis: Axis::Saturation,
                lo: saturation_bounds.0,
                hi: saturation_bounds.1,
            });
        }

        match rectangles {
            Some(existing) if !existing.is_empty() => Ok(Self {
                size_bounds,
                saturation_bounds,
                rectangles: existing,
                created: Vec::new(),
                removed: Vec::new(),
            }),
            _ => {
                let root = Rectangle::root(size_bounds, saturation_bounds);
                Ok(Self {
                    size_bounds,
                    saturation_bounds,
                    rectangles: vec![root.clone()],
                    created: vec![root],
                    removed: Vec::new(),
                })
            }
        }
    }

    /// Draw the next stimulus: a rectangle chosen categorically by selection
    /// weight, then a uniform point inside it.
    ///
    /// Returns the point and the index of the selected rectangle, or `None`
    /// when every rectangle's weight is zero (nearly-fully-explored space).
    /// The index is only valid until the next call to [`apply_result`].
    ///
    /// [`apply_result`]: PartitionState::apply_result
    pub fn next_trial<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(TrialPoint, usize)> {
        let weights: Vec<f64> = self
            .rectangles
            .iter()
            .map(Rectangle::selection_weight)
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut draw = rng.random::<f64>() * total;
        let mut index = self.rectangles.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if draw < *w {
                index = i;
                break;
            }
            draw -= w;
        }

        let bounds = self.rectangles[index].bounds;
        let size = uniform_in(rng, bounds.size);
        let saturation = uniform_in(rng, bounds.saturation);
        Some((TrialPoint { size, saturation }, index))
    }

    /// Record a trial outcome on the selected rectangle and split it if the
    /// policy says so.
    ///
    /// Returns the split delta when a split fired, so the caller can update
    /// an external store without rebuilding it.
    ///
    /// # Panics
    ///
    /// Panics if `rect_index` is out of bounds (stale index from before a
    /// previous `apply_result`).
    pub fn apply_result(
        &mut self,
        rect_index: usize,
        point: TrialPoint,
        success: bool,
        policy: &SplitPolicy,
    ) -> Option<SplitEvent> {
        let rect = &mut self.rectangles[rect_index];
        rect.samples.push(TrialRecord::new(point, success));
        if success {
            rect.true_samples += 1;
        } else {
            rect.false_samples += 1;
        }

        let total = rect.total_samples();
        let should_split = (rect.success_rate() < policy.success_rate_threshold
            && total > policy.total_samples_threshold)
            || total > policy.max_samples;
        if !should_split {
            return None;
        }

        let parent = self.rectangles.remove(rect_index);
        let children = parent.split();
        self.rectangles.extend(children.iter().cloned());
        self.removed.push(parent.clone());
        self.created.extend(children.iter().cloned());

        Some(SplitEvent {
            removed: parent,
            created: children,
        })
    }

    /// Sum of live leaf areas. Stays at the root's 1.0 (to floating-point
    /// tolerance) through any sequence of splits.
    pub fn total_area(&self) -> f64 {
        self.rectangles.iter().map(|r| r.area).sum()
    }
}

fn uniform_in<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        // Degenerate interval after deep recursion; nothing left to draw.
        lo
    }
}
