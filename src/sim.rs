//! Synthetic ground-truth probability models for tuning and testing.
//!
//! Each model maps a `(size, saturation)` stimulus to a success probability;
//! simulated trials draw a Bernoulli outcome from it. The registry is an
//! explicit value owned by the harness that needs it — there is no
//! process-wide model table.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-x).exp())
}

/// A parametric ground-truth model of subject performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "lowercase")]
pub enum ProbabilityModel {
    /// Radially increasing performance with absolute per-axis scaling:
    /// `p = base + coefficient * (((size/size_scale)^2 + (sat/sat_scale)^2) / 2)^exponent`,
    /// clamped to [0, 1].
    Polynomial {
        /// Floor probability at the origin.
        base: f64,
        /// Gain applied to the radial term.
        coefficient: f64,
        /// Exponent shaping the radial rise.
        exponent: f64,
        /// Size at which the size contribution reaches 1.0.
        size_scale: f64,
        /// Saturation at which the saturation contribution reaches 1.0.
        sat_scale: f64,
    },
    /// Sigmoid-window model: performance is high inside a band on each axis
    /// and falls off outside it.
    /// `p = 0.25 + 0.75 * clip(((W_size * W_sat)^gamma - eps) / (1 - eps))`.
    Bandpass {
        /// Lower edge of the size window.
        ts_low: f64,
        /// Softness of the lower size edge.
        ts_w_low: f64,
        /// Upper edge of the size window.
        ts_high: f64,
        /// Softness of the upper size edge.
        ts_w_high: f64,
        /// Lower edge of the saturation window.
        sat_low: f64,
        /// Softness of the lower saturation edge.
        sat_w_low: f64,
        /// Upper edge of the saturation window.
        sat_high: f64,
        /// Softness of the upper saturation edge.
        sat_w_high: f64,
        /// Exponent sharpening the window product.
        gamma: f64,
        /// Clip level subtracted before renormalization.
        eps_clip: f64,
    },
    /// Contrast-threshold model: size sets the saturation threshold, and
    /// performance rises only once saturation exceeds it.
    /// `C_t = c_inf + (c_0 - c_inf) / (1 + (size/ts_50)^beta)`,
    /// `p = 0.25 + 0.75 * (1 - exp(-k * max(0, ln(sat / C_t))))`.
    Threshold {
        /// Threshold floor at large sizes.
        c_inf: f64,
        /// Threshold at zero size.
        c_0: f64,
        /// Size of half-threshold decay.
        ts_50: f64,
        /// Steepness of the threshold decay.
        beta: f64,
        /// Rate at which performance rises above threshold.
        k: f64,
    },
}

impl ProbabilityModel {
    /// Success probability at a stimulus.
    pub fn probability(&self, size: f64, saturation: f64) -> f64 {
        match *self {
            ProbabilityModel::Polynomial {
                base,
                coefficient,
                exponent,
                size_scale,
                sat_scale,
            } => {
                let ts_norm = if size_scale != 0.0 { size / size_scale } else { 0.0 };
                let sat_norm = if sat_scale != 0.0 {
                    saturation / sat_scale
                } else {
                    0.0
                };
                let raw = (ts_norm.powi(2) + sat_norm.powi(2)) / 2.0;
                (base + coefficient * raw.powf(exponent)).clamp(0.0, 1.0)
            }
            ProbabilityModel::Bandpass {
                ts_low,
                ts_w_low,
                ts_high,
                ts_w_high,
                sat_low,
                sat_w_low,
                sat_high,
                sat_w_high,
                gamma,
                eps_clip,
            } => {
                let w_ts = sigmoid((size - ts_low) / ts_w_low) * sigmoid((ts_high - size) / ts_w_high);
                let w_sat = sigmoid((saturation - sat_low) / sat_w_low)
                    * sigmoid((sat_high - saturation) / sat_w_high);
                let product = (w_ts * w_sat).max(0.0).powf(gamma);
                let denom = 1.0 - eps_clip;
                let w = if denom > 1e-12 {
                    ((product - eps_clip) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                0.25 + 0.75 * w
            }
            ProbabilityModel::Threshold {
                c_inf,
                c_0,
                ts_50,
                beta,
                k,
            } => {
                let c_t = c_inf + (c_0 - c_inf) / (1.0 + (size / ts_50).max(1e-12).powf(beta));
                let ratio = saturation / c_t.max(1e-12);
                let above = ratio.max(1e-12).ln().max(0.0);
                0.25 + 0.75 * (1.0 - (-k * above).exp())
            }
        }
    }

    /// Human-readable formula with the concrete parameters inlined.
    pub fn description(&self) -> String {
        match *self {
            ProbabilityModel::Polynomial {
                base,
                coefficient,
                exponent,
                size_scale,
                sat_scale,
            } => format!(
                "{base} + {coefficient} * (((ts/{size_scale})^2 + (sat/{sat_scale})^2) / 2)^{exponent}"
            ),
            ProbabilityModel::Bandpass {
                ts_low,
                ts_w_low,
                ts_high,
                ts_w_high,
                sat_low,
                sat_w_low,
                sat_high,
                sat_w_high,
                gamma,
                eps_clip,
            } => format!(
                "0.25 + 0.75 * W, W = clip(((W_ts*W_sat)^{gamma} - {eps_clip}) / (1 - {eps_clip}), 0, 1), \
                 W_ts = sig((ts-{ts_low})/{ts_w_low})*sig(({ts_high}-ts)/{ts_w_high}), \
                 W_sat = sig((sat-{sat_low})/{sat_w_low})*sig(({sat_high}-sat)/{sat_w_high})"
            ),
            ProbabilityModel::Threshold {
                c_inf,
                c_0,
                ts_50,
                beta,
                k,
            } => format!(
                "0.25 + 0.75 * (1 - exp(-{k} * max(0, ln(sat / C_t)))), \
                 C_t(ts) = {c_inf} + ({c_0} - {c_inf}) / (1 + (ts/{ts_50})^{beta})"
            ),
        }
    }

    /// Draw one Bernoulli trial outcome at a stimulus.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R, size: f64, saturation: f64) -> bool {
        rng.random::<f64>() < self.probability(size, saturation)
    }
}

/// A labeled registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Display label.
    pub label: String,
    /// The model itself.
    #[serde(flatten)]
    pub model: ProbabilityModel,
}

/// An explicit, caller-owned collection of named ground-truth models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRegistry {
    entries: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock models shipped for tuning runs.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(
            "default",
            "Default (base 0.6)",
            ProbabilityModel::Polynomial {
                base: 0.6,
                coefficient: 0.39,
                exponent: 0.5,
                size_scale: 400.0,
                sat_scale: 1.0,
            },
        );
        registry.insert(
            "model2",
            "Model 2 (base 0.5)",
            ProbabilityModel::Polynomial {
                base: 0.5,
                coefficient: 0.39,
                exponent: 0.5,
                size_scale: 400.0,
                sat_scale: 1.0,
            },
        );
        registry.insert(
            "bandpass_default",
            "Bandpass Default",
            ProbabilityModel::Bandpass {
                ts_low: 50.0,
                ts_w_low: 15.0,
                ts_high: 300.0,
                ts_w_high: 15.0,
                sat_low: 0.2,
                sat_w_low: 0.05,
                sat_high: 0.8,
                sat_w_high: 0.05,
                gamma: 1.0,
                eps_clip: 0.01,
            },
        );
        registry.insert(
            "threshold_default",
            "Contrast Threshold",
            ProbabilityModel::Threshold {
                c_inf: 0.12,
                c_0: 0.95,
                ts_50: 60.0,
                beta: 2.0,
                k: 3.0,
            },
        );
        registry
    }

    /// Add or replace a named model.
    pub fn insert(&mut self, name: &str, label: &str, model: ProbabilityModel) {
        self.entries.insert(
            name.to_owned(),
            ModelEntry {
                label: label.to_owned(),
                model,
            },
        );
    }

    /// Look up a model, failing fast on unknown names.
    pub fn get(&self, name: &str) -> Result<&ModelEntry, ConfigError> {
        self.entries.get(name).ok_or_else(|| ConfigError::UnknownModel {
            name: name.to_owned(),
        })
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Simulate one trial against a named model.
    pub fn simulate_trial<R: Rng + ?Sized>(
        &self,
        name: &str,
        rng: &mut R,
        size: f64,
        saturation: f64,
    ) -> Result<bool, ConfigError> {
        let entry = self.get(name)?;
        Ok(entry.model.simulate(rng, size, saturation))
    }
}
