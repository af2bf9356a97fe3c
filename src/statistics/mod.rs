//! Statistical helpers for the axis-regression estimator.
//!
//! Currently just quantile computation, used to turn a stack of bootstrap
//! probability curves into pointwise confidence bands.

mod quantile;

pub use quantile::compute_quantile;
