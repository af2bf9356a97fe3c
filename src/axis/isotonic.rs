//! Isotonic regression via the pool-adjacent-violators algorithm.
//!
//! Natively monotonic increasing; predictions are clipped to [0, 1] and
//! interpolated linearly onto the evaluation grid, clamping outside the
//! observed range.

/// Fit an increasing isotonic curve and evaluate it over `grid`.
///
/// Fewer than 2 observations yields a flat 0.5 curve.
pub(crate) fn fit_isotonic(x: &[f64], y: &[f64], grid: &[f64]) -> Vec<f64> {
    if x.len() < 2 {
        return vec![0.5; grid.len()];
    }

    let (knots_x, knots_y) = pava(x, y);
    let curve: Vec<f64> = grid
        .iter()
        .map(|&g| interpolate(&knots_x, &knots_y, g).clamp(0.0, 1.0))
        .collect();
    // PAVA output is already non-decreasing; the running maximum is kept for
    // symmetry with the logistic fit and costs nothing.
    super::running_max(curve)
}

/// Pool adjacent violators on (x, y) pairs, pooling duplicate x first.
///
/// Returns the fitted knot positions and levels, both non-decreasing.
fn pava(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    // Average ties so each knot position is unique.
    let mut xs: Vec<f64> = Vec::with_capacity(x.len());
    let mut ys: Vec<f64> = Vec::with_capacity(x.len());
    let mut weights: Vec<f64> = Vec::with_capacity(x.len());
    for &i in &order {
        if xs.last() == Some(&x[i]) {
            let last = xs.len() - 1;
            let w = weights[last];
            ys[last] = (ys[last] * w + y[i]) / (w + 1.0);
            weights[last] = w + 1.0;
        } else {
            xs.push(x[i]);
            ys.push(y[i]);
            weights.push(1.0);
        }
    }

    // Blocks of (level, weight, end index); merge while decreasing.
    let mut levels: Vec<f64> = Vec::with_capacity(ys.len());
    let mut block_weights: Vec<f64> = Vec::with_capacity(ys.len());
    let mut block_ends: Vec<usize> = Vec::with_capacity(ys.len());
    for (i, (&value, &weight)) in ys.iter().zip(&weights).enumerate() {
        levels.push(value);
        block_weights.push(weight);
        block_ends.push(i);
        while levels.len() > 1 && levels[levels.len() - 1] < levels[levels.len() - 2] {
            let (lv, lw) = (levels.pop().unwrap(), block_weights.pop().unwrap());
            let end = block_ends.pop().unwrap();
            let last = levels.len() - 1;
            let merged_weight = block_weights[last] + lw;
            levels[last] = (levels[last] * block_weights[last] + lv * lw) / merged_weight;
            block_weights[last] = merged_weight;
            block_ends[last] = end;
        }
    }

    // Expand blocks back to per-knot levels.
    let mut fitted = vec![0.0; xs.len()];
    let mut start = 0;
    for (level, &end) in levels.iter().zip(&block_ends) {
        for slot in fitted.iter_mut().take(end + 1).skip(start) {
            *slot = *level;
        }
        start = end + 1;
    }

    (xs, fitted)
}

/// Piecewise-linear interpolation with clamped extrapolation.
fn interpolate(xs: &[f64], ys: &[f64], at: f64) -> f64 {
    if at <= xs[0] {
        return ys[0];
    }
    let last = xs.len() - 1;
    if at >= xs[last] {
        return ys[last];
    }
    let idx = xs.partition_point(|&v| v < at);
    let (x0, x1) = (xs[idx - 1], xs[idx]);
    let (y0, y1) = (ys[idx - 1], ys[idx]);
    if (x1 - x0).abs() < 1e-12 {
        return y1;
    }
    y0 + (y1 - y0) * (at - x0) / (x1 - x0)
}
