//! 1-D logistic regression fitted with iteratively reweighted least squares.
//!
//! The model is `P(success | x) = sigmoid(b0 + b1 * x_norm)` on min-max
//! normalized x, with an L2 ridge on the slope (the intercept is left
//! unpenalized, matching the usual regularized-logistic convention). The
//! fitted curve is forced monotonic non-decreasing with a running maximum
//! before it is returned.

use crate::types::{Matrix2, Vector2};

/// Ridge strength on the slope coefficient.
const RIDGE: f64 = 1.0;

/// Newton/IRLS iteration cap.
const MAX_ITERATIONS: usize = 25;

/// Convergence tolerance on the update step.
const STEP_TOLERANCE: f64 = 1e-8;

/// Probability clamp keeping logits finite.
const PROB_EPS: f64 = 1e-9;

fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-z).exp())
}

fn normalize(value: f64, lower: f64, upper: f64) -> f64 {
    (value - lower) / (upper - lower).max(1e-9)
}

/// Fit the logistic curve and evaluate it over `grid`.
///
/// Fallbacks, in order: fewer than 3 observations yields a flat 0.5 curve;
/// a single observed class yields a flat Laplace-smoothed mean
/// `(sum(y) + 1) / (n + 2)`.
pub(crate) fn fit_logistic(
    x: &[f64],
    y: &[f64],
    grid: &[f64],
    lower: f64,
    upper: f64,
) -> Vec<f64> {
    let n = x.len();
    if n < 3 {
        return vec![0.5; grid.len()];
    }

    let successes: f64 = y.iter().sum();
    if successes == 0.0 || successes == n as f64 {
        // No class separation yet; use a Laplace-smoothed empirical mean.
        let p = (successes + 1.0) / (n as f64 + 2.0);
        return vec![p; grid.len()];
    }

    let xn: Vec<f64> = x.iter().map(|&v| normalize(v, lower, upper)).collect();
    let beta = irls(&xn, y);

    let curve: Vec<f64> = grid
        .iter()
        .map(|&g| sigmoid(beta[0] + beta[1] * normalize(g, lower, upper)))
        .collect();
    super::running_max(curve)
}

/// Newton iterations on the penalized log-likelihood.
fn irls(xn: &[f64], y: &[f64]) -> Vector2 {
    let mut beta = Vector2::zeros();

    for _ in 0..MAX_ITERATIONS {
        let mut gradient = Vector2::zeros();
        let mut hessian = Matrix2::zeros();

        for (&xi, &yi) in xn.iter().zip(y) {
            let mu = sigmoid(beta[0] + beta[1] * xi).clamp(PROB_EPS, 1.0 - PROB_EPS);
            let w = (mu * (1.0 - mu)).max(PROB_EPS);
            let residual = yi - mu;

            gradient[0] += residual;
            gradient[1] += residual * xi;

            hessian[(0, 0)] += w;
            hessian[(0, 1)] += w * xi;
            hessian[(1, 0)] += w * xi;
            hessian[(1, 1)] += w * xi * xi;
        }

        // Ridge on the slope only.
        gradient[1] -= RIDGE * beta[1];
        hessian[(1, 1)] += RIDGE;

        let step = match hessian.try_inverse() {
            Some(inverse) => inverse * gradient,
            None => break,
        };
        beta += step;

        if step.norm() < STEP_TOLERANCE {
            break;
        }
    }

    beta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(lower: f64, upper: f64) -> Vec<f64> {
        super::super::make_grid(lower, upper, 21)
    }

    #[test]
    fn too_few_points_is_flat_half() {
        let curve = fit_logistic(&[1.0, 2.0], &[0.0, 1.0], &grid(0.0, 10.0), 0.0, 10.0);
        assert!(curve.iter().all(|&p| p == 0.5));
    }

    #[test]
    fn single_class_is_laplace_smoothed() {
        let curve = fit_logistic(
            &[1.0, 2.0, 3.0],
            &[1.0, 1.0, 1.0],
            &grid(0.0, 10.0),
            0.0,
            10.0,
        );
        let expected = 4.0 / 5.0;
        assert!(curve.iter().all(|&p| (p - expected).abs() < 1e-12));
    }

    #[test]
    fn separable_data_produces_rising_curve() {
        let x = [1.0, 2.0, 3.0, 7.0, 8.0, 9.0];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let g = grid(0.0, 10.0);
        let curve = fit_logistic(&x, &y, &g, 0.0, 10.0);
        assert!(curve[0] < 0.5);
        assert!(curve[curve.len() - 1] > 0.5);
        for pair in curve.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn decreasing_data_is_flattened_by_running_max() {
        // Successes concentrated at low x: the raw fit decreases, the
        // returned curve must still be non-decreasing.
        let x = [1.0, 2.0, 3.0, 7.0, 8.0, 9.0];
        let y = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let curve = fit_logistic(&x, &y, &grid(0.0, 10.0), 0.0, 10.0);
        for pair in curve.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
