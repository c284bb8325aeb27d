//! Cubic interpolating spline with zero extrapolation.
//!
//! The spline passes through every sample and uses not-a-knot end
//! conditions, which gives the same curve as a FITPACK degree-3 spline with
//! zero smoothing (interior knots at `x[2] ..= x[n-3]`). Outside
//! `[x[0], x[n-1]]` it evaluates to zero.

use crate::error::{Error, Result};

/// Samples needed for a cubic: degree + 1.
pub const MIN_POINTS: usize = 4;

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// First derivative at each knot.
    slopes: Vec<f64>,
}

impl CubicSpline {
    /// Fit the interpolating spline. `x` must be strictly increasing and
    /// hold at least [`MIN_POINTS`] finite values.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                field: "y",
                expected: x.len(),
                actual: y.len(),
            });
        }
        if x.len() < MIN_POINTS {
            return Err(Error::DomainError(format!(
                "cubic spline needs at least {MIN_POINTS} points, got {}",
                x.len()
            )));
        }
        if let Some(i) = x.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(Error::DomainError(format!(
                "x must be strictly increasing (x[{}] = {}, x[{}] = {})",
                i,
                x[i],
                i + 1,
                x[i + 1]
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::DomainError(String::from("x must be finite")));
        }

        let slopes = not_a_knot_slopes(x, y)?;
        tracing::trace!(points = x.len(), "fitted cubic spline");
        Ok(CubicSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes,
        })
    }

    /// Domain `(x[0], x[n-1])`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluate at `t`; zero outside the fitted range, NaN for NaN input.
    pub fn evaluate(&self, t: f64) -> f64 {
        if t.is_nan() {
            return f64::NAN;
        }
        let (lo, hi) = self.bounds();
        if t < lo || t > hi {
            return 0.0;
        }

        // Interval i with x[i] <= t <= x[i+1].
        let i = self
            .x
            .partition_point(|&v| v <= t)
            .saturating_sub(1)
            .min(self.x.len() - 2);

        let h = self.x[i + 1] - self.x[i];
        let secant = (self.y[i + 1] - self.y[i]) / h;
        let (s0, s1) = (self.slopes[i], self.slopes[i + 1]);
        let c2 = (3.0 * secant - 2.0 * s0 - s1) / h;
        let c3 = (s0 + s1 - 2.0 * secant) / (h * h);
        let dt = t - self.x[i];
        self.y[i] + dt * (s0 + dt * (c2 + dt * c3))
    }

    pub fn evaluate_many(&self, t: &[f64]) -> Vec<f64> {
        t.iter().map(|&v| self.evaluate(v)).collect()
    }
}

/// Solve for knot slopes under not-a-knot end conditions (third derivative
/// continuous across x[1] and x[n-2]).
fn not_a_knot_slopes(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let secant: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / dx[i]).collect();

    let mut sub = vec![0.0; n - 1];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n - 1];
    let mut rhs = vec![0.0; n];

    for i in 1..n - 1 {
        sub[i - 1] = dx[i];
        diag[i] = 2.0 * (dx[i - 1] + dx[i]);
        sup[i] = dx[i - 1];
        rhs[i] = 3.0 * (dx[i] * secant[i - 1] + dx[i - 1] * secant[i]);
    }

    let d = x[2] - x[0];
    diag[0] = dx[1];
    sup[0] = d;
    rhs[0] = ((dx[0] + 2.0 * d) * dx[1] * secant[0] + dx[0] * dx[0] * secant[1]) / d;

    let d = x[n - 1] - x[n - 3];
    diag[n - 1] = dx[n - 3];
    sub[n - 2] = d;
    rhs[n - 1] = (dx[n - 2] * dx[n - 2] * secant[n - 3]
        + (2.0 * d + dx[n - 2]) * dx[n - 3] * secant[n - 2])
        / d;

    solve_tridiagonal(sub, diag, sup, rhs)
}

/// Gaussian elimination with partial pivoting on a tridiagonal system.
///
/// Row swaps fill one extra superdiagonal, which is kept in `sub` once the
/// corresponding subdiagonal entry has been eliminated.
fn solve_tridiagonal(
    mut sub: Vec<f64>,
    mut diag: Vec<f64>,
    mut sup: Vec<f64>,
    mut rhs: Vec<f64>,
) -> Result<Vec<f64>> {
    let n = diag.len();
    let singular = || Error::DomainError(String::from("singular spline system"));

    for i in 0..n - 1 {
        if diag[i].abs() >= sub[i].abs() {
            if diag[i] == 0.0 {
                return Err(singular());
            }
            let fact = sub[i] / diag[i];
            diag[i + 1] -= fact * sup[i];
            rhs[i + 1] -= fact * rhs[i];
            sub[i] = 0.0;
        } else {
            let fact = diag[i] / sub[i];
            diag[i] = sub[i];
            let tmp = diag[i + 1];
            diag[i + 1] = sup[i] - fact * tmp;
            if i + 2 < n {
                sub[i] = sup[i + 1];
                sup[i + 1] = -fact * sub[i];
            }
            sup[i] = tmp;
            let tmp = rhs[i];
            rhs[i] = rhs[i + 1];
            rhs[i + 1] = tmp - fact * rhs[i + 1];
        }
    }
    if diag[n - 1] == 0.0 {
        return Err(singular());
    }

    rhs[n - 1] /= diag[n - 1];
    rhs[n - 2] = (rhs[n - 2] - sup[n - 2] * rhs[n - 1]) / diag[n - 2];
    for i in (0..n.saturating_sub(2)).rev() {
        rhs[i] = (rhs[i] - sup[i] * rhs[i + 1] - sub[i] * rhs[i + 2]) / diag[i];
    }
    Ok(rhs)
}
