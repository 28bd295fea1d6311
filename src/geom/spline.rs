//! Interpolating cubic splines through 3D points.
//!
//! One spline is solved per coordinate axis, all sharing the same knot
//! vector, so the system matrix is factored once and solved against `Vec3`
//! right-hand sides. Open splines use a tridiagonal (Thomas) solve; closed
//! splines are periodic and use the cyclic variant (Sherman-Morrison).
//!
//! Two parameterizations are supported:
//! - [`Parameterization::Index`]: knot `i` sits at `t = i`.
//! - [`Parameterization::ChordLength`]: knots follow cumulative point spacing,
//!   which keeps resampled points evenly spread along the curve.
//!
//! The reported [`Curve3::domain`] of a closed spline is `[t_0, t_{n-1}]`; the
//! closing span continues past it up to `t_0 + period()`.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::{Point3, Tolerance, Vec3};

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    fn domain(&self) -> (f64, f64);

    #[must_use]
    fn is_closed(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parameterization {
    #[default]
    Index,
    ChordLength,
}

/// Boundary condition applied at both ends of an open spline.
///
/// Closed splines are periodic and ignore this setting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndCondition {
    /// Zero second derivative at the ends.
    Natural,
    /// Prescribed first derivative (per axis) at the ends.
    Clamped { start_tangent: Vec3, end_tangent: Vec3 },
}

impl Default for EndCondition {
    fn default() -> Self {
        Self::Clamped {
            start_tangent: Vec3::ZERO,
            end_tangent: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("spline requires at least 2 points, got {count}")]
    TooFewPoints { count: usize },
    #[error("spline point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("spline points collapse to a single location")]
    Collapsed,
    #[error("spline system is singular")]
    Singular,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline3 {
    knots: Vec<f64>,
    values: Vec<Vec3>,
    second: Vec<Vec3>,
    closed: bool,
}

impl CubicSpline3 {
    /// Fits a spline through `points`.
    ///
    /// With [`Parameterization::ChordLength`] consecutive coincident points (and
    /// for closed input a trailing copy of the first point) are dropped first,
    /// since they would produce zero-length knot spans.
    pub fn fit(
        points: &[Point3],
        closed: bool,
        parameterization: Parameterization,
        end: EndCondition,
    ) -> Result<Self, SplineError> {
        if points.len() < 2 {
            return Err(SplineError::TooFewPoints {
                count: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(SplineError::NonFinitePoint { index });
        }

        let mut values: Vec<Vec3> = match parameterization {
            Parameterization::Index => points.iter().map(|p| p.to_vec3()).collect(),
            Parameterization::ChordLength => distinct_values(points, closed, Tolerance::ZERO_LENGTH),
        };
        if values.len() < 2 {
            return Err(SplineError::Collapsed);
        }

        let n = values.len();
        let mut knots = Vec::with_capacity(n + 1);
        knots.push(0.0);
        for i in 1..n {
            let span = knot_span(values[i - 1], values[i], parameterization);
            knots.push(knots[i - 1] + span);
        }

        let second = if closed {
            let span = knot_span(values[n - 1], values[0], parameterization);
            knots.push(knots[n - 1] + span);
            values.push(values[0]);
            let mut m = solve_periodic(&knots, &values).ok_or(SplineError::Singular)?;
            m.push(m[0]);
            m
        } else {
            solve_open(&knots, &values, end).ok_or(SplineError::Singular)?
        };

        Ok(Self {
            knots,
            values,
            second,
            closed,
        })
    }

    /// Number of interpolated points (the periodic seam copy is not counted).
    #[must_use]
    pub fn point_count(&self) -> usize {
        if self.closed {
            self.values.len() - 1
        } else {
            self.values.len()
        }
    }

    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Length of one full period, `None` for open splines.
    #[must_use]
    pub fn period(&self) -> Option<f64> {
        if self.closed {
            let last = self.knots.len() - 1;
            Some(self.knots[last] - self.knots[0])
        } else {
            None
        }
    }

    #[must_use]
    pub fn derivative_at(&self, t: f64) -> Vec3 {
        let t = self.wrap_parameter(t);
        let i = self.span_index(t);
        let h = self.knots[i + 1] - self.knots[i];
        let a = self.knots[i + 1] - t;
        let b = t - self.knots[i];
        let (mi, mj) = (self.second[i], self.second[i + 1]);
        let (yi, yj) = (self.values[i], self.values[i + 1]);

        mi * (-a * a / (2.0 * h)) + mj * (b * b / (2.0 * h)) + (yj - yi) * (1.0 / h)
            - (mj - mi) * (h / 6.0)
    }

    /// Samples `subdivisions + 1` points evenly spaced in parameter.
    ///
    /// Open splines are sampled over their domain. Closed splines are sampled
    /// over one full period and the final sample is the first point again.
    #[must_use]
    pub fn resample(&self, subdivisions: usize) -> Vec<Point3> {
        let (t0, t1) = match self.period() {
            Some(period) => (self.knots[0], self.knots[0] + period),
            None => self.domain(),
        };
        if subdivisions == 0 {
            return vec![self.point_at(t0)];
        }

        let step = (t1 - t0) / subdivisions as f64;
        let mut out: Vec<Point3> = (0..=subdivisions)
            .map(|k| self.point_at(t0 + step * k as f64))
            .collect();
        if self.closed {
            out[subdivisions] = out[0];
        }
        out
    }

    fn wrap_parameter(&self, t: f64) -> f64 {
        let start = self.knots[0];
        match self.period() {
            Some(period) if period > 0.0 => start + (t - start).rem_euclid(period),
            _ => {
                let (a, b) = self.domain();
                t.clamp(a, b)
            }
        }
    }

    fn span_index(&self, t: f64) -> usize {
        let last_span = self.knots.len() - 2;
        let upper = self.knots.partition_point(|&k| k <= t);
        upper.saturating_sub(1).min(last_span)
    }
}

impl Curve3 for CubicSpline3 {
    fn point_at(&self, t: f64) -> Point3 {
        let t = self.wrap_parameter(t);
        let i = self.span_index(t);
        let h = self.knots[i + 1] - self.knots[i];
        let a = self.knots[i + 1] - t;
        let b = t - self.knots[i];
        let (mi, mj) = (self.second[i], self.second[i + 1]);
        let (yi, yj) = (self.values[i], self.values[i + 1]);

        let v = mi * (a * a * a / (6.0 * h))
            + mj * (b * b * b / (6.0 * h))
            + (yi * (1.0 / h) - mi * (h / 6.0)) * a
            + (yj * (1.0 / h) - mj * (h / 6.0)) * b;
        Point3::from(v)
    }

    fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.point_count() - 1])
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Fits a chord-length spline through `points` and resamples it to
/// `subdivisions + 1` evenly spaced points.
///
/// For closed input the last output point repeats the first.
pub fn resample_spline(
    points: &[Point3],
    closed: bool,
    subdivisions: usize,
    end: EndCondition,
) -> Result<Vec<Point3>, SplineError> {
    let spline = CubicSpline3::fit(points, closed, Parameterization::ChordLength, end)?;
    Ok(spline.resample(subdivisions))
}

fn distinct_values(points: &[Point3], closed: bool, tol: Tolerance) -> Vec<Vec3> {
    let mut out: Vec<Point3> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|&last| tol.approx_eq_point3(last, p)) {
            continue;
        }
        out.push(p);
    }
    if closed {
        while out.len() > 1 && tol.approx_eq_point3(out[0], out[out.len() - 1]) {
            out.pop();
        }
    }
    out.into_iter().map(Point3::to_vec3).collect()
}

fn knot_span(a: Vec3, b: Vec3, parameterization: Parameterization) -> f64 {
    match parameterization {
        Parameterization::Index => 1.0,
        Parameterization::ChordLength => (b - a).length(),
    }
}

fn solve_open(knots: &[f64], values: &[Vec3], end: EndCondition) -> Option<Vec<Vec3>> {
    let n = values.len();
    let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();

    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![Vec3::ZERO; n];

    for i in 1..n - 1 {
        sub[i] = h[i - 1];
        diag[i] = 2.0 * (h[i - 1] + h[i]);
        sup[i] = h[i];
        rhs[i] = ((values[i + 1] - values[i]) * (1.0 / h[i])
            - (values[i] - values[i - 1]) * (1.0 / h[i - 1]))
            * 6.0;
    }

    match end {
        EndCondition::Natural => {
            diag[0] = 1.0;
            diag[n - 1] = 1.0;
        }
        EndCondition::Clamped {
            start_tangent,
            end_tangent,
        } => {
            diag[0] = 2.0 * h[0];
            sup[0] = h[0];
            rhs[0] = ((values[1] - values[0]) * (1.0 / h[0]) - start_tangent) * 6.0;

            let last = n - 2;
            sub[n - 1] = h[last];
            diag[n - 1] = 2.0 * h[last];
            rhs[n - 1] = (end_tangent - (values[n - 1] - values[last]) * (1.0 / h[last])) * 6.0;
        }
    }

    solve_tridiagonal(&sub, &diag, &sup, &rhs)
}

/// `values` and `knots` carry the seam copy at index `n`.
fn solve_periodic(knots: &[f64], values: &[Vec3]) -> Option<Vec<Vec3>> {
    let n = values.len() - 1;
    let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();

    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![Vec3::ZERO; n];

    for i in 0..n {
        let prev = (i + n - 1) % n;
        sub[i] = h[prev];
        diag[i] = 2.0 * (h[prev] + h[i]);
        sup[i] = h[i];
        rhs[i] = ((values[i + 1] - values[i]) * (1.0 / h[i])
            - (values[i] - values[prev]) * (1.0 / h[prev]))
            * 6.0;
    }

    if n == 2 {
        // Both neighbours of each row are the same unknown.
        let off = sub[0] + sup[0];
        let det = diag[0] * diag[1] - off * off;
        if !det.is_finite() || det.abs() <= f64::MIN_POSITIVE {
            return None;
        }
        let m0 = (rhs[0] * diag[1] - rhs[1] * off) * (1.0 / det);
        let m1 = (rhs[1] * diag[0] - rhs[0] * off) * (1.0 / det);
        return Some(vec![m0, m1]);
    }

    let alpha = sup[n - 1];
    let beta = sub[0];
    solve_cyclic(&sub, &diag, &sup, alpha, beta, &rhs)
}

fn solve_tridiagonal<T>(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[T]) -> Option<Vec<T>>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let n = diag.len();
    if n == 0 || rhs.len() != n {
        return None;
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime: Vec<T> = Vec::with_capacity(n);

    let first = diag[0];
    if !first.is_finite() || first.abs() <= f64::MIN_POSITIVE {
        return None;
    }
    if n > 1 {
        c_prime[0] = sup[0] / first;
    }
    d_prime.push(rhs[0] * (1.0 / first));

    for i in 1..n {
        let denom = diag[i] - sub[i] * c_prime[i - 1];
        if !denom.is_finite() || denom.abs() <= f64::MIN_POSITIVE {
            return None;
        }
        if i < n - 1 {
            c_prime[i] = sup[i] / denom;
        }
        let d = (rhs[i] - d_prime[i - 1] * sub[i]) * (1.0 / denom);
        d_prime.push(d);
    }

    let mut x = d_prime;
    for i in (0..n - 1).rev() {
        x[i] = x[i] - x[i + 1] * c_prime[i];
    }
    Some(x)
}

/// Cyclic tridiagonal solve; `alpha` is the bottom-left and `beta` the
/// top-right corner coefficient.
fn solve_cyclic<T>(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    alpha: f64,
    beta: f64,
    rhs: &[T],
) -> Option<Vec<T>>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let n = diag.len();
    if n < 3 {
        return None;
    }

    let gamma = -diag[0];
    let mut modified = diag.to_vec();
    modified[0] = diag[0] - gamma;
    modified[n - 1] = diag[n - 1] - alpha * beta / gamma;

    let mut x = solve_tridiagonal(sub, &modified, sup, rhs)?;

    let mut u = vec![0.0; n];
    u[0] = gamma;
    u[n - 1] = alpha;
    let z = solve_tridiagonal(sub, &modified, sup, &u)?;

    let denom = 1.0 + z[0] + beta * z[n - 1] / gamma;
    if !denom.is_finite() || denom.abs() <= f64::MIN_POSITIVE {
        return None;
    }
    let fact = (x[0] + x[n - 1] * (beta / gamma)) * (1.0 / denom);
    for (xi, zi) in x.iter_mut().zip(z) {
        *xi = *xi - fact * zi;
    }
    Some(x)
}
