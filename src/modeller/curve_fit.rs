//! Landmark curve fitting.
//!
//! Closed fits and the dense open flavour interpolate each axis with a cubic
//! spline over the landmark index. Fits with an explicit subdivision count go
//! through the chord-length resampling filter instead, so every output has
//! exactly the requested number of evenly spaced points.

use crate::geom::{
    CubicSpline3, Curve3, Parameterization, Point3, Polyline, SplineError, resample_spline,
};

use super::options::FitOptions;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    #[error("curve fit requires at least 2 landmarks, got {count}")]
    InsufficientPoints { count: usize },
    #[error("curve fit collapsed to {output_points} output point(s)")]
    DegenerateCurve { output_points: usize },
    #[error("landmark {index} contains non-finite coordinates")]
    NonFinitePoint { index: usize },
}

impl From<SplineError> for FitError {
    fn from(err: SplineError) -> Self {
        match err {
            SplineError::TooFewPoints { count } => Self::InsufficientPoints { count },
            SplineError::NonFinitePoint { index } => Self::NonFinitePoint { index },
            SplineError::Collapsed | SplineError::Singular => Self::DegenerateCurve { output_points: 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurveFitter {
    options: FitOptions,
}

impl CurveFitter {
    #[must_use]
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> FitOptions {
        self.options
    }

    /// Fits a curve through `points` and samples it into a fresh polyline.
    ///
    /// * closed, no target: `samples_per_span * (n - 1)` samples over
    ///   `[0, n - 1]` followed by the samples at `0` and one step past it.
    /// * closed, `Some(k)`: `k + 1` chord-length samples, the last repeating
    ///   the first.
    /// * open, no target: `samples_per_span * (n - 1)` samples stopping one
    ///   step short of the last landmark.
    /// * open, `Some(m)`: exactly `m` chord-length samples from the first to
    ///   the last landmark.
    pub fn fit(
        &self,
        points: &[Point3],
        closed: bool,
        target_subdivisions: Option<usize>,
    ) -> Result<Polyline, FitError> {
        if points.len() < 2 {
            return Err(FitError::InsufficientPoints {
                count: points.len(),
            });
        }

        let samples = match (closed, target_subdivisions) {
            (true, None) => self.sample_closed(points)?,
            (false, None) => self.sample_open(points)?,
            (true, Some(subdivisions)) => {
                resample_spline(points, true, subdivisions, self.options.end_condition)?
            }
            (false, Some(count)) => {
                if count < 2 {
                    return Err(FitError::DegenerateCurve {
                        output_points: count,
                    });
                }
                resample_spline(points, false, count - 1, self.options.end_condition)?
            }
        };

        if samples.len() < 2 {
            return Err(FitError::DegenerateCurve {
                output_points: samples.len(),
            });
        }

        crate::debug_log!(
            "curve fit: {} landmarks -> {} points (closed: {closed})",
            points.len(),
            samples.len()
        );
        Ok(Polyline::new(samples, closed))
    }

    /// Closed profile through opening landmarks.
    pub fn fit_closed(&self, points: &[Point3]) -> Result<Polyline, FitError> {
        self.fit(points, true, None)
    }

    /// Open curve with exactly `count` points, as required for stitching.
    pub fn fit_open_exact(&self, points: &[Point3], count: usize) -> Result<Polyline, FitError> {
        self.fit(points, false, Some(count))
    }

    fn index_spline(&self, points: &[Point3], closed: bool) -> Result<CubicSpline3, FitError> {
        Ok(CubicSpline3::fit(
            points,
            closed,
            Parameterization::Index,
            self.options.end_condition,
        )?)
    }

    fn sample_closed(&self, points: &[Point3]) -> Result<Vec<Point3>, FitError> {
        let spline = self.index_spline(points, true)?;
        let interpolated = self.options.samples_per_span * (points.len() - 1);
        if interpolated < 2 {
            return Err(FitError::DegenerateCurve {
                output_points: interpolated,
            });
        }

        let (t0, t1) = spline.domain();
        let step = (t1 - t0) / (interpolated - 1) as f64;
        let mut out: Vec<Point3> = (0..interpolated)
            .map(|i| spline.point_at(t0 + step * i as f64))
            .collect();
        // Seam copies so consumers joining i to i + 1 see a closed ring.
        out.push(spline.point_at(t0));
        out.push(spline.point_at(t0 + step));
        Ok(out)
    }

    fn sample_open(&self, points: &[Point3]) -> Result<Vec<Point3>, FitError> {
        let spline = self.index_spline(points, false)?;
        let count = self.options.samples_per_span * (points.len() - 1);
        if count == 0 {
            return Err(FitError::DegenerateCurve { output_points: 0 });
        }

        let (t0, t1) = spline.domain();
        let step = (t1 - t0) / count as f64;
        Ok((0..count)
            .map(|i| spline.point_at(t0 + step * i as f64))
            .collect())
    }
}
