//! Oriented cross-section planes around a closed profile.

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Polyline, Tolerance, Vec3};
use crate::scene::CrossSectionView;

use super::options::ModellerOptions;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaneError {
    #[error("cannot generate planes from an empty profile")]
    EmptyProfile,
    #[error("profile has no usable tangent at point {index}")]
    DegenerateProfile { index: usize },
}

/// A finite plane described by a corner and two spanning axes.
///
/// `normal` is the raw forward-difference tangent of the profile and is not
/// normalized. The axes carry the display extents of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionPlane {
    pub origin: Point3,
    pub normal: Vec3,
    pub axis1: Vec3,
    pub axis2: Vec3,
    pub center: Point3,
}

impl CrossSectionPlane {
    #[must_use]
    pub fn point1(&self) -> Point3 {
        self.origin + self.axis1
    }

    #[must_use]
    pub fn point2(&self) -> Point3 {
        self.origin + self.axis2
    }

    /// The four corners, counter-clockwise from `origin`.
    #[must_use]
    pub fn corners(&self) -> [Point3; 4] {
        [
            self.origin,
            self.point1(),
            self.origin + self.axis1 + self.axis2,
            self.point2(),
        ]
    }

    /// Orthonormal viewing frame centred on the plane.
    ///
    /// The x axis is the radial axis with its normal component removed.
    #[must_use]
    pub fn view(&self) -> Option<CrossSectionView> {
        let normal = self.normal.normalized()?;
        let radial = self.axis1 - normal * self.axis1.dot(normal);
        let x_axis = radial
            .normalized()
            .or_else(|| normal.any_perpendicular())?;
        let y_axis = normal.cross(x_axis);
        Some(CrossSectionView {
            origin: self.center,
            normal,
            x_axis,
            y_axis,
        })
    }
}

/// Planes in traversal order around the profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaneSet {
    planes: Vec<CrossSectionPlane>,
}

impl PlaneSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CrossSectionPlane> {
        self.planes.get(index)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CrossSectionPlane] {
        &self.planes
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrossSectionPlane> {
        self.planes.iter()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CrossSectionPlaneGenerator {
    pub plane_count: usize,
    pub radial_scale: f64,
    pub vertical_scale: f64,
    pub centroid_stride: usize,
    pub tolerance: Tolerance,
}

impl Default for CrossSectionPlaneGenerator {
    fn default() -> Self {
        Self::from_options(&ModellerOptions::default())
    }
}

impl CrossSectionPlaneGenerator {
    #[must_use]
    pub fn from_options(options: &ModellerOptions) -> Self {
        Self {
            plane_count: options.plane_count,
            radial_scale: options.radial_scale,
            vertical_scale: options.vertical_scale,
            centroid_stride: options.centroid_stride,
            tolerance: Tolerance::ZERO_LENGTH,
        }
    }

    /// Mean of every `centroid_stride`-th profile point, starting at the first.
    #[must_use]
    pub fn centroid(&self, points: &[Point3]) -> Option<Point3> {
        Point3::centroid(points.iter().step_by(self.centroid_stride.max(1)))
    }

    pub fn generate(&self, profile: &Polyline) -> Result<PlaneSet, PlaneError> {
        let points = profile.points();
        let centroid = self.centroid(points).ok_or(PlaneError::EmptyProfile)?;

        let total = points.len();
        let step = (total / self.plane_count.max(1)).max(1);
        let mut planes = Vec::with_capacity(self.plane_count);

        for s in 0..self.plane_count {
            let i = (s * step) % total;
            let center = points[i];
            let tangent = self.forward_tangent(points, i)?;

            let mut radial = center - centroid;
            if self.tolerance.is_zero_vec3(radial) {
                radial = tangent
                    .any_perpendicular()
                    .ok_or(PlaneError::DegenerateProfile { index: i })?;
            }
            let vertical = tangent
                .cross(radial)
                .normalized()
                .or_else(|| tangent.any_perpendicular())
                .ok_or(PlaneError::DegenerateProfile { index: i })?;

            let axis1 = radial * self.radial_scale;
            let axis2 = vertical * self.vertical_scale;
            planes.push(CrossSectionPlane {
                origin: center - (axis1 + axis2) * 0.5,
                normal: tangent,
                axis1,
                axis2,
                center,
            });
        }

        log::debug!("generated {} cross-section planes from {total} profile points", planes.len());
        Ok(PlaneSet { planes })
    }

    /// `p[i + 1] - p[i]`, skipping ahead (and wrapping) past coincident points.
    fn forward_tangent(&self, points: &[Point3], i: usize) -> Result<Vec3, PlaneError> {
        let total = points.len();
        (1..total)
            .map(|k| points[(i + k) % total] - points[i])
            .find(|t| !self.tolerance.is_zero_vec3(*t))
            .ok_or(PlaneError::DegenerateProfile { index: i })
    }
}
