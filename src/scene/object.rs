//! Payloads the modeller publishes to the scene.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Polyline, SurfaceMesh, Vec3};
use crate::modeller::CrossSectionPlane;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Profile,
    Plane,
    LeafletCurve,
    Surface,
}

impl ObjectKind {
    pub const ALL: [Self; 4] = [Self::Profile, Self::Plane, Self::LeafletCurve, Self::Surface];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Plane => "plane",
            Self::LeafletCurve => "leaflet curve",
            Self::Surface => "surface",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Profile(Polyline),
    Plane { index: usize, plane: CrossSectionPlane },
    LeafletCurve { slot: usize, curve: Polyline },
    Surface(SurfaceMesh),
}

impl SceneObject {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Profile(_) => ObjectKind::Profile,
            Self::Plane { .. } => ObjectKind::Plane,
            Self::LeafletCurve { .. } => ObjectKind::LeafletCurve,
            Self::Surface(_) => ObjectKind::Surface,
        }
    }

    #[must_use]
    pub fn as_polyline(&self) -> Option<&Polyline> {
        match self {
            Self::Profile(polyline) | Self::LeafletCurve { curve: polyline, .. } => Some(polyline),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_plane(&self) -> Option<&CrossSectionPlane> {
        if let Self::Plane { plane, .. } = self {
            Some(plane)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_surface(&self) -> Option<&SurfaceMesh> {
        if let Self::Surface(mesh) = self {
            Some(mesh)
        } else {
            None
        }
    }
}

/// Orthonormal frame of a reslice view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionView {
    pub origin: Point3,
    pub normal: Vec3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
}

impl Default for CrossSectionView {
    fn default() -> Self {
        Self {
            origin: Point3::ORIGIN,
            normal: Vec3::Z,
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
        }
    }
}
