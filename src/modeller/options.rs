//! Configuration for the reconstruction pipeline.
//!
//! Every struct deserializes with `#[serde(default)]`, so a host only needs to
//! persist the fields it changes.

use serde::{Deserialize, Serialize};

use crate::geom::{EndCondition, Tolerance};

/// Settings for landmark curve fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Dense samples emitted per landmark span.
    pub samples_per_span: usize,
    /// Boundary condition for open curves.
    pub end_condition: EndCondition,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            samples_per_span: 52,
            end_condition: EndCondition::default(),
        }
    }
}

/// Settings for turning leaflet curves into a closed surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchOptions {
    /// Curve positions between consecutive rings.
    pub ring_step: usize,
    /// Subdivisions of the closed spline re-fitted through each ring.
    pub ring_subdivisions: usize,
    /// Dihedral angle above which normals are split into a crease.
    pub feature_angle_degrees: f64,
    pub fill_holes: bool,
    pub auto_orient_normals: bool,
    pub tolerance: Tolerance,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            ring_step: 2,
            ring_subdivisions: 70,
            feature_angle_degrees: 60.0,
            fill_holes: true,
            auto_orient_normals: true,
            tolerance: Tolerance::default_geom(),
        }
    }
}

impl StitchOptions {
    #[must_use]
    pub fn with_ring_step(step: usize) -> Self {
        Self {
            ring_step: step,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ring_subdivisions(subdivisions: usize) -> Self {
        Self {
            ring_subdivisions: subdivisions,
            ..Self::default()
        }
    }
}

/// Well-known names of the objects the modeller publishes to the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneNames {
    pub opening_points: String,
    pub leaflet_points: String,
    pub profile: String,
    pub plane_prefix: String,
    pub leaflet_prefix: String,
    pub surface: String,
    pub merged_curves: String,
    pub cross_section_view: String,
}

impl Default for SceneNames {
    fn default() -> Self {
        Self {
            opening_points: "MVOpeningPoints".to_owned(),
            leaflet_points: "LeafletPoints".to_owned(),
            profile: "MVOpening".to_owned(),
            plane_prefix: "MVPlane".to_owned(),
            leaflet_prefix: "Leaflet".to_owned(),
            surface: "MVSurface".to_owned(),
            merged_curves: "MVLeafletCurves".to_owned(),
            cross_section_view: "CrossSectionRed".to_owned(),
        }
    }
}

impl SceneNames {
    /// Scene name of plane `index` (0-based).
    #[must_use]
    pub fn plane(&self, index: usize) -> String {
        format!("{}{index}", self.plane_prefix)
    }

    /// Scene name of leaflet `slot` (1-based).
    #[must_use]
    pub fn leaflet(&self, slot: usize) -> String {
        format!("{}{slot}", self.leaflet_prefix)
    }
}

/// Top-level options for [`ValveModeller`](super::ValveModeller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModellerOptions {
    pub plane_count: usize,
    /// Scale applied to the radial in-plane axis of each cross-section plane.
    pub radial_scale: f64,
    /// Length of the vertical in-plane axis of each cross-section plane.
    pub vertical_scale: f64,
    /// Only every n-th profile point contributes to the centroid.
    pub centroid_stride: usize,
    /// Points per fitted leaflet curve; all slots share it so they can be stitched.
    pub leaflet_point_count: usize,
    /// Plane indices left visible after generation.
    pub highlighted_planes: Vec<usize>,
    pub fit: FitOptions,
    pub stitch: StitchOptions,
    pub names: SceneNames,
}

impl Default for ModellerOptions {
    fn default() -> Self {
        Self {
            plane_count: 11,
            radial_scale: 3.5,
            vertical_scale: 50.0,
            centroid_stride: 10,
            leaflet_point_count: 50,
            highlighted_planes: vec![0, 5],
            fit: FitOptions::default(),
            stitch: StitchOptions::default(),
            names: SceneNames::default(),
        }
    }
}

impl ModellerOptions {
    #[must_use]
    pub fn with_highlighted_planes(mut self, planes: impl IntoIterator<Item = usize>) -> Self {
        self.highlighted_planes = planes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_leaflet_point_count(mut self, count: usize) -> Self {
        self.leaflet_point_count = count;
        self
    }

    #[must_use]
    pub fn with_stitch(mut self, stitch: StitchOptions) -> Self {
        self.stitch = stitch;
        self
    }

    #[must_use]
    pub fn is_highlighted(&self, plane: usize) -> bool {
        self.highlighted_planes.contains(&plane)
    }
}
