use crate::scene::SceneError;

use super::cross_section::PlaneError;
use super::curve_fit::FitError;
use super::leaflets::StoreError;
use super::stitch::StitchError;

/// Failure of a modeller command. No modeller state changes when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModellerError {
    #[error("missing input: {what}")]
    NullInput { what: &'static str },
    #[error("plane index {index} is out of range for {count} planes")]
    PlaneIndexOutOfRange { index: usize, count: usize },
    #[error("curve fit failed: {0}")]
    Fit(#[from] FitError),
    #[error("plane generation failed: {0}")]
    Plane(#[from] PlaneError),
    #[error("leaflet store: {0}")]
    Store(#[from] StoreError),
    #[error("surface stitching failed: {0}")]
    Stitch(#[from] StitchError),
    #[error("scene: {0}")]
    Scene(#[from] SceneError),
}
