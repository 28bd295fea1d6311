//! Mitral valve reconstruction pipeline.
//!
//! [`ValveModeller`] owns the derived state (profile, planes, leaflet curves,
//! surface) and exposes the commands a host UI sequences:
//!
//! ```ignore
//! let mut modeller = ValveModeller::new(ModellerOptions::default());
//! modeller.begin_opening_capture();
//! // ... user places opening landmarks through modeller.capture_mut() ...
//! modeller.end_opening_capture()?;
//! modeller.select_plane(0)?;
//! modeller.begin_leaflet_capture();
//! // ... landmarks for the leaflet at plane 0 ...
//! modeller.end_leaflet_capture(1)?;
//! let (mesh, diag, stitch) = modeller.generate_surface()?;
//! ```
//!
//! Every command computes its results into locals and only commits them once
//! all fallible steps have succeeded. Scene publishing happens after commit;
//! scene failures there are logged and do not undo the command.

mod cross_section;
mod curve_fit;
mod error;
mod leaflets;
mod options;
mod stitch;

pub use cross_section::{CrossSectionPlane, CrossSectionPlaneGenerator, PlaneError, PlaneSet};
pub use curve_fit::{CurveFitter, FitError};
pub use error::ModellerError;
pub use leaflets::{LEAFLET_SLOT_COUNT, LeafletCurveStore, StoreError};
pub use options::{FitOptions, ModellerOptions, SceneNames, StitchOptions};
pub use stitch::{StitchDiagnostics, StitchError, SurfaceStitcher};

use crate::geom::{
    GeomMeshDiagnostics, PipelineMetrics, Point3, PolyData, Polyline, SurfaceMesh, TimingBucket,
    TimingReport,
};
use crate::scene::{
    CrossSectionView, MarkupCapture, NodeId, PointCapture, Scene, SceneError, SceneObject,
    SceneStore,
};

/// Which landmark set the capture tool is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSession {
    Opening,
    Leaflet,
}

pub struct ValveModeller<S = Scene, C = MarkupCapture> {
    options: ModellerOptions,
    scene: S,
    capture: C,
    session: Option<CaptureSession>,
    profile: Option<Polyline>,
    planes: Option<PlaneSet>,
    plane_nodes: Vec<NodeId>,
    leaflets: LeafletCurveStore,
    surface: Option<SurfaceMesh>,
    metrics: PipelineMetrics,
}

impl ValveModeller {
    /// Modeller over an in-memory scene (default styles, one cross-section
    /// view) and an in-memory markup capture.
    #[must_use]
    pub fn new(options: ModellerOptions) -> Self {
        let scene = Scene::new()
            .with_default_styles()
            .with_view(options.names.cross_section_view.clone());
        Self::with_collaborators(options, scene, MarkupCapture::new())
    }
}

impl Default for ValveModeller {
    fn default() -> Self {
        Self::new(ModellerOptions::default())
    }
}

impl<S: SceneStore, C: PointCapture> ValveModeller<S, C> {
    pub fn with_collaborators(options: ModellerOptions, scene: S, capture: C) -> Self {
        Self {
            options,
            scene,
            capture,
            session: None,
            profile: None,
            planes: None,
            plane_nodes: Vec::new(),
            leaflets: LeafletCurveStore::new(),
            surface: None,
            metrics: PipelineMetrics::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ModellerOptions {
        &self.options
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    #[must_use]
    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    #[must_use]
    pub fn session(&self) -> Option<CaptureSession> {
        self.session
    }

    /// Timing of the most recent command (`modeller_metrics` feature only).
    #[must_use]
    pub fn last_timing(&self) -> Option<TimingReport> {
        self.metrics.end()
    }

    // ── Opening ─────────────────────────────────────────────────────────────

    /// Starts placing opening landmarks; previously captured points are cleared.
    pub fn begin_opening_capture(&mut self) {
        self.begin_session(CaptureSession::Opening);
    }

    /// Fits the profile through the captured opening landmarks.
    pub fn end_opening_capture(&mut self) -> Result<&Polyline, ModellerError> {
        let landmarks = self.landmarks_for(CaptureSession::Opening, "opening landmark source")?;
        self.end_opening_capture_with(&landmarks)
    }

    /// Fits the profile through `landmarks`, regenerates the planes and hides
    /// the capture target.
    pub fn end_opening_capture_with(&mut self, landmarks: &[Point3]) -> Result<&Polyline, ModellerError> {
        let fitter = CurveFitter::new(self.options.fit);
        let generator = CrossSectionPlaneGenerator::from_options(&self.options);

        self.metrics.begin();
        let profile = self
            .metrics
            .time(TimingBucket::CurveFit, || fitter.fit_closed(landmarks))?;
        let planes = self
            .metrics
            .time(TimingBucket::PlaneGeneration, || generator.generate(&profile))?;

        log::info!(
            "opening profile: {} landmarks -> {} points, {} planes",
            landmarks.len(),
            profile.len(),
            planes.len()
        );

        self.finish_session(CaptureSession::Opening);
        self.capture.set_target_visible(false);
        self.profile = Some(profile);
        self.planes = Some(planes);

        self.publish_profile();
        let profile = self
            .profile
            .as_ref()
            .ok_or(ModellerError::NullInput { what: "profile" })?;
        Ok(profile)
    }

    // ── Planes ──────────────────────────────────────────────────────────────

    /// Reorients the cross-section view onto plane `index` and returns the new frame.
    pub fn select_plane(&mut self, index: usize) -> Result<CrossSectionView, ModellerError> {
        let planes = self.planes.as_ref().ok_or(PlaneError::EmptyProfile)?;
        let plane = planes.get(index).ok_or(ModellerError::PlaneIndexOutOfRange {
            index,
            count: planes.len(),
        })?;
        let frame = plane.view().ok_or(PlaneError::DegenerateProfile { index })?;

        let view = self
            .scene
            .view_mut(&self.options.names.cross_section_view)
            .ok_or(ModellerError::NullInput {
                what: "cross-section view",
            })?;
        *view = frame;
        log::debug!("cross-section view moved to plane {index}");
        Ok(frame)
    }

    /// Shows or hides the scene node of plane `index`.
    pub fn set_plane_visibility(&mut self, index: usize, visible: bool) -> Result<(), ModellerError> {
        let id = *self
            .plane_nodes
            .get(index)
            .ok_or(ModellerError::PlaneIndexOutOfRange {
                index,
                count: self.plane_nodes.len(),
            })?;
        self.scene.set_visibility(id, visible)?;
        Ok(())
    }

    #[must_use]
    pub fn planes(&self) -> Option<&PlaneSet> {
        self.planes.as_ref()
    }

    // ── Leaflets ────────────────────────────────────────────────────────────

    pub fn begin_leaflet_capture(&mut self) {
        self.begin_session(CaptureSession::Leaflet);
    }

    /// Fits the captured leaflet landmarks into `slot` (1-based).
    pub fn end_leaflet_capture(&mut self, slot: usize) -> Result<&Polyline, ModellerError> {
        let landmarks = self.landmarks_for(CaptureSession::Leaflet, "leaflet landmark source")?;
        self.end_leaflet_capture_with(slot, &landmarks)
    }

    /// Fits an open curve with `leaflet_point_count` points through
    /// `landmarks` and stores it in `slot` (1-based).
    pub fn end_leaflet_capture_with(
        &mut self,
        slot: usize,
        landmarks: &[Point3],
    ) -> Result<&Polyline, ModellerError> {
        // Slot is checked before fitting.
        self.leaflets.get(slot)?;

        let fitter = CurveFitter::new(self.options.fit);
        let count = self.options.leaflet_point_count;
        self.metrics.begin();
        let curve = self
            .metrics
            .time(TimingBucket::CurveFit, || fitter.fit_open_exact(landmarks, count))?;

        self.leaflets.set(slot, curve)?;
        self.finish_session(CaptureSession::Leaflet);
        self.capture.clear();
        log::info!("leaflet slot {slot}: {} landmarks -> {count} points", landmarks.len());

        self.publish_leaflet(slot);
        Ok(self.leaflets.get(slot)?)
    }

    #[must_use]
    pub fn leaflet_curves(&self) -> &[Polyline] {
        self.leaflets.all()
    }

    #[must_use]
    pub fn leaflet_store(&self) -> &LeafletCurveStore {
        &self.leaflets
    }

    /// Unstitched concatenation of the populated leaflet curves.
    pub fn merged_leaflet_curves(&self) -> Result<PolyData, ModellerError> {
        let curves: Vec<&Polyline> = self.leaflets.populated().map(|(_, c)| c).collect();
        Ok(self.stitcher().merge_raw(&curves)?)
    }

    // ── Surface ─────────────────────────────────────────────────────────────

    /// Stitches every populated leaflet slot into one closed surface.
    pub fn generate_surface(
        &mut self,
    ) -> Result<(SurfaceMesh, GeomMeshDiagnostics, StitchDiagnostics), ModellerError> {
        let curves: Vec<&Polyline> = self.leaflets.populated().map(|(_, c)| c).collect();
        let stitcher = self.stitcher();
        let (mesh, mesh_diag, stitch_diag) = stitcher.stitch_with_metrics(
            &curves,
            self.options.leaflet_point_count,
            &mut self.metrics,
        )?;

        log::info!(
            "surface from {} curves: {} ({} rings)",
            stitch_diag.curve_count,
            mesh_diag.summary(),
            stitch_diag.ring_count
        );

        self.surface = Some(mesh.clone());
        if let Err(err) = self.scene.upsert(
            &self.options.names.surface,
            SceneObject::Surface(mesh.clone()),
        ) {
            log::warn!("surface not published: {err}");
        }
        Ok((mesh, mesh_diag, stitch_diag))
    }

    #[must_use]
    pub fn surface(&self) -> Option<&SurfaceMesh> {
        self.surface.as_ref()
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Polyline> {
        self.profile.as_ref()
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn stitcher(&self) -> SurfaceStitcher {
        SurfaceStitcher::new(self.options.stitch).with_end_condition(self.options.fit.end_condition)
    }

    fn target_name(&self, session: CaptureSession) -> &str {
        match session {
            CaptureSession::Opening => &self.options.names.opening_points,
            CaptureSession::Leaflet => &self.options.names.leaflet_points,
        }
    }

    fn begin_session(&mut self, session: CaptureSession) {
        let target = self.target_name(session).to_owned();
        self.capture.clear();
        self.capture.begin(&target);
        self.session = Some(session);
        log::debug!("capture session {session:?} started on '{target}'");
    }

    fn finish_session(&mut self, session: CaptureSession) {
        if self.session == Some(session) {
            self.capture.end();
            self.session = None;
        }
    }

    fn landmarks_for(&self, session: CaptureSession, what: &'static str) -> Result<Vec<Point3>, ModellerError> {
        if self.capture.target() != Some(self.target_name(session)) {
            return Err(ModellerError::NullInput { what });
        }
        Ok(self.capture.landmarks())
    }

    fn publish_profile(&mut self) {
        if let Err(err) = self.try_publish_profile() {
            log::warn!("profile not fully published: {err}");
        }
    }

    fn try_publish_profile(&mut self) -> Result<(), SceneError> {
        let names = &self.options.names;
        if let Some(profile) = self.profile.as_ref() {
            self.scene
                .upsert(&names.profile, SceneObject::Profile(profile.clone()))?;
        }

        let Some(planes) = self.planes.as_ref() else {
            return Ok(());
        };
        let mut ids = Vec::with_capacity(planes.len());
        for (index, plane) in planes.iter().enumerate() {
            let id = self.scene.upsert(
                &names.plane(index),
                SceneObject::Plane {
                    index,
                    plane: *plane,
                },
            )?;
            self.scene
                .set_visibility(id, self.options.is_highlighted(index))?;
            ids.push(id);
        }
        self.plane_nodes = ids;
        Ok(())
    }

    fn publish_leaflet(&mut self, slot: usize) {
        let Ok(curve) = self.leaflets.get(slot) else {
            return;
        };
        let object = SceneObject::LeafletCurve {
            slot,
            curve: curve.clone(),
        };
        if let Err(err) = self.scene.upsert(&self.options.names.leaflet(slot), object) {
            log::warn!("leaflet {slot} not published: {err}");
        }
    }
}

#[cfg(test)]
mod tests;
