//! Surface stitching from leaflet curves.
//!
//! Corresponding points of all curves form closed rings; each ring is re-fitted
//! with a closed spline, adjacent rings are joined by a quad strip and the two
//! end rings are capped. The result is triangulated and finished into a closed,
//! outward-facing mesh.
//!
//! # Pipeline
//! 1. Validate curve count and per-curve point counts
//! 2. Extract a ring at every `ring_step`-th curve position
//! 3. Re-fit each ring to `ring_subdivisions` evenly spaced points
//! 4. Wall quads between adjacent rings; each end gets a k-gon through the
//!    curve points, zipped onto the end ring by a triangle collar
//! 5. Triangulate, then weld / fill holes / orient / compute normals

use serde::Serialize;

use crate::geom::{
    EndCondition, FinishOptions, GeomMeshDiagnostics, NormalsOptions, PipelineMetrics, Point3,
    PolyData, Polyline, SplineError, SurfaceMesh, TimingBucket, Tolerance, Vec3, finish_mesh,
    resample_spline,
};

use super::options::StitchOptions;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StitchError {
    #[error("stitching requires at least 2 populated curves, got {count}")]
    InsufficientCurves { count: usize },
    #[error("curve {index} has {actual} points, expected {expected}")]
    InconsistentCurveLength {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("stitching requires at least 2 rings, got {count}")]
    TooFewRings { count: usize },
    #[error("ring {ring} could not be re-fitted")]
    DegenerateRing { ring: usize },
}

/// Counts describing one stitch run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StitchDiagnostics {
    pub curve_count: usize,
    pub points_per_curve: usize,
    pub ring_count: usize,
    /// Distinct points per re-fitted ring (the seam copy is not stored).
    pub ring_point_count: usize,
    pub wall_quad_count: usize,
    /// Vertex count of each cap polygon that was emitted.
    pub cap_vertex_counts: Vec<usize>,
    /// Rings whose points all coincide; they collapse to an apex and get no cap.
    pub collapsed_rings: Vec<usize>,
    pub skipped_polygon_count: usize,
    pub holes_filled: usize,
    pub hole_fill_triangles: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceStitcher {
    options: StitchOptions,
    end_condition: EndCondition,
}

struct Ring {
    /// The curve points this ring was fitted through, one per curve.
    landmarks: Vec<Point3>,
    points: Vec<Point3>,
    collapsed: bool,
}

impl SurfaceStitcher {
    #[must_use]
    pub fn new(options: StitchOptions) -> Self {
        Self {
            options,
            end_condition: EndCondition::default(),
        }
    }

    #[must_use]
    pub fn with_end_condition(mut self, end_condition: EndCondition) -> Self {
        self.end_condition = end_condition;
        self
    }

    #[must_use]
    pub fn options(&self) -> StitchOptions {
        self.options
    }

    /// Stitches `curves` (each with `points_per_curve` points) into one closed mesh.
    pub fn stitch(
        &self,
        curves: &[&Polyline],
        points_per_curve: usize,
    ) -> Result<(SurfaceMesh, GeomMeshDiagnostics, StitchDiagnostics), StitchError> {
        let mut metrics = PipelineMetrics::default();
        self.stitch_with_metrics(curves, points_per_curve, &mut metrics)
    }

    pub fn stitch_with_metrics(
        &self,
        curves: &[&Polyline],
        points_per_curve: usize,
        metrics: &mut PipelineMetrics,
    ) -> Result<(SurfaceMesh, GeomMeshDiagnostics, StitchDiagnostics), StitchError> {
        metrics.begin();
        validate_curves(curves, points_per_curve)?;

        let positions: Vec<usize> = (0..points_per_curve)
            .step_by(self.options.ring_step.max(1))
            .collect();
        if positions.len() < 2 {
            return Err(StitchError::TooFewRings {
                count: positions.len(),
            });
        }

        let rings = metrics.time(TimingBucket::RingFit, || {
            positions
                .iter()
                .enumerate()
                .map(|(r, &j)| {
                    let landmarks: Vec<Point3> = curves.iter().map(|c| c.points()[j]).collect();
                    self.fit_ring(r, &landmarks)
                })
                .collect::<Result<Vec<Ring>, StitchError>>()
        })?;

        let n = self.ring_point_count();
        let mut diag = StitchDiagnostics {
            curve_count: curves.len(),
            points_per_curve,
            ring_count: rings.len(),
            ring_point_count: n,
            collapsed_rings: rings
                .iter()
                .enumerate()
                .filter(|(_, ring)| ring.collapsed)
                .map(|(r, _)| r)
                .collect(),
            ..StitchDiagnostics::default()
        };
        log::debug!(
            "stitching {} curves x {points_per_curve} points into {} rings of {n}",
            curves.len(),
            rings.len()
        );

        let mut poly = PolyData::new();
        for ring in &rings {
            poly.add_points(&ring.points);
        }

        for r in 0..rings.len() - 1 {
            let (lo, hi) = (r * n, (r + 1) * n);
            for i in 0..n {
                let next = (i + 1) % n;
                let a = (lo + i) as u32;
                let b = (lo + next) as u32;
                let c = (hi + next) as u32;
                let d = (hi + i) as u32;
                poly.add_poly(vec![a, d, c, b]);
                diag.wall_quad_count += 1;
            }
        }

        // The last cap is wound the other way so both face away from the wall.
        let last = rings.len() - 1;
        for (r, reverse) in [(0, false), (last, true)] {
            if !rings[r].collapsed {
                add_cap(&mut poly, (r * n) as u32, &rings[r], reverse);
                diag.cap_vertex_counts.push(rings[r].landmarks.len());
            }
        }

        let tol = self.options.tolerance;
        let (indices, report) = metrics.time(TimingBucket::Triangulation, || poly.triangulate(tol));
        diag.skipped_polygon_count = report.skipped_polygon_count;

        let finish = FinishOptions {
            tolerance: tol,
            fill_holes: self.options.fill_holes,
            orient_outward: self.options.auto_orient_normals,
            normals: NormalsOptions {
                feature_angle_degrees: self.options.feature_angle_degrees,
                splitting: true,
            },
        };
        let (mesh, mut mesh_diag) = finish_mesh(poly.points().to_vec(), indices, finish, metrics);
        diag.holes_filled = mesh_diag.filled_hole_count;
        diag.hole_fill_triangles = mesh_diag.hole_fill_triangle_count;
        mesh_diag.timing = metrics.end();

        Ok((mesh, mesh_diag, diag))
    }

    /// Unstitched view of the curves: one line cell per curve plus a closed
    /// spline through the first point of every curve.
    ///
    /// Curves may differ in length; nothing is resampled or triangulated.
    pub fn merge_raw(&self, curves: &[&Polyline]) -> Result<PolyData, StitchError> {
        if curves.len() < 2 {
            return Err(StitchError::InsufficientCurves {
                count: curves.len(),
            });
        }

        let mut merged = PolyData::new();
        for curve in curves {
            merged.add_polyline(curve);
        }

        let starts: Vec<Point3> = curves.iter().filter_map(|c| c.first()).collect();
        match resample_spline(&starts, true, self.ring_point_count(), self.end_condition) {
            Ok(mut closing) => {
                closing.pop();
                let mut annulus = PolyData::new();
                annulus.add_polyline(&Polyline::closed(closing));
                merged.append(&annulus);
            }
            Err(err) => log::warn!("merged curves have no closing spline: {err}"),
        }

        Ok(merged)
    }

    fn ring_point_count(&self) -> usize {
        self.options.ring_subdivisions.max(3)
    }

    fn fit_ring(&self, ring: usize, landmarks: &[Point3]) -> Result<Ring, StitchError> {
        let n = self.ring_point_count();
        match resample_spline(landmarks, true, n, self.end_condition) {
            Ok(mut points) => {
                // The closed resample repeats its first point; the wall wraps by index instead.
                points.pop();
                if encloses_no_area(&points, self.options.tolerance) {
                    log::debug!("ring {ring} through {} points encloses no area", landmarks.len());
                    return Err(StitchError::DegenerateRing { ring });
                }
                Ok(Ring {
                    landmarks: landmarks.to_vec(),
                    points,
                    collapsed: false,
                })
            }
            Err(SplineError::Collapsed) => {
                log::debug!("ring {ring} collapses to a single point");
                Ok(Ring {
                    landmarks: landmarks.to_vec(),
                    points: vec![landmarks[0]; n],
                    collapsed: true,
                })
            }
            Err(err) => {
                log::debug!("ring {ring} re-fit failed: {err}");
                Err(StitchError::DegenerateRing { ring })
            }
        }
    }
}

/// Adds one end cap: a polygon through the ring's curve points plus a collar
/// of triangles joining that polygon to the resampled ring starting at `base`.
///
/// Curve point `l` is anchored at its nearest ring sample, searching forward
/// from the previous anchor. Between anchors `l` and `l + 1` the ring edges fan
/// to curve point `l`, and one triangle bridges to curve point `l + 1`.
fn add_cap(poly: &mut PolyData, base: u32, ring: &Ring, reverse: bool) {
    let n = ring.points.len();
    let k = ring.landmarks.len();
    let cap = poly.add_points(&ring.landmarks);

    let mut anchors = Vec::with_capacity(k + 1);
    let mut from = 0;
    for landmark in &ring.landmarks {
        let nearest = (from..n)
            .min_by(|&a, &b| {
                let da = ring.points[a].distance_to(*landmark);
                let db = ring.points[b].distance_to(*landmark);
                da.total_cmp(&db)
            })
            .unwrap_or(from);
        anchors.push(nearest);
        from = nearest;
    }
    anchors.push(anchors[0] + n);

    let ring_id = |i: usize| base + (i % n) as u32;
    let mut emit = |tri: [u32; 3]| {
        let [a, b, c] = tri;
        poly.add_poly(if reverse { vec![a, c, b] } else { vec![a, b, c] });
    };
    for l in 0..k {
        let here = cap + l as u32;
        let next = cap + ((l + 1) % k) as u32;
        for i in anchors[l]..anchors[l + 1] {
            emit([here, ring_id(i), ring_id(i + 1)]);
        }
        emit([here, ring_id(anchors[l + 1]), next]);
    }

    let mut face: Vec<u32> = (0..k as u32).map(|l| cap + l).collect();
    if reverse {
        face.reverse();
    }
    poly.add_poly(face);
}

/// True when the closed loop's vector area is negligible against its size,
/// as for a spline through two points that runs out and back along a segment.
fn encloses_no_area(points: &[Point3], tol: Tolerance) -> bool {
    let (area, perimeter) = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .fold((Vec3::ZERO, 0.0), |(area, length), (p, q)| {
            (area + p.to_vec3().cross(q.to_vec3()), length + p.distance_to(*q))
        });
    area.length() * 0.5 <= tol.eps.max(f64::EPSILON) * perimeter * perimeter
}

fn validate_curves(curves: &[&Polyline], points_per_curve: usize) -> Result<(), StitchError> {
    if curves.len() < 2 {
        return Err(StitchError::InsufficientCurves {
            count: curves.len(),
        });
    }
    for (index, curve) in curves.iter().enumerate() {
        if curve.len() != points_per_curve {
            return Err(StitchError::InconsistentCurveLength {
                index,
                expected: points_per_curve,
                actual: curve.len(),
            });
        }
    }
    Ok(())
}
