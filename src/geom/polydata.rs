use super::triangulation::{TriangulationError, split_quad, triangulate_polygon};
use super::{Point3, Polyline, Tolerance};

/// Point buffer with line and polygon cells referencing it.
///
/// Lines are open index chains (a closed polyline repeats its first index at
/// the end). Polygons are implicitly closed loops of three or more indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolyData {
    points: Vec<Point3>,
    lines: Vec<Vec<u32>>,
    polys: Vec<Vec<u32>>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TriangulateReport {
    pub input_polygon_count: usize,
    pub output_triangle_count: usize,
    /// Polygons that could not be triangulated and were dropped.
    pub skipped_polygon_count: usize,
    /// Polygons that needed the Delaunay fallback.
    pub fallback_polygon_count: usize,
}

impl PolyData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn lines(&self) -> &[Vec<u32>] {
        &self.lines
    }

    #[must_use]
    pub fn polys(&self) -> &[Vec<u32>] {
        &self.polys
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn add_point(&mut self, p: Point3) -> u32 {
        let idx = self.points.len() as u32;
        self.points.push(p);
        idx
    }

    /// Appends `points` and returns the index of the first one.
    pub fn add_points(&mut self, points: &[Point3]) -> u32 {
        let offset = self.points.len() as u32;
        self.points.extend_from_slice(points);
        offset
    }

    pub fn add_line(&mut self, ids: Vec<u32>) {
        if ids.len() >= 2 {
            self.lines.push(ids);
        }
    }

    /// Adds the polyline's points and one line cell through them.
    pub fn add_polyline(&mut self, polyline: &Polyline) {
        if polyline.is_empty() {
            return;
        }
        let offset = self.add_points(polyline.points());
        let mut ids: Vec<u32> = (0..polyline.len() as u32).map(|i| offset + i).collect();
        if polyline.is_closed() && ids.len() > 2 {
            ids.push(offset);
        }
        self.add_line(ids);
    }

    pub fn add_poly(&mut self, ids: Vec<u32>) {
        if ids.len() >= 3 {
            self.polys.push(ids);
        }
    }

    /// Appends another poly data, offsetting its cell indices.
    pub fn append(&mut self, other: &PolyData) {
        let offset = self.points.len() as u32;
        self.points.extend_from_slice(&other.points);
        self.lines
            .extend(other.lines.iter().map(|cell| cell.iter().map(|i| i + offset).collect()));
        self.polys
            .extend(other.polys.iter().map(|cell| cell.iter().map(|i| i + offset).collect()));
    }

    /// Triangulates every polygon cell into a flat triangle index list.
    ///
    /// Quads are split along their shorter diagonal; larger polygons are ear
    /// clipped in their best-fit plane. Line cells are ignored. Polygons that
    /// fail to triangulate are skipped and counted in the report.
    #[must_use]
    pub fn triangulate(&self, tol: Tolerance) -> (Vec<u32>, TriangulateReport) {
        let mut indices = Vec::with_capacity(self.polys.len() * 6);
        let mut report = TriangulateReport {
            input_polygon_count: self.polys.len(),
            ..TriangulateReport::default()
        };

        for poly in &self.polys {
            match poly.len() {
                3 => indices.extend_from_slice(poly),
                4 => {
                    for tri in split_quad(&self.points, [poly[0], poly[1], poly[2], poly[3]]) {
                        indices.extend_from_slice(&tri);
                    }
                }
                _ => match triangulate_polygon(&self.points, poly, tol) {
                    Ok(result) => {
                        if result.used_fallback {
                            report.fallback_polygon_count += 1;
                        }
                        for tri in result.triangles {
                            indices.extend_from_slice(&tri);
                        }
                    }
                    Err(err) => {
                        log_skipped_polygon(poly.len(), &err);
                        report.skipped_polygon_count += 1;
                    }
                },
            }
        }

        report.output_triangle_count = indices.len() / 3;
        (indices, report)
    }
}

fn log_skipped_polygon(len: usize, err: &TriangulationError) {
    log::warn!("skipping {len}-gon during triangulation: {err}");
}
