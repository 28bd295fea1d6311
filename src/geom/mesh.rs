use std::collections::HashMap;
use std::fmt::Write as _;

use super::diagnostics::GeomMeshDiagnostics;
use super::holes::fill_holes;
use super::metrics::{PipelineMetrics, TimingBucket};
use super::normals::{NormalsOptions, compute_normals};
use super::{Point3, Tolerance};

/// Indexed triangle mesh with optional per-vertex normals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl SurfaceMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self
            .positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
        {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        let n = self.positions.len() as u32;
        if self.indices.iter().any(|&i| i >= n) {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self
            .normals
            .as_ref()
            .is_some_and(|normals| normals.len() != self.positions.len())
        {
            return Err("mesh normal buffer does not match vertex count".to_string());
        }
        Ok(())
    }

    /// Signed enclosed volume; positive when triangles face outward.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let points: Vec<Point3> = self.positions.iter().copied().map(Point3::from).collect();
        signed_volume(&points, &self.indices)
    }

    /// Wavefront OBJ text (1-based indices, normals when present).
    #[must_use]
    pub fn to_obj(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "o {name}");
        for p in &self.positions {
            let _ = writeln!(out, "v {} {} {}", p[0], p[1], p[2]);
        }
        if let Some(normals) = self.normals.as_ref() {
            for n in normals {
                let _ = writeln!(out, "vn {} {} {}", n[0], n[1], n[2]);
            }
        }
        let has_normals = self.normals.is_some();
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            if has_normals {
                let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
            } else {
                let _ = writeln!(out, "f {a} {b} {c}");
            }
        }
        out
    }
}

/// Settings for [`finish_mesh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishOptions {
    pub tolerance: Tolerance,
    pub fill_holes: bool,
    pub orient_outward: bool,
    pub normals: NormalsOptions,
}

impl Default for FinishOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default_geom(),
            fill_holes: true,
            orient_outward: true,
            normals: NormalsOptions::default(),
        }
    }
}

/// Turns raw triangles into a repaired, oriented and shaded mesh.
///
/// Runs welding, degenerate culling, hole filling, winding repair, outward
/// orientation (closed meshes only) and feature-angle normals, in that order.
#[must_use]
pub fn finish_mesh(
    points: Vec<Point3>,
    indices: Vec<u32>,
    options: FinishOptions,
    metrics: &mut PipelineMetrics,
) -> (SurfaceMesh, GeomMeshDiagnostics) {
    let tol = options.tolerance;

    let (points, indices, welded_vertex_count, degenerate_triangle_count) =
        metrics.time(TimingBucket::Welding, || {
            let (points, indices, welded) = weld_mesh_vertices(points, indices, tol);
            let (indices, degenerate) = cull_degenerate_triangles(&points, &indices, tol);
            (points, indices, welded, degenerate)
        });
    let mut indices = indices;

    let hole_report = if options.fill_holes {
        Some(metrics.time(TimingBucket::HoleFill, || fill_holes(&points, &mut indices, tol)))
    } else {
        None
    };

    let flipped_triangle_count =
        metrics.time(TimingBucket::Normals, || fix_triangle_winding_consistency(&mut indices));
    let (open_edge_count, non_manifold_edge_count) =
        metrics.time(TimingBucket::Diagnostics, || count_edge_topology(&indices));

    let mut warnings = Vec::new();
    if options.orient_outward && open_edge_count == 0 && non_manifold_edge_count == 0 {
        let volume = signed_volume(&points, &indices);
        if volume.is_finite() && volume < 0.0 {
            flip_all_triangles(&mut indices);
            warnings.push("mesh orientation flipped (outward)".to_string());
        }
    }
    if open_edge_count > 0 {
        warnings.push("mesh has open edges".to_string());
    }
    if non_manifold_edge_count > 0 {
        warnings.push("mesh has non-manifold edges".to_string());
    }

    let shaded = metrics.time(TimingBucket::Normals, || {
        compute_normals(points, indices, options.normals)
    });

    let mesh = SurfaceMesh {
        positions: shaded.positions.into_iter().map(Point3::to_array).collect(),
        indices: shaded.indices,
        normals: Some(shaded.normals),
    };

    let (filled_hole_count, hole_fill_triangle_count) = hole_report
        .as_ref()
        .map_or((0, 0), |r| (r.holes_filled, r.triangles_added));

    let diagnostics = GeomMeshDiagnostics {
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        welded_vertex_count,
        flipped_triangle_count,
        degenerate_triangle_count,
        open_edge_count,
        non_manifold_edge_count,
        filled_hole_count,
        hole_fill_triangle_count,
        split_vertex_count: shaded.split_vertex_count,
        timing: None,
        warnings,
    };

    (mesh, diagnostics)
}

/// Merges vertices closer than `tol` into the first one seen and remaps
/// indices; returns the number merged.
pub(crate) fn weld_mesh_vertices(
    points: Vec<Point3>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (Vec<Point3>, Vec<u32>, usize) {
    if !tol.eps.is_finite() || tol.eps <= 0.0 {
        return (points, indices, 0);
    }

    // Cells are one tolerance wide, so a match is always in a neighbouring cell.
    let cell_of = |p: Point3| -> Option<[i64; 3]> {
        p.is_finite().then(|| {
            p.to_array()
                .map(|c| (c / tol.eps).floor().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
        })
    };

    let mut grid: HashMap<[i64; 3], Vec<u32>> = HashMap::new();
    let mut kept: Vec<Point3> = Vec::with_capacity(points.len());
    let remap: Vec<u32> = points
        .iter()
        .map(|&p| {
            let cell = cell_of(p);
            let existing = cell.and_then(|[x, y, z]| {
                NEIGHBOUR_OFFSETS.iter().find_map(|[dx, dy, dz]| {
                    grid.get(&[x + dx, y + dy, z + dz])?
                        .iter()
                        .copied()
                        .find(|&k| tol.approx_eq_point3(kept[k as usize], p))
                })
            });
            existing.unwrap_or_else(|| {
                let index = kept.len() as u32;
                kept.push(p);
                if let Some(cell) = cell {
                    grid.entry(cell).or_default().push(index);
                }
                index
            })
        })
        .collect();

    let indices = indices
        .into_iter()
        .map(|i| remap.get(i as usize).copied().unwrap_or(i))
        .collect();
    let welded = points.len() - kept.len();
    (kept, indices, welded)
}

const NEIGHBOUR_OFFSETS: [[i64; 3]; 27] = {
    let mut offsets = [[0; 3]; 27];
    let mut i = 0;
    while i < 27 {
        offsets[i] = [(i / 9) as i64 - 1, ((i / 3) % 3) as i64 - 1, (i % 3) as i64 - 1];
        i += 1;
    }
    offsets
};

/// Drops triangles with repeated or missing vertices or (near) zero area.
fn cull_degenerate_triangles(points: &[Point3], indices: &[u32], tol: Tolerance) -> (Vec<u32>, usize) {
    let min_area2 = tol.eps_squared() * tol.eps_squared();
    let is_live = |tri: &[u32]| {
        let [a, b, c] = [tri[0], tri[1], tri[2]];
        if a == b || b == c || a == c {
            return false;
        }
        let corner = |i: u32| points.get(i as usize).copied();
        let (Some(pa), Some(pb), Some(pc)) = (corner(a), corner(b), corner(c)) else {
            return false;
        };
        let area2 = (pb - pa).cross(pc - pa).length_squared();
        area2.is_finite() && area2 > min_area2
    };

    let kept: Vec<u32> = indices
        .chunks_exact(3)
        .filter(|tri| is_live(tri))
        .flatten()
        .copied()
        .collect();
    let removed = (indices.len() - kept.len()) / 3;
    (kept, removed)
}

/// Undirected edge key plus whether `a -> b` runs from the lower index.
fn edge_key(a: u32, b: u32) -> ((u32, u32), bool) {
    if a <= b { ((a, b), true) } else { ((b, a), false) }
}

fn triangle_edges(tri: &[u32]) -> [(u32, u32); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

/// Re-winds triangles so that every manifold edge is walked in opposite
/// directions by its two triangles. The first triangle of each connected
/// patch keeps its winding.
pub(crate) fn fix_triangle_winding_consistency(indices: &mut [u32]) -> usize {
    let tri_count = indices.len() / 3;
    let mut edges: HashMap<(u32, u32), Vec<(usize, bool)>> = HashMap::with_capacity(tri_count * 3);
    for (t, tri) in indices.chunks_exact(3).enumerate() {
        for (a, b) in triangle_edges(tri) {
            let (key, forward) = edge_key(a, b);
            edges.entry(key).or_default().push((t, forward));
        }
    }

    // `None` = not reached yet, `Some(flip)` = decided.
    let mut flip: Vec<Option<bool>> = vec![None; tri_count];
    for seed in 0..tri_count {
        if flip[seed].is_some() {
            continue;
        }
        flip[seed] = Some(false);
        let mut stack = vec![seed];
        while let Some(t) = stack.pop() {
            let flip_t = flip[t].unwrap_or(false);
            for (a, b) in triangle_edges(&indices[t * 3..t * 3 + 3]) {
                let (key, forward) = edge_key(a, b);
                // Only manifold edges propagate.
                let Some(&[first, second]) = edges.get(&key).map(Vec::as_slice) else {
                    continue;
                };
                let (other, other_forward) = if first.0 == t { second } else { first };
                if flip[other].is_none() {
                    // Same stored direction means one of the two must turn.
                    flip[other] = Some(flip_t ^ (forward == other_forward));
                    stack.push(other);
                }
            }
        }
    }

    let mut count = 0;
    for (tri, flip) in indices.chunks_exact_mut(3).zip(flip) {
        if flip == Some(true) {
            tri.swap(1, 2);
            count += 1;
        }
    }
    count
}

/// `(open_edges, non_manifold_edges)` over the non-degenerate triangles.
pub(crate) fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut uses: HashMap<(u32, u32), u32> = HashMap::new();
    for tri in indices.chunks_exact(3) {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            continue;
        }
        for (a, b) in triangle_edges(tri) {
            *uses.entry(edge_key(a, b).0).or_insert(0) += 1;
        }
    }
    uses.values().fold((0, 0), |(open, non_manifold), &n| match n {
        1 => (open + 1, non_manifold),
        2 => (open, non_manifold),
        _ => (open, non_manifold + 1),
    })
}

fn flip_all_triangles(indices: &mut [u32]) {
    indices.chunks_exact_mut(3).for_each(|tri| tri.swap(1, 2));
}

/// Divergence-theorem volume; triangles with missing vertices are skipped.
fn signed_volume(points: &[Point3], indices: &[u32]) -> f64 {
    let corner = |i: u32| points.get(i as usize).map(|p| p.to_vec3());
    indices
        .chunks_exact(3)
        .filter_map(|tri| Some(corner(tri[0])?.dot(corner(tri[1])?.cross(corner(tri[2])?))))
        .sum::<f64>()
        / 6.0
}
