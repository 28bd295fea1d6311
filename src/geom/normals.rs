//! Vertex normals with feature-angle creasing.
//!
//! Around each vertex the incident triangles are grouped into smooth fans:
//! two triangles sharing an edge through the vertex join the same fan when
//! the angle between their face normals does not exceed the feature angle.
//! Every fan beyond the first gets its own copy of the vertex, so sharp
//! creases keep distinct normals on either side.

use std::collections::HashMap;

use super::{Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalsOptions {
    pub feature_angle_degrees: f64,
    /// When `false` every vertex gets one area-weighted smooth normal.
    pub splitting: bool,
}

impl Default for NormalsOptions {
    fn default() -> Self {
        Self {
            feature_angle_degrees: 60.0,
            splitting: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalsResult {
    pub positions: Vec<Point3>,
    pub indices: Vec<u32>,
    pub normals: Vec<[f64; 3]>,
    /// Vertices added by splitting along feature edges.
    pub split_vertex_count: usize,
}

/// Area-weighted (unnormalized) face normals, one per triangle.
#[must_use]
pub fn face_normals(points: &[Point3], indices: &[u32]) -> Vec<Vec3> {
    indices
        .chunks_exact(3)
        .map(|tri| {
            match (
                points.get(tri[0] as usize),
                points.get(tri[1] as usize),
                points.get(tri[2] as usize),
            ) {
                (Some(a), Some(b), Some(c)) => b.sub_point(*a).cross(c.sub_point(*a)),
                _ => Vec3::ZERO,
            }
        })
        .collect()
}

#[must_use]
pub fn compute_normals(points: Vec<Point3>, indices: Vec<u32>, options: NormalsOptions) -> NormalsResult {
    let faces = face_normals(&points, &indices);
    let unit_faces: Vec<Option<Vec3>> = faces.iter().map(|n| n.normalized()).collect();
    let cos_feature = options.feature_angle_degrees.to_radians().cos();

    let corner_count = indices.len() / 3 * 3;
    let mut parent: Vec<usize> = (0..corner_count).collect();

    // Corners of the same vertex that should share a normal get unioned.
    let mut edge_corners: HashMap<(u32, u32), Vec<(usize, usize, usize)>> = HashMap::new();
    for (t, tri) in indices.chunks_exact(3).enumerate() {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let key = (a.min(b), a.max(b));
            let (ca, cb) = (t * 3 + k, t * 3 + (k + 1) % 3);
            let (c_lo, c_hi) = if a <= b { (ca, cb) } else { (cb, ca) };
            edge_corners.entry(key).or_default().push((t, c_lo, c_hi));
        }
    }

    if options.splitting {
        for uses in edge_corners.values() {
            let [(f, f_lo, f_hi), (g, g_lo, g_hi)] = uses.as_slice() else {
                continue;
            };
            let smooth = match (unit_faces[*f], unit_faces[*g]) {
                (Some(nf), Some(ng)) => nf.dot(ng) >= cos_feature,
                _ => true,
            };
            if smooth {
                union(&mut parent, *f_lo, *g_lo);
                union(&mut parent, *f_hi, *g_hi);
            }
        }
    } else {
        let mut first_corner: HashMap<u32, usize> = HashMap::new();
        for (corner, &v) in indices.iter().enumerate().take(corner_count) {
            let root = *first_corner.entry(v).or_insert(corner);
            union(&mut parent, root, corner);
        }
    }

    let mut positions = points;
    let original_count = positions.len();
    let mut sums: Vec<Vec3> = vec![Vec3::ZERO; original_count];
    let mut vertex_claimed = vec![false; original_count];
    let mut group_vertex: HashMap<usize, u32> = HashMap::new();
    let mut out_indices = Vec::with_capacity(corner_count);

    for corner in 0..corner_count {
        let v = indices[corner];
        let root = find(&mut parent, corner);
        let out_v = match group_vertex.get(&root) {
            Some(&existing) => existing,
            None => {
                let assigned = if vertex_claimed[v as usize] {
                    let idx = positions.len() as u32;
                    positions.push(positions[v as usize]);
                    sums.push(Vec3::ZERO);
                    idx
                } else {
                    vertex_claimed[v as usize] = true;
                    v
                };
                group_vertex.insert(root, assigned);
                assigned
            }
        };
        sums[out_v as usize] = sums[out_v as usize] + faces[corner / 3];
        out_indices.push(out_v);
    }

    let normals = sums
        .into_iter()
        .map(|n| n.normalized().map_or([0.0, 0.0, 1.0], Vec3::to_array))
        .collect();

    NormalsResult {
        split_vertex_count: positions.len() - original_count,
        positions,
        indices: out_indices,
        normals,
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Keep the lower corner as root so output order stays deterministic.
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
