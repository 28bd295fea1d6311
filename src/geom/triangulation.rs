//! Polygon triangulation for stitched walls, end caps and filled holes.

use super::{Point3, Tolerance, Vec3};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationError {
    #[error("polygon requires at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },
    #[error("polygon vertex index {index} is out of range")]
    IndexOutOfRange { index: u32 },
    #[error("polygon has no well-defined plane")]
    DegeneratePlane,
    #[error("polygon degenerates after removing duplicate and collinear vertices")]
    Degenerate,
    #[error("no ear left to clip")]
    NoEars,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PolygonTriangulation {
    /// Indices into the caller's point buffer, wound like the input loop.
    pub triangles: Vec<[u32; 3]>,
    /// Set when ear clipping gave up and the Delaunay fallback was used.
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Uv {
    u: f64,
    v: f64,
}

impl Uv {
    /// Twice the signed area of `a b c`; positive when counter-clockwise.
    fn orient(a: Self, b: Self, c: Self) -> f64 {
        (b.u - a.u) * (c.v - a.v) - (b.v - a.v) * (c.u - a.u)
    }

    fn near(self, other: Self, tol: Tolerance) -> bool {
        (self.u - other.u).abs() <= tol.eps && (self.v - other.v).abs() <= tol.eps
    }

    /// Distance from `p` to the line through `a` and `b`.
    fn line_distance(a: Self, p: Self, b: Self) -> f64 {
        let len = (b.u - a.u).hypot(b.v - a.v);
        if len <= f64::EPSILON {
            (p.u - a.u).hypot(p.v - a.v)
        } else {
            Self::orient(a, b, p).abs() / len
        }
    }
}

/// Triangulates one polygon loop given as indices into `points`.
///
/// The loop is projected onto the plane of its Newell normal, which makes it
/// counter-clockwise in the projection whatever its 3D winding. Ear clipping
/// runs first; a self-overlapping projection falls back to a Delaunay
/// triangulation of the projected vertices clipped to the loop interior.
pub fn triangulate_polygon(
    points: &[Point3],
    polygon: &[u32],
    tol: Tolerance,
) -> Result<PolygonTriangulation, TriangulationError> {
    if polygon.len() < 3 {
        return Err(TriangulationError::TooFewVertices {
            count: polygon.len(),
        });
    }

    let loop_points = polygon
        .iter()
        .map(|&index| {
            points
                .get(index as usize)
                .copied()
                .ok_or(TriangulationError::IndexOutOfRange { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let [a, b, c] = *polygon {
        return Ok(PolygonTriangulation {
            triangles: vec![[a, b, c]],
            used_fallback: false,
        });
    }

    let normal = newell_normal(&loop_points, tol).ok_or(TriangulationError::DegeneratePlane)?;
    let u_axis = normal.any_perpendicular().unwrap_or(Vec3::X);
    let v_axis = normal.cross(u_axis);
    let uv: Vec<Uv> = loop_points
        .iter()
        .map(|p| {
            let p = p.to_vec3();
            Uv {
                u: p.dot(u_axis),
                v: p.dot(v_axis),
            }
        })
        .collect();

    match EarRing::new(polygon, &uv, tol).clip() {
        Ok(triangles) => Ok(PolygonTriangulation {
            triangles,
            used_fallback: false,
        }),
        Err(err) => {
            log::debug!("ear clipping of {} vertices failed ({err}), trying delaunay", polygon.len());
            let triangles = delaunay_clip(polygon, &uv);
            if triangles.is_empty() {
                return Err(err);
            }
            Ok(PolygonTriangulation {
                triangles,
                used_fallback: true,
            })
        }
    }
}

/// Splits a quad `[a, b, c, d]` along its shorter diagonal.
#[must_use]
pub fn split_quad(points: &[Point3], quad: [u32; 4]) -> [[u32; 3]; 2] {
    let [a, b, c, d] = quad;
    let diagonal = |i: u32, j: u32| match (points.get(i as usize), points.get(j as usize)) {
        (Some(p), Some(q)) => p.distance_to(*q),
        _ => f64::INFINITY,
    };
    if diagonal(b, d) < diagonal(a, c) {
        [[a, b, d], [b, c, d]]
    } else {
        [[a, b, c], [a, c, d]]
    }
}

/// Area-weighted unit normal of a closed loop.
fn newell_normal(points: &[Point3], tol: Tolerance) -> Option<Vec3> {
    if points.len() < 3 {
        return None;
    }
    let sum = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .fold(Vec3::ZERO, |acc, (p, q)| {
            acc + Vec3::new(
                (p.y - q.y) * (p.z + q.z),
                (p.z - q.z) * (p.x + q.x),
                (p.x - q.x) * (p.y + q.y),
            )
        });
    let len = sum.length();
    (len.is_finite() && len > tol.eps).then(|| sum / len)
}

/// Doubly linked ring of projected vertices that ears are clipped from.
struct EarRing {
    index: Vec<u32>,
    uv: Vec<Uv>,
    prev: Vec<usize>,
    next: Vec<usize>,
    start: usize,
    len: usize,
    tol: Tolerance,
}

impl EarRing {
    fn new(polygon: &[u32], uv: &[Uv], tol: Tolerance) -> Self {
        let n = polygon.len();
        Self {
            index: polygon.to_vec(),
            uv: uv.to_vec(),
            prev: (0..n).map(|i| (i + n - 1) % n).collect(),
            next: (0..n).map(|i| (i + 1) % n).collect(),
            start: 0,
            len: n,
            tol,
        }
    }

    fn unlink(&mut self, node: usize) {
        let (p, n) = (self.prev[node], self.next[node]);
        self.next[p] = n;
        self.prev[n] = p;
        if self.start == node {
            self.start = n;
        }
        self.len -= 1;
    }

    /// Drops duplicate and collinear vertices; errors once fewer than three remain.
    fn prune(&mut self) -> Result<(), TriangulationError> {
        let mut cur = self.start;
        let mut stable = 0usize;
        while stable < self.len {
            if self.len < 3 {
                return Err(TriangulationError::Degenerate);
            }
            let (p, n) = (self.prev[cur], self.next[cur]);
            let (a, b, c) = (self.uv[p], self.uv[cur], self.uv[n]);
            if b.near(a, self.tol) || b.near(c, self.tol) || Uv::line_distance(a, b, c) <= self.tol.eps {
                self.unlink(cur);
                cur = p;
                stable = 0;
            } else {
                cur = n;
                stable += 1;
            }
        }
        if self.len < 3 {
            return Err(TriangulationError::Degenerate);
        }
        Ok(())
    }

    fn is_ear(&self, node: usize) -> bool {
        let (p, n) = (self.prev[node], self.next[node]);
        let (a, b, c) = (self.uv[p], self.uv[node], self.uv[n]);
        if Uv::orient(a, b, c) <= 0.0 || Uv::line_distance(a, b, c) <= self.tol.eps {
            return false;
        }

        let eps = self.tol.eps;
        let mut other = self.next[n];
        while other != p {
            let q = self.uv[other];
            let inside = Uv::orient(a, b, q) >= -eps
                && Uv::orient(b, c, q) >= -eps
                && Uv::orient(c, a, q) >= -eps;
            if inside {
                let reflex =
                    Uv::orient(self.uv[self.prev[other]], q, self.uv[self.next[other]]) <= eps;
                if reflex {
                    return false;
                }
            }
            other = self.next[other];
        }
        true
    }

    fn clip(mut self) -> Result<Vec<[u32; 3]>, TriangulationError> {
        self.prune()?;
        let mut triangles = Vec::with_capacity(self.len - 2);
        let mut node = self.start;
        let mut misses = 0usize;

        while self.len > 3 {
            if self.is_ear(node) {
                let (p, n) = (self.prev[node], self.next[node]);
                triangles.push([self.index[p], self.index[node], self.index[n]]);
                self.unlink(node);
                node = n;
                misses = 0;
                continue;
            }

            node = self.next[node];
            misses += 1;
            if misses > self.len {
                // A full lap without an ear: prune once more, then give up.
                let before = self.len;
                self.prune()?;
                if self.len == before {
                    return Err(TriangulationError::NoEars);
                }
                node = self.start;
                misses = 0;
            }
        }

        let (p, n) = (self.prev[node], self.next[node]);
        triangles.push([self.index[p], self.index[node], self.index[n]]);
        Ok(triangles)
    }
}

fn delaunay_clip(polygon: &[u32], uv: &[Uv]) -> Vec<[u32; 3]> {
    let sites: Vec<delaunator::Point> = uv
        .iter()
        .map(|p| delaunator::Point { x: p.u, y: p.v })
        .collect();
    let triangulation = delaunator::triangulate(&sites);

    triangulation
        .triangles
        .chunks_exact(3)
        .filter_map(|tri| {
            let (a, b, c) = (uv[tri[0]], uv[tri[1]], uv[tri[2]]);
            let centroid = Uv {
                u: (a.u + b.u + c.u) / 3.0,
                v: (a.v + b.v + c.v) / 3.0,
            };
            if !contains(uv, centroid) {
                return None;
            }
            let [i, j, k] = [polygon[tri[0]], polygon[tri[1]], polygon[tri[2]]];
            Some(if Uv::orient(a, b, c) > 0.0 { [i, j, k] } else { [i, k, j] })
        })
        .collect()
}

/// Even-odd point-in-polygon test.
fn contains(ring: &[Uv], p: Uv) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[j];
        if (a.v > p.v) != (b.v > p.v) && p.u < (b.u - a.u) * (p.v - a.v) / (b.v - a.v) + a.u {
            inside = !inside;
        }
        j = i;
    }
    inside
}
