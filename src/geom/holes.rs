//! Boundary-loop detection and hole filling for triangle meshes.
//!
//! A boundary edge is an undirected edge used by exactly one triangle. Loops
//! are traced against the direction the owning triangles use the edge, so a
//! fill triangulated in loop order winds consistently with its neighbours.

use std::collections::{BTreeMap, BTreeSet};

use super::triangulation::triangulate_polygon;
use super::{Point3, Tolerance};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct HoleFillReport {
    pub holes_found: usize,
    pub holes_filled: usize,
    pub triangles_added: usize,
    /// Loops closed with a plain fan because polygon triangulation failed.
    pub fan_fallbacks: usize,
}

/// Traces closed boundary loops of a triangle mesh.
///
/// Each returned loop lists vertex indices in fill order (opposite to the
/// direction the adjacent triangles traverse the boundary). Open chains that
/// do not close are discarded.
#[must_use]
pub fn find_boundary_loops(indices: &[u32]) -> Vec<Vec<u32>> {
    let mut edge_counts: BTreeMap<(u32, u32), u32> = BTreeMap::new();
    for tri in indices.chunks_exact(3) {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            continue;
        }
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *edge_counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    // Reversed boundary half-edges: b -> a for a triangle edge a -> b.
    let mut outgoing: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for tri in indices.chunks_exact(3) {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            continue;
        }
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if edge_counts.get(&(a.min(b), a.max(b))) == Some(&1) {
                outgoing.entry(b).or_default().push(a);
            }
        }
    }

    let mut used: BTreeSet<(u32, u32)> = BTreeSet::new();
    let mut loops = Vec::new();
    let starts: Vec<(u32, u32)> = outgoing
        .iter()
        .flat_map(|(&from, tos)| tos.iter().map(move |&to| (from, to)))
        .collect();

    for (from, to) in starts {
        if used.contains(&(from, to)) {
            continue;
        }
        used.insert((from, to));

        let mut ring = vec![from];
        let mut cur = to;
        let mut closed = false;
        let limit = edge_counts.len() + 1;
        while ring.len() <= limit {
            if cur == from {
                closed = true;
                break;
            }
            ring.push(cur);
            let next = outgoing
                .get(&cur)
                .and_then(|tos| tos.iter().copied().find(|&n| !used.contains(&(cur, n))));
            let Some(next) = next else {
                break;
            };
            used.insert((cur, next));
            cur = next;
        }

        if closed && ring.len() >= 3 {
            loops.push(ring);
        }
    }

    loops
}

/// Fills every closed boundary loop of the mesh in place.
///
/// Loops are triangulated in their best-fit plane; when that fails a fan
/// from the first loop vertex closes the hole so the result stays watertight.
pub fn fill_holes(points: &[Point3], indices: &mut Vec<u32>, tol: Tolerance) -> HoleFillReport {
    let loops = find_boundary_loops(indices);
    let mut report = HoleFillReport {
        holes_found: loops.len(),
        ..HoleFillReport::default()
    };

    for ring in loops {
        let before = indices.len();
        match triangulate_polygon(points, &ring, tol) {
            Ok(result) => {
                for tri in result.triangles {
                    indices.extend_from_slice(&tri);
                }
            }
            Err(err) => {
                log::debug!("hole of {} vertices needs fan fill: {err}", ring.len());
                for i in 1..ring.len() - 1 {
                    indices.extend_from_slice(&[ring[0], ring[i], ring[i + 1]]);
                }
                report.fan_fallbacks += 1;
            }
        }
        let added = (indices.len() - before) / 3;
        if added > 0 {
            report.holes_filled += 1;
            report.triangles_added += added;
        }
    }

    if report.holes_filled > 0 {
        log::warn!(
            "filled {} hole(s) with {} triangle(s)",
            report.holes_filled,
            report.triangles_added
        );
    }

    report
}
