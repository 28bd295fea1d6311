//! What happened to a surface on its way out of the finishing pipeline.
//!
//! ```ignore
//! let (mesh, diagnostics, _) = stitcher.stitch(&curves, 50)?;
//! if !diagnostics.is_watertight() {
//!     log::warn!("surface has {} open edges", diagnostics.open_edge_count);
//! }
//! ```

use std::fmt;

use serde::Serialize;

use super::metrics::TimingReport;

/// Topology counts and repair tallies for one finished mesh.
///
/// Edge counts are measured on the welded mesh, before feature-edge vertex
/// splitting; `vertex_count` and `triangle_count` describe the output buffers.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GeomMeshDiagnostics {
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Vertices merged by welding. An apex ring contributes all but one of its points.
    pub welded_vertex_count: usize,
    /// Triangles re-wound to agree with their neighbours.
    pub flipped_triangle_count: usize,
    /// Zero-area triangles dropped after welding.
    pub degenerate_triangle_count: usize,
    /// Edges used by exactly one triangle after hole filling.
    pub open_edge_count: usize,
    /// Edges used by three or more triangles.
    pub non_manifold_edge_count: usize,
    pub filled_hole_count: usize,
    pub hole_fill_triangle_count: usize,
    /// Extra vertices created along creases sharper than the feature angle.
    pub split_vertex_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingReport>,
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Closed and manifold, i.e. the surface bounds a volume.
    #[must_use]
    pub fn is_valid_solid(&self) -> bool {
        self.is_watertight() && self.is_manifold()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    #[must_use]
    pub fn repair_count(&self) -> usize {
        [
            self.welded_vertex_count,
            self.flipped_triangle_count,
            self.degenerate_triangle_count,
            self.filled_hole_count,
        ]
        .iter()
        .sum()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// One-line `V:{vertices} T:{triangles}` summary followed by every
    /// non-zero repair or defect count.
    #[must_use]
    pub fn summary(&self) -> String {
        let tallies = [
            ("welded", self.welded_vertex_count),
            ("flipped", self.flipped_triangle_count),
            ("degenerate", self.degenerate_triangle_count),
            ("holes", self.filled_hole_count),
            ("split", self.split_vertex_count),
            ("open", self.open_edge_count),
            ("non-manifold", self.non_manifold_edge_count),
        ];
        let mut out = format!("V:{} T:{}", self.vertex_count, self.triangle_count);
        for (label, count) in tallies.into_iter().filter(|(_, n)| *n > 0) {
            out.push_str(&format!(" {label}:{count}"));
        }
        out
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())?;
        self.warnings
            .iter()
            .try_for_each(|warning| write!(f, "\n  warning: {warning}"))
    }
}
