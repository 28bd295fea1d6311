mod core;
mod diagnostics;
mod holes;
mod mesh;
mod metrics;
mod normals;
mod polydata;
mod polyline;
mod spline;
mod triangulation;

pub use core::{Point3, Tolerance, Vec3};
pub use diagnostics::GeomMeshDiagnostics;
pub use holes::{HoleFillReport, fill_holes, find_boundary_loops};
pub use mesh::{FinishOptions, SurfaceMesh, finish_mesh};
pub use metrics::{PipelineMetrics, TimingBucket, TimingReport};
pub use normals::{NormalsOptions, NormalsResult, compute_normals, face_normals};
pub use polydata::{PolyData, TriangulateReport};
pub use polyline::Polyline;
pub use spline::{
    CubicSpline3, Curve3, EndCondition, Parameterization, SplineError, resample_spline,
};
pub use triangulation::{
    PolygonTriangulation, TriangulationError, split_quad, triangulate_polygon,
};

#[cfg(test)]
mod tests;
