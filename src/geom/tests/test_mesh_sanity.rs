use crate::geom::{
    FinishOptions, NormalsOptions, PipelineMetrics, Point3, SurfaceMesh, find_boundary_loops,
    finish_mesh,
};

fn cube_points() -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ]
}

/// Outward-facing unit cube; the last two triangles are the top face.
fn cube_indices() -> Vec<u32> {
    vec![
        0, 3, 2, 0, 2, 1, // bottom
        0, 1, 5, 0, 5, 4, // front
        3, 7, 6, 3, 6, 2, // back
        0, 4, 7, 0, 7, 3, // left
        1, 2, 6, 1, 6, 5, // right
        4, 5, 6, 4, 6, 7, // top
    ]
}

fn finish(points: Vec<Point3>, indices: Vec<u32>, options: FinishOptions) -> (SurfaceMesh, crate::geom::GeomMeshDiagnostics) {
    let mut metrics = PipelineMetrics::default();
    finish_mesh(points, indices, options, &mut metrics)
}

#[test]
fn closed_cube_is_clean_and_creased() {
    let (mesh, diag) = finish(cube_points(), cube_indices(), FinishOptions::default());

    mesh.validate().expect("mesh validate");
    assert!(diag.is_valid_solid());
    assert_eq!(diag.welded_vertex_count, 0);
    assert_eq!(diag.degenerate_triangle_count, 0);
    assert_eq!(diag.filled_hole_count, 0);
    assert!(!diag.has_warnings());

    // Three faces meet at 90 degrees at every corner.
    assert_eq!(mesh.vertex_count(), 24);
    assert_eq!(diag.split_vertex_count, 16);
    assert_eq!(mesh.triangle_count(), 12);
    assert!((mesh.signed_volume() - 1.0).abs() < 1e-12);

    let normals = mesh.normals.as_ref().expect("normals");
    for n in normals {
        let axis_aligned = n.iter().filter(|c| (c.abs() - 1.0).abs() < 1e-12).count();
        assert_eq!(axis_aligned, 1, "crease normal should be a face normal: {n:?}");
    }
}

#[test]
fn smooth_normals_without_splitting() {
    let options = FinishOptions {
        normals: NormalsOptions {
            splitting: false,
            ..NormalsOptions::default()
        },
        ..FinishOptions::default()
    };
    let (mesh, diag) = finish(cube_points(), cube_indices(), options);

    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(diag.split_vertex_count, 0);
    let normals = mesh.normals.as_ref().expect("normals");
    // Vertex 6 sits at (1,1,1); its smooth normal points away from the cube centre.
    let n6 = normals[6];
    assert!(n6[0] > 0.0 && n6[1] > 0.0 && n6[2] > 0.0);
}

#[test]
fn inverted_cube_is_flipped_outward() {
    let mut indices = cube_indices();
    for tri in indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
    let (mesh, diag) = finish(cube_points(), indices, FinishOptions::default());

    assert!(mesh.signed_volume() > 0.0);
    assert!(diag.warnings.iter().any(|w| w.contains("flipped")));
}

#[test]
fn missing_face_is_filled() {
    let mut indices = cube_indices();
    indices.truncate(30);
    assert_eq!(find_boundary_loops(&indices).len(), 1);

    let (mesh, diag) = finish(cube_points(), indices, FinishOptions::default());

    assert_eq!(diag.filled_hole_count, 1);
    assert_eq!(diag.hole_fill_triangle_count, 2);
    assert!(diag.is_watertight());
    assert_eq!(mesh.triangle_count(), 12);
    assert!((mesh.signed_volume() - 1.0).abs() < 1e-12);
}

#[test]
fn hole_filling_can_be_disabled() {
    let mut indices = cube_indices();
    indices.truncate(30);
    let options = FinishOptions {
        fill_holes: false,
        ..FinishOptions::default()
    };
    let (_, diag) = finish(cube_points(), indices, options);

    assert_eq!(diag.open_edge_count, 4);
    assert!(diag.warnings.iter().any(|w| w == "mesh has open edges"));
}

#[test]
fn triangle_soup_is_welded() {
    let corners = cube_points();
    let mut points = Vec::new();
    let mut indices = Vec::new();
    for (i, &v) in cube_indices().iter().enumerate() {
        points.push(corners[v as usize]);
        indices.push(i as u32);
    }

    let (_, diag) = finish(points, indices, FinishOptions::default());
    assert_eq!(diag.welded_vertex_count, 36 - 8);
    assert!(diag.is_valid_solid());
}

#[test]
fn collapsed_triangles_are_culled() {
    let mut points = cube_points();
    points.push(Point3::new(0.0, 0.0, 0.0));
    let mut indices = cube_indices();
    // Zero-area sliver through the duplicate of vertex 0.
    indices.extend_from_slice(&[0, 8, 1]);

    let (mesh, diag) = finish(points, indices, FinishOptions::default());
    assert_eq!(diag.welded_vertex_count, 1);
    assert_eq!(diag.degenerate_triangle_count, 1);
    assert_eq!(mesh.triangle_count(), 12);
}

#[test]
fn surface_mesh_validate_rejects_bad_buffers() {
    assert!(SurfaceMesh::new(vec![[0.0, 0.0, 0.0]], vec![0]).validate().is_err());
    assert!(SurfaceMesh::new(vec![[0.0, 0.0, 0.0]], vec![0, 1, 0]).validate().is_err());
    assert!(SurfaceMesh::new(vec![[f64::NAN, 0.0, 0.0]], vec![]).validate().is_err());

    let obj = SurfaceMesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![0, 1, 2],
    )
    .to_obj("tri");
    assert!(obj.starts_with("o tri\n"));
    assert!(obj.contains("f 1 2 3"));
}
