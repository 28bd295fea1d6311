use crate::geom::{
    Point3, Tolerance, TriangulationError, Vec3, face_normals, split_quad, triangulate_polygon,
};

fn triangle_area_sum(points: &[Point3], triangles: &[[u32; 3]]) -> f64 {
    let flat: Vec<u32> = triangles.iter().flatten().copied().collect();
    face_normals(points, &flat).iter().map(|n| 0.5 * n.length()).sum()
}

#[test]
fn tilted_square_triangulates_with_loop_winding() {
    // Unit square in the plane x = z, wound counter-clockwise about (-1, 0, 1).
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let result = triangulate_polygon(&points, &[0, 1, 2, 3], Tolerance::default_geom()).expect("triangulate");
    assert_eq!(result.triangles.len(), 2);
    assert!(!result.used_fallback);

    let flat: Vec<u32> = result.triangles.iter().flatten().copied().collect();
    let expected = Vec3::new(-1.0, 0.0, 1.0);
    for n in face_normals(&points, &flat) {
        assert!(n.dot(expected) > 0.0);
    }
}

#[test]
fn concave_l_shape_covers_its_area() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ];
    let result =
        triangulate_polygon(&points, &[0, 1, 2, 3, 4, 5], Tolerance::default_geom()).expect("triangulate");
    assert_eq!(result.triangles.len(), 4);
    assert!((triangle_area_sum(&points, &result.triangles) - 3.0).abs() < 1e-9);
}

#[test]
fn clockwise_loop_keeps_clockwise_triangles() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, -0.5, 0.0),
    ];
    let result =
        triangulate_polygon(&points, &[0, 1, 2, 3, 4], Tolerance::default_geom()).expect("triangulate");
    let flat: Vec<u32> = result.triangles.iter().flatten().copied().collect();
    for n in face_normals(&points, &flat) {
        assert!(n.z < 0.0);
    }
}

#[test]
fn polygon_errors() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
    ];
    let tol = Tolerance::default_geom();

    assert_eq!(
        triangulate_polygon(&points, &[0, 1], tol),
        Err(TriangulationError::TooFewVertices { count: 2 })
    );
    assert_eq!(
        triangulate_polygon(&points, &[0, 1, 9, 2], tol),
        Err(TriangulationError::IndexOutOfRange { index: 9 })
    );
    assert_eq!(
        triangulate_polygon(&points, &[0, 1, 2, 3], tol),
        Err(TriangulationError::DegeneratePlane)
    );
}

#[test]
fn split_quad_uses_shorter_diagonal() {
    // Kite: diagonal 1-3 is much shorter than 0-2.
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, -0.5, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(2.0, 0.5, 0.0),
    ];
    let tris = split_quad(&points, [0, 1, 2, 3]);
    assert_eq!(tris, [[0, 1, 3], [1, 2, 3]]);
}

#[test]
fn duplicate_and_collinear_vertices_are_pruned() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.5, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let result =
        triangulate_polygon(&points, &[0, 1, 2, 3, 4, 5], Tolerance::default_geom()).expect("triangulate");
    assert_eq!(result.triangles.len(), 2);
    assert!((triangle_area_sum(&points, &result.triangles) - 1.0).abs() < 1e-12);
    assert!(result.triangles.iter().flatten().all(|&i| i != 1));
}

#[test]
fn ring_cap_gives_n_minus_two_triangles() {
    let n = 70u32;
    let points: Vec<Point3> = (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * f64::from(i) / f64::from(n);
            Point3::new(10.0 * a.cos(), 10.0 * a.sin(), -4.0)
        })
        .collect();
    let ring: Vec<u32> = (0..n).collect();
    let result = triangulate_polygon(&points, &ring, Tolerance::default_geom()).expect("triangulate");

    assert_eq!(result.triangles.len(), 68);
    let polygon_area = 0.5 * f64::from(n) * 100.0 * (std::f64::consts::TAU / f64::from(n)).sin();
    assert!((triangle_area_sum(&points, &result.triangles) - polygon_area).abs() < 1e-9);
}
