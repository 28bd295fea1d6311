use std::f64::consts::{FRAC_PI_2, TAU};

use crate::geom::{Point3, Polyline};
use crate::modeller::{
    CaptureSession, FitError, ModellerError, ModellerOptions, PlaneError, StitchError, StoreError,
    ValveModeller,
};
use crate::scene::{ObjectKind, PointCapture, SceneStore};

fn ring(count: usize) -> Vec<Point3> {
    (0..count)
        .map(|i| {
            let a = TAU * i as f64 / count as f64;
            Point3::new(20.0 * a.cos(), 15.0 * a.sin(), 0.5 * a.sin())
        })
        .collect()
}

/// Landmarks for a leaflet hanging from the opening at `angle`.
fn leaflet(angle: f64) -> Vec<Point3> {
    (0..5)
        .map(|j| {
            let t = f64::from(j) / 4.0;
            let r = 10.0 - 5.0 * t;
            Point3::new(r * angle.cos(), r * angle.sin(), -10.0 * t)
        })
        .collect()
}

fn capture_opening(modeller: &mut ValveModeller, landmarks: &[Point3]) {
    modeller.begin_opening_capture();
    for &p in landmarks {
        assert!(modeller.capture_mut().add_point(p));
    }
}

fn capture_leaflet(modeller: &mut ValveModeller, landmarks: &[Point3]) {
    modeller.begin_leaflet_capture();
    for &p in landmarks {
        assert!(modeller.capture_mut().add_point(p));
    }
}

fn modeller_with_leaflets(count: usize) -> ValveModeller {
    let mut modeller = ValveModeller::default();
    for c in 0..count {
        capture_leaflet(&mut modeller, &leaflet(c as f64 * FRAC_PI_2));
        modeller.end_leaflet_capture(c + 1).expect("leaflet");
    }
    modeller
}

#[test]
fn opening_capture_builds_profile_and_planes() {
    let mut modeller = ValveModeller::default();
    capture_opening(&mut modeller, &ring(8));
    assert_eq!(modeller.session(), Some(CaptureSession::Opening));

    let len = modeller.end_opening_capture().expect("profile").len();
    assert_eq!(len, 52 * 7 + 2);
    assert_eq!(modeller.session(), None);
    assert!(!modeller.capture().is_active());
    assert!(!modeller.capture().is_target_visible());
    assert_eq!(modeller.planes().map(|p| p.len()), Some(11));

    let scene = modeller.scene();
    let profile_id = scene.find(ObjectKind::Profile, "MVOpening").expect("profile node");
    let profile = scene.node(profile_id).expect("node").object.as_polyline();
    assert_eq!(profile.map(Polyline::len), Some(len));

    let visible: Vec<usize> = (0..11)
        .filter(|&i| {
            let id = scene.find(ObjectKind::Plane, &format!("MVPlane{i}")).expect("plane node");
            scene.node(id).expect("node").is_visible()
        })
        .collect();
    assert_eq!(visible, vec![0, 5]);
}

#[test]
fn recapturing_the_opening_replaces_scene_nodes() {
    let mut modeller = ValveModeller::default();
    capture_opening(&mut modeller, &ring(8));
    modeller.end_opening_capture().expect("profile");
    let nodes = modeller.scene().node_count();

    capture_opening(&mut modeller, &ring(5));
    let len = modeller.end_opening_capture().expect("profile").len();
    assert_eq!(len, 52 * 4 + 2);
    assert_eq!(modeller.scene().node_count(), nodes);
}

#[test]
fn highlighted_planes_are_configurable() {
    let options = ModellerOptions::default().with_highlighted_planes([3]);
    let mut modeller = ValveModeller::new(options);
    modeller.end_opening_capture_with(&ring(6)).expect("profile");

    let scene = modeller.scene();
    let shown = scene
        .nodes_of_kind(ObjectKind::Plane)
        .filter(|n| n.is_visible())
        .map(|n| n.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(shown, vec!["MVPlane3".to_owned()]);
}

#[test]
fn select_plane_moves_the_view() {
    let mut modeller = ValveModeller::default();
    assert_eq!(
        modeller.select_plane(0),
        Err(ModellerError::Plane(PlaneError::EmptyProfile))
    );

    modeller.end_opening_capture_with(&ring(8)).expect("profile");
    let frame = modeller.select_plane(5).expect("select");
    let center = modeller.planes().and_then(|p| p.get(5)).expect("plane").center;
    assert_eq!(frame.origin, center);
    assert_eq!(modeller.scene().view("CrossSectionRed"), Some(&frame));

    assert_eq!(
        modeller.select_plane(11),
        Err(ModellerError::PlaneIndexOutOfRange { index: 11, count: 11 })
    );
    assert_eq!(modeller.scene().view("CrossSectionRed"), Some(&frame));
}

#[test]
fn plane_visibility_can_be_toggled() {
    let mut modeller = ValveModeller::default();
    assert_eq!(
        modeller.set_plane_visibility(0, true),
        Err(ModellerError::PlaneIndexOutOfRange { index: 0, count: 0 })
    );

    modeller.end_opening_capture_with(&ring(8)).expect("profile");
    modeller.set_plane_visibility(2, true).expect("show");
    modeller.set_plane_visibility(0, false).expect("hide");

    let scene = modeller.scene();
    let visible = |name: &str| {
        scene
            .find(ObjectKind::Plane, name)
            .and_then(|id| scene.node(id))
            .is_some_and(|n| n.is_visible())
    };
    assert!(visible("MVPlane2"));
    assert!(!visible("MVPlane0"));
    assert!(visible("MVPlane5"));
}

#[test]
fn ending_without_a_session_is_null_input() {
    let mut modeller = ValveModeller::default();
    assert!(matches!(
        modeller.end_opening_capture(),
        Err(ModellerError::NullInput { .. })
    ));

    // Opening points are not a leaflet source.
    capture_opening(&mut modeller, &ring(4));
    assert!(matches!(
        modeller.end_leaflet_capture(1),
        Err(ModellerError::NullInput { .. })
    ));
    assert_eq!(modeller.session(), Some(CaptureSession::Opening));
}

#[test]
fn failed_fit_keeps_previous_state() {
    let mut modeller = ValveModeller::default();
    modeller.end_opening_capture_with(&ring(8)).expect("profile");
    let before = modeller.profile().cloned();

    modeller.begin_opening_capture();
    assert_eq!(
        modeller.end_opening_capture().map(|_| ()),
        Err(ModellerError::Fit(FitError::InsufficientPoints { count: 0 }))
    );
    assert_eq!(modeller.profile().cloned(), before);
    assert_eq!(modeller.planes().map(|p| p.len()), Some(11));
    assert_eq!(modeller.session(), Some(CaptureSession::Opening));
    assert!(modeller.capture().is_active());

    // The session is still usable once landmarks arrive.
    for p in ring(3) {
        modeller.capture_mut().add_point(p);
    }
    assert_eq!(modeller.end_opening_capture().expect("profile").len(), 52 * 2 + 2);
}

#[test]
fn leaflet_capture_fills_slots() {
    let mut modeller = ValveModeller::default();
    capture_leaflet(&mut modeller, &leaflet(0.0));
    let len = modeller.end_leaflet_capture(4).expect("leaflet").len();

    assert_eq!(len, 50);
    assert_eq!(modeller.session(), None);
    assert_eq!(modeller.capture().point_count(), 0);
    assert_eq!(modeller.leaflet_curves().len(), 11);
    assert_eq!(modeller.leaflet_curves()[3].len(), 50);
    assert_eq!(modeller.leaflet_store().populated_count(), 1);

    let scene = modeller.scene();
    let id = scene.find(ObjectKind::LeafletCurve, "Leaflet4").expect("leaflet node");
    assert_eq!(
        scene.node(id).and_then(|n| n.object.as_polyline()).map(Polyline::len),
        Some(50)
    );
}

#[test]
fn leaflet_errors_leave_the_store_untouched() {
    let mut modeller = modeller_with_leaflets(1);
    let before = modeller.leaflet_store().clone();

    capture_leaflet(&mut modeller, &leaflet(1.0));
    assert_eq!(
        modeller.end_leaflet_capture(12).map(|_| ()),
        Err(ModellerError::Store(StoreError::SlotOutOfRange { slot: 12 }))
    );
    assert_eq!(
        modeller.end_leaflet_capture(0).map(|_| ()),
        Err(ModellerError::Store(StoreError::SlotOutOfRange { slot: 0 }))
    );
    assert_eq!(
        modeller.end_leaflet_capture_with(2, &[Point3::ORIGIN]).map(|_| ()),
        Err(ModellerError::Fit(FitError::InsufficientPoints { count: 1 }))
    );
    assert_eq!(modeller.leaflet_store(), &before);
    assert_eq!(modeller.session(), Some(CaptureSession::Leaflet));
}

#[test]
fn surface_needs_two_curves() {
    let mut modeller = ValveModeller::default();
    assert_eq!(
        modeller.generate_surface().map(|_| ()),
        Err(ModellerError::Stitch(StitchError::InsufficientCurves { count: 0 }))
    );

    let mut modeller = modeller_with_leaflets(1);
    assert_eq!(
        modeller.generate_surface().map(|_| ()),
        Err(ModellerError::Stitch(StitchError::InsufficientCurves { count: 1 }))
    );
    assert!(modeller.surface().is_none());
    assert!(modeller.scene().find(ObjectKind::Surface, "MVSurface").is_none());
}

#[test]
fn four_leaflets_give_a_closed_surface() {
    let mut modeller = modeller_with_leaflets(4);
    let (mesh, mesh_diag, diag) = modeller.generate_surface().expect("surface");

    assert_eq!(diag.curve_count, 4);
    assert_eq!(diag.points_per_curve, 50);
    assert_eq!(diag.ring_count, 25);
    assert_eq!(diag.wall_quad_count, 24 * 70);
    assert!(mesh_diag.is_valid_solid(), "{}", mesh_diag.summary());
    assert!(mesh.signed_volume() > 0.0);
    assert_eq!(modeller.surface(), Some(&mesh));

    let scene = modeller.scene();
    let id = scene.find(ObjectKind::Surface, "MVSurface").expect("surface node");
    assert_eq!(
        scene.node(id).and_then(|n| n.object.as_surface()),
        Some(&mesh)
    );

    // Same curves, same surface, one scene node.
    let nodes = scene.node_count();
    let (again, _, _) = modeller.generate_surface().expect("surface");
    assert_eq!(again, mesh);
    assert_eq!(modeller.scene().node_count(), nodes);
}

#[test]
fn merged_curves_follow_populated_slots() {
    let modeller = ValveModeller::default();
    assert_eq!(
        modeller.merged_leaflet_curves().map(|_| ()),
        Err(ModellerError::Stitch(StitchError::InsufficientCurves { count: 0 }))
    );

    let modeller = modeller_with_leaflets(3);
    let merged = modeller.merged_leaflet_curves().expect("merge");
    assert_eq!(merged.lines().len(), 4);
    assert_eq!(merged.point_count(), 3 * 50 + 70);
}
