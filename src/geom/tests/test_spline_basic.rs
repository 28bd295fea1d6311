use crate::geom::{
    CubicSpline3, Curve3, EndCondition, Parameterization, Point3, SplineError, Tolerance, Vec3,
    resample_spline,
};

fn square() -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ]
}

#[test]
fn index_spline_interpolates_landmarks() {
    let pts = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 0.5),
        Point3::new(3.0, 1.0, -1.0),
        Point3::new(4.0, 4.0, 2.0),
        Point3::new(6.0, 3.0, 0.0),
    ];
    let tol = Tolerance::new(1e-9);

    for closed in [false, true] {
        let spline = CubicSpline3::fit(&pts, closed, Parameterization::Index, EndCondition::default())
            .expect("fit");
        for (i, p) in pts.iter().enumerate() {
            let q = spline.point_at(i as f64);
            assert!(tol.approx_eq_point3(*p, q), "closed={closed} i={i}: {q:?} != {p:?}");
        }
    }
}

#[test]
fn closed_spline_domain_and_period() {
    let spline =
        CubicSpline3::fit(&square(), true, Parameterization::Index, EndCondition::default()).expect("fit");
    assert!(spline.is_closed());
    assert_eq!(spline.domain(), (0.0, 3.0));
    assert_eq!(spline.period(), Some(4.0));
    assert_eq!(spline.point_count(), 4);

    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(spline.point_at(0.0), spline.point_at(4.0)));
    assert!(tol.approx_eq_point3(spline.point_at(0.25), spline.point_at(4.25)));
    assert!(tol.approx_eq_point3(spline.point_at(-0.5), spline.point_at(3.5)));
}

#[test]
fn closed_spline_is_smooth_across_the_seam() {
    let spline =
        CubicSpline3::fit(&square(), true, Parameterization::Index, EndCondition::default()).expect("fit");
    let period = spline.period().expect("closed");
    let before = spline.derivative_at(period - 1e-9);
    let after = spline.derivative_at(1e-9);
    assert!((before - after).length() < 1e-6, "{before:?} vs {after:?}");
}

#[test]
fn chord_length_knots_follow_spacing() {
    let pts = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(3.0, 4.0, 0.0),
        Point3::new(3.0, 4.0, 2.0),
    ];
    let spline =
        CubicSpline3::fit(&pts, false, Parameterization::ChordLength, EndCondition::Natural).expect("fit");
    assert_eq!(spline.knots(), &[0.0, 5.0, 7.0]);
    assert_eq!(spline.domain(), (0.0, 7.0));
    assert_eq!(spline.period(), None);
}

#[test]
fn natural_spline_reproduces_a_straight_line() {
    let pts: Vec<Point3> = (0..5).map(|i| Point3::new(i as f64, 2.0 * i as f64, 0.0)).collect();
    let spline = CubicSpline3::fit(&pts, false, Parameterization::Index, EndCondition::Natural).expect("fit");
    for k in 0..=40 {
        let t = k as f64 * 0.1;
        let p = spline.point_at(t);
        assert!((p.x - t).abs() < 1e-9);
        assert!((p.y - 2.0 * t).abs() < 1e-9);
    }
}

#[test]
fn clamped_spline_honours_end_tangents() {
    let start_tangent = Vec3::new(1.0, 0.0, 0.0);
    let end_tangent = Vec3::new(0.0, -2.0, 0.0);
    let end = EndCondition::Clamped {
        start_tangent,
        end_tangent,
    };
    let spline = CubicSpline3::fit(&square(), false, Parameterization::Index, end).expect("fit");

    assert!((spline.derivative_at(0.0) - start_tangent).length() < 1e-9);
    assert!((spline.derivative_at(3.0) - end_tangent).length() < 1e-9);
}

#[test]
fn default_end_condition_has_zero_end_slopes() {
    let spline =
        CubicSpline3::fit(&square(), false, Parameterization::Index, EndCondition::default()).expect("fit");
    assert!(spline.derivative_at(0.0).length() < 1e-9);
}

#[test]
fn two_point_closed_spline_is_supported() {
    let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
    let spline =
        CubicSpline3::fit(&pts, true, Parameterization::ChordLength, EndCondition::default()).expect("fit");
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(spline.point_at(0.0), pts[0]));
    assert!(tol.approx_eq_point3(spline.point_at(2.0), pts[1]));
    assert_eq!(spline.period(), Some(4.0));
}

#[test]
fn resample_closed_repeats_first_point() {
    let ring = resample_spline(&square(), true, 70, EndCondition::default()).expect("resample");
    assert_eq!(ring.len(), 71);
    assert_eq!(ring[0], ring[70]);
    assert!(Tolerance::new(1e-9).approx_eq_point3(ring[0], square()[0]));
    assert_ne!(ring[0], ring[69]);
}

#[test]
fn resample_open_keeps_endpoints() {
    let pts = square();
    let out = resample_spline(&pts, false, 9, EndCondition::default()).expect("resample");
    assert_eq!(out.len(), 10);
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(out[0], pts[0]));
    assert!(tol.approx_eq_point3(out[9], pts[3]));
}

#[test]
fn fit_rejects_bad_input() {
    let one = [Point3::ORIGIN];
    assert_eq!(
        CubicSpline3::fit(&one, false, Parameterization::Index, EndCondition::Natural),
        Err(SplineError::TooFewPoints { count: 1 })
    );

    let nan = [Point3::ORIGIN, Point3::new(f64::NAN, 0.0, 0.0)];
    assert_eq!(
        CubicSpline3::fit(&nan, false, Parameterization::Index, EndCondition::Natural),
        Err(SplineError::NonFinitePoint { index: 1 })
    );

    let same = [Point3::ORIGIN, Point3::ORIGIN, Point3::ORIGIN];
    assert_eq!(
        resample_spline(&same, true, 70, EndCondition::default()),
        Err(SplineError::Collapsed)
    );
}
