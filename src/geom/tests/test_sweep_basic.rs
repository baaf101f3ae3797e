use crate::geom::{Point3, Polyline3, SweepOptions, Tolerance, sweep_profile};

fn square(half: f64) -> Vec<[f64; 2]> {
    vec![[-half, -half], [half, -half], [half, half], [-half, half]]
}

fn rail() -> Polyline3 {
    Polyline3::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, -2.0),
        Point3::new(0.0, -2.0, -2.0),
    ])
    .expect("valid rail")
}

#[test]
fn full_sweep_counts() {
    let (mesh, diag) = sweep_profile(&square(0.1), &rail(), SweepOptions::default()).expect("sweep");
    assert_eq!(diag.ring_count, 3);
    assert_eq!(mesh.vertex_count(), 12);
    assert_eq!(diag.triangle_count, 2 * 4 * 2);
    assert!(mesh.validate().is_ok());
}

#[test]
fn first_ring_lies_across_world_x() {
    let (mesh, _) = sweep_profile(&square(0.5), &rail(), SweepOptions::default()).expect("sweep");
    let xs: Vec<f64> = mesh.positions[..4].iter().map(|p| p[0]).collect();
    assert!(xs.iter().any(|&x| Tolerance::DEFAULT.approx_eq_f64(x, 0.5)));
    assert!(xs.iter().any(|&x| Tolerance::DEFAULT.approx_eq_f64(x, -0.5)));
    for p in &mesh.positions[..4] {
        assert!(Tolerance::DEFAULT.approx_eq_f64(p[2], 0.0));
    }
}

#[test]
fn taper_shrinks_last_ring() {
    let options = SweepOptions::default().with_taper(0.0);
    let (mesh, _) = sweep_profile(&square(0.5), &rail(), options).expect("sweep");
    for p in &mesh.positions[8..] {
        assert!(Tolerance::DEFAULT.approx_eq_point3(Point3::from(*p), Point3::new(0.0, -2.0, -2.0)));
    }
}

#[test]
fn reveal_limits_rings() {
    let hidden = sweep_profile(&square(0.1), &rail(), SweepOptions::default().with_reveal(0.0)).expect("sweep");
    assert_eq!(hidden.0.vertex_count(), 0);

    let (quarter, diag) =
        sweep_profile(&square(0.1), &rail(), SweepOptions::default().with_reveal(0.25)).expect("sweep");
    assert_eq!(diag.ring_count, 2);
    let end = quarter.positions[4..].iter().map(|p| p[2]).sum::<f64>() / 4.0;
    assert!(Tolerance::new(1e-9).approx_eq_f64(end, -1.0));
}

#[test]
fn rejects_bad_profile() {
    assert!(sweep_profile(&[[0.0, 0.0], [1.0, 0.0]], &rail(), SweepOptions::default()).is_err());
    assert!(sweep_profile(&square(0.1), &rail(), SweepOptions::default().with_taper(f64::NAN)).is_err());
}
