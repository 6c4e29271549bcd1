use mockifu_algorithms::BinAssigner;
use mockifu_core::{BinGeometry, BoundingBox, FootprintBoundary, SpatialBin, UNASSIGNED};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Clockwise, closed hexagon with a central always-inside disc.
fn hexagon(min_radius: f64) -> FootprintBoundary {
    let vertices: Vec<(f64, f64)> = (0..=6)
        .map(|i| {
            let angle = -std::f64::consts::FRAC_PI_3 * f64::from(i % 6);
            (10.0 * angle.cos(), 10.0 * angle.sin())
        })
        .collect();
    FootprintBoundary::new(
        vertices,
        min_radius,
        10.0,
        BoundingBox::new(-10.0, 10.0, -9.0, 9.0),
    )
    .unwrap()
}

fn grid_bins() -> BinGeometry {
    let mut bins = Vec::new();
    for iy in -3_i32..=3 {
        for ix in -3_i32..=3 {
            let label = i64::try_from(bins.len()).unwrap();
            bins.push(SpatialBin::new(
                label,
                f64::from(ix) * 3.0,
                f64::from(iy) * 3.0,
                9.0,
                true,
            ));
        }
    }
    BinGeometry::new(bins).unwrap()
}

#[test]
fn test_assigner_never_labels_rejected_points() {
    let footprint = hexagon(2.0);
    let geometry = grid_bins();
    let assigner = BinAssigner::new(&footprint, &geometry);

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x: Vec<f64> = (0..20_000).map(|_| rng.gen_range(-15.0..15.0)).collect();
    let y: Vec<f64> = (0..20_000).map(|_| rng.gen_range(-15.0..15.0)).collect();
    let assignment = assigner.assign_xy(&x, &y).unwrap();

    let mut inside = 0;
    for (i, &label) in assignment.labels().iter().enumerate() {
        let accepted = footprint.is_inside(x[i], y[i]);
        if accepted {
            inside += 1;
            assert_ne!(label, UNASSIGNED, "accepted point {i} was not binned");
        } else {
            assert_eq!(label, UNASSIGNED, "rejected point {i} received bin {label}");
        }
    }
    assert!(inside > 0 && inside < x.len());
}

#[test]
fn test_points_within_min_radius_are_inside() {
    // Polygon far from the origin, so only the disc can accept these points.
    let footprint = FootprintBoundary::new(
        vec![(50.0, 60.0), (60.0, 60.0), (60.0, 50.0), (50.0, 50.0), (50.0, 60.0)],
        3.0,
        100.0,
        BoundingBox::new(50.0, 60.0, 50.0, 60.0),
    )
    .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..5_000 {
        let r = rng.gen_range(0.0..2.999);
        let theta = rng.gen_range(0.0..std::f64::consts::TAU);
        assert!(footprint.is_inside(r * theta.cos(), r * theta.sin()));
    }
}

#[test]
fn test_points_outside_bounding_box_are_outside() {
    let footprint = hexagon(2.0);
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    for _ in 0..5_000 {
        let x = rng.gen_range(-30.0..30.0);
        let y = if rng.gen_bool(0.5) {
            rng.gen_range(9.001..30.0)
        } else {
            rng.gen_range(-30.0..-9.001)
        };
        assert!(!footprint.is_inside(x, y));
        assert!(!footprint.is_inside(y * 1.2, x * 0.3));
    }
}

#[test]
fn test_single_bin_receives_every_accepted_point() {
    let footprint = hexagon(0.0);
    let geometry = BinGeometry::new(vec![SpatialBin::new(5, 1.0, 1.0, 100.0, true)]).unwrap();
    let assigner = BinAssigner::new(&footprint, &geometry);

    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let x: Vec<f64> = (0..2_000).map(|_| rng.gen_range(-12.0..12.0)).collect();
    let y: Vec<f64> = (0..2_000).map(|_| rng.gen_range(-12.0..12.0)).collect();
    let assignment = assigner.assign_xy(&x, &y).unwrap();

    for (i, &label) in assignment.labels().iter().enumerate() {
        if footprint.is_inside(x[i], y[i]) {
            assert_eq!(label, 0);
        }
    }
}
