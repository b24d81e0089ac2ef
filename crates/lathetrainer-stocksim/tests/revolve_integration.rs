//! Integration tests for the revolve cutting path: engine + raster +
//! parting detector working together on realistic stock.

use lathetrainer_core::{CutConfig, HelixConfig, MaterialType, PartingConfig, RasterConfig};
use lathetrainer_stocksim::{
    ContactShape, CutMode, CuttingEngine, PartingDetector, Point2, Pose, RasterStock,
    StockSnapshot, WorldBounds,
};
use lathetrainer_core::FeedRate;

// 257 rows puts center_row at 128 with a pixel row exactly on the axis,
// which is what lets a parting blade cut a column down to nothing.
fn stock_500() -> RasterStock {
    RasterStock::new_covered(
        500,
        257,
        WorldBounds::from_center_size(0.0, 0.0, 500.0, 257.0),
        MaterialType::Steel,
        RasterConfig::default(),
    )
    .unwrap()
}

fn continuous_engine() -> CuttingEngine {
    CuttingEngine::new(
        CutMode::LatheRevolve,
        CutConfig::default(),
        HelixConfig {
            enabled: false,
            ..Default::default()
        },
    )
}

#[test]
fn test_revolve_scenario_columns_clipped_to_target_radius() {
    let mut stock = stock_500();
    let mut engine = continuous_engine();

    // Tool tip spanning columns ~100..400, bottom edge 40 px above the axis
    let tip = ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(150.0, 44.0))
        .at_pose(&Pose::at(0.0, 84.0));

    let outcome = engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(2.0), 1200.0, 0.016);
    assert!(outcome.changed);
    let (x0, x1) = outcome.columns.unwrap();

    for x in x0..=x1 {
        let r = stock.max_radius_px(x).expect("column still has material");
        assert!(
            r <= 41,
            "column {} has radius {} but should be clipped to ~40",
            x,
            r
        );
    }

    // Columns outside the contact range keep the full bar diameter
    for x in [0usize, 50, x0 - 5, x1 + 5, 450, 499] {
        assert_eq!(stock.max_radius_px(x), Some(128), "column {} unchanged", x);
    }
}

#[test]
fn test_revolve_does_not_trigger_parting() {
    let mut stock = stock_500();
    let mut engine = continuous_engine();
    let mut detector = PartingDetector::new(PartingConfig::default());

    let tip = ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(150.0, 44.0))
        .at_pose(&Pose::at(0.0, 84.0));

    let outcome = engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(2.0), 1200.0, 0.016);
    let (x0, x1) = outcome.columns.unwrap();

    // Material remains near the axis everywhere, so no split is reported
    assert_eq!(detector.check(&stock, x0, x1, (x0 + x1) / 2, 1.0), None);
}

#[test]
fn test_parting_pass_splits_stock() {
    let mut stock = stock_500();
    let mut engine = continuous_engine();
    let mut detector = PartingDetector::new(PartingConfig {
        check_cooldown_s: 0.0,
        ..Default::default()
    });

    // Narrow parting blade at column ~250, fed to the axis over many ticks
    let mut now = 0.0f64;
    let mut cut_at = None;
    for step in 0..70 {
        let blade_bottom = 120.0 - step as f32 * 2.0;
        let tip = ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(2.0, 8.0))
            .at_pose(&Pose::at(0.0, blade_bottom + 8.0));

        let outcome = engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(1.0), 800.0, 0.016);
        now += 0.016;

        let (x0, x1) = outcome.columns.unwrap_or((246, 254));
        if let Some(cut) = detector.check(&stock, x0, x1, 250, now) {
            cut_at = Some(cut);
            detector.mark_parted();
            break;
        }
    }

    let cut = cut_at.expect("parting should be detected before the blade bottoms out");
    let split = stock.split(cut);
    let right = split.right.expect("a dropped piece should exist");

    assert!(split.left.width_px() + right.width_px() < stock.width_px());
    assert!(split.left.has_material_in_column(0));
    assert!(right.has_material_in_column(right.width_px() - 1));
    assert!(detector.is_parted());
}

#[test]
fn test_snapshot_reflects_machining() {
    let mut stock = stock_500();
    let mut engine = continuous_engine();

    let before = StockSnapshot::capture(&stock);
    let tip = ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(40.0, 30.0))
        .at_pose(&Pose::at(0.0, 110.0));
    engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(2.0), 1200.0, 0.016);
    let after = StockSnapshot::capture(&stock);

    let solid = |s: &StockSnapshot| s.pixels.iter().filter(|p| p.a > 10).count();
    assert!(solid(&after) < solid(&before));

    let img = after.to_image();
    assert_eq!(img.dimensions(), (500, 257));
}
