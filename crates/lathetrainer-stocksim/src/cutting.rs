//! Cutting engine
//!
//! Orchestrates one tick of material removal: asks the helix mask which
//! columns are eligible, asks the geometry probe which raster cells the
//! tool tip covers, erodes the stock, and paints the freshly machined
//! surface. Two cut modes exist per tool configuration:
//!
//! - `ProfileCarve` erases exactly the cells inside the tip volume,
//!   optionally mirrored across the rotation axis (a symmetric two-edge
//!   insert).
//! - `LatheRevolve` models rotational symmetry: the minimum radius the tip
//!   reaches in a column becomes that column's new maximum radius, because
//!   a tool engaging anywhere around the spinning circumference cuts the
//!   whole circumference down to it.

use lathetrainer_core::{CutConfig, FeedRate, HelixConfig};
use tracing::trace;

use crate::geometry::{
    bounding_raster_rect, column_to_world_x, row_to_world_y, ContactVolume, Point2, RasterRect,
};
use crate::helix::HelixMask;
use crate::raster::RasterStock;

/// How a tool removes material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutMode {
    /// Erase the tip silhouette directly.
    ProfileCarve,
    /// Clip each column to the minimum radius the tip reaches.
    LatheRevolve,
}

/// What one cutting tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CutOutcome {
    /// Whether any material was removed.
    pub changed: bool,
    /// Inclusive column range the tick touched, when it touched anything.
    pub columns: Option<(usize, usize)>,
}

/// Per-tool cutting engine state.
#[derive(Debug, Clone)]
pub struct CuttingEngine {
    mode: CutMode,
    cut: CutConfig,
    helix: HelixConfig,
    spindle_phase: f32,
}

impl CuttingEngine {
    /// Create an engine in the given cut mode.
    pub fn new(mode: CutMode, cut: CutConfig, helix: HelixConfig) -> Self {
        Self {
            mode,
            cut,
            helix,
            spindle_phase: 0.0,
        }
    }

    /// Current cut mode.
    pub fn mode(&self) -> CutMode {
        self.mode
    }

    /// Switch cut mode (a tool-change concern, not a per-tick one).
    pub fn set_mode(&mut self, mode: CutMode) {
        self.mode = mode;
    }

    /// Current rotational phase of the stock, [0, 1).
    pub fn spindle_phase(&self) -> f32 {
        self.spindle_phase
    }

    /// Run one cutting tick against the stock.
    ///
    /// The caller has already verified `can_cut_now()`; this only does
    /// geometry. A tip that misses the stock entirely is a no-op tick.
    pub fn tick(
        &mut self,
        stock: &mut RasterStock,
        tip: &ContactVolume,
        feed: FeedRate,
        rpm: f32,
        dt: f32,
    ) -> CutOutcome {
        self.spindle_phase = (self.spindle_phase + rpm / 60.0 * dt).rem_euclid(1.0);

        let bounds = *stock.world_bounds();
        let rect = match bounding_raster_rect(tip, &bounds, stock.width_px(), stock.height_px()) {
            Some(r) => r,
            None => return CutOutcome::default(),
        };

        let mask = HelixMask::compute(&self.helix, feed, rpm, self.spindle_phase);

        let changed = match self.mode {
            CutMode::ProfileCarve => self.profile_carve(stock, tip, &mask, rect),
            CutMode::LatheRevolve => self.revolve_carve(stock, tip, &mask, rect),
        };

        if changed {
            trace!(x0 = rect.x0, x1 = rect.x1, mode = ?self.mode, "material removed");
        }

        CutOutcome {
            changed,
            columns: changed.then_some((rect.x0, rect.x1)),
        }
    }

    fn column_allowed(&self, mask: &HelixMask, stock: &RasterStock, x: usize) -> bool {
        let bounds = stock.world_bounds();
        let wx = column_to_world_x(x, bounds, stock.width_px());
        let x_mm = stock.calibration().world_x_to_mm(wx - bounds.min_x);
        mask.allows(x_mm)
    }

    fn profile_carve(
        &self,
        stock: &mut RasterStock,
        tip: &ContactVolume,
        mask: &HelixMask,
        rect: RasterRect,
    ) -> bool {
        let bounds = *stock.world_bounds();
        let width = stock.width_px();
        let height = stock.height_px();
        let center_row = stock.center_row();

        let allowed: Vec<bool> = (rect.x0..=rect.x1)
            .map(|x| self.column_allowed(mask, stock, x))
            .collect();

        let mut changed = false;
        let mut touched = vec![false; rect.x1 - rect.x0 + 1];

        for y in rect.y0..=rect.y1 {
            let wy = row_to_world_y(y, &bounds, height);
            for x in rect.x0..=rect.x1 {
                if !allowed[x - rect.x0] {
                    continue;
                }
                let wx = column_to_world_x(x, &bounds, width);
                if !tip.contains_point(Point2::new(wx, wy)) {
                    continue;
                }
                if !stock.erase(x, y) {
                    continue;
                }
                changed = true;
                touched[x - rect.x0] = true;

                if self.cut.mirror_across_center {
                    let mirror_y = 2 * center_row as isize - y as isize;
                    if mirror_y >= 0 && (mirror_y as usize) < height {
                        stock.erase(x, mirror_y as usize);
                    }
                }
            }
        }

        if changed && self.cut.paint_whole_column {
            for (i, was_touched) in touched.iter().enumerate() {
                if *was_touched {
                    stock.paint_whole_column(rect.x0 + i, self.cut.machined_column_color);
                }
            }
        }

        changed
    }

    fn revolve_carve(
        &self,
        stock: &mut RasterStock,
        tip: &ContactVolume,
        mask: &HelixMask,
        rect: RasterRect,
    ) -> bool {
        let bounds = *stock.world_bounds();
        let width = stock.width_px();
        let height = stock.height_px();
        let center_row = stock.center_row();
        let center_y_world = bounds.center_y();
        let half_rad_world = (bounds.height() / 2.0).max(1e-6);

        let soften = self.cut.soften_edge.then_some(self.cut.soften_alpha_add);
        let mut changed = false;

        for x in rect.x0..=rect.x1 {
            if !self.column_allowed(mask, stock, x) {
                continue;
            }
            let wx = column_to_world_x(x, &bounds, width);

            // Minimum radial distance the tip reaches in this column.
            let mut min_abs_r = f32::INFINITY;
            for y in 0..height {
                let wy = row_to_world_y(y, &bounds, height);
                if !tip.contains_point(Point2::new(wx, wy)) {
                    continue;
                }
                min_abs_r = min_abs_r.min((wy - center_y_world).abs());
            }
            if min_abs_r.is_infinite() {
                continue;
            }

            let max_radius = height / 2 - 1;
            let target_radius_px = (((min_abs_r / half_rad_world) * (height as f32 / 2.0)).round()
                as usize)
                .min(max_radius);

            if stock.clip_column_to_radius(x, target_radius_px) {
                changed = true;
            }

            let top = center_row as isize + target_radius_px as isize;
            let bot = center_row as isize - target_radius_px as isize;
            stock.paint_machined_band(
                x,
                top,
                -1,
                self.cut.machined_edge_color,
                self.cut.edge_thickness_px,
                soften,
            );
            stock.paint_machined_band(
                x,
                bot,
                1,
                self.cut.machined_edge_color,
                self.cut.edge_thickness_px,
                soften,
            );
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ContactShape, Pose, WorldBounds};
    use lathetrainer_core::{MaterialType, RasterConfig};

    fn stock_500() -> RasterStock {
        RasterStock::new_covered(
            500,
            256,
            WorldBounds::from_center_size(0.0, 0.0, 500.0, 256.0),
            MaterialType::Steel,
            RasterConfig::default(),
        )
        .unwrap()
    }

    fn no_helix() -> HelixConfig {
        HelixConfig {
            enabled: false,
            ..Default::default()
        }
    }

    fn tip_box(cx: f32, cy: f32, hx: f32, hy: f32) -> ContactVolume {
        ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(hx, hy))
            .at_pose(&Pose::at(cx, cy))
    }

    #[test]
    fn test_miss_is_noop() {
        let mut stock = stock_500();
        let mut engine = CuttingEngine::new(CutMode::ProfileCarve, CutConfig::default(), no_helix());
        let tip = tip_box(10_000.0, 0.0, 5.0, 5.0);
        let outcome = engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(1.0), 1200.0, 0.016);
        assert!(!outcome.changed);
        assert_eq!(outcome.columns, None);
    }

    #[test]
    fn test_profile_carve_erases_silhouette() {
        let mut stock = stock_500();
        let cfg = CutConfig {
            mirror_across_center: false,
            paint_whole_column: false,
            ..Default::default()
        };
        let mut engine = CuttingEngine::new(CutMode::ProfileCarve, cfg, no_helix());

        // A 10x10 world-unit tip biting the upper surface at x=0
        let tip = tip_box(0.0, 128.0, 5.0, 5.0);
        let outcome = engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(1.0), 1200.0, 0.016);
        assert!(outcome.changed);

        // Pixels inside the bite are gone, pixels outside survive
        assert!(!stock.sample_coverage(250, 255));
        assert!(stock.sample_coverage(250, 100));
        assert!(stock.sample_coverage(100, 255));
    }

    #[test]
    fn test_profile_carve_mirror() {
        let mut stock = stock_500();
        let cfg = CutConfig {
            mirror_across_center: true,
            paint_whole_column: false,
            ..Default::default()
        };
        let mut engine = CuttingEngine::new(CutMode::ProfileCarve, cfg, no_helix());

        let tip = tip_box(0.0, 120.0, 5.0, 5.0);
        engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(1.0), 1200.0, 0.016);

        // The mirrored counterpart below the axis is erased too
        let touched_row = 248; // row hit directly
        let mirror_row = 2 * 128 - touched_row;
        assert!(!stock.sample_coverage(250, touched_row));
        assert!(!stock.sample_coverage(250, mirror_row));
    }

    #[test]
    fn test_revolve_clips_to_min_radius() {
        let mut stock = stock_500();
        let mut engine =
            CuttingEngine::new(CutMode::LatheRevolve, CutConfig::default(), no_helix());

        // Tip plunged to 40 px above the axis across columns ~200..=300
        let tip = tip_box(0.0, 84.0, 50.0, 44.0);
        let outcome = engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(1.0), 1200.0, 0.016);
        assert!(outcome.changed);

        let (x0, x1) = outcome.columns.unwrap();
        for x in x0..=x1 {
            let r = stock.max_radius_px(x).unwrap();
            assert!(r <= 40 + 1, "column {} radius {} should be clipped", x, r);
        }
        // Outside the contact range the stock is untouched
        assert_eq!(stock.max_radius_px(10), Some(128));
    }

    #[test]
    fn test_revolve_cuts_both_sides_of_center() {
        let mut stock = stock_500();
        let mut engine =
            CuttingEngine::new(CutMode::LatheRevolve, CutConfig::default(), no_helix());

        // Tool engages only the top; rotational symmetry clips the bottom too
        let tip = tip_box(0.0, 100.0, 20.0, 20.0);
        engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(1.0), 1200.0, 0.016);

        let x = 250;
        let r = stock.max_radius_px(x).unwrap();
        assert!(!stock.sample_coverage(x, 255));
        assert!(!stock.sample_coverage(x, 0));
        assert!(r < 128);
    }

    #[test]
    fn test_helix_restricts_columns() {
        let mut stock = stock_500();
        let helix = HelixConfig {
            enabled: true,
            duty_cycle: 0.2,
            min_pitch_mm_per_rev: 0.001,
        };
        let cfg = CutConfig {
            mirror_across_center: false,
            paint_whole_column: false,
            ..Default::default()
        };
        let mut engine = CuttingEngine::new(CutMode::ProfileCarve, cfg, helix);

        // Wide shallow tip over the whole top surface; slow feed + fast
        // spindle gives a pitch of a few mm, so only some columns are cut.
        let tip = tip_box(0.0, 126.0, 250.0, 4.0);
        let outcome = engine.tick(
            &mut stock,
            &tip,
            FeedRate::from_mm_per_min(2400.0),
            600.0,
            0.016,
        );
        assert!(outcome.changed);

        let (x0, x1) = outcome.columns.unwrap();
        let cut_columns = (x0..=x1)
            .filter(|&x| !stock.sample_coverage(x, 255))
            .count();
        let total = x1 - x0 + 1;
        assert!(cut_columns > 0, "some columns must be cut");
        assert!(
            cut_columns < total,
            "helix mask must leave uncut ridges ({}/{})",
            cut_columns,
            total
        );
    }

    #[test]
    fn test_phase_advances_with_rpm() {
        let mut stock = stock_500();
        let mut engine =
            CuttingEngine::new(CutMode::LatheRevolve, CutConfig::default(), no_helix());
        let tip = tip_box(10_000.0, 0.0, 5.0, 5.0);

        // 600 rpm = 10 rev/s; 0.05 s = half a revolution
        engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(0.0), 600.0, 0.05);
        assert!((engine.spindle_phase() - 0.5).abs() < 1e-4);

        engine.tick(&mut stock, &tip, FeedRate::from_mm_per_sec(0.0), 600.0, 0.06);
        assert!((engine.spindle_phase() - 0.1).abs() < 1e-4);
    }
}
