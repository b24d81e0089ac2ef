//! Parting-off detection
//!
//! Scans recently modified raster columns for complete separation of the
//! stock. The scan is restricted to the strict interior of the material
//! span, so transient holes at the stock ends cannot fake a parting event,
//! and it is cooldown-gated because it runs after every cutting tick.
//!
//! Once a stock has parted, the detector latches: no further cutting or
//! parting checks run against it until new stock is loaded.

use lathetrainer_core::PartingConfig;
use tracing::{debug, trace};

use crate::raster::RasterStock;

/// Detects full material separation in a column range.
#[derive(Debug, Clone)]
pub struct PartingDetector {
    cfg: PartingConfig,
    next_check_time_s: f64,
    parted: bool,
}

impl PartingDetector {
    /// Create a detector with the given tunables.
    pub fn new(cfg: PartingConfig) -> Self {
        Self {
            cfg,
            next_check_time_s: 0.0,
            parted: false,
        }
    }

    /// Whether the current stock has already been parted off.
    pub fn is_parted(&self) -> bool {
        self.parted
    }

    /// Latch the parted state (set by the orchestrator after a split).
    pub fn mark_parted(&mut self) {
        self.parted = true;
    }

    /// Reset for freshly loaded stock.
    pub fn reset(&mut self) {
        self.parted = false;
        self.next_check_time_s = 0.0;
    }

    /// Check columns `[x0, x1]` for a through cut.
    ///
    /// `tool_column` is the tool tip's current axial raster column; when a
    /// cut-through column is found, the separation plane is taken from the
    /// tool position rather than the detected column, which avoids
    /// off-by-noise artifacts at the groove edges. Returns the column to
    /// split at, or `None`.
    pub fn check(
        &mut self,
        stock: &RasterStock,
        x0: usize,
        x1: usize,
        tool_column: usize,
        now_s: f64,
    ) -> Option<usize> {
        if !self.cfg.enabled || self.parted {
            return None;
        }
        if now_s < self.next_check_time_s {
            return None;
        }
        self.next_check_time_s = now_s + self.cfg.check_cooldown_s as f64;

        let width = stock.width_px();
        let mut x0 = x0.clamp(1, width - 2);
        let mut x1 = x1.clamp(1, width - 2);
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
        }

        let (first_mat, last_mat) = stock.material_span()?;
        let from = x0.max(first_mat + 1);
        let to = x1.min(last_mat.saturating_sub(1));
        if from > to {
            return None;
        }

        // The probe region must have stock on both sides, otherwise the
        // operator is just shortening the bar, not parting it.
        let mid = (from + to) / 2;
        if !self.has_material_left_of(stock, mid) || !self.has_material_right_of(stock, mid) {
            return None;
        }

        for cx in from..=to {
            if !stock.is_column_cut_near_center(
                cx,
                self.cfg.center_span_fraction,
                self.cfg.max_solid_pixels_near_center,
            ) {
                continue;
            }

            let cut_column = tool_column.clamp(1, width - 2);
            debug!(detected = cx, cut_column, "parting detected");
            return Some(cut_column);
        }

        trace!(from, to, "parting check: no separation");
        None
    }

    fn has_material_left_of(&self, stock: &RasterStock, x: usize) -> bool {
        (0..x).any(|c| !stock.is_column_empty_near_center(c, self.cfg.center_span_fraction))
    }

    fn has_material_right_of(&self, stock: &RasterStock, x: usize) -> bool {
        ((x + 1)..stock.width_px())
            .any(|c| !stock.is_column_empty_near_center(c, self.cfg.center_span_fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WorldBounds;
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

    fn cut_through(stock: &mut RasterStock, x: usize) {
        for y in 0..stock.height_px() {
            stock.erase(x, y);
        }
    }

    #[test]
    fn test_detects_through_cut() {
        let mut stock = stock_500();
        cut_through(&mut stock, 250);

        let mut detector = PartingDetector::new(PartingConfig::default());
        let cut = detector.check(&stock, 246, 254, 250, 1.0);
        assert_eq!(cut, Some(250));
    }

    #[test]
    fn test_cut_column_comes_from_tool_position() {
        let mut stock = stock_500();
        cut_through(&mut stock, 250);

        let mut detector = PartingDetector::new(PartingConfig::default());
        // The groove is at 250 but the tool sits at 252
        let cut = detector.check(&stock, 246, 254, 252, 1.0);
        assert_eq!(cut, Some(252));
    }

    #[test]
    fn test_no_detection_without_material_both_sides() {
        let mut stock = stock_500();
        // Clear everything right of 250: a shortening cut, not a parting cut
        for x in 250..500 {
            cut_through(&mut stock, x);
        }

        let mut detector = PartingDetector::new(PartingConfig::default());
        assert_eq!(detector.check(&stock, 246, 260, 250, 1.0), None);
    }

    #[test]
    fn test_intact_stock_no_detection() {
        let stock = stock_500();
        let mut detector = PartingDetector::new(PartingConfig::default());
        assert_eq!(detector.check(&stock, 100, 400, 250, 1.0), None);
    }

    #[test]
    fn test_cooldown_gates_rechecks() {
        let mut stock = stock_500();
        cut_through(&mut stock, 250);

        let mut detector = PartingDetector::new(PartingConfig::default());
        assert!(detector.check(&stock, 246, 254, 250, 1.0).is_some());
        // Within the cooldown window nothing is re-reported
        assert_eq!(detector.check(&stock, 246, 254, 250, 1.01), None);
        // After the window it would fire again (the orchestrator latches
        // parted state before that can happen)
        assert!(detector.check(&stock, 246, 254, 250, 1.2).is_some());
    }

    #[test]
    fn test_parted_latch() {
        let mut stock = stock_500();
        cut_through(&mut stock, 250);

        let mut detector = PartingDetector::new(PartingConfig::default());
        detector.mark_parted();
        assert!(detector.is_parted());
        assert_eq!(detector.check(&stock, 246, 254, 250, 10.0), None);

        detector.reset();
        assert!(!detector.is_parted());
        assert!(detector.check(&stock, 246, 254, 250, 20.0).is_some());
    }

    #[test]
    fn test_residual_pixels_still_count_as_cut() {
        let mut stock = stock_500();
        // Leave two stray pixels in the groove
        for y in 0..stock.height_px() {
            if y != 128 && y != 129 {
                stock.erase(250, y);
            }
        }

        let mut detector = PartingDetector::new(PartingConfig::default());
        assert_eq!(detector.check(&stock, 246, 254, 250, 1.0), Some(250));
    }

    #[test]
    fn test_disabled_detector() {
        let mut stock = stock_500();
        cut_through(&mut stock, 250);

        let mut detector = PartingDetector::new(PartingConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(detector.check(&stock, 246, 254, 250, 1.0), None);
    }
}
