//! Per-pixel raster model of the workpiece
//!
//! One `RasterStock` owns the material buffer for one workpiece segment:
//! a row-major grid of `Rgba8` pixels whose alpha channel is the coverage
//! channel. Columns run along the stock axis, rows across the diameter,
//! with `center_row` marking the rotation axis.
//!
//! Material removal is monotonic and irreversible: `erase` is the only
//! coverage mutation, and nothing ever sets a cleared pixel solid again.
//! Painting helpers recolour pixels that still hold material but never
//! resurrect coverage.

use lathetrainer_core::{Calibration, CoreError, MaterialType, RasterConfig, Rgba8, WorkpieceParams};
use tracing::debug;

use crate::geometry::WorldBounds;

/// The raster material buffer for one workpiece segment.
#[derive(Debug, Clone)]
pub struct RasterStock {
    width_px: usize,
    height_px: usize,
    center_row: usize,
    pixels: Vec<Rgba8>,
    calibration: Calibration,
    world_bounds: WorldBounds,
    material: MaterialType,
    cfg: RasterConfig,
    dirty: bool,
}

/// Result of splitting a stock at a parting column.
#[derive(Debug, Clone)]
pub struct StockSplit {
    /// The fragment that remains clamped in the chuck.
    pub left: RasterStock,
    /// The severed fragment, re-indexed to start at its first material
    /// column; `None` when no material remains right of the cut.
    pub right: Option<RasterStock>,
}

impl RasterStock {
    /// Build a fully covered stock from nominal workpiece parameters.
    ///
    /// The raster resolution comes from `cfg.pixels_per_mm`; calibration is
    /// recomputed from the world bounds and nominal dimensions.
    pub fn from_params(
        params: &WorkpieceParams,
        world_bounds: WorldBounds,
        cfg: RasterConfig,
    ) -> Result<Self, CoreError> {
        if params.length_mm <= 0.01 || params.diameter_mm <= 0.01 {
            return Err(CoreError::InvalidWorkpiece {
                diameter_mm: params.diameter_mm,
                length_mm: params.length_mm,
            });
        }
        let width_px = (params.length_mm * cfg.pixels_per_mm).round() as usize;
        let height_px = (params.diameter_mm * cfg.pixels_per_mm).round() as usize;
        Self::new_covered(width_px, height_px, world_bounds, params.material, cfg)
    }

    /// Build a fully covered stock with explicit raster dimensions.
    pub fn new_covered(
        width_px: usize,
        height_px: usize,
        world_bounds: WorldBounds,
        material: MaterialType,
        cfg: RasterConfig,
    ) -> Result<Self, CoreError> {
        if width_px <= 4 || height_px <= 4 {
            return Err(CoreError::RasterTooSmall {
                width_px,
                height_px,
            });
        }
        let base = material.record().base_color;
        let calibration = Calibration::from_nominal(
            world_bounds.width(),
            world_bounds.height(),
            width_px as f32 / cfg.pixels_per_mm,
            height_px as f32 / cfg.pixels_per_mm,
        )
        .unwrap_or_default();

        debug!(
            width_px,
            height_px,
            material = %material,
            "raster stock created"
        );

        Ok(Self {
            width_px,
            height_px,
            center_row: height_px / 2,
            pixels: vec![base; width_px * height_px],
            calibration,
            world_bounds,
            material,
            cfg,
            dirty: true,
        })
    }

    /// Raster width in pixels (columns along the stock axis).
    pub fn width_px(&self) -> usize {
        self.width_px
    }

    /// Raster height in pixels (rows across the diameter).
    pub fn height_px(&self) -> usize {
        self.height_px
    }

    /// Row index of the rotation axis.
    pub fn center_row(&self) -> usize {
        self.center_row
    }

    /// World-space extents of the raster.
    pub fn world_bounds(&self) -> &WorldBounds {
        &self.world_bounds
    }

    /// Per-axis mm calibration.
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// The stock material.
    pub fn material(&self) -> MaterialType {
        self.material
    }

    /// Raster tunables this stock was built with.
    pub fn config(&self) -> RasterConfig {
        self.cfg
    }

    /// The raw pixel buffer, row-major.
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width_px + x
    }

    fn clamp_x(&self, x: usize) -> usize {
        x.min(self.width_px - 1)
    }

    fn clamp_y(&self, y: usize) -> usize {
        y.min(self.height_px - 1)
    }

    /// Alpha at a pixel; out-of-range coordinates clamp to the nearest cell.
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        self.pixels[self.index(self.clamp_x(x), self.clamp_y(y))].a
    }

    /// True when the pixel holds material. Out-of-range coordinates clamp.
    pub fn sample_coverage(&self, x: usize, y: usize) -> bool {
        self.alpha_at(x, y) > self.cfg.material_alpha_threshold
    }

    /// Remove material at a pixel. No-op if already absent.
    pub fn erase(&mut self, x: usize, y: usize) -> bool {
        let idx = self.index(self.clamp_x(x), self.clamp_y(y));
        if self.pixels[idx].a == 0 {
            return false;
        }
        self.pixels[idx].a = 0;
        self.dirty = true;
        true
    }

    /// Clip a column to a maximum radius from the center row, erasing every
    /// cell beyond it on both sides. Returns whether anything changed.
    pub fn clip_column_to_radius(&mut self, x: usize, radius_px: usize) -> bool {
        let x = self.clamp_x(x);
        let top = self.center_row + radius_px;
        let bot = self.center_row.saturating_sub(radius_px);

        let mut changed = false;
        for y in (top + 1)..self.height_px {
            changed |= self.erase(x, y);
        }
        for y in 0..bot {
            changed |= self.erase(x, y);
        }
        changed
    }

    /// True when no pixel in the column exceeds the empty-column threshold.
    pub fn is_column_empty(&self, x: usize) -> bool {
        let x = self.clamp_x(x);
        (0..self.height_px).all(|y| self.pixels[self.index(x, y)].a <= self.cfg.empty_column_alpha_threshold)
    }

    /// True when the column holds any material at all.
    pub fn has_material_in_column(&self, x: usize) -> bool {
        !self.is_column_empty(x)
    }

    fn center_band(&self, span_fraction: f32) -> (usize, usize) {
        let span = (self.height_px as f32 * span_fraction).round() as usize;
        let y_min = self.center_row.saturating_sub(span);
        let y_max = (self.center_row + span).min(self.height_px - 1);
        (y_min, y_max)
    }

    /// True when no covered cell remains in the band around the center row.
    pub fn is_column_empty_near_center(&self, x: usize, span_fraction: f32) -> bool {
        let x = self.clamp_x(x);
        let (y_min, y_max) = self.center_band(span_fraction);
        (y_min..=y_max)
            .all(|y| self.pixels[self.index(x, y)].a <= self.cfg.empty_column_alpha_threshold)
    }

    /// True when the center band holds at most `max_solid` covered cells.
    ///
    /// The tolerance absorbs raster quantization noise: a column with one or
    /// two stray solid pixels still counts as cut through.
    pub fn is_column_cut_near_center(
        &self,
        x: usize,
        span_fraction: f32,
        max_solid: usize,
    ) -> bool {
        let x = self.clamp_x(x);
        let (y_min, y_max) = self.center_band(span_fraction);
        let mut solid = 0usize;
        for y in y_min..=y_max {
            if self.pixels[self.index(x, y)].a > self.cfg.empty_column_alpha_threshold {
                solid += 1;
                if solid > max_solid {
                    return false;
                }
            }
        }
        true
    }

    /// Leftmost and rightmost columns containing material, or `None` when
    /// the buffer is fully empty.
    pub fn material_span(&self) -> Option<(usize, usize)> {
        let first = (0..self.width_px).find(|&x| !self.is_column_empty(x))?;
        let last = (0..self.width_px).rev().find(|&x| !self.is_column_empty(x))?;
        Some((first, last))
    }

    /// Largest covered distance from the center row in a column, in pixels.
    pub fn max_radius_px(&self, x: usize) -> Option<usize> {
        let x = self.clamp_x(x);
        let mut max_r = None;
        for y in 0..self.height_px {
            if self.pixels[self.index(x, y)].a > self.cfg.material_alpha_threshold {
                let r = y.abs_diff(self.center_row);
                max_r = Some(max_r.map_or(r, |m: usize| m.max(r)));
            }
        }
        max_r
    }

    /// Recolour every material pixel in a column.
    pub fn paint_whole_column(&mut self, x: usize, color: Rgba8) {
        let x = self.clamp_x(x);
        for y in 0..self.height_px {
            let idx = self.index(x, y);
            if self.pixels[idx].a == 0 {
                continue;
            }
            self.pixels[idx] = color;
        }
        self.dirty = true;
    }

    /// Paint the freshly machined band at a new surface edge.
    ///
    /// `y_edge` is the surface row; `dir_to_inside` is +1 or -1 toward the
    /// material. The first interior pixel optionally gets an alpha bump for
    /// a softened visual edge (cosmetic only).
    pub fn paint_machined_band(
        &mut self,
        x: usize,
        y_edge: isize,
        dir_to_inside: isize,
        color: Rgba8,
        thickness: usize,
        soften_alpha_add: Option<u8>,
    ) {
        let x = self.clamp_x(x);
        for t in 0..thickness {
            let y = y_edge + dir_to_inside * t as isize;
            if y < 0 || y >= self.height_px as isize {
                break;
            }
            let idx = self.index(x, y as usize);
            if self.pixels[idx].a == 0 {
                continue;
            }
            self.pixels[idx] = color;
        }

        if let Some(add) = soften_alpha_add {
            let y = y_edge + dir_to_inside;
            if y >= 0 && y < self.height_px as isize {
                let idx = self.index(x, y as usize);
                if self.pixels[idx].a != 0 {
                    self.pixels[idx].a = self.pixels[idx].a.saturating_add(add);
                }
            }
        }
        self.dirty = true;
    }

    /// Tint the outermost material rows of every column with the edge
    /// colour, marking the as-delivered skin of the bar.
    pub fn paint_initial_outline(&mut self, color: Rgba8, thickness: usize) {
        for x in 0..self.width_px {
            let mut top = None;
            for y in (0..self.height_px).rev() {
                if self.pixels[self.index(x, y)].a > self.cfg.empty_column_alpha_threshold {
                    top = Some(y);
                    break;
                }
            }
            let mut bot = None;
            for y in 0..self.height_px {
                if self.pixels[self.index(x, y)].a > self.cfg.empty_column_alpha_threshold {
                    bot = Some(y);
                    break;
                }
            }
            let (top, bot) = match (top, bot) {
                (Some(t), Some(b)) => (t, b),
                _ => continue,
            };

            self.paint_machined_band(x, top as isize, -1, color, thickness, None);
            self.paint_machined_band(x, bot as isize, 1, color, thickness, None);
        }
    }

    /// Split the stock at a parting column.
    ///
    /// The left fragment keeps columns `[0, cut_column)`; the right fragment
    /// re-indexes from the first non-empty column at or after
    /// `cut_column + 1`, so the cut column itself is consumed. Called
    /// exactly once per parting event.
    pub fn split(&self, cut_column: usize) -> StockSplit {
        let cut = cut_column.clamp(1, self.width_px - 2);

        let left = self.extract_columns(0, cut);

        let mut src_x0 = cut + 1;
        while src_x0 < self.width_px && !self.has_material_in_column(src_x0) {
            src_x0 += 1;
        }
        let right_width = self.width_px - src_x0;
        let right = if src_x0 >= self.width_px || right_width <= 2 {
            None
        } else {
            Some(self.extract_columns(src_x0, right_width))
        };

        debug!(
            cut_column = cut,
            left_width = left.width_px,
            right_width = right.as_ref().map(|r| r.width_px).unwrap_or(0),
            "stock split"
        );

        StockSplit { left, right }
    }

    fn extract_columns(&self, x_start: usize, width: usize) -> RasterStock {
        let mut pixels = Vec::with_capacity(width * self.height_px);
        for y in 0..self.height_px {
            let row = y * self.width_px;
            for x in 0..width {
                pixels.push(self.pixels[row + x_start + x]);
            }
        }

        let px_w = self.world_bounds.width() / self.width_px as f32;
        let world_bounds = WorldBounds::new(
            self.world_bounds.min_x + x_start as f32 * px_w,
            self.world_bounds.min_y,
            self.world_bounds.min_x + (x_start + width) as f32 * px_w,
            self.world_bounds.max_y,
        );

        RasterStock {
            width_px: width,
            height_px: self.height_px,
            center_row: self.center_row,
            pixels,
            calibration: self.calibration,
            world_bounds,
            material: self.material,
            cfg: self.cfg,
            dirty: true,
        }
    }

    /// Count of covered cells (material threshold), for conservation checks.
    pub fn covered_cell_count(&self) -> usize {
        self.pixels
            .iter()
            .filter(|p| p.a > self.cfg.material_alpha_threshold)
            .count()
    }

    /// Take and clear the dirty flag; the display collaborator polls this.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(width: usize, height: usize) -> RasterStock {
        RasterStock::new_covered(
            width,
            height,
            WorldBounds::new(0.0, 0.0, width as f32, height as f32),
            MaterialType::Steel,
            RasterConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_creation_fully_covered() {
        let s = stock(100, 40);
        assert_eq!(s.width_px(), 100);
        assert_eq!(s.height_px(), 40);
        assert_eq!(s.center_row(), 20);
        assert!(s.sample_coverage(0, 0));
        assert!(s.sample_coverage(99, 39));
        assert_eq!(s.covered_cell_count(), 4000);
    }

    #[test]
    fn test_creation_rejects_degenerate() {
        let r = RasterStock::new_covered(
            3,
            40,
            WorldBounds::new(0.0, 0.0, 1.0, 1.0),
            MaterialType::Steel,
            RasterConfig::default(),
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_sample_coverage_clamps() {
        let s = stock(100, 40);
        // Far out of range clamps to the nearest valid cell, no panic
        assert!(s.sample_coverage(10_000, 10_000));
    }

    #[test]
    fn test_erase_is_monotonic() {
        let mut s = stock(100, 40);
        assert!(s.erase(10, 10));
        assert!(!s.sample_coverage(10, 10));
        // Erasing again is a no-op
        assert!(!s.erase(10, 10));
        assert!(!s.sample_coverage(10, 10));
    }

    #[test]
    fn test_dirty_flag() {
        let mut s = stock(100, 40);
        assert!(s.take_dirty());
        assert!(!s.take_dirty());
        s.erase(5, 5);
        assert!(s.take_dirty());
    }

    #[test]
    fn test_column_scans() {
        let mut s = stock(100, 40);
        assert!(!s.is_column_empty(50));
        assert!(!s.is_column_empty_near_center(50, 0.4));

        for y in 0..40 {
            s.erase(50, y);
        }
        assert!(s.is_column_empty(50));
        assert!(s.is_column_empty_near_center(50, 0.4));
        assert!(s.is_column_cut_near_center(50, 0.4, 0));
    }

    #[test]
    fn test_cut_near_center_tolerates_residual_pixels() {
        let mut s = stock(100, 40);
        for y in 0..40 {
            if y != 20 && y != 21 {
                s.erase(50, y);
            }
        }
        // Two stray pixels remain in the band
        assert!(!s.is_column_cut_near_center(50, 0.4, 1));
        assert!(s.is_column_cut_near_center(50, 0.4, 2));
    }

    #[test]
    fn test_material_span() {
        let mut s = stock(100, 40);
        assert_eq!(s.material_span(), Some((0, 99)));

        for y in 0..40 {
            s.erase(0, y);
            s.erase(1, y);
            s.erase(99, y);
        }
        assert_eq!(s.material_span(), Some((2, 98)));
    }

    #[test]
    fn test_material_span_empty() {
        let mut s = stock(10, 10);
        for x in 0..10 {
            for y in 0..10 {
                s.erase(x, y);
            }
        }
        assert_eq!(s.material_span(), None);
    }

    #[test]
    fn test_clip_column_to_radius() {
        let mut s = stock(100, 40);
        assert!(s.clip_column_to_radius(30, 5));
        assert_eq!(s.max_radius_px(30), Some(5));
        // Neighbouring column untouched
        assert_eq!(s.max_radius_px(31), Some(20));
        // Clipping to the same radius again changes nothing
        assert!(!s.clip_column_to_radius(30, 5));
    }

    #[test]
    fn test_split_conservation() {
        let mut s = stock(500, 64);
        // Cut through column 250 completely
        for y in 0..64 {
            s.erase(250, y);
        }
        let split = s.split(250);
        let right = split.right.expect("right fragment should exist");

        assert_eq!(split.left.width_px() + right.width_px(), 499);
        assert_eq!(
            split.left.covered_cell_count() + right.covered_cell_count(),
            s.covered_cell_count()
        );
    }

    #[test]
    fn test_split_skips_empty_leading_columns() {
        let mut s = stock(500, 64);
        // A wide parting groove: columns 248..=254 fully cut
        for x in 248..=254 {
            for y in 0..64 {
                s.erase(x, y);
            }
        }
        let split = s.split(250);
        let right = split.right.expect("right fragment should exist");

        // Right fragment starts at the first material column (255)
        assert_eq!(right.width_px(), 500 - 255);
        assert!(right.sample_coverage(0, 32));
    }

    #[test]
    fn test_split_no_material_right() {
        let mut s = stock(100, 40);
        for x in 50..100 {
            for y in 0..40 {
                s.erase(x, y);
            }
        }
        let split = s.split(50);
        assert!(split.right.is_none());
        assert_eq!(split.left.width_px(), 50);
    }

    #[test]
    fn test_split_fragment_world_bounds() {
        let s = stock(100, 40);
        let split = s.split(50);
        let left = &split.left;
        assert!((left.world_bounds().min_x - 0.0).abs() < 1e-4);
        assert!((left.world_bounds().max_x - 50.0).abs() < 1e-4);
        let right = split.right.unwrap();
        assert!((right.world_bounds().min_x - 51.0).abs() < 1e-4);
        assert!((right.world_bounds().max_x - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_paint_does_not_resurrect_coverage() {
        let mut s = stock(100, 40);
        for y in 0..40 {
            s.erase(60, y);
        }
        s.paint_whole_column(60, Rgba8::opaque(200, 200, 200));
        s.paint_machined_band(60, 20, 1, Rgba8::opaque(200, 200, 200), 2, Some(40));
        assert!(s.is_column_empty(60));
    }

    #[test]
    fn test_initial_outline_paints_skin() {
        let mut s = stock(100, 40);
        let edge = Rgba8::opaque(1, 2, 3);
        s.paint_initial_outline(edge, 2);
        let top_px = s.pixels()[39 * 100 + 10];
        assert_eq!((top_px.r, top_px.g, top_px.b), (1, 2, 3));
        // Still covered: outline is a recolour, not removal
        assert!(s.sample_coverage(10, 39));
    }
}
