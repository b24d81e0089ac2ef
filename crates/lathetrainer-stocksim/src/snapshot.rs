//! Presentation adapter for the raster stock
//!
//! The raster is pure data; the display collaborator consumes snapshots.
//! A snapshot carries the pixel buffer plus the calibration factors the
//! renderer needs to scale it, and converts to a standard `image` buffer
//! on demand.

use image::{Rgba, RgbaImage};
use lathetrainer_core::{Calibration, Rgba8};
use serde::{Deserialize, Serialize};

use crate::geometry::WorldBounds;
use crate::raster::RasterStock;

/// A full pixel-buffer snapshot of one stock, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// Raster width in pixels.
    pub width_px: usize,
    /// Raster height in pixels.
    pub height_px: usize,
    /// Row index of the rotation axis.
    pub center_row: usize,
    /// Per-axis mm calibration for on-screen scaling.
    pub calibration: Calibration,
    /// World-space placement of the raster.
    pub world_bounds: WorldBounds,
    /// Row-major pixel data.
    pub pixels: Vec<Rgba8>,
}

impl StockSnapshot {
    /// Capture the current state of a stock.
    pub fn capture(stock: &RasterStock) -> Self {
        Self {
            width_px: stock.width_px(),
            height_px: stock.height_px(),
            center_row: stock.center_row(),
            calibration: stock.calibration(),
            world_bounds: *stock.world_bounds(),
            pixels: stock.pixels().to_vec(),
        }
    }

    /// Convert to an `image` RGBA buffer.
    ///
    /// Raster row 0 is the bottom of the stock; image row 0 is the top, so
    /// rows are flipped during conversion.
    pub fn to_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width_px as u32, self.height_px as u32);
        for y in 0..self.height_px {
            let src_row = y * self.width_px;
            let img_y = (self.height_px - 1 - y) as u32;
            for x in 0..self.width_px {
                let p = self.pixels[src_row + x];
                img.put_pixel(x as u32, img_y, Rgba([p.r, p.g, p.b, p.a]));
            }
        }
        img
    }
}
