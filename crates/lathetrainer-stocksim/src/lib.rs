//! # LatheTrainer Stock Simulation
//!
//! Per-pixel raster model of the workpiece and the algorithms that erode it:
//!
//! - `RasterStock` - the material buffer with coverage queries and splitting
//! - geometry - world/raster mapping and contact volume containment tests
//! - `HelixMask` - per-column cut eligibility from the feed/RPM ratio
//! - `CuttingEngine` - profile-carve and lathe-revolve erosion
//! - `PartingDetector` - detection of complete material separation
//! - `StockSnapshot` - presentation adapter for the display collaborator
//!
//! The raster is pure data; nothing in this crate renders. Erosion is
//! monotonic: a cell that loses its material never regains it within one
//! stock's lifetime.

pub mod cutting;
pub mod geometry;
pub mod helix;
pub mod parting;
pub mod raster;
pub mod snapshot;

pub use cutting::{CutMode, CutOutcome, CuttingEngine};
pub use geometry::{
    bounding_raster_rect, column_to_world_x, has_material_under, row_to_world_y, world_x_to_column,
    world_y_to_row, ContactShape, ContactVolume, OrientedBox, Point2, Pose, RasterRect, WorldBounds,
};
pub use helix::HelixMask;
pub use parting::PartingDetector;
pub use raster::{RasterStock, StockSplit};
pub use snapshot::StockSnapshot;
