//! Geometric containment and raster mapping
//!
//! Pure functions and value types converting tool contact volumes into
//! raster-space coverage tests. World coordinates map into raster index
//! space with independent scale factors per axis, so non-uniform scaling
//! between stock length and diameter is respected.

use serde::{Deserialize, Serialize};

use crate::raster::RasterStock;

/// A 2D point / vector in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// X coordinate (stock axis direction).
    pub x: f32,
    /// Y coordinate (radial direction).
    pub y: f32,
}

impl Point2 {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Dot product.
    pub fn dot(self, other: Point2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Component-wise subtraction.
    pub fn sub(self, other: Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise addition.
    pub fn add(self, other: Point2) -> Point2 {
        Point2::new(self.x + other.x, self.y + other.y)
    }

    /// Rotate by an angle in radians around the origin.
    pub fn rotated(self, angle_rad: f32) -> Point2 {
        let (s, c) = angle_rad.sin_cos();
        Point2::new(c * self.x - s * self.y, s * self.x + c * self.y)
    }
}

/// World-space pose of the tool carrier: position plus rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// World position of the tool origin.
    pub position: Point2,
    /// Rotation about the tool origin, radians.
    pub rotation_rad: f32,
}

impl Pose {
    /// Create a pose with no rotation.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            rotation_rad: 0.0,
        }
    }
}

/// Axis-aligned world-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Minimum X.
    pub min_x: f32,
    /// Minimum Y.
    pub min_y: f32,
    /// Maximum X.
    pub max_x: f32,
    /// Maximum Y.
    pub max_y: f32,
}

impl WorldBounds {
    /// Create bounds from min/max corners.
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create bounds from a center point and full size.
    pub fn from_center_size(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: cx - width / 2.0,
            min_y: cy - height / 2.0,
            max_x: cx + width / 2.0,
            max_y: cy + height / 2.0,
        }
    }

    /// Width of the bounds.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height of the bounds.
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// X center.
    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Y center.
    pub fn center_y(&self) -> f32 {
        (self.min_y + self.max_y) / 2.0
    }

    /// Whether two bounds overlap (closed intervals).
    pub fn intersects(&self, other: &WorldBounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Intersection of two bounds, `None` when disjoint or degenerate.
    pub fn intersection(&self, other: &WorldBounds) -> Option<WorldBounds> {
        let min_x = self.min_x.max(other.min_x);
        let max_x = self.max_x.min(other.max_x);
        let min_y = self.min_y.max(other.min_y);
        let max_y = self.max_y.min(other.max_y);
        if min_x >= max_x || min_y >= max_y {
            return None;
        }
        Some(WorldBounds::new(min_x, min_y, max_x, max_y))
    }
}

/// An oriented box in world space, stored as a local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// World center.
    pub center: Point2,
    /// Unit local X axis.
    pub axis_x: Point2,
    /// Unit local Y axis.
    pub axis_y: Point2,
    /// Half extent along the local X axis.
    pub half_x: f32,
    /// Half extent along the local Y axis.
    pub half_y: f32,
}

impl OrientedBox {
    /// Build a world-space box from a center, half extents, and rotation.
    pub fn new(center: Point2, half_extents: Point2, rotation_rad: f32) -> Self {
        Self {
            center,
            axis_x: Point2::new(1.0, 0.0).rotated(rotation_rad),
            axis_y: Point2::new(0.0, 1.0).rotated(rotation_rad),
            half_x: half_extents.x.abs(),
            half_y: half_extents.y.abs(),
        }
    }

    /// Oriented-box containment: project onto the local axes and compare
    /// against the half extents.
    pub fn contains(&self, p: Point2) -> bool {
        let d = p.sub(self.center);
        d.dot(self.axis_x).abs() <= self.half_x && d.dot(self.axis_y).abs() <= self.half_y
    }

    /// The four world-space corners.
    pub fn corners(&self) -> [Point2; 4] {
        let ex = Point2::new(self.axis_x.x * self.half_x, self.axis_x.y * self.half_x);
        let ey = Point2::new(self.axis_y.x * self.half_y, self.axis_y.y * self.half_y);
        [
            self.center.add(ex).add(ey),
            self.center.add(ex).sub(ey),
            self.center.sub(ex).sub(ey),
            self.center.sub(ex).add(ey),
        ]
    }

    /// Axis-aligned bounds enclosing the box.
    pub fn aabb(&self) -> WorldBounds {
        let corners = self.corners();
        let mut b = WorldBounds::new(corners[0].x, corners[0].y, corners[0].x, corners[0].y);
        for c in &corners[1..] {
            b.min_x = b.min_x.min(c.x);
            b.max_x = b.max_x.max(c.x);
            b.min_y = b.min_y.min(c.y);
            b.max_y = b.max_y.max(c.y);
        }
        b
    }
}

/// Tool-local contact shape, instantiated into world space by a [`Pose`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContactShape {
    /// Rectangular volume offset from the tool origin.
    Box {
        /// Center offset from the tool origin, tool-local.
        offset: Point2,
        /// Half extents along the shape's own axes.
        half_extents: Point2,
        /// Shape rotation relative to the tool, radians.
        rotation_rad: f32,
    },
    /// Arbitrary polygon, tool-local vertices in order.
    Polygon(Vec<Point2>),
}

impl ContactShape {
    /// Axis-aligned rectangular shape centered on an offset.
    pub fn rect(offset: Point2, half_extents: Point2) -> Self {
        Self::Box {
            offset,
            half_extents,
            rotation_rad: 0.0,
        }
    }

    /// Instantiate this shape at a world pose.
    pub fn at_pose(&self, pose: &Pose) -> ContactVolume {
        match self {
            ContactShape::Box {
                offset,
                half_extents,
                rotation_rad,
            } => {
                let center = pose.position.add(offset.rotated(pose.rotation_rad));
                ContactVolume::Box(OrientedBox::new(
                    center,
                    *half_extents,
                    pose.rotation_rad + rotation_rad,
                ))
            }
            ContactShape::Polygon(points) => ContactVolume::Polygon(
                points
                    .iter()
                    .map(|p| pose.position.add(p.rotated(pose.rotation_rad)))
                    .collect(),
            ),
        }
    }
}

/// A world-space contact volume ready for containment tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactVolume {
    /// Oriented box.
    Box(OrientedBox),
    /// Polygon with world-space vertices.
    Polygon(Vec<Point2>),
}

impl ContactVolume {
    /// Whether a world point lies inside the volume.
    pub fn contains_point(&self, p: Point2) -> bool {
        match self {
            ContactVolume::Box(obb) => obb.contains(p),
            ContactVolume::Polygon(points) => polygon_contains(points, p),
        }
    }

    /// Axis-aligned bounds of the volume.
    pub fn aabb(&self) -> WorldBounds {
        match self {
            ContactVolume::Box(obb) => obb.aabb(),
            ContactVolume::Polygon(points) => {
                let first = points.first().copied().unwrap_or_default();
                let mut b = WorldBounds::new(first.x, first.y, first.x, first.y);
                for p in points.iter().skip(1) {
                    b.min_x = b.min_x.min(p.x);
                    b.max_x = b.max_x.max(p.x);
                    b.min_y = b.min_y.min(p.y);
                    b.max_y = b.max_y.max(p.y);
                }
                b
            }
        }
    }

    /// Whether two volumes overlap.
    ///
    /// Box/box uses a separating-axis test. When a polygon participates the
    /// test falls back to mutual vertex containment, which is sufficient at
    /// the contact scales the safety rules operate on.
    pub fn overlaps(&self, other: &ContactVolume) -> bool {
        if !self.aabb().intersects(&other.aabb()) {
            return false;
        }
        match (self, other) {
            (ContactVolume::Box(a), ContactVolume::Box(b)) => obb_overlap(a, b),
            _ => {
                self.vertices().iter().any(|v| other.contains_point(*v))
                    || other.vertices().iter().any(|v| self.contains_point(*v))
            }
        }
    }

    fn vertices(&self) -> Vec<Point2> {
        match self {
            ContactVolume::Box(obb) => obb.corners().to_vec(),
            ContactVolume::Polygon(points) => points.clone(),
        }
    }
}

/// Even-odd ray cast point-in-polygon test.
fn polygon_contains(points: &[Point2], p: Point2) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Separating-axis overlap test for two oriented boxes.
fn obb_overlap(a: &OrientedBox, b: &OrientedBox) -> bool {
    let axes = [a.axis_x, a.axis_y, b.axis_x, b.axis_y];
    let ca = a.corners();
    let cb = b.corners();
    for axis in axes {
        let (mut min_a, mut max_a) = (f32::INFINITY, f32::NEG_INFINITY);
        for c in ca {
            let d = c.dot(axis);
            min_a = min_a.min(d);
            max_a = max_a.max(d);
        }
        let (mut min_b, mut max_b) = (f32::INFINITY, f32::NEG_INFINITY);
        for c in cb {
            let d = c.dot(axis);
            min_b = min_b.min(d);
            max_b = max_b.max(d);
        }
        if max_a < min_b || max_b < min_a {
            return false;
        }
    }
    true
}

/// Pixel rectangle in raster index space, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterRect {
    /// First column.
    pub x0: usize,
    /// Last column.
    pub x1: usize,
    /// First row.
    pub y0: usize,
    /// Last row.
    pub y1: usize,
}

/// Map a world X coordinate to a raster column, clamped into range.
pub fn world_x_to_column(world_x: f32, bounds: &WorldBounds, width_px: usize) -> usize {
    let span = bounds.width().max(1e-6);
    let nx = ((world_x - bounds.min_x) / span).clamp(0.0, 1.0);
    ((nx * (width_px - 1) as f32).round() as usize).min(width_px - 1)
}

/// Map a world Y coordinate to a raster row, clamped into range.
pub fn world_y_to_row(world_y: f32, bounds: &WorldBounds, height_px: usize) -> usize {
    let span = bounds.height().max(1e-6);
    let ny = ((world_y - bounds.min_y) / span).clamp(0.0, 1.0);
    ((ny * (height_px - 1) as f32).round() as usize).min(height_px - 1)
}

/// Map a raster column to the world X coordinate of its center.
pub fn column_to_world_x(column: usize, bounds: &WorldBounds, width_px: usize) -> f32 {
    let nx = column as f32 / (width_px.saturating_sub(1).max(1)) as f32;
    bounds.min_x + nx * bounds.width()
}

/// Map a raster row to the world Y coordinate of its center.
pub fn row_to_world_y(row: usize, bounds: &WorldBounds, height_px: usize) -> f32 {
    let ny = row as f32 / (height_px.saturating_sub(1).max(1)) as f32;
    bounds.min_y + ny * bounds.height()
}

/// Pixel rectangle bounding a contact volume, clamped to stock extents.
///
/// Bounds the inner per-pixel scans so erosion is O(contact area), not
/// O(raster area). Returns `None` when the volume misses the stock.
pub fn bounding_raster_rect(
    volume: &ContactVolume,
    stock_bounds: &WorldBounds,
    width_px: usize,
    height_px: usize,
) -> Option<RasterRect> {
    let overlap = volume.aabb().intersection(stock_bounds)?;

    let mut x0 = world_x_to_column(overlap.min_x, stock_bounds, width_px);
    let mut x1 = world_x_to_column(overlap.max_x, stock_bounds, width_px);
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
    }
    let mut y0 = world_y_to_row(overlap.min_y, stock_bounds, height_px);
    let mut y1 = world_y_to_row(overlap.max_y, stock_bounds, height_px);
    if y0 > y1 {
        std::mem::swap(&mut y0, &mut y1);
    }
    Some(RasterRect { x0, x1, y0, y1 })
}

/// Whether a contact volume actually covers material, by strided sampling
/// of raster pixels inside the overlap region.
///
/// Bounding-box overlap alone reports contact with already-removed areas;
/// the safety rules need contact with pixels that still hold material.
pub fn has_material_under(
    volume: &ContactVolume,
    stock: &RasterStock,
    pixel_step: usize,
    alpha_threshold: u8,
) -> bool {
    let bounds = *stock.world_bounds();
    let rect = match bounding_raster_rect(volume, &bounds, stock.width_px(), stock.height_px()) {
        Some(r) => r,
        None => return false,
    };

    let step = pixel_step.clamp(1, 8);
    let mut y = rect.y0;
    while y <= rect.y1 {
        let wy = row_to_world_y(y, &bounds, stock.height_px());
        let mut x = rect.x0;
        while x <= rect.x1 {
            if stock.alpha_at(x, y) > alpha_threshold {
                let wx = column_to_world_x(x, &bounds, stock.width_px());
                if volume.contains_point(Point2::new(wx, wy)) {
                    return true;
                }
            }
            x += step;
        }
        y += step;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obb_containment() {
        let obb = OrientedBox::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0), 0.0);
        assert!(obb.contains(Point2::new(1.9, 0.9)));
        assert!(!obb.contains(Point2::new(2.1, 0.0)));
        assert!(!obb.contains(Point2::new(0.0, 1.1)));
    }

    #[test]
    fn test_obb_containment_rotated() {
        // Rotated 90 degrees: half extents swap roles
        let obb = OrientedBox::new(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 1.0),
            std::f32::consts::FRAC_PI_2,
        );
        assert!(obb.contains(Point2::new(0.9, 1.9)));
        assert!(!obb.contains(Point2::new(1.9, 0.9)));
    }

    #[test]
    fn test_polygon_containment() {
        let triangle = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ];
        let vol = ContactVolume::Polygon(triangle);
        assert!(vol.contains_point(Point2::new(1.0, 1.0)));
        assert!(!vol.contains_point(Point2::new(3.0, 3.0)));
    }

    #[test]
    fn test_obb_overlap() {
        let a = ContactVolume::Box(OrientedBox::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            0.0,
        ));
        let b = ContactVolume::Box(OrientedBox::new(
            Point2::new(1.5, 0.0),
            Point2::new(1.0, 1.0),
            0.0,
        ));
        let c = ContactVolume::Box(OrientedBox::new(
            Point2::new(5.0, 0.0),
            Point2::new(1.0, 1.0),
            0.0,
        ));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_obb_overlap_rotated_gap() {
        // Diamond next to a box: AABBs overlap, SAT separates them
        let a = ContactVolume::Box(OrientedBox::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            0.0,
        ));
        let b = ContactVolume::Box(OrientedBox::new(
            Point2::new(2.6, 2.6),
            Point2::new(1.0, 1.0),
            std::f32::consts::FRAC_PI_4,
        ));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_world_raster_mapping_clamps() {
        let bounds = WorldBounds::new(0.0, 0.0, 10.0, 4.0);
        assert_eq!(world_x_to_column(-5.0, &bounds, 100), 0);
        assert_eq!(world_x_to_column(50.0, &bounds, 100), 99);
        assert_eq!(world_x_to_column(5.0, &bounds, 101), 50);
        assert_eq!(world_y_to_row(2.0, &bounds, 41), 20);
    }

    #[test]
    fn test_mapping_round_trip() {
        let bounds = WorldBounds::new(-1.0, -2.0, 3.0, 2.0);
        for column in [0usize, 17, 63, 99] {
            let wx = column_to_world_x(column, &bounds, 100);
            assert_eq!(world_x_to_column(wx, &bounds, 100), column);
        }
    }

    #[test]
    fn test_bounding_raster_rect_miss() {
        let stock = WorldBounds::new(0.0, 0.0, 10.0, 4.0);
        let vol = ContactVolume::Box(OrientedBox::new(
            Point2::new(50.0, 50.0),
            Point2::new(1.0, 1.0),
            0.0,
        ));
        assert!(bounding_raster_rect(&vol, &stock, 100, 40).is_none());
    }

    #[test]
    fn test_shape_at_pose() {
        let shape = ContactShape::rect(Point2::new(1.0, 0.0), Point2::new(0.5, 0.5));
        let vol = shape.at_pose(&Pose::at(10.0, 5.0));
        assert!(vol.contains_point(Point2::new(11.0, 5.0)));
        assert!(!vol.contains_point(Point2::new(10.0, 5.0)));

        // Rotating the pose by 90 degrees moves the offset onto +Y
        let rotated = shape.at_pose(&Pose {
            position: Point2::new(10.0, 5.0),
            rotation_rad: std::f32::consts::FRAC_PI_2,
        });
        assert!(rotated.contains_point(Point2::new(10.0, 6.0)));
    }
}
