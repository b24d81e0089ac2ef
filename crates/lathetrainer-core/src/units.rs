//! Unit conversion and calibration utilities
//!
//! The raster measures the workpiece in pixels; the machine moves in
//! millimeters. `Calibration` maps between the two with independent factors
//! per axis (axial length vs. radial diameter), recomputed whenever nominal
//! stock dimensions are applied.

use serde::{Deserialize, Serialize};

/// Per-axis raster calibration.
///
/// `units_per_mm_x` converts axial millimeters to world units along the
/// stock length; `units_per_mm_y` converts radial millimeters across the
/// diameter. The two are independent because stock length and diameter are
/// scaled separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// World units per millimeter along the stock axis (length).
    pub units_per_mm_x: f32,
    /// World units per millimeter across the stock (diameter).
    pub units_per_mm_y: f32,
}

impl Calibration {
    /// Compute calibration from world-space extents and nominal dimensions.
    ///
    /// Returns `None` when either nominal dimension is too small to divide
    /// by; callers keep their previous calibration in that case.
    pub fn from_nominal(
        world_width: f32,
        world_height: f32,
        length_mm: f32,
        diameter_mm: f32,
    ) -> Option<Self> {
        if length_mm <= 0.01 || diameter_mm <= 0.01 {
            return None;
        }
        Some(Self {
            units_per_mm_x: world_width / length_mm,
            units_per_mm_y: world_height / diameter_mm,
        })
    }

    /// Convert an axial world-space distance to millimeters.
    pub fn world_x_to_mm(&self, world_dx: f32) -> f32 {
        world_dx / self.units_per_mm_x.max(1e-6)
    }

    /// Convert axial millimeters to a world-space distance.
    pub fn mm_to_world_x(&self, mm: f32) -> f32 {
        mm * self.units_per_mm_x
    }

    /// Convert a radial world-space distance to millimeters.
    pub fn world_y_to_mm(&self, world_dy: f32) -> f32 {
        world_dy / self.units_per_mm_y.max(1e-6)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            units_per_mm_x: 0.018,
            units_per_mm_y: 0.018,
        }
    }
}

/// Axial feed rate, stored canonically in mm/sec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedRate(f32);

impl FeedRate {
    /// Create a feed rate from mm/sec.
    pub fn from_mm_per_sec(v: f32) -> Self {
        Self(v.max(0.0))
    }

    /// Create a feed rate from mm/min.
    pub fn from_mm_per_min(v: f32) -> Self {
        Self(v.max(0.0) / 60.0)
    }

    /// Create a feed rate from mm/rev at a given spindle speed.
    ///
    /// Zero RPM or zero feed-per-rev yields a zero rate.
    pub fn from_mm_per_rev(mm_per_rev: f32, rpm: f32) -> Self {
        if mm_per_rev <= 0.0 || rpm <= 0.0 {
            Self(0.0)
        } else {
            Self(mm_per_rev * rpm / 60.0)
        }
    }

    /// Feed rate in mm/sec.
    pub fn mm_per_sec(&self) -> f32 {
        self.0
    }

    /// Feed rate in mm/min.
    pub fn mm_per_min(&self) -> f32 {
        self.0 * 60.0
    }

    /// True when the rate is effectively zero.
    pub fn is_zero(&self) -> bool {
        self.0 <= 1e-4
    }
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
///
/// The simulation's only ramp primitive: spindle RPM, jaw offsets and axis
/// homing all advance through it, which is what bounds per-tick change.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_from_nominal() {
        let cal = Calibration::from_nominal(2.7, 1.8, 150.0, 100.0).unwrap();
        assert!((cal.units_per_mm_x - 0.018).abs() < 1e-6);
        assert!((cal.units_per_mm_y - 0.018).abs() < 1e-6);
    }

    #[test]
    fn test_calibration_rejects_degenerate_nominal() {
        assert!(Calibration::from_nominal(1.0, 1.0, 0.0, 100.0).is_none());
        assert!(Calibration::from_nominal(1.0, 1.0, 150.0, 0.005).is_none());
    }

    #[test]
    fn test_calibration_round_trip() {
        let cal = Calibration::from_nominal(2.7, 1.8, 150.0, 100.0).unwrap();
        let mm = cal.world_x_to_mm(cal.mm_to_world_x(42.0));
        assert!((mm - 42.0).abs() < 1e-4);
    }

    #[test]
    fn test_feed_rate_conversions() {
        assert!((FeedRate::from_mm_per_min(600.0).mm_per_sec() - 10.0).abs() < 1e-6);
        assert!((FeedRate::from_mm_per_sec(2.0).mm_per_min() - 120.0).abs() < 1e-6);

        // 0.2 mm/rev at 1200 rpm = 240 mm/min = 4 mm/s
        let f = FeedRate::from_mm_per_rev(0.2, 1200.0);
        assert!((f.mm_per_sec() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_feed_rate_zero_rpm() {
        assert!(FeedRate::from_mm_per_rev(0.2, 0.0).is_zero());
        assert!(FeedRate::from_mm_per_rev(0.0, 1200.0).is_zero());
    }

    #[test]
    fn test_move_towards() {
        assert_eq!(move_towards(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_towards(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_towards(10.0, 0.0, 4.0), 6.0);
        assert_eq!(move_towards(5.0, 5.0, 1.0), 5.0);
    }
}
