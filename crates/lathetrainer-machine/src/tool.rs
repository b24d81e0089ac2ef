//! Tool and hazard registry
//!
//! The tool subsystem registers its contact volumes here at setup time and
//! the core reads them each tick; nothing scans a scene graph. Two roles
//! are kept strictly apart:
//!
//! - the cutting tip: the only geometry that legally removes material
//! - body/holder volumes: never allowed to touch material or the chuck
//!
//! Tip and body shapes are tool-local and get instantiated at the tool
//! pose per tick; chuck hazard volumes are stationary world-space geometry.

use lathetrainer_stocksim::{ContactShape, ContactVolume, Pose};

/// Registered contact geometry for the active tool and the chuck hazards.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tip: Option<ContactShape>,
    bodies: Vec<ContactShape>,
    hazards: Vec<ContactVolume>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the cutting tip shape, replacing any previous tip.
    pub fn register_tip(&mut self, shape: ContactShape) {
        self.tip = Some(shape);
    }

    /// Register a body/holder shape.
    pub fn register_body(&mut self, shape: ContactShape) {
        self.bodies.push(shape);
    }

    /// Register a stationary chuck hazard volume (chuck body, jaws).
    pub fn register_hazard(&mut self, volume: ContactVolume) {
        self.hazards.push(volume);
    }

    /// Remove the active tool's tip and body shapes (tool change).
    pub fn clear_tool(&mut self) {
        self.tip = None;
        self.bodies.clear();
    }

    /// Whether a tip has been registered.
    pub fn has_tip(&self) -> bool {
        self.tip.is_some()
    }

    /// The tip volume at the given tool pose.
    pub fn tip_at(&self, pose: &Pose) -> Option<ContactVolume> {
        self.tip.as_ref().map(|shape| shape.at_pose(pose))
    }

    /// All body volumes at the given tool pose.
    pub fn bodies_at(&self, pose: &Pose) -> Vec<ContactVolume> {
        self.bodies.iter().map(|shape| shape.at_pose(pose)).collect()
    }

    /// The stationary hazard volumes.
    pub fn hazards(&self) -> &[ContactVolume] {
        &self.hazards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lathetrainer_stocksim::Point2;

    #[test]
    fn test_registry_roles() {
        let mut reg = ToolRegistry::new();
        assert!(!reg.has_tip());

        reg.register_tip(ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)));
        reg.register_body(ContactShape::rect(Point2::new(0.0, 5.0), Point2::new(3.0, 2.0)));
        reg.register_body(ContactShape::rect(Point2::new(0.0, 9.0), Point2::new(4.0, 2.0)));

        assert!(reg.has_tip());
        let pose = Pose::at(10.0, 0.0);
        assert!(reg.tip_at(&pose).is_some());
        assert_eq!(reg.bodies_at(&pose).len(), 2);

        reg.clear_tool();
        assert!(!reg.has_tip());
        assert!(reg.bodies_at(&pose).is_empty());
    }

    #[test]
    fn test_volumes_track_pose() {
        let mut reg = ToolRegistry::new();
        reg.register_tip(ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)));

        let near = reg.tip_at(&Pose::at(0.0, 0.0)).unwrap();
        let far = reg.tip_at(&Pose::at(100.0, 0.0)).unwrap();
        assert!(near.contains_point(Point2::new(0.5, 0.5)));
        assert!(!far.contains_point(Point2::new(0.5, 0.5)));
        assert!(far.contains_point(Point2::new(100.5, 0.5)));
    }
}
