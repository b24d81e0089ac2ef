//! Spindle state and RPM ramping
//!
//! The spindle never jumps to a commanded speed: `current_rpm` approaches
//! the effective target by at most `rpm_acceleration * dt` per tick. A
//! disabled spindle ramps toward zero while remembering the commanded
//! value, so re-enabling resumes the previous setting.

use serde::{Deserialize, Serialize};

use lathetrainer_core::units::move_towards;

/// Spindle rotation direction.
///
/// `Forward` is the conventional turning direction; contacting the stock
/// in `Reverse` is a crash condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinDirection {
    /// Normal turning direction.
    Forward,
    /// Reverse rotation (unsafe for turning contact).
    Reverse,
}

impl Default for SpinDirection {
    fn default() -> Self {
        Self::Forward
    }
}

impl std::fmt::Display for SpinDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "Forward"),
            Self::Reverse => write!(f, "Reverse"),
        }
    }
}

/// Spindle drive state.
#[derive(Debug, Clone)]
pub struct Spindle {
    commanded_rpm: f32,
    current_rpm: f32,
    rpm_acceleration: f32,
    enabled: bool,
    direction: SpinDirection,
}

impl Spindle {
    /// Create a stopped spindle with the given acceleration.
    pub fn new(rpm_acceleration: f32) -> Self {
        Self {
            commanded_rpm: 0.0,
            current_rpm: 0.0,
            rpm_acceleration: rpm_acceleration.max(1e-3),
            enabled: false,
            direction: SpinDirection::Forward,
        }
    }

    /// The operator's commanded speed.
    pub fn commanded_rpm(&self) -> f32 {
        self.commanded_rpm
    }

    /// The actual (ramped) speed.
    pub fn current_rpm(&self) -> f32 {
        self.current_rpm
    }

    /// Whether the drive is switched on.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Current rotation direction.
    pub fn direction(&self) -> SpinDirection {
        self.direction
    }

    /// Command a new speed (negative input clamps to zero).
    pub fn set_commanded_rpm(&mut self, rpm: f32) {
        self.commanded_rpm = rpm.max(0.0);
    }

    /// Select the rotation direction.
    pub fn set_direction(&mut self, direction: SpinDirection) {
        self.direction = direction;
    }

    /// Switch the drive on. The chuck gates when this is legal.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Switch the drive off; RPM ramps down, the commanded value persists.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Advance the ramp by one tick.
    ///
    /// `force_zero` overrides the target during the clamp sequence, when
    /// rotation must not start regardless of the commanded value.
    pub fn update(&mut self, dt: f32, force_zero: bool) {
        let target = if self.enabled && !force_zero {
            self.commanded_rpm
        } else {
            0.0
        };
        self.current_rpm = move_towards(self.current_rpm, target, self.rpm_acceleration * dt);
    }

    /// Whether the spindle is effectively stopped.
    pub fn is_stopped(&self, threshold: f32) -> bool {
        self.current_rpm <= threshold
    }
}
