//! Chuck clamping state machine
//!
//! Governs whether the stock is held and spinning, and therefore whether
//! cutting is legal. The chuck owns the spindle: RPM ramping advances here
//! once per tick regardless of cutting activity, and the clamp sequence
//! forces the ramp target to zero until the jaws are closed.
//!
//! The clamp sequence is a restartable multi-tick procedure: it holds its
//! own elapsed-time field and advances one step per `update` call. Loading
//! a new workpiece supersedes and restarts it.

use tracing::debug;

use lathetrainer_core::ChuckConfig;

use crate::spindle::{SpinDirection, Spindle};

/// Chuck states. Cutting is legal only in `Clamped` and `Spinning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChuckState {
    /// No workpiece selected; jaws idle.
    IdleNoWorkpiece,
    /// Workpiece selected, jaws open (momentary: clamping auto-starts).
    IdleOpened,
    /// Jaws closing on the stock; spindle held at zero.
    Clamping,
    /// Stock held, spindle at rest or spinning up.
    Clamped,
    /// Stock held and rotating above the spin-on threshold.
    Spinning,
}

impl std::fmt::Display for ChuckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdleNoWorkpiece => write!(f, "IdleNoWorkpiece"),
            Self::IdleOpened => write!(f, "IdleOpened"),
            Self::Clamping => write!(f, "Clamping"),
            Self::Clamped => write!(f, "Clamped"),
            Self::Spinning => write!(f, "Spinning"),
        }
    }
}

/// The chuck state machine, owning the spindle.
#[derive(Debug, Clone)]
pub struct Chuck {
    state: ChuckState,
    spindle: Spindle,
    cfg: ChuckConfig,
    open_jaw_offset_mm: f32,
    clamped_jaw_offset_mm: f32,
    jaw_offset_mm: f32,
    clamp_elapsed_s: f32,
}

impl Chuck {
    /// Create an empty chuck.
    pub fn new(cfg: ChuckConfig) -> Self {
        Self {
            state: ChuckState::IdleNoWorkpiece,
            spindle: Spindle::new(cfg.rpm_acceleration),
            cfg,
            open_jaw_offset_mm: 0.0,
            clamped_jaw_offset_mm: 0.0,
            jaw_offset_mm: 0.0,
            clamp_elapsed_s: 0.0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ChuckState {
        self.state
    }

    /// Read access to the spindle.
    pub fn spindle(&self) -> &Spindle {
        &self.spindle
    }

    /// The actual (ramped) spindle speed.
    pub fn current_rpm(&self) -> f32 {
        self.spindle.current_rpm()
    }

    /// Jaw offset from the axis, for the display collaborator.
    pub fn jaw_offset_mm(&self) -> f32 {
        self.jaw_offset_mm
    }

    /// Whether the stock is held (cutting precondition).
    pub fn is_clamped(&self) -> bool {
        matches!(self.state, ChuckState::Clamped | ChuckState::Spinning)
    }

    /// Select a workpiece: compute jaw offsets from its geometry and
    /// auto-start the clamp sequence. Supersedes any sequence in flight.
    pub fn select_workpiece(&mut self, diameter_mm: f32, clearance_mm: f32) {
        let radius = diameter_mm.max(0.0) / 2.0;
        self.clamped_jaw_offset_mm = radius;
        self.open_jaw_offset_mm = radius + clearance_mm.max(0.0);
        self.jaw_offset_mm = self.open_jaw_offset_mm;

        self.spindle.disable();
        self.spindle.set_commanded_rpm(0.0);

        // IdleOpened is momentary: selection flows straight into Clamping.
        self.transition(ChuckState::IdleOpened);
        self.clamp_elapsed_s = 0.0;
        self.transition(ChuckState::Clamping);
    }

    /// Start the spindle. Fails unless the stock is clamped.
    pub fn try_start_spindle(&mut self) -> bool {
        if !self.is_clamped() {
            debug!(state = %self.state, "spindle start rejected");
            return false;
        }
        self.spindle.enable();
        true
    }

    /// Stop the spindle; always legal. RPM ramps down.
    pub fn stop_spindle(&mut self) {
        self.spindle.disable();
    }

    /// Command a spindle speed.
    pub fn set_commanded_rpm(&mut self, rpm: f32) {
        self.spindle.set_commanded_rpm(rpm);
    }

    /// Select the spindle direction.
    pub fn set_direction(&mut self, direction: SpinDirection) {
        self.spindle.set_direction(direction);
    }

    /// Advance the state machine and the RPM ramp by one tick.
    pub fn update(&mut self, dt: f32) {
        match self.state {
            ChuckState::IdleNoWorkpiece | ChuckState::IdleOpened => {
                self.spindle.update(dt, true);
            }
            ChuckState::Clamping => {
                self.spindle.update(dt, true);
                self.clamp_elapsed_s += dt;
                let t = (self.clamp_elapsed_s / self.cfg.clamp_duration_s.max(1e-3)).clamp(0.0, 1.0);
                self.jaw_offset_mm =
                    self.open_jaw_offset_mm + (self.clamped_jaw_offset_mm - self.open_jaw_offset_mm) * t;
                if t >= 1.0 {
                    self.transition(ChuckState::Clamped);
                }
            }
            ChuckState::Clamped => {
                self.spindle.update(dt, false);
                if self.spindle.current_rpm() > self.cfg.spin_on_rpm {
                    self.transition(ChuckState::Spinning);
                }
            }
            ChuckState::Spinning => {
                self.spindle.update(dt, false);
                if self.spindle.current_rpm() < self.cfg.spin_off_rpm {
                    self.transition(ChuckState::Clamped);
                }
            }
        }
    }

    fn transition(&mut self, to: ChuckState) {
        if self.state != to {
            debug!(from = %self.state, to = %to, "chuck state");
            self.state = to;
        }
    }
}
