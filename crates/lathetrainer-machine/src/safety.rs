//! Crash rule monitor
//!
//! Evaluates the safety rules every tick, ahead of the cutting engine.
//! First match wins and short-circuits the tick. Rule order:
//!
//! 1. tip or body volume touching a chuck hazard (always active)
//! 2. body/holder volume touching stock material
//! 3. any tool volume touching material while the spindle is stopped
//! 4. any tool volume touching material while rotating in reverse
//! 5. rapid-traverse tip contact lasting longer than the configured limit
//!
//! Rules 2-5 verify contact by sampling raster coverage under the overlap
//! region, not just bounding boxes, so contact with already-removed air
//! never trips them. Event emission is rate-limited by a simulation-time
//! cooldown; the trigger itself always halts the tick.

use tracing::warn;

use lathetrainer_core::SafetyConfig;
use lathetrainer_stocksim::{has_material_under, ContactVolume, RasterStock};

use crate::axis::FeedMode;
use crate::spindle::SpinDirection;

/// A fired crash rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashTrigger {
    /// Operator-facing diagnostic.
    pub message: String,
    /// Whether a `CrashEvent` should be emitted (false while the cooldown
    /// window from the previous crash is still open).
    pub emit: bool,
}

/// Everything the rules need to see for one tick.
#[derive(Debug)]
pub struct SafetyInputs<'a> {
    /// The clamped stock, when loaded.
    pub stock: Option<&'a RasterStock>,
    /// The tip volume at the current pose.
    pub tip: Option<&'a ContactVolume>,
    /// Body/holder volumes at the current pose.
    pub bodies: &'a [ContactVolume],
    /// Stationary chuck hazard volumes.
    pub hazards: &'a [ContactVolume],
    /// Spindle drive switched on.
    pub spindle_enabled: bool,
    /// Actual spindle speed.
    pub current_rpm: f32,
    /// Spindle direction.
    pub direction: SpinDirection,
    /// Current axis feed mode.
    pub feed_mode: FeedMode,
    /// Tick delta, simulation seconds.
    pub dt: f32,
    /// Simulation clock.
    pub now_s: f64,
}

/// Evaluates the crash rules and tracks their timers.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    cfg: SafetyConfig,
    rapid_contact_timer_s: f32,
    next_crash_time_s: f64,
}

impl SafetyMonitor {
    /// Create a monitor with the given tunables.
    pub fn new(cfg: SafetyConfig) -> Self {
        Self {
            cfg,
            rapid_contact_timer_s: 0.0,
            next_crash_time_s: 0.0,
        }
    }

    /// Clear accumulated contact timers (crash handling, new stock).
    pub fn reset_timers(&mut self) {
        self.rapid_contact_timer_s = 0.0;
    }

    /// Evaluate the rules in order; the first match wins.
    pub fn check(&mut self, inputs: &SafetyInputs<'_>) -> Option<CrashTrigger> {
        if let Some(message) = self.rule_tool_vs_chuck(inputs) {
            return Some(self.trigger(message, inputs.now_s));
        }
        if let Some(message) = self.rule_body_vs_stock(inputs) {
            return Some(self.trigger(message, inputs.now_s));
        }
        if self.cfg.enable_crash_checks {
            if let Some(message) = self.rule_no_rotation_touch(inputs) {
                return Some(self.trigger(message, inputs.now_s));
            }
            if let Some(message) = self.rule_wrong_direction_touch(inputs) {
                return Some(self.trigger(message, inputs.now_s));
            }
            if let Some(message) = self.rule_rapid_touch_too_long(inputs) {
                return Some(self.trigger(message, inputs.now_s));
            }
        }
        None
    }

    fn trigger(&mut self, message: String, now_s: f64) -> CrashTrigger {
        let emit = now_s >= self.next_crash_time_s;
        if emit {
            self.next_crash_time_s = now_s + self.cfg.crash_cooldown_s as f64;
            warn!(%message, "crash");
        }
        self.rapid_contact_timer_s = 0.0;
        CrashTrigger { message, emit }
    }

    fn touches_material(&self, volume: &ContactVolume, stock: &RasterStock) -> bool {
        has_material_under(
            volume,
            stock,
            self.cfg.crash_pixel_step,
            self.cfg.crash_alpha_threshold,
        )
    }

    fn any_tool_touches_material(&self, inputs: &SafetyInputs<'_>) -> bool {
        let stock = match inputs.stock {
            Some(s) => s,
            None => return false,
        };
        if let Some(tip) = inputs.tip {
            if self.touches_material(tip, stock) {
                return true;
            }
        }
        inputs.bodies.iter().any(|b| self.touches_material(b, stock))
    }

    fn rule_tool_vs_chuck(&self, inputs: &SafetyInputs<'_>) -> Option<String> {
        if !self.cfg.enable_chuck_checks || inputs.hazards.is_empty() {
            return None;
        }
        if let Some(tip) = inputs.tip {
            if inputs.hazards.iter().any(|hz| tip.overlaps(hz)) {
                return Some("Cutting insert collided with the chuck or jaws".to_string());
            }
        }
        for body in inputs.bodies {
            if inputs.hazards.iter().any(|hz| body.overlaps(hz)) {
                return Some("Tool holder collided with the chuck or jaws".to_string());
            }
        }
        None
    }

    fn rule_body_vs_stock(&self, inputs: &SafetyInputs<'_>) -> Option<String> {
        let stock = inputs.stock?;
        for body in inputs.bodies {
            if self.touches_material(body, stock) {
                return Some("Tool holder struck the workpiece".to_string());
            }
        }
        None
    }

    fn rule_no_rotation_touch(&self, inputs: &SafetyInputs<'_>) -> Option<String> {
        let rotating =
            inputs.spindle_enabled && inputs.current_rpm > self.cfg.rpm_zero_threshold;
        if rotating {
            return None;
        }
        if self.any_tool_touches_material(inputs) {
            return Some("Tool contact while the spindle is not rotating".to_string());
        }
        None
    }

    fn rule_wrong_direction_touch(&self, inputs: &SafetyInputs<'_>) -> Option<String> {
        if !self.cfg.enable_wrong_direction_check {
            return None;
        }
        let rotating =
            inputs.spindle_enabled && inputs.current_rpm > self.cfg.rpm_zero_threshold;
        if !rotating || inputs.direction != SpinDirection::Reverse {
            return None;
        }
        if self.any_tool_touches_material(inputs) {
            return Some(
                "Wrong spindle direction (Reverse); turning requires Forward".to_string(),
            );
        }
        None
    }

    fn rule_rapid_touch_too_long(&mut self, inputs: &SafetyInputs<'_>) -> Option<String> {
        if inputs.feed_mode != FeedMode::Rapid {
            self.rapid_contact_timer_s = 0.0;
            return None;
        }
        let touching = match (inputs.tip, inputs.stock) {
            (Some(tip), Some(stock)) => self.touches_material(tip, stock),
            _ => false,
        };
        if !touching {
            self.rapid_contact_timer_s = 0.0;
            return None;
        }

        self.rapid_contact_timer_s += inputs.dt;
        if self.rapid_contact_timer_s >= self.cfg.rapid_contact_limit_s {
            return Some("Rapid traverse drove the tool into the workpiece".to_string());
        }
        None
    }
}
