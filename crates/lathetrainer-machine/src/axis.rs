//! Axis motion: cross slide (X, radial) and carriage (Z, axial)
//!
//! Feed modes: `Jog` derives speed from feed-per-revolution times spindle
//! RPM; `Rapid` uses a fixed traverse rate. Move modes: `Continuous`
//! (held direction) and `Increment` (fixed step per press).
//!
//! The go-home sequence is an explicit two-stage state machine advanced
//! one step per tick: X travels first, then Z. Starting a new sequence or
//! move supersedes whatever occupied the axes before, and jog input is
//! rejected while homing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use lathetrainer_core::units::move_towards;
use lathetrainer_core::{AxisConfig, FeedRate};

/// Feed rate source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedMode {
    /// Controlled feed: mm/rev scaled by spindle RPM.
    Jog,
    /// Rapid traverse at a fixed mm/min rate.
    Rapid,
}

/// How jog input moves the axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveMode {
    /// Move while the direction is held.
    Continuous,
    /// Move a fixed step per command.
    Increment,
}

#[derive(Debug, Clone, Copy)]
struct ContinuousMove {
    dir_x: f32,
    dir_z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HomeStage {
    AxisX,
    AxisZ,
}

/// Tool position and motion state for both axes.
#[derive(Debug, Clone)]
pub struct AxisMotion {
    cfg: AxisConfig,
    x_mm: f32,
    z_mm: f32,
    feed_mode: FeedMode,
    move_mode: MoveMode,
    increment_step_mm: f32,
    jog_feed_mm_per_rev: f32,
    rapid_mm_per_min: f32,
    active_move: Option<ContinuousMove>,
    homing: Option<HomeStage>,
    input_enabled: bool,
}

impl AxisMotion {
    /// Create axes parked at the home position.
    pub fn new(cfg: AxisConfig) -> Self {
        Self {
            x_mm: cfg.home_x_mm,
            z_mm: cfg.home_z_mm,
            feed_mode: FeedMode::Rapid,
            move_mode: MoveMode::Continuous,
            increment_step_mm: cfg.increment_step_mm,
            jog_feed_mm_per_rev: cfg.jog_feed_mm_per_rev,
            rapid_mm_per_min: cfg.rapid_mm_per_min,
            active_move: None,
            homing: None,
            input_enabled: true,
            cfg,
        }
    }

    /// Cross slide position, millimeters.
    pub fn x_mm(&self) -> f32 {
        self.x_mm
    }

    /// Carriage position, millimeters.
    pub fn z_mm(&self) -> f32 {
        self.z_mm
    }

    /// Current feed mode.
    pub fn feed_mode(&self) -> FeedMode {
        self.feed_mode
    }

    /// Current move mode.
    pub fn move_mode(&self) -> MoveMode {
        self.move_mode
    }

    /// Current increment step.
    pub fn increment_step_mm(&self) -> f32 {
        self.increment_step_mm
    }

    /// Whether a go-home sequence is in flight.
    pub fn is_homing(&self) -> bool {
        self.homing.is_some()
    }

    /// Whether both axes rest at the home position.
    pub fn is_at_home(&self, eps_mm: f32) -> bool {
        (self.x_mm - self.cfg.home_x_mm).abs() <= eps_mm
            && (self.z_mm - self.cfg.home_z_mm).abs() <= eps_mm
    }

    /// Enable or disable operator jog input (parting post-flow disables it).
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        if !enabled {
            self.active_move = None;
        }
    }

    /// Select controlled feed and continuous movement.
    pub fn set_jog_mode(&mut self) {
        self.feed_mode = FeedMode::Jog;
        self.move_mode = MoveMode::Continuous;
    }

    /// Select rapid traverse and continuous movement.
    pub fn set_rapid_mode(&mut self) {
        self.feed_mode = FeedMode::Rapid;
        self.move_mode = MoveMode::Continuous;
    }

    /// Select increment movement with the given step.
    pub fn set_increment_step(&mut self, step_mm: f32) {
        self.increment_step_mm = step_mm.max(1e-4);
        self.move_mode = MoveMode::Increment;
    }

    /// Set the controlled feed per revolution.
    pub fn set_jog_feed_mm_per_rev(&mut self, feed: f32) {
        self.jog_feed_mm_per_rev = feed.max(0.0);
    }

    /// Set the rapid traverse rate.
    pub fn set_rapid_mm_per_min(&mut self, rate: f32) {
        self.rapid_mm_per_min = rate.max(0.0);
    }

    /// The axial feed rate implied by the current mode and spindle speed.
    pub fn current_feed(&self, rpm: f32) -> FeedRate {
        match self.feed_mode {
            FeedMode::Jog => FeedRate::from_mm_per_rev(self.jog_feed_mm_per_rev, rpm),
            FeedMode::Rapid => FeedRate::from_mm_per_min(self.rapid_mm_per_min),
        }
    }

    /// Whether the axes can move at all right now.
    pub fn can_move(&self, rpm: f32) -> bool {
        !self.current_feed(rpm).is_zero()
    }

    /// Begin (or re-aim) a continuous move. Ignored while homing, while
    /// input is disabled, or when the effective speed is zero.
    pub fn start_move(&mut self, dir_x: f32, dir_z: f32, rpm: f32) {
        if self.homing.is_some() || !self.input_enabled {
            return;
        }
        if !self.can_move(rpm) {
            self.active_move = None;
            return;
        }
        self.active_move = Some(ContinuousMove { dir_x, dir_z });
    }

    /// Stop any continuous move.
    pub fn stop_move(&mut self) {
        self.active_move = None;
    }

    /// Apply one increment step. Ignored while homing or input-disabled.
    pub fn step_move(&mut self, dir_x: f32, dir_z: f32, rpm: f32) {
        if self.homing.is_some() || !self.input_enabled {
            return;
        }
        if !self.can_move(rpm) {
            return;
        }
        self.x_mm += dir_x * self.increment_step_mm;
        self.z_mm += dir_z * self.increment_step_mm;
    }

    /// Start the go-home sequence, superseding any active move.
    pub fn go_home(&mut self) {
        self.active_move = None;
        self.set_rapid_mode();
        self.homing = Some(HomeStage::AxisX);
        debug!(x = self.x_mm, z = self.z_mm, "go-home started");
    }

    /// Cancel a go-home sequence in flight.
    pub fn cancel_homing(&mut self) {
        self.homing = None;
    }

    /// Crash handling: snap the cross slide away from the work.
    pub fn retract_x(&mut self, retract_mm: f32) {
        self.x_mm -= retract_mm;
        self.active_move = None;
    }

    /// Advance motion by one tick. Returns true when a go-home sequence
    /// completed this tick.
    pub fn update(&mut self, dt: f32, rpm: f32) -> bool {
        if let Some(stage) = self.homing {
            let speed = FeedRate::from_mm_per_min(self.rapid_mm_per_min).mm_per_sec();
            if speed <= 1e-4 {
                self.homing = None;
                return false;
            }
            match stage {
                HomeStage::AxisX => {
                    self.x_mm = move_towards(self.x_mm, self.cfg.home_x_mm, speed * dt);
                    if (self.x_mm - self.cfg.home_x_mm).abs() <= self.cfg.pos_eps_mm {
                        self.homing = Some(HomeStage::AxisZ);
                    }
                }
                HomeStage::AxisZ => {
                    self.z_mm = move_towards(self.z_mm, self.cfg.home_z_mm, speed * dt);
                    if (self.z_mm - self.cfg.home_z_mm).abs() <= self.cfg.pos_eps_mm {
                        self.homing = None;
                        debug!("go-home complete");
                        return true;
                    }
                }
            }
            return false;
        }

        if let Some(mv) = self.active_move {
            let speed = self.current_feed(rpm).mm_per_sec();
            if speed <= 1e-4 {
                self.active_move = None;
            } else {
                self.x_mm += mv.dir_x * speed * dt;
                self.z_mm += mv.dir_z * speed * dt;
            }
        }
        false
    }
}
