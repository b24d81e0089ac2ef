//! Simulation configuration
//!
//! Every empirically tuned constant of the simulation lives here rather
//! than inline in the algorithms: alpha thresholds for "is this pixel
//! material", crash cooldowns, clamp timing, helix duty cycle, retract
//! distance. Defaults reproduce the tuned values of the shipping trainer.
//!
//! The aggregate `SimConfig` round-trips through JSON so a deployment can
//! override individual tunables without recompiling.

use crate::data::Rgba8;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raster construction tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Raster resolution in pixels per millimeter.
    pub pixels_per_mm: f32,
    /// Alpha above which a pixel counts as solid material.
    pub material_alpha_threshold: u8,
    /// Alpha at or below which a pixel counts as empty when scanning columns.
    pub empty_column_alpha_threshold: u8,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pixels_per_mm: 3.0,
            material_alpha_threshold: 10,
            empty_column_alpha_threshold: 2,
        }
    }
}

/// Cutting engine tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CutConfig {
    /// Minimum spindle speed at which the tool removes material.
    pub min_rpm_to_cut: f32,
    /// Mirror profile carves across the rotation axis.
    pub mirror_across_center: bool,
    /// Paint the whole touched column during profile carves.
    pub paint_whole_column: bool,
    /// Thickness of the freshly machined edge band, in pixels.
    pub edge_thickness_px: usize,
    /// Soften the machined edge with an alpha ramp.
    pub soften_edge: bool,
    /// Alpha added to the first interior pixel when softening.
    pub soften_alpha_add: u8,
    /// Margin of columns around a cut handed to the parting detector.
    pub parting_check_margin: usize,
    /// Colour of the freshly machined edge band.
    pub machined_edge_color: Rgba8,
    /// Colour painted over whole columns touched by a profile carve.
    pub machined_column_color: Rgba8,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            min_rpm_to_cut: 5.0,
            mirror_across_center: true,
            paint_whole_column: true,
            edge_thickness_px: 2,
            soften_edge: true,
            soften_alpha_add: 40,
            parting_check_margin: 4,
            machined_edge_color: Rgba8::opaque(191, 191, 191),
            machined_column_color: Rgba8::opaque(166, 166, 166),
        }
    }
}

/// Helix / threading effect tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HelixConfig {
    /// Whether the helix mask restricts cutting at all.
    pub enabled: bool,
    /// Fraction of one revolution during which a column is engaged.
    pub duty_cycle: f32,
    /// Lower bound for the computed pitch, mm per revolution.
    pub min_pitch_mm_per_rev: f32,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duty_cycle: 0.2,
            min_pitch_mm_per_rev: 0.001,
        }
    }
}

/// Safety monitor tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Master switch for the spindle-state crash rules.
    pub enable_crash_checks: bool,
    /// Master switch for chuck/jaw contact rules.
    pub enable_chuck_checks: bool,
    /// Master switch for the wrong-direction rule.
    pub enable_wrong_direction_check: bool,
    /// RPM at or below which the spindle counts as stopped.
    pub rpm_zero_threshold: f32,
    /// Longest tolerated rapid-traverse contact, in simulation seconds.
    pub rapid_contact_limit_s: f32,
    /// Radial retract distance applied on crash, millimeters.
    pub retract_mm: f32,
    /// Minimum spacing between emitted crash events, simulation seconds.
    pub crash_cooldown_s: f32,
    /// Stride used when sampling raster pixels under a contact volume.
    pub crash_pixel_step: usize,
    /// Alpha above which a sampled pixel counts as material for crash rules.
    pub crash_alpha_threshold: u8,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            enable_crash_checks: true,
            enable_chuck_checks: true,
            enable_wrong_direction_check: true,
            rpm_zero_threshold: 0.1,
            rapid_contact_limit_s: 0.07,
            retract_mm: 50.0,
            crash_cooldown_s: 0.35,
            crash_pixel_step: 2,
            crash_alpha_threshold: 5,
        }
    }
}

/// Parting-off detection tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartingConfig {
    /// Whether parting detection runs at all.
    pub enabled: bool,
    /// Minimum spacing between detection sweeps, simulation seconds.
    pub check_cooldown_s: f32,
    /// Vertical band around the center row checked for separation, as a
    /// fraction of raster height.
    pub center_span_fraction: f32,
    /// Residual solid pixels tolerated in a "cut through" column.
    pub max_solid_pixels_near_center: usize,
}

impl Default for PartingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_cooldown_s: 0.08,
            center_span_fraction: 0.40,
            max_solid_pixels_near_center: 2,
        }
    }
}

/// Chuck and spindle tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChuckConfig {
    /// Spindle acceleration, RPM per second.
    pub rpm_acceleration: f32,
    /// Clamp sequence duration, simulation seconds.
    pub clamp_duration_s: f32,
    /// Jaw clearance beyond stock radius when opened, millimeters.
    pub open_clearance_mm: f32,
    /// RPM above which the chuck reports `Spinning`.
    pub spin_on_rpm: f32,
    /// RPM below which `Spinning` falls back to `Clamped`.
    pub spin_off_rpm: f32,
}

impl Default for ChuckConfig {
    fn default() -> Self {
        Self {
            rpm_acceleration: 400.0,
            clamp_duration_s: 1.0,
            open_clearance_mm: 8.0,
            spin_on_rpm: 3.0,
            spin_off_rpm: 1.0,
        }
    }
}

/// Axis motion tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Home position of the cross slide (X, radial), millimeters.
    pub home_x_mm: f32,
    /// Home position of the carriage (Z, axial), millimeters.
    pub home_z_mm: f32,
    /// Position tolerance for "arrived", millimeters.
    pub pos_eps_mm: f32,
    /// Rapid traverse rate, mm per minute.
    pub rapid_mm_per_min: f32,
    /// Default controlled feed, mm per spindle revolution.
    pub jog_feed_mm_per_rev: f32,
    /// Default increment step, millimeters.
    pub increment_step_mm: f32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            home_x_mm: -390.79,
            home_z_mm: 281.99,
            pos_eps_mm: 0.2,
            rapid_mm_per_min: 2000.0,
            jog_feed_mm_per_rev: 0.2,
            increment_step_mm: 1.0,
        }
    }
}

/// Aggregate simulation configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Raster construction tunables.
    pub raster: RasterConfig,
    /// Cutting engine tunables.
    pub cut: CutConfig,
    /// Helix / threading tunables.
    pub helix: HelixConfig,
    /// Safety monitor tunables.
    pub safety: SafetyConfig,
    /// Parting detection tunables.
    pub parting: PartingConfig,
    /// Chuck and spindle tunables.
    pub chuck: ChuckConfig,
    /// Axis motion tunables.
    pub axis: AxisConfig,
}

impl SimConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save configuration to a JSON file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
