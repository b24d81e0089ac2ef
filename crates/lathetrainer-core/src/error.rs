//! Error handling for the LatheTrainer simulation core
//!
//! Provides error types for the layers of the simulation:
//! - Core errors (workpiece/calibration setup)
//! - Configuration errors (loading/saving tunables)
//!
//! Safety violations are deliberately NOT errors: a crash is an expected,
//! user-triggerable domain event carried by `CrashEvent`, and geometric
//! degeneracies are clamped at the call site rather than propagated.

use thiserror::Error;

/// Core simulation error type
///
/// Represents setup failures that make a requested operation impossible.
/// Per-tick failure paths never surface here; they degrade to a logged
/// no-op for that tick.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Workpiece dimensions are unusable
    #[error("Invalid workpiece dimensions: diameter {diameter_mm}mm, length {length_mm}mm")]
    InvalidWorkpiece {
        /// The requested stock diameter in millimeters.
        diameter_mm: f32,
        /// The requested stock length in millimeters.
        length_mm: f32,
    },

    /// Raster would be degenerate at the requested resolution
    #[error("Raster too small: {width_px}x{height_px} px")]
    RasterTooSmall {
        /// Raster width in pixels.
        width_px: usize,
        /// Raster height in pixels.
        height_px: usize,
    },

    /// A required collaborator reference has not been supplied
    #[error("Missing collaborator: {name}")]
    MissingCollaborator {
        /// The name of the missing collaborator.
        name: String,
    },

    /// Generic core error
    #[error("Simulation error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed or serialized
    #[error("Config format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
