//! Event type definitions for the simulation event bus.
//!
//! Events are cloneable and serializable for logging/replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::WorkpieceParams;

/// Root event enum for all simulation events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimEvent {
    /// A crash rule fired and halted the machine.
    Crash(CrashEvent),
    /// Machine state transitions (chuck, spindle, axes).
    Machine(MachineEvent),
    /// Stock material changes (cuts, parting).
    Stock(StockEvent),
}

impl SimEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            SimEvent::Crash(_) => EventCategory::Crash,
            SimEvent::Machine(_) => EventCategory::Machine,
            SimEvent::Stock(_) => EventCategory::Stock,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            SimEvent::Crash(e) => format!("Crash: {}", e.message),
            SimEvent::Machine(e) => e.description(),
            SimEvent::Stock(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Crash / safety events.
    Crash,
    /// Machine state events.
    Machine,
    /// Stock material events.
    Stock,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Crash => write!(f, "Crash"),
            EventCategory::Machine => write!(f, "Machine"),
            EventCategory::Stock => write!(f, "Stock"),
        }
    }
}

/// A detected unsafe contact condition.
///
/// Crashes are expected, user-triggerable domain events, not program
/// errors. One event is emitted per cooldown window; the machine stays
/// locked until the operator acknowledges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashEvent {
    /// Human-readable diagnostic for the operator.
    pub message: String,
    /// Wall-clock time the crash was recorded.
    pub timestamp: DateTime<Utc>,
}

impl CrashEvent {
    /// Create a crash event stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Machine state transition events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MachineEvent {
    /// The spindle was started by the operator.
    SpindleStarted {
        /// Commanded speed at start.
        commanded_rpm: f32,
    },
    /// The spindle was stopped (operator or crash handling).
    SpindleStopped,
    /// The chuck state machine changed state.
    ChuckStateChanged {
        /// State name before the transition.
        from: String,
        /// State name after the transition.
        to: String,
    },
    /// A new workpiece was loaded and clamping started.
    WorkpieceLoaded {
        /// The loaded workpiece parameters.
        params: WorkpieceParams,
    },
    /// The go-home sequence completed.
    Homed,
}

impl MachineEvent {
    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            MachineEvent::SpindleStarted { commanded_rpm } => {
                format!("Spindle started at {:.0} rpm", commanded_rpm)
            }
            MachineEvent::SpindleStopped => "Spindle stopped".to_string(),
            MachineEvent::ChuckStateChanged { from, to } => {
                format!("Chuck {} -> {}", from, to)
            }
            MachineEvent::WorkpieceLoaded { params } => {
                format!("Workpiece loaded: {}", params)
            }
            MachineEvent::Homed => "Axes homed".to_string(),
        }
    }
}

/// Stock material events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StockEvent {
    /// Material was removed this tick (drives cutting feedback).
    MaterialRemoved {
        /// First modified raster column.
        first_column: usize,
        /// Last modified raster column.
        last_column: usize,
    },
    /// The stock was fully severed.
    PartedOff {
        /// Raster column of the separation plane.
        cut_column: usize,
    },
}

impl StockEvent {
    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            StockEvent::MaterialRemoved {
                first_column,
                last_column,
            } => format!("Material removed in columns {}..={}", first_column, last_column),
            StockEvent::PartedOff { cut_column } => {
                format!("Parted off at column {}", cut_column)
            }
        }
    }
}
