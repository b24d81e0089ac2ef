//! # LatheTrainer Core
//!
//! Core types, events, and configuration for the LatheTrainer simulation.
//! Provides the fundamental abstractions shared by the stock simulation and
//! machine crates: unit calibration, the material database, the simulation
//! event bus, and the error taxonomy.

pub mod config;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod units;

pub use config::{
    AxisConfig, ChuckConfig, CutConfig, HelixConfig, PartingConfig, RasterConfig, SafetyConfig,
    SimConfig,
};

pub use data::{MaterialRecord, MaterialType, Rgba8, WorkpieceParams};

pub use error::{ConfigError, CoreError, Result};

pub use event_bus::{
    CrashEvent, EventBus, EventCategory, EventFilter, MachineEvent, SimEvent, StockEvent,
    SubscriptionId,
};

pub use units::{move_towards, Calibration, FeedRate};
