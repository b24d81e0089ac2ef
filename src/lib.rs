//! # LatheTrainer
//!
//! The simulation core of a manual lathe trainer: an operator drives a
//! cutting tool against rotating stock and must remove material without
//! violating the machine's safety rules.
//!
//! ## Architecture
//!
//! LatheTrainer is organized as a workspace with multiple crates:
//!
//! 1. **lathetrainer-core** - units, materials, events, configuration
//! 2. **lathetrainer-stocksim** - raster stock, cutting geometry, parting
//! 3. **lathetrainer-machine** - chuck/spindle/axes, safety rules, tick loop
//! 4. **lathetrainer** - facade crate and headless demo binary
//!
//! ## Features
//!
//! - **Raster stock model**: per-pixel material buffer with monotonic
//!   erosion and parting-off splitting
//! - **Two cut modes**: silhouette profile carving and lathe-revolve
//!   turning with a helix/threading mask
//! - **Chuck state machine**: clamp sequencing, RPM ramping with
//!   hysteresis, three independent cutting gates
//! - **Crash detection**: five ordered safety rules with raster-refined
//!   contact tests, cooldowns, and an operator-acknowledged lock

// Re-export the public surface of the member crates
pub use lathetrainer_core::{
    AxisConfig, Calibration, ChuckConfig, CrashEvent, CutConfig, EventBus, EventCategory,
    EventFilter, FeedRate, HelixConfig, MachineEvent, MaterialRecord, MaterialType, PartingConfig,
    RasterConfig, Rgba8, SafetyConfig, SimConfig, SimEvent, StockEvent, SubscriptionId,
    WorkpieceParams,
};

pub use lathetrainer_stocksim::{
    ContactShape, ContactVolume, CutMode, CutOutcome, CuttingEngine, HelixMask, OrientedBox,
    PartingDetector, Point2, Pose, RasterRect, RasterStock, StockSnapshot, StockSplit, WorldBounds,
};

pub use lathetrainer_machine::{
    AxisMotion, Chuck, ChuckState, CrashSink, CrashTrigger, DroppedPart, DroppedPartSink,
    FeedMode, LatheSimulation, MoveMode, SafetyMonitor, SimulationContext, SpinDirection, Spindle,
    TickInput, ToolRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with console output and RUST_LOG
/// environment variable support.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
