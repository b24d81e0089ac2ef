//! # LatheTrainer Machine
//!
//! The machine side of the simulation: spindle RPM ramping, the chuck
//! clamping state machine, axis motion with jog/rapid/increment modes and
//! the go-home sequence, the tool & hazard registry, the crash rule
//! monitor, and the `LatheSimulation` orchestrator that runs one tick of
//! everything in the mandated order (safety, then cutting, then parting).

pub mod axis;
pub mod chuck;
pub mod safety;
pub mod simulation;
pub mod spindle;
pub mod tool;

pub use axis::{AxisMotion, FeedMode, MoveMode};
pub use chuck::{Chuck, ChuckState};
pub use safety::{CrashTrigger, SafetyMonitor};
pub use simulation::{
    CrashSink, DroppedPart, DroppedPartSink, LatheSimulation, SimulationContext, TickInput,
};
pub use spindle::{SpinDirection, Spindle};
pub use tool::ToolRegistry;
