//! Event bus for simulation-wide event distribution.
//!
//! External collaborators (UI panels, audio, crash popups) observe the
//! simulation exclusively through this bus; the core never calls into a
//! presentation layer directly.

mod bus;
mod events;

pub use bus::{EventBus, EventBusConfig, EventFilter, SubscriptionId};
pub use events::{CrashEvent, EventCategory, MachineEvent, SimEvent, StockEvent};
