//! The simulation orchestrator
//!
//! `LatheSimulation` owns every core component and runs one tick in the
//! mandated order: chuck (RPM ramp) and axes always advance; then, unless
//! the machine is locked or the stock already parted, the safety monitor
//! runs, the `can_cut_now()` gate is checked, the cutting engine erodes
//! the stock, and the parting detector scans the modified columns.
//!
//! The context lock replaces a global safety latch: it is set by crash
//! handling and by the parting post-flow, and cleared only by operator
//! acknowledgment or by loading new stock.
//!
//! World space is millimeter space: the stock spans `[0, length_mm]`
//! axially with the rotation axis at y = 0, and the tool pose arrives in
//! the same frame.

use tracing::{debug, info, warn};

use lathetrainer_core::{
    CoreError, CrashEvent, EventBus, MachineEvent, SimConfig, SimEvent, StockEvent,
    WorkpieceParams,
};
use lathetrainer_stocksim::{
    world_x_to_column, CutMode, CuttingEngine, PartingDetector, Pose, RasterStock, StockSnapshot,
    WorldBounds,
};

use crate::axis::AxisMotion;
use crate::chuck::Chuck;
use crate::safety::{CrashTrigger, SafetyInputs, SafetyMonitor};
use crate::spindle::SpinDirection;
use crate::tool::ToolRegistry;

/// Per-tick machine-wide state, passed explicitly instead of hiding in a
/// global.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationContext {
    /// Machine halted; cleared only by acknowledgment or new stock.
    pub locked: bool,
    /// Simulation clock, seconds accumulated from tick deltas.
    pub sim_time_s: f64,
}

/// Input for one simulation tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Tick delta, simulation seconds.
    pub dt: f32,
    /// Current world pose of the tool carrier.
    pub tool_pose: Pose,
}

impl TickInput {
    /// Create a tick input.
    pub fn new(dt: f32, tool_pose: Pose) -> Self {
        Self { dt, tool_pose }
    }
}

/// Crash collaborator contract: receives crash events and owns operator
/// acknowledgment (the resume side calls `acknowledge_crash`).
pub trait CrashSink {
    /// A crash rule fired and locked the machine.
    fn on_crash(&mut self, event: &CrashEvent);
}

/// A severed stock fragment handed to the physical-drop collaborator.
#[derive(Debug, Clone)]
pub struct DroppedPart {
    /// The fragment raster, re-indexed and carrying its own calibration
    /// and world placement.
    pub stock: RasterStock,
    /// Raster column the separation happened at, in the parent stock.
    pub cut_column: usize,
}

/// Dropped-part collaborator contract.
pub trait DroppedPartSink {
    /// The right-hand fragment separated and falls free.
    fn on_part_dropped(&mut self, part: DroppedPart);
}

/// The complete simulation core.
pub struct LatheSimulation {
    config: SimConfig,
    ctx: SimulationContext,
    chuck: Chuck,
    axis: AxisMotion,
    tools: ToolRegistry,
    cutting: CuttingEngine,
    parting: PartingDetector,
    safety: SafetyMonitor,
    stock: Option<RasterStock>,
    events: EventBus,
    crash_sink: Option<Box<dyn CrashSink>>,
    dropped_sink: Option<Box<dyn DroppedPartSink>>,
}

impl LatheSimulation {
    /// Build a simulation from configuration.
    pub fn new(config: SimConfig) -> Self {
        Self {
            ctx: SimulationContext::default(),
            chuck: Chuck::new(config.chuck),
            axis: AxisMotion::new(config.axis),
            tools: ToolRegistry::new(),
            cutting: CuttingEngine::new(CutMode::LatheRevolve, config.cut, config.helix),
            parting: PartingDetector::new(config.parting),
            safety: SafetyMonitor::new(config.safety),
            stock: None,
            events: EventBus::new(),
            crash_sink: None,
            dropped_sink: None,
            config,
        }
    }

    /// The event bus collaborators subscribe to.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Attach the crash collaborator.
    pub fn set_crash_sink(&mut self, sink: Box<dyn CrashSink>) {
        self.crash_sink = Some(sink);
    }

    /// Attach the dropped-part collaborator.
    pub fn set_dropped_part_sink(&mut self, sink: Box<dyn DroppedPartSink>) {
        self.dropped_sink = Some(sink);
    }

    /// The tool/hazard registry.
    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    /// Select the cutting mode of the active tool.
    pub fn set_cut_mode(&mut self, mode: CutMode) {
        self.cutting.set_mode(mode);
    }

    /// Chuck and spindle state.
    pub fn chuck(&self) -> &Chuck {
        &self.chuck
    }

    /// Axis state.
    pub fn axis(&self) -> &AxisMotion {
        &self.axis
    }

    /// Mutable axis access for the input collaborator (jog, feed mode).
    pub fn axis_mut(&mut self) -> &mut AxisMotion {
        &mut self.axis
    }

    /// The clamped stock, when loaded.
    pub fn stock(&self) -> Option<&RasterStock> {
        self.stock.as_ref()
    }

    /// Machine-wide context.
    pub fn context(&self) -> SimulationContext {
        self.ctx
    }

    /// Whether the machine is halted awaiting acknowledgment.
    pub fn is_locked(&self) -> bool {
        self.ctx.locked
    }

    /// Whether the current stock has been parted off.
    pub fn is_parted_off(&self) -> bool {
        self.parting.is_parted()
    }

    /// Operator acknowledged the crash popup; unlock the machine.
    pub fn acknowledge_crash(&mut self) {
        if self.ctx.locked {
            info!("crash acknowledged, machine unlocked");
        }
        self.ctx.locked = false;
        self.axis.set_input_enabled(true);
    }

    /// Snapshot the stock for the display collaborator.
    pub fn snapshot(&self) -> Option<StockSnapshot> {
        self.stock.as_ref().map(StockSnapshot::capture)
    }

    /// Load new stock: rebuild the raster, recompute calibration, restart
    /// the chuck clamp sequence, and clear parted/lock state.
    pub fn load_workpiece(&mut self, params: WorkpieceParams) -> Result<(), CoreError> {
        let bounds = WorldBounds::new(
            0.0,
            -params.diameter_mm / 2.0,
            params.length_mm,
            params.diameter_mm / 2.0,
        );
        let mut stock = RasterStock::from_params(&params, bounds, self.config.raster)?;
        stock.paint_initial_outline(
            self.config.cut.machined_edge_color,
            self.config.cut.edge_thickness_px,
        );

        self.stock = Some(stock);
        self.chuck
            .select_workpiece(params.diameter_mm, self.config.chuck.open_clearance_mm);
        self.parting.reset();
        self.safety.reset_timers();
        self.ctx.locked = false;
        self.axis.set_input_enabled(true);

        info!(%params, "workpiece loaded");
        self.events
            .publish(SimEvent::Machine(MachineEvent::WorkpieceLoaded { params }));
        Ok(())
    }

    /// Operator start button. Fails unless the chuck allows it.
    pub fn press_start(&mut self) -> bool {
        if self.ctx.locked {
            return false;
        }
        let started = self.chuck.try_start_spindle();
        if started {
            self.events
                .publish(SimEvent::Machine(MachineEvent::SpindleStarted {
                    commanded_rpm: self.chuck.spindle().commanded_rpm(),
                }));
        }
        started
    }

    /// Operator stop button. Always legal.
    pub fn press_stop(&mut self) {
        self.chuck.stop_spindle();
        self.events
            .publish(SimEvent::Machine(MachineEvent::SpindleStopped));
    }

    /// Spindle command source: commanded speed.
    pub fn set_commanded_rpm(&mut self, rpm: f32) {
        self.chuck.set_commanded_rpm(rpm);
    }

    /// Spindle command source: direction.
    pub fn set_direction(&mut self, direction: SpinDirection) {
        self.chuck.set_direction(direction);
    }

    /// Three independent gates, all required: clamped, enabled, fast enough.
    pub fn can_cut_now(&self) -> bool {
        self.chuck.is_clamped()
            && self.chuck.spindle().enabled()
            && self.chuck.current_rpm() >= self.config.cut.min_rpm_to_cut
    }

    /// Run one simulation tick.
    pub fn tick(&mut self, input: &TickInput) {
        self.ctx.sim_time_s += input.dt as f64;

        // The chuck's RPM ramp and the axes advance every tick, cutting or
        // not; a crash-stopped spindle still spins down through here.
        let chuck_before = self.chuck.state();
        self.chuck.update(input.dt);
        let chuck_after = self.chuck.state();
        if chuck_before != chuck_after {
            self.events
                .publish(SimEvent::Machine(MachineEvent::ChuckStateChanged {
                    from: chuck_before.to_string(),
                    to: chuck_after.to_string(),
                }));
        }

        if self.axis.update(input.dt, self.chuck.current_rpm()) {
            self.events.publish(SimEvent::Machine(MachineEvent::Homed));
        }

        if self.ctx.locked || self.parting.is_parted() {
            return;
        }

        let tip = self.tools.tip_at(&input.tool_pose);
        let bodies = self.tools.bodies_at(&input.tool_pose);

        let trigger = {
            let inputs = SafetyInputs {
                stock: self.stock.as_ref(),
                tip: tip.as_ref(),
                bodies: &bodies,
                hazards: self.tools.hazards(),
                spindle_enabled: self.chuck.spindle().enabled(),
                current_rpm: self.chuck.current_rpm(),
                direction: self.chuck.spindle().direction(),
                feed_mode: self.axis.feed_mode(),
                dt: input.dt,
                now_s: self.ctx.sim_time_s,
            };
            self.safety.check(&inputs)
        };
        if let Some(trigger) = trigger {
            self.handle_crash(trigger);
            return;
        }

        if !self.can_cut_now() {
            return;
        }

        let tip = match tip {
            Some(t) => t,
            None => {
                debug!("no tool tip registered, skipping cut");
                return;
            }
        };
        let stock = match self.stock.as_mut() {
            Some(s) => s,
            None => {
                debug!("no stock loaded, skipping cut");
                return;
            }
        };

        let rpm = self.chuck.current_rpm();
        let feed = self.axis.current_feed(rpm);
        let outcome = self.cutting.tick(stock, &tip, feed, rpm, input.dt);

        if let Some((x0, x1)) = outcome.columns {
            self.events
                .publish(SimEvent::Stock(StockEvent::MaterialRemoved {
                    first_column: x0,
                    last_column: x1,
                }));

            let margin = self.config.cut.parting_check_margin;
            let check0 = x0.saturating_sub(margin);
            let check1 = (x1 + margin).min(stock.width_px() - 1);
            let tool_column =
                world_x_to_column(tip.aabb().center_x(), stock.world_bounds(), stock.width_px());

            let cut = self
                .parting
                .check(stock, check0, check1, tool_column, self.ctx.sim_time_s);
            if let Some(cut_column) = cut {
                self.handle_parting(cut_column);
            }
        }
    }

    fn handle_crash(&mut self, trigger: CrashTrigger) {
        self.axis.stop_move();
        self.axis.cancel_homing();
        self.chuck.stop_spindle();
        self.axis.retract_x(self.config.safety.retract_mm);
        self.safety.reset_timers();
        self.ctx.locked = true;

        if trigger.emit {
            let event = CrashEvent::new(trigger.message);
            self.events.publish(SimEvent::Crash(event.clone()));
            if let Some(sink) = self.crash_sink.as_mut() {
                sink.on_crash(&event);
            } else {
                warn!("no crash sink attached");
            }
        }
    }

    fn handle_parting(&mut self, cut_column: usize) {
        let stock = match self.stock.take() {
            Some(s) => s,
            None => return,
        };

        let split = stock.split(cut_column);
        self.stock = Some(split.left);
        self.parting.mark_parted();

        info!(cut_column, "stock parted off");
        self.events
            .publish(SimEvent::Stock(StockEvent::PartedOff { cut_column }));

        match (split.right, self.dropped_sink.as_mut()) {
            (Some(right), Some(sink)) => sink.on_part_dropped(DroppedPart {
                stock: right,
                cut_column,
            }),
            (Some(_), None) => warn!("no dropped-part sink attached, fragment discarded"),
            (None, _) => debug!("no material right of the cut, nothing drops"),
        }

        // Post flow: lock input, stop the spindle, park the tool. The lock
        // clears when the operator loads fresh stock.
        self.axis.set_input_enabled(false);
        self.chuck.stop_spindle();
        self.axis.go_home();
        self.ctx.locked = true;
    }
}

impl std::fmt::Debug for LatheSimulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatheSimulation")
            .field("ctx", &self.ctx)
            .field("chuck", &self.chuck.state())
            .field("stock", &self.stock.as_ref().map(|s| (s.width_px(), s.height_px())))
            .field("parted", &self.parting.is_parted())
            .finish()
    }
}
