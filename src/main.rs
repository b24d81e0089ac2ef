//! Headless demo session: load a bar, clamp, spin up, turn a shoulder,
//! then part it off. Prints what an attached UI would render.

use lathetrainer::{
    init_logging, ContactShape, CrashEvent, CrashSink, DroppedPart, DroppedPartSink,
    LatheSimulation, MaterialType, Point2, Pose, SimConfig, TickInput, WorkpieceParams,
};

const DT: f32 = 0.016;

struct ConsoleCrashSink;

impl CrashSink for ConsoleCrashSink {
    fn on_crash(&mut self, event: &CrashEvent) {
        println!("CRASH: {}", event.message);
    }
}

struct ConsolePartSink;

impl DroppedPartSink for ConsolePartSink {
    fn on_part_dropped(&mut self, part: DroppedPart) {
        println!(
            "Part dropped: {} x {} px, cut at column {}",
            part.stock.width_px(),
            part.stock.height_px(),
            part.cut_column
        );
    }
}

fn run_ticks(sim: &mut LatheSimulation, pose: Pose, ticks: usize) {
    for _ in 0..ticks {
        sim.tick(&TickInput::new(DT, pose));
    }
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let mut sim = LatheSimulation::new(SimConfig::default());
    sim.set_crash_sink(Box::new(ConsoleCrashSink));
    sim.set_dropped_part_sink(Box::new(ConsolePartSink));
    sim.tools_mut()
        .register_tip(ContactShape::rect(Point2::new(0.0, 0.0), Point2::new(1.5, 3.0)));

    // 85 mm at 3 px/mm gives an odd raster height, so one pixel row sits
    // exactly on the rotation axis and a parting blade can cut through it.
    let params = WorkpieceParams::new(MaterialType::Aluminium, 85.0, 150.0);
    sim.load_workpiece(params)?;

    let parked = Pose::at(500.0, 500.0);
    run_ticks(&mut sim, parked, 80);
    println!("Chuck: {}", sim.chuck().state());

    if !sim.press_start() {
        anyhow::bail!("spindle failed to start after clamping");
    }
    sim.set_commanded_rpm(1200.0);
    sim.axis_mut().set_jog_mode();
    run_ticks(&mut sim, parked, 300);
    println!(
        "Spindle at {:.0} rpm, chuck {}",
        sim.chuck().current_rpm(),
        sim.chuck().state()
    );

    // Turn the middle of the bar down a few millimeters
    run_ticks(&mut sim, Pose::at(75.0, 40.0), 40);
    if let Some(stock) = sim.stock() {
        let mid = stock.width_px() / 2;
        println!(
            "After turning: column {} radius {:?} px (full bar: {} px)",
            mid,
            stock.max_radius_px(mid),
            stock.height_px() / 2
        );
    }

    // Part off the right third of the bar
    let mut step = 0usize;
    while !sim.is_parted_off() && step < 3000 {
        let y = 44.0 - step as f32 * 0.05;
        sim.tick(&TickInput::new(DT, Pose::at(100.0, y)));
        step += 1;
    }
    println!(
        "Parted: {}, remaining stock {} px wide, machine locked: {}",
        sim.is_parted_off(),
        sim.stock().map(|s| s.width_px()).unwrap_or(0),
        sim.is_locked()
    );

    Ok(())
}
