use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glam::{Quat, Vec3};
use tracing_subscriber::EnvFilter;
use waywalk_common::{EntityId, Transform};
use waywalk_kernel::{World, WorldEvent};
use waywalk_render::{DebugTextRenderer, RenderView, Renderer};
use waywalk_walker::{Preset, Scenario, ScenarioConfig};

#[derive(Parser)]
#[command(name = "waywalk", about = "Run waypoint walk scenarios headless")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Built-in scenario: triangle, village or crossing
    #[arg(short, long, default_value = "triangle", conflicts_with = "config")]
    preset: Preset,
    /// Scenario file (.json, .yaml or .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Source {
    fn load(&self) -> anyhow::Result<Scenario> {
        match &self.config {
            Some(path) => ScenarioConfig::load(path)
                .with_context(|| format!("reading {}", path.display()))?
                .into_scenario()
                .with_context(|| format!("validating {}", path.display())),
            None => Ok(self.preset.scenario()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and built-in scenarios
    Info,
    /// Print a scenario's legs
    Legs {
        #[command(flatten)]
        source: Source,
    },
    /// Walk a scenario for a number of ticks
    Walk {
        #[command(flatten)]
        source: Source,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Override the scenario's distance per tick
        #[arg(short, long)]
        step: Option<f64>,
        /// Print the scene every N ticks (0 prints only the final frame)
        #[arg(short, long, default_value = "0")]
        every: u64,
        /// Write the event log as JSON
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Walk, replay the event log and compare state hashes
    Replay {
        #[command(flatten)]
        source: Source,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "1000")]
        ticks: u64,
    },
    /// Write a built-in scenario to a file for editing
    Export {
        /// Built-in scenario to export
        preset: Preset,
        /// Output file (.json, .yaml or .yml)
        output: PathBuf,
    },
}

/// Frames per traffic cycle: drive for 150, wait for 50.
const TRAFFIC_CYCLE: u64 = 200;
const TRAFFIC_DRIVE: u64 = 150;

/// Where the passing car is on a given tick. Drives down the road at x = 3
/// from z = 8 to z = -7, waits, then starts over.
fn traffic_transform(tick: u64) -> Transform {
    let frame = tick % TRAFFIC_CYCLE;
    let z = if frame < TRAFFIC_DRIVE {
        8.0 - 15.0 * frame as f32 / TRAFFIC_DRIVE as f32
    } else {
        -7.0
    };
    Transform::from_pose(Vec3::new(3.0, 0.16, z), Quat::IDENTITY)
}

/// What the walking agent did over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    turns: usize,
    loops: usize,
    held: usize,
}

/// One agent walking a scenario, plus the passing car when the scenario has a
/// yield zone.
///
/// World events are drained every tick. They are kept only when the run
/// records, so long unrecorded walks use constant memory.
struct Run {
    world: World,
    agent: EntityId,
    traffic: Option<EntityId>,
    tally: Tally,
    log: Option<Vec<WorldEvent>>,
}

impl Run {
    fn new(scenario: &Scenario, record: bool) -> anyhow::Result<Self> {
        let mut world = World::new();
        let (agent, traffic) = match scenario.yield_zone {
            Some(_) => {
                let car = world.spawn(traffic_transform(0), Vec3::new(0.3, 0.16, 0.75));
                (world.spawn_scenario_yielding_to(scenario, car)?, Some(car))
            }
            None => (world.spawn_scenario(scenario)?, None),
        };
        let mut run = Self {
            world,
            agent,
            traffic,
            tally: Tally::default(),
            log: record.then(Vec::new),
        };
        run.collect_events();
        Ok(run)
    }

    fn step(&mut self) -> anyhow::Result<()> {
        if let Some(car) = self.traffic {
            self.world
                .set_transform(car, traffic_transform(self.world.tick()))?;
        }
        self.world.step();
        self.collect_events();
        Ok(())
    }

    fn collect_events(&mut self) {
        for event in self.world.drain_events() {
            match &event {
                WorldEvent::Advanced { id, command } if *id == self.agent => {
                    self.tally.turns += usize::from(command.turn.is_some());
                    self.tally.loops += usize::from(command.reset.is_some());
                }
                WorldEvent::Held { id } if *id == self.agent => self.tally.held += 1,
                _ => {}
            }
            if let Some(log) = &mut self.log {
                log.push(event);
            }
        }
    }

    /// Recorded events, empty unless the run was created recording.
    fn events(&self) -> &[WorldEvent] {
        self.log.as_deref().unwrap_or_default()
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("waywalk v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", waywalk_render::crate_info());
            for preset in Preset::ALL {
                let s = preset.scenario();
                println!(
                    "preset {:<9} legs={} cycle={:.2} step={}",
                    preset,
                    s.track.len(),
                    s.track.cycle_distance(),
                    s.step_distance
                );
            }
        }
        Commands::Legs { source } => {
            let scenario = source.load()?;
            println!(
                "{}: base=({:.2}, {:.2}, {:.2}) step={}",
                scenario.name,
                scenario.base_position.x,
                scenario.base_position.y,
                scenario.base_position.z,
                scenario.step_distance
            );
            for (i, leg) in scenario.track.legs().iter().enumerate() {
                println!(
                    "  leg {:>2}: turn {:>8.2} deg after {:>7.3}",
                    i,
                    leg.turn_degrees(),
                    leg.cumulative_distance_threshold
                );
            }
        }
        Commands::Walk {
            source,
            ticks,
            step,
            every,
            events,
        } => {
            let mut scenario = source.load()?;
            if let Some(step) = step {
                scenario.step_distance = step;
            }
            tracing::info!(
                scenario = %scenario.name,
                ticks,
                step = scenario.step_distance,
                "walking"
            );

            let mut run = Run::new(&scenario, events.is_some())?;
            let renderer = DebugTextRenderer::new();
            let view = RenderView::default();
            for _ in 0..ticks {
                run.step()?;
                if every > 0 && run.world.tick() % every == 0 {
                    print!("{}", renderer.render(&run.world, &view));
                }
            }
            if every == 0 || ticks % every != 0 {
                print!("{}", renderer.render(&run.world, &view));
            }

            let Tally { turns, loops, held } = run.tally;
            println!("turns={turns} loops={loops} held={held}");

            if let Some(path) = events {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                serde_json::to_writer_pretty(file, run.events())?;
                tracing::info!(path = %path.display(), "event log written");
            }
        }
        Commands::Replay { source, ticks } => {
            let scenario = source.load()?;
            println!("Deterministic replay: {} for {ticks} ticks", scenario.name);

            let mut run = Run::new(&scenario, true)?;
            for _ in 0..ticks {
                run.step()?;
            }
            let replayed = World::replay(run.events());

            let (a, b) = (run.world.state_hash(), replayed.state_hash());
            println!("Run:    tick={} hash={a:#018x}", run.world.tick());
            println!("Replay: tick={} hash={b:#018x}", replayed.tick());
            if a != b {
                anyhow::bail!("replay diverged");
            }
            println!("Match: OK");
        }
        Commands::Export { preset, output } => {
            ScenarioConfig::from(&preset.scenario())
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("wrote {preset} to {}", output.display());
        }
    }

    Ok(())
}
