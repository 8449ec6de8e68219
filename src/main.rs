use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use gravity_core::{DiscConfig, ScenarioConfig};
use gravity_physics::{Body, GridBroadPhase, diagnostics, procgen};
use gravity_sim::{Playback, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Headless n-body run with a rewindable timeline")]
struct Args {
    /// Scenario file; a default disc is generated when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Ticks to simulate, overriding the scenario
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Rewind this many ticks at the end and replay them
    #[arg(short, long, default_value_t = 0)]
    rewind: u64,

    /// Seed for the generated disc, overriding the scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Report broad-phase contacts using a grid with this cell size
    #[arg(long)]
    grid: Option<f64>,
}

fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    let mut scenario = match &args.scenario {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("reading scenario {}", path.display()))?;
            ScenarioConfig::from_yaml_str(&source)
                .with_context(|| format!("parsing scenario {}", path.display()))?
        }
        None => ScenarioConfig {
            disc: Some(DiscConfig::default()),
            ticks: 100,
            ..ScenarioConfig::default()
        },
    };

    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }
    if let (Some(seed), Some(disc)) = (args.seed, scenario.disc.as_mut()) {
        disc.seed = seed;
    }
    Ok(scenario)
}

fn report(sim: &Simulation) {
    let bodies: Vec<Body> = sim.bodies().cloned().collect();
    let centre = diagnostics::center_of_mass(&bodies).unwrap_or_default();
    info!(
        "Tick {} [{}..={}]: {} bodies, KE {:.3}, momentum ({:.3}, {:.3}), \
         centre ({:.2}, {:.2}), {} KiB history",
        sim.tick(),
        sim.min_tick(),
        sim.max_tick(),
        bodies.len(),
        diagnostics::kinetic_energy(&bodies),
        diagnostics::momentum(&bodies).x,
        diagnostics::momentum(&bodies).y,
        centre.x,
        centre.y,
        sim.history().bytes_used() / 1024
    );
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let scenario = load_scenario(&args)?;

    let mut sim = Simulation::new(scenario.simulation.clone())?;
    if let Some(cell_size) = args.grid {
        sim = sim.with_broad_phase(GridBroadPhase::new(cell_size));
    }

    let mut specs = Vec::new();
    if let Some(disc) = &scenario.disc {
        specs.extend(procgen::generate_disc(disc, scenario.simulation.g));
    }
    specs.extend(scenario.bodies.iter().copied());
    ensure!(!specs.is_empty(), "scenario has no bodies");

    sim.create_bodies(&specs)?;
    report(&sim);

    let progress = (scenario.ticks / 10).max(1);
    for _ in 0..scenario.ticks {
        let tick = sim.advance()?;
        if tick % progress == 0 {
            report(&sim);
        }
        if let Some(step) = sim.last_report().filter(|r| !r.contacts.is_empty()) {
            info!("Tick {}: {} contact pairs", step.tick, step.contacts.len());
        }
    }

    if args.rewind > 0 {
        let end = sim.max_tick();
        let expected = sim.history().read(end);
        let speed = i64::try_from(args.rewind).context("rewind too large")?;

        let mut playback = Playback::new(speed);
        playback.set_speed(-speed);
        let from = playback.update(&mut sim)?;
        info!("Rewound to tick {}", from);

        sim.apply_edits()?;
        while sim.tick() < end {
            playback.set_speed((end - sim.tick()) as i64);
            playback.update(&mut sim)?;
        }

        let replayed = sim.history().read(end);
        info!(
            "Replayed ticks {}..={}: {}",
            from + 1,
            end,
            if replayed == expected { "identical" } else { "diverged" }
        );
    }

    report(&sim);
    Ok(())
}
