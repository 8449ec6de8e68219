//! Sweep of disc runs across seeds and real-body counts.
//! Focus: how the size of the real set trades accuracy for speed.

use std::time::Instant;

use anyhow::Result;
use gravity_core::{DiscConfig, SimConfig};
use gravity_physics::{Body, diagnostics, procgen};
use gravity_sim::Simulation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Outcome of one run
struct RunStats {
    seed: u64,
    real_bodies_min: usize,
    ticks_per_sec: f64,
    survivors: usize,
    energy_drift: f64,
}

fn kinetic_energy(sim: &Simulation) -> f64 {
    let bodies: Vec<Body> = sim.bodies().cloned().collect();
    diagnostics::kinetic_energy(&bodies)
}

fn run(seed: u64, real_bodies_min: usize, body_count: u32, ticks: u64) -> Result<RunStats> {
    let config = SimConfig {
        real_bodies_min,
        ..SimConfig::default()
    };
    let disc = DiscConfig {
        body_count,
        seed,
        ..DiscConfig::default()
    };

    let mut sim = Simulation::new(config.clone())?;
    sim.create_bodies(&procgen::generate_disc(&disc, config.g))?;
    let initial = kinetic_energy(&sim);

    let start = Instant::now();
    for _ in 0..ticks {
        sim.advance()?;
    }
    let elapsed = start.elapsed().as_secs_f64().max(f64::EPSILON);

    Ok(RunStats {
        seed,
        real_bodies_min,
        ticks_per_sec: ticks as f64 / elapsed,
        survivors: sim.num_bodies(),
        energy_drift: (kinetic_energy(&sim) - initial) / initial,
    })
}

fn main() -> Result<()> {
    let num_seeds = 5;
    let body_count = 400;
    let ticks = 50;
    let real_counts = [1, 10, 50, 100, 250, 401];

    let mut rng = ChaCha8Rng::seed_from_u64(7919);
    let seeds: Vec<u64> = (0..num_seeds).map(|_| rng.gen_range(0..1_000_000)).collect();

    eprintln!(
        "Simulating {} seeds x {} real-body settings, {} bodies, {} ticks each...",
        seeds.len(),
        real_counts.len(),
        body_count + 1,
        ticks
    );

    let mut all = Vec::new();
    for &seed in &seeds {
        for &real in &real_counts {
            all.push(run(seed, real, body_count, ticks)?);
        }
        eprint!("  seed {} done\r", seed);
    }
    eprintln!();

    println!("{:>8} {:>6} {:>10} {:>10} {:>12}", "seed", "real", "ticks/s", "alive", "KE drift");
    for stats in &all {
        println!(
            "{:>8} {:>6} {:>10.1} {:>10} {:>12.4}",
            stats.seed,
            stats.real_bodies_min,
            stats.ticks_per_sec,
            stats.survivors,
            stats.energy_drift
        );
    }

    println!();
    println!("{:>6} {:>10} {:>12}", "real", "ticks/s", "|KE drift|");
    for &real in &real_counts {
        let runs: Vec<&RunStats> = all.iter().filter(|s| s.real_bodies_min == real).collect();
        let n = runs.len() as f64;
        let speed = runs.iter().map(|s| s.ticks_per_sec).sum::<f64>() / n;
        let drift = runs.iter().map(|s| s.energy_drift.abs()).sum::<f64>() / n;
        println!("{:>6} {:>10.1} {:>12.4}", real, speed, drift);
    }

    Ok(())
}
