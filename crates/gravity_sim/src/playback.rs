use gravity_core::{GravityResult, Tick};
use tracing::debug;

use crate::simulation::Simulation;

pub const DEFAULT_MAX_SPEED: i64 = 16;

/// Moves the selected tick of a [`Simulation`] at a signed speed.
///
/// Positive speeds play forward and simulate new ticks once the end of the
/// timeline is reached. Negative speeds rewind and stop at the oldest
/// retained tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    /// Ticks per update, negative when rewinding
    speed: i64,
    max_speed: i64,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPEED)
    }
}

impl Playback {
    /// Paused playback limited to `±max_speed` ticks per update
    pub fn new(max_speed: i64) -> Self {
        Self {
            speed: 0,
            max_speed: max_speed.max(1),
        }
    }

    pub fn speed(&self) -> i64 {
        self.speed
    }

    pub fn max_speed(&self) -> i64 {
        self.max_speed
    }

    pub fn is_paused(&self) -> bool {
        self.speed == 0
    }

    pub fn pause(&mut self) {
        self.speed = 0;
    }

    pub fn set_speed(&mut self, speed: i64) {
        self.speed = speed.clamp(-self.max_speed, self.max_speed);
    }

    /// One step faster forward, or faster backward when `reverse` is set
    pub fn increment(&mut self, reverse: bool) -> i64 {
        self.set_speed(if reverse { self.speed - 1 } else { self.speed + 1 });
        self.speed
    }

    /// Move the selection by the current speed and return the new tick
    pub fn update(&mut self, sim: &mut Simulation) -> GravityResult<Tick> {
        let current = sim.tick();

        if self.speed > 0 {
            let target = current + self.speed as u64;
            while sim.max_tick() < target {
                sim.advance()?;
            }
            sim.select_tick(target)?;
        } else if self.speed < 0 {
            let min = sim.min_tick();
            let target = current.saturating_sub(self.speed.unsigned_abs()).max(min);
            if target == min {
                debug!("Rewind reached tick {}, pausing", min);
                self.pause();
            }
            sim.select_tick(target)?;
        }

        Ok(sim.tick())
    }
}
