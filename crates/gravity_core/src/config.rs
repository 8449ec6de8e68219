use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{GravityError, GravityResult};
use crate::types::BodySpec;

/// Simulation configuration. Supplied once at construction, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Gravitational constant
    pub g: f64,
    /// Integration sub-steps per tick
    pub physics_steps: u32,
    /// Minimum number of bodies classified as direct gravity sources
    pub real_bodies_min: usize,
    /// Mass above which a body is always a direct gravity source
    pub real_mass_threshold: f64,
    /// Ceiling for retained history, in bytes
    pub max_cache_memory: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            g: DEFAULT_G,
            physics_steps: DEFAULT_PHYSICS_STEPS,
            real_bodies_min: DEFAULT_REAL_BODIES_MIN,
            real_mass_threshold: DEFAULT_REAL_MASS_THRESHOLD,
            max_cache_memory: DEFAULT_MAX_CACHE_MEMORY,
        }
    }
}

impl SimConfig {
    /// Parse and validate a YAML mapping. Missing keys fall back to defaults.
    pub fn from_yaml_str(source: &str) -> GravityResult<Self> {
        let config: Self =
            serde_yaml::from_str(source).map_err(|e| GravityError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GravityResult<()> {
        if !(self.g.is_finite() && self.g > 0.0) {
            return Err(GravityError::config(format!(
                "g must be a positive finite number, got {}",
                self.g
            )));
        }
        if self.physics_steps == 0 {
            return Err(GravityError::config("physics_steps must be at least 1"));
        }
        if !(self.real_mass_threshold.is_finite() && self.real_mass_threshold > 0.0) {
            return Err(GravityError::config(format!(
                "real_mass_threshold must be a positive finite number, got {}",
                self.real_mass_threshold
            )));
        }
        if self.max_cache_memory == 0 {
            return Err(GravityError::config("max_cache_memory must be non-zero"));
        }
        Ok(())
    }

    /// Length of one sub-step in ticks
    pub fn sub_step(&self) -> f64 {
        1.0 / self.physics_steps as f64
    }
}

/// Parameters for a generated disc of bodies orbiting a central star
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscConfig {
    /// Number of orbiting bodies (the star is extra)
    pub body_count: u32,
    /// Random seed for deterministic generation
    pub seed: u64,
    pub star_mass: f64,
    pub body_mass_min: f64,
    pub body_mass_max: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Default for DiscConfig {
    fn default() -> Self {
        Self {
            body_count: 200,
            seed: 42,
            star_mass: 10_000.0,
            body_mass_min: 0.5,
            body_mass_max: 20.0,
            inner_radius: 40.0,
            outer_radius: 400.0,
        }
    }
}

impl DiscConfig {
    pub fn validate(&self) -> GravityResult<()> {
        if !(self.star_mass.is_finite() && self.star_mass > 0.0) {
            return Err(GravityError::config("disc star_mass must be positive"));
        }
        if !(self.body_mass_min > 0.0 && self.body_mass_min <= self.body_mass_max) {
            return Err(GravityError::config(
                "disc body masses must satisfy 0 < body_mass_min <= body_mass_max",
            ));
        }
        if !(self.inner_radius > 0.0 && self.inner_radius < self.outer_radius) {
            return Err(GravityError::config(
                "disc radii must satisfy 0 < inner_radius < outer_radius",
            ));
        }
        Ok(())
    }
}

/// A complete headless run: configuration, initial population and duration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub simulation: SimConfig,
    /// Generated disc, created before the explicit bodies
    pub disc: Option<DiscConfig>,
    /// Explicitly placed bodies
    pub bodies: Vec<BodySpec>,
    /// Ticks to simulate after creation
    pub ticks: u64,
}

impl ScenarioConfig {
    pub fn from_yaml_str(source: &str) -> GravityResult<Self> {
        let scenario: Self =
            serde_yaml::from_str(source).map_err(|e| GravityError::config(e.to_string()))?;
        scenario.simulation.validate()?;
        if let Some(disc) = &scenario.disc {
            disc.validate()?;
        }
        Ok(scenario)
    }
}
