use gravity_core::{BodyId, BodySpec, DiscConfig, Vec2};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::body::Body;
use crate::orbits;

/// Generate a star at the origin surrounded by a disc of bodies on circular
/// orbits. The same config always yields the same bodies.
pub fn generate_disc(config: &DiscConfig, g: f64) -> Vec<BodySpec> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut specs = Vec::with_capacity(config.body_count as usize + 1);

    let star = BodySpec::at_rest(config.star_mass, Vec2::ZERO);
    let star_body = Body::new(BodyId(0), &star);
    specs.push(star);

    for _ in 0..config.body_count {
        let position = disc_position(config, &mut rng);
        let mass = rng.gen_range(config.body_mass_min..=config.body_mass_max);
        let velocity = orbits::orbital_velocity(position, &star_body, g);
        specs.push(BodySpec::new(mass, position, velocity));
    }

    specs
}

/// Uniform over the annulus area, not over radius
fn disc_position(config: &DiscConfig, rng: &mut impl Rng) -> Vec2 {
    let inner_sq = config.inner_radius * config.inner_radius;
    let outer_sq = config.outer_radius * config.outer_radius;
    let radius = rng.gen_range(inner_sq..outer_sq).sqrt();
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}
