use gravity_core::Vec2;

use crate::body::Body;

/// Total kinetic energy of the existing bodies
pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .filter(|b| b.exists())
        .map(|b| 0.5 * b.mass * b.velocity.length_squared())
        .sum()
}

/// Total linear momentum of the existing bodies
pub fn momentum(bodies: &[Body]) -> Vec2 {
    bodies
        .iter()
        .filter(|b| b.exists())
        .map(|b| b.velocity * b.mass)
        .sum()
}

/// Mass-weighted centre of the existing bodies, `None` when there are none
pub fn center_of_mass(bodies: &[Body]) -> Option<Vec2> {
    let (weighted, total) = bodies
        .iter()
        .filter(|b| b.exists())
        .fold((Vec2::ZERO, 0.0), |(sum, mass), b| {
            (sum + b.position * b.mass, mass + b.mass)
        });

    (total > 0.0).then(|| weighted / total)
}
