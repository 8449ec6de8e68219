use gravity_core::{BodyId, MIN_DISTANCE_SQUARED, SimConfig, Vec2};
use rayon::prelude::*;

use crate::body::Body;

/// Mass lent to real bodies by the pseudo bodies linked to them.
/// Working buffer of one sub-step; indices match the body slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoMass {
    /// Total mass lent to each body
    pub totals: Vec<f64>,
    /// Which body each pseudo body lent its mass to
    pub lent_to: Vec<Option<usize>>,
}

impl PseudoMass {
    fn new(len: usize) -> Self {
        Self {
            totals: vec![0.0; len],
            lent_to: vec![None; len],
        }
    }
}

/// Relative vector from `from` to `to` and its floored squared length
#[inline]
fn separation(from: Vec2, to: Vec2) -> (Vec2, f64) {
    let relative = to - from;
    (relative, relative.length_squared().max(MIN_DISTANCE_SQUARED))
}

/// Mark the real bodies and return their indices in slice (id) order.
///
/// A body is real if it ranks among the `real_bodies_min` most massive bodies
/// (mass descending, then id ascending) or if its mass exceeds the threshold.
pub fn classify(
    bodies: &mut [Body],
    real_bodies_min: usize,
    real_mass_threshold: f64,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..bodies.len()).collect();
    order.sort_by(|&a, &b| {
        bodies[b]
            .mass
            .total_cmp(&bodies[a].mass)
            .then(bodies[a].id.cmp(&bodies[b].id))
    });

    for (rank, &i) in order.iter().enumerate() {
        bodies[i].real = rank < real_bodies_min || bodies[i].mass > real_mass_threshold;
    }

    (0..bodies.len()).filter(|&i| bodies[i].real).collect()
}

/// Strongest real attractor of body `i`, using `source_mass` for each candidate
fn strongest(
    bodies: &[Body],
    real: &[usize],
    i: usize,
    g: f64,
    source_mass: impl Fn(usize) -> f64,
) -> Option<usize> {
    let mut best = None;
    let mut best_attraction = f64::NEG_INFINITY;

    for &j in real {
        if j == i {
            continue;
        }
        let (_, distance_squared) = separation(bodies[i].position, bodies[j].position);
        let attraction = g * source_mass(j) / distance_squared;
        if attraction > best_attraction {
            best_attraction = attraction;
            best = Some(j);
        }
    }

    best
}

/// Link every body to its strongest real attractor (base masses only) and
/// lump each pseudo body's mass onto that attractor.
pub fn assign_pseudo_mass(bodies: &mut [Body], real: &[usize], g: f64) -> PseudoMass {
    let mut pseudo = PseudoMass::new(bodies.len());

    for i in 0..bodies.len() {
        let link = strongest(bodies, real, i, g, |j| bodies[j].mass);
        bodies[i].link = link.map(|j| bodies[j].id);

        if !bodies[i].real {
            if let Some(j) = link {
                pseudo.totals[j] += bodies[i].mass;
                pseudo.lent_to[i] = Some(j);
            }
        }
    }

    pseudo
}

/// Snapshot of one real body as a gravity source for the force pass
struct Source {
    index: usize,
    id: BodyId,
    position: Vec2,
    mass: f64,
}

/// Net gravitational force on every body from the real set, with source
/// masses boosted by pseudo-mass. Also re-links every body using the boosted
/// attraction.
///
/// A pseudo body is not pulled by the mass it lent out itself. Target mass is
/// part of the force, so two real bodies always feel exactly opposite forces.
pub fn accumulate_forces(bodies: &mut [Body], real: &[usize], pseudo: &PseudoMass, g: f64) {
    let sources: Vec<Source> = real
        .iter()
        .map(|&j| Source {
            index: j,
            id: bodies[j].id,
            position: bodies[j].position,
            mass: bodies[j].mass + pseudo.totals[j],
        })
        .collect();

    bodies.par_iter_mut().enumerate().for_each(|(i, body)| {
        let mut force = Vec2::ZERO;
        let mut link = None;
        let mut best_attraction = f64::NEG_INFINITY;

        for source in &sources {
            if source.index == i {
                continue;
            }

            let source_mass = if pseudo.lent_to[i] == Some(source.index) {
                source.mass - body.mass
            } else {
                source.mass
            };

            let (relative, distance_squared) = separation(body.position, source.position);

            let attraction = g * source_mass / distance_squared;
            if attraction > best_attraction {
                best_attraction = attraction;
                link = Some(source.id);
            }

            let distance = distance_squared.sqrt();
            force += relative * (g * (body.mass * source_mass) / distance_squared) / distance;
        }

        body.force = force;
        body.link = link;
    });
}

/// Semi-implicit Euler step: velocity first, then position with the new velocity
pub fn integrate(bodies: &mut [Body], dt: f64) {
    bodies.par_iter_mut().for_each(|body| {
        body.velocity += body.force / body.mass * dt;
        body.position += body.velocity * dt;
        body.update_bounds();
    });
}

/// One full sub-step: classification, pseudo-mass, forces, integration.
/// `bodies` must be in id order and contain only existing bodies.
pub fn sub_step(bodies: &mut [Body], config: &SimConfig) {
    let real = classify(bodies, config.real_bodies_min, config.real_mass_threshold);
    let pseudo = assign_pseudo_mass(bodies, &real, config.g);
    accumulate_forces(bodies, &real, &pseudo, config.g);
    integrate(bodies, config.sub_step());
}
