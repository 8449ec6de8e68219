use gravity_core::Vec2;

use crate::body::Body;

/// Velocity for a circular, counter-clockwise orbit around `parent`
pub fn orbital_velocity(position: Vec2, parent: &Body, g: f64) -> Vec2 {
    let relative = position - parent.position;
    let distance = relative.length();
    if distance <= 0.0 || !parent.exists() {
        return parent.velocity;
    }
    let speed = (g * parent.mass / distance).sqrt();
    parent.velocity + relative.perp() / distance * speed
}

/// Speed needed to escape `parent_mass` from `distance`
pub fn escape_speed(parent_mass: f64, distance: f64, g: f64) -> f64 {
    (2.0 * g * parent_mass / distance).sqrt()
}

/// Whether `child` moves fast enough relative to `parent` to leave it for good
pub fn is_escaping(child: &Body, parent: &Body, g: f64) -> bool {
    let distance = (child.position - parent.position).length();
    let relative_speed = (child.velocity - parent.velocity).length();
    relative_speed > escape_speed(parent.mass, distance, g)
}
