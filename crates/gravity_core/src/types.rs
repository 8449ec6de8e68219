use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{NO_PARENT, RECORD_FIELDS};

/// 2D vector used for positions, velocities and forces
pub type Vec2 = glam::DVec2;

/// Discrete unit of simulated time
pub type Tick = u64;

/// Stable identity of a body. Issued once by the history store, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Packed physical state of one body at one tick.
/// Must stay repr(C) and Pod so it can be viewed as a flat run of scalars.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TickRecord {
    pub mass: f64,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    /// Id of the dominant attractor when recorded, or `NO_PARENT`
    pub parent: f64,
}

impl TickRecord {
    pub fn new(mass: f64, position: Vec2, velocity: Vec2, parent: Option<BodyId>) -> Self {
        Self {
            mass,
            position: position.to_array(),
            velocity: velocity.to_array(),
            parent: parent.map_or(NO_PARENT, |id| id.0 as f64),
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn vel(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }

    pub fn parent_id(&self) -> Option<BodyId> {
        if self.parent >= 0.0 {
            Some(BodyId(self.parent as u64))
        } else {
            None
        }
    }

    /// Field order: mass, x, y, vx, vy, parent
    pub fn as_scalars(&self) -> &[f64; RECORD_FIELDS] {
        bytemuck::cast_ref(self)
    }

    pub fn from_scalars(scalars: [f64; RECORD_FIELDS]) -> Self {
        bytemuck::cast(scalars)
    }
}

/// Axis-aligned box covering a body and one tick of its motion
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Box around a circle swept along `velocity` for one tick
    pub fn swept(position: Vec2, radius: f64, velocity: Vec2) -> Self {
        let extent = Vec2::splat(radius);
        let mut min = position - extent;
        let mut max = position + extent;

        if velocity.x < 0.0 {
            min.x += velocity.x;
        } else {
            max.x += velocity.x;
        }
        if velocity.y < 0.0 {
            min.y += velocity.y;
        } else {
            max.y += velocity.y;
        }

        Self { min, max }
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Initial state of a body to be created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub mass: f64,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub velocity: Vec2,
}

impl BodySpec {
    pub fn new(mass: f64, position: Vec2, velocity: Vec2) -> Self {
        Self {
            mass,
            position,
            velocity,
        }
    }

    pub fn at_rest(mass: f64, position: Vec2) -> Self {
        Self::new(mass, position, Vec2::ZERO)
    }
}
