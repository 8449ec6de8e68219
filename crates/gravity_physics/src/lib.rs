pub mod body;
pub mod broadphase;
pub mod diagnostics;
pub mod forces;
pub mod orbits;
pub mod procgen;

pub use body::{Body, radius_from_mass};
pub use broadphase::{BroadPhase, GridBroadPhase};
pub use forces::{PseudoMass, sub_step};
