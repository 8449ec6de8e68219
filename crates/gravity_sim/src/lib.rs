pub mod integrator;
pub mod playback;
pub mod simulation;

pub use integrator::{Integrator, StepReport};
pub use playback::Playback;
pub use simulation::Simulation;
