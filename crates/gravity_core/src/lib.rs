pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{DiscConfig, ScenarioConfig, SimConfig};
pub use constants::*;
pub use error::{GravityError, GravityResult};
pub use types::*;
