// Simulation units are dimensionless: one tick is one unit of time, and with
// the default G = 1 a mass of M at distance d accelerates a neighbour by M / d².

/// Default gravitational constant
pub const DEFAULT_G: f64 = 1.0;

/// Default number of integration sub-steps per tick
pub const DEFAULT_PHYSICS_STEPS: u32 = 4;

/// Default minimum number of bodies treated as direct gravity sources
pub const DEFAULT_REAL_BODIES_MIN: usize = 100;

/// Default mass above which a body is always a direct gravity source
pub const DEFAULT_REAL_MASS_THRESHOLD: f64 = 250.0;

/// Default ceiling for retained history (320 MiB)
pub const DEFAULT_MAX_CACHE_MEMORY: u64 = 320 * 1024 * 1024;

/// Floor applied to squared distances before dividing.
/// Coincident bodies would otherwise produce infinite attraction and NaN state.
pub const MIN_DISTANCE_SQUARED: f64 = 1e-6;

/// Number of scalars packed into one tick record
pub const RECORD_FIELDS: usize = 6;

/// Bytes used by one retained tick record
pub const RECORD_BYTES: u64 = (RECORD_FIELDS * std::mem::size_of::<f64>()) as u64;

/// Parent slot value for a record whose body had no dominant attractor
pub const NO_PARENT: f64 = -1.0;
