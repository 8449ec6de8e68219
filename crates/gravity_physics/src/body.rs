use gravity_core::{BodyId, BodySpec, Bounds, TickRecord, Vec2};

/// Radius of a unit-density sphere holding `mass`.
/// Zero for anything that does not exist (non-positive or non-finite mass).
pub fn radius_from_mass(mass: f64) -> f64 {
    if mass.is_finite() && mass > 0.0 {
        (mass * 3.0 / (4.0 * std::f64::consts::PI)).cbrt()
    } else {
        0.0
    }
}

/// Physical state of one point mass plus the scratch fields of the current sub-step
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    /// NaN when the body is not present at the loaded tick
    pub mass: f64,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Force accumulated during the last force pass
    pub force: Vec2,
    /// Dominant attractor, never `id` itself
    pub link: Option<BodyId>,
    /// Direct gravity source in the last classification pass
    pub real: bool,
    pub bounds: Bounds,
}

impl Body {
    pub fn new(id: BodyId, spec: &BodySpec) -> Self {
        let mut body = Self {
            id,
            mass: spec.mass,
            position: spec.position,
            velocity: spec.velocity,
            force: Vec2::ZERO,
            link: None,
            real: false,
            bounds: Bounds::default(),
        };
        body.update_bounds();
        body
    }

    pub fn from_record(id: BodyId, record: &TickRecord) -> Self {
        let mut body = Self::absent(id);
        body.load(record);
        body
    }

    /// Placeholder for a body that does not exist at the loaded tick
    pub fn absent(id: BodyId) -> Self {
        Self {
            id,
            mass: f64::NAN,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            link: None,
            real: false,
            bounds: Bounds::default(),
        }
    }

    pub fn exists(&self) -> bool {
        self.mass.is_finite() && self.mass > 0.0
    }

    /// Present at the loaded tick, even if the caller has since zeroed its mass
    pub fn is_loaded(&self) -> bool {
        !self.mass.is_nan()
    }

    pub fn radius(&self) -> f64 {
        radius_from_mass(self.mass)
    }

    /// Mass, position and velocity all finite
    pub fn is_finite(&self) -> bool {
        self.mass.is_finite() && self.position.is_finite() && self.velocity.is_finite()
    }

    pub fn load(&mut self, record: &TickRecord) {
        self.mass = record.mass;
        self.position = record.pos();
        self.velocity = record.vel();
        self.force = Vec2::ZERO;
        self.link = record.parent_id().filter(|parent| *parent != self.id);
        self.update_bounds();
    }

    pub fn mark_absent(&mut self) {
        self.mass = f64::NAN;
        self.force = Vec2::ZERO;
        self.link = None;
        self.real = false;
    }

    pub fn to_record(&self) -> TickRecord {
        TickRecord::new(self.mass, self.position, self.velocity, self.link)
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Bounds::swept(self.position, self.radius(), self.velocity);
    }
}
