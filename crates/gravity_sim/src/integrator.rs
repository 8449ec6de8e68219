use std::collections::BTreeMap;

use gravity_core::{BodyId, GravityResult, SimConfig, Tick, TickRecord};
use gravity_physics::{Body, BroadPhase, sub_step};
use gravity_storage::{TickEntry, TickSink};
use tracing::{debug, warn};

/// What happened while producing one tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepReport {
    /// The tick that was written
    pub tick: Tick,
    /// Bodies alive at `tick`
    pub alive: usize,
    /// Bodies that stopped existing during the step
    pub destroyed: Vec<BodyId>,
    /// Broad-phase candidate pairs at `tick`, empty without a broad phase
    pub contacts: Vec<(BodyId, BodyId)>,
}

/// Turns the snapshot of one tick into the next.
///
/// Holds no state besides its configuration: the same snapshot always yields
/// the same next tick.
pub struct Integrator {
    config: SimConfig,
    broad_phase: Option<Box<dyn BroadPhase>>,
}

impl Integrator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            broad_phase: None,
        }
    }

    pub fn with_broad_phase(mut self, broad_phase: impl BroadPhase + 'static) -> Self {
        self.broad_phase = Some(Box::new(broad_phase));
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run `physics_steps` sub-steps over `bodies` (id order).
    /// Returns the survivors and the ids of bodies that stopped existing.
    pub fn advance(&self, bodies: Vec<Body>) -> (Vec<Body>, Vec<BodyId>) {
        let mut alive = bodies;
        let mut destroyed = Vec::new();
        drop_vanished(&mut alive, &mut destroyed);

        for _ in 0..self.config.physics_steps {
            if alive.is_empty() {
                break;
            }
            sub_step(&mut alive, &self.config);
            drop_vanished(&mut alive, &mut destroyed);
        }

        destroyed.sort();
        (alive, destroyed)
    }

    /// Advance the snapshot recorded at `tick` and write `tick + 1` to `sink`
    /// in a single call.
    pub fn step(
        &self,
        tick: Tick,
        snapshot: &BTreeMap<BodyId, TickRecord>,
        sink: &mut impl TickSink,
    ) -> GravityResult<StepReport> {
        let bodies = snapshot
            .iter()
            .map(|(id, record)| Body::from_record(*id, record))
            .collect();

        let (alive, destroyed) = self.advance(bodies);

        let mut entries: Vec<(BodyId, TickEntry)> = alive
            .iter()
            .map(|body| (body.id, TickEntry::Alive(body.to_record())))
            .chain(destroyed.iter().map(|id| (*id, TickEntry::Destroyed)))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let next = tick + 1;
        sink.write(next, &entries)?;

        let contacts = self
            .broad_phase
            .as_ref()
            .map(|bp| bp.candidate_pairs(&alive))
            .unwrap_or_default();

        debug!(
            "Tick {}: {} bodies, {} destroyed, {} contacts",
            next,
            alive.len(),
            destroyed.len(),
            contacts.len()
        );

        Ok(StepReport {
            tick: next,
            alive: alive.len(),
            destroyed,
            contacts,
        })
    }
}

/// Move bodies that no longer exist, or hold non-finite state, out of the
/// working set. A non-finite body must never reach the force pass as a source.
fn drop_vanished(bodies: &mut Vec<Body>, destroyed: &mut Vec<BodyId>) {
    bodies.retain(|body| {
        if !body.exists() {
            destroyed.push(body.id);
            false
        } else if !body.is_finite() {
            warn!("Body {} left finite range and is destroyed", body.id);
            destroyed.push(body.id);
            false
        } else {
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_core::{GravityError, Vec2};
    use gravity_physics::GridBroadPhase;

    /// Sink that keeps every write, for inspection
    #[derive(Default)]
    struct Recorder {
        writes: Vec<(Tick, Vec<(BodyId, TickEntry)>)>,
    }

    impl TickSink for Recorder {
        fn write(&mut self, tick: Tick, entries: &[(BodyId, TickEntry)]) -> GravityResult<()> {
            self.writes.push((tick, entries.to_vec()));
            Ok(())
        }
    }

    struct Refuse;

    impl TickSink for Refuse {
        fn write(&mut self, _tick: Tick, _entries: &[(BodyId, TickEntry)]) -> GravityResult<()> {
            Err(GravityError::OutOfBudget { budget: 0, required: 48 })
        }
    }

    fn config(physics_steps: u32) -> SimConfig {
        SimConfig {
            g: 1.0,
            physics_steps,
            real_bodies_min: 1,
            real_mass_threshold: 50.0,
            ..SimConfig::default()
        }
    }

    fn snapshot(bodies: &[(u64, f64, Vec2)]) -> BTreeMap<BodyId, TickRecord> {
        bodies
            .iter()
            .map(|(id, mass, pos)| (BodyId(*id), TickRecord::new(*mass, *pos, Vec2::ZERO, None)))
            .collect()
    }

    #[test]
    fn emits_one_write_for_the_next_tick() {
        let integrator = Integrator::new(config(4));
        let snap = snapshot(&[(0, 100.0, Vec2::ZERO), (1, 1.0, Vec2::new(10.0, 0.0))]);
        let mut recorder = Recorder::default();

        let report = integrator.step(7, &snap, &mut recorder).unwrap();

        assert_eq!(report.tick, 8);
        assert_eq!(report.alive, 2);
        assert_eq!(recorder.writes.len(), 1);
        let (tick, entries) = &recorder.writes[0];
        assert_eq!(*tick, 8);
        assert_eq!(entries.iter().map(|(id, _)| id.0).collect::<Vec<_>>(), vec![0, 1]);
        let TickEntry::Alive(light) = entries[1].1 else {
            panic!("light body should survive");
        };
        assert_eq!(light.parent_id(), Some(BodyId(0)));
        assert!(light.pos().x < 10.0);
    }

    #[test]
    fn same_snapshot_same_result() {
        let integrator = Integrator::new(config(3));
        let snap = snapshot(&[
            (0, 300.0, Vec2::new(0.0, 0.0)),
            (1, 2.0, Vec2::new(5.0, 1.0)),
            (2, 7.0, Vec2::new(-3.0, 4.0)),
            (3, 80.0, Vec2::new(9.0, -2.0)),
        ]);
        let mut first = Recorder::default();
        let mut second = Recorder::default();
        integrator.step(0, &snap, &mut first).unwrap();
        integrator.step(0, &snap, &mut second).unwrap();
        assert_eq!(first.writes, second.writes);
    }

    #[test]
    fn massless_bodies_are_reported_destroyed() {
        let integrator = Integrator::new(config(2));
        let snap = snapshot(&[(0, 10.0, Vec2::ZERO), (1, 0.0, Vec2::new(1.0, 0.0))]);
        let mut recorder = Recorder::default();

        let report = integrator.step(0, &snap, &mut recorder).unwrap();

        assert_eq!(report.destroyed, vec![BodyId(1)]);
        assert_eq!(recorder.writes[0].1[1], (BodyId(1), TickEntry::Destroyed));
    }

    #[test]
    fn non_finite_bodies_are_destroyed() {
        let integrator = Integrator::new(config(1));
        let mut snap = snapshot(&[(0, 10.0, Vec2::ZERO)]);
        snap.insert(BodyId(1), TickRecord::new(1.0, Vec2::new(f64::NAN, 0.0), Vec2::ZERO, None));
        let (alive, destroyed) = integrator.advance(
            snap.iter().map(|(id, r)| Body::from_record(*id, r)).collect(),
        );
        assert_eq!(alive.len(), 1);
        assert_eq!(destroyed, vec![BodyId(1)]);
    }

    #[test]
    fn non_finite_source_does_not_poison_the_others() {
        let integrator = Integrator::new(SimConfig {
            real_bodies_min: 3,
            ..config(2)
        });
        let mut snap = snapshot(&[(0, 100.0, Vec2::ZERO), (2, 100.0, Vec2::new(0.0, 10.0))]);
        snap.insert(
            BodyId(1),
            TickRecord::new(100.0, Vec2::new(f64::NAN, 0.0), Vec2::ZERO, None),
        );
        let mut recorder = Recorder::default();

        let report = integrator.step(0, &snap, &mut recorder).unwrap();

        assert_eq!(report.alive, 2);
        assert_eq!(report.destroyed, vec![BodyId(1)]);
        for (id, entry) in &recorder.writes[0].1 {
            match entry {
                TickEntry::Alive(record) => {
                    assert!(record.pos().is_finite() && record.vel().is_finite(), "{id}");
                }
                TickEntry::Destroyed => assert_eq!(*id, BodyId(1)),
            }
        }
    }

    #[test]
    fn infinite_velocity_is_destroyed_before_stepping() {
        let integrator = Integrator::new(config(1));
        let body = Body::from_record(
            BodyId(0),
            &TickRecord::new(500.0, Vec2::ZERO, Vec2::new(f64::INFINITY, 0.0), None),
        );
        let (alive, destroyed) = integrator.advance(vec![body]);
        assert!(alive.is_empty());
        assert_eq!(destroyed, vec![BodyId(0)]);
    }

    #[test]
    fn sink_errors_propagate() {
        let integrator = Integrator::new(config(1));
        let snap = snapshot(&[(0, 10.0, Vec2::ZERO)]);
        assert!(integrator.step(0, &snap, &mut Refuse).is_err());
    }

    #[test]
    fn broad_phase_reports_contacts() {
        let config = SimConfig {
            g: 1e-9,
            ..config(1)
        };
        let integrator = Integrator::new(config).with_broad_phase(GridBroadPhase::new(4.0));
        let snap = snapshot(&[
            (0, 100.0, Vec2::ZERO),
            (1, 100.0, Vec2::new(3.0, 0.0)),
            (2, 1.0, Vec2::new(500.0, 0.0)),
        ]);
        let report = integrator.step(0, &snap, &mut Recorder::default()).unwrap();
        assert_eq!(report.contacts, vec![(BodyId(0), BodyId(1))]);
    }
}
