use std::collections::BTreeMap;
use std::sync::Arc;

use gravity_core::{BodyId, BodySpec, GravityError, GravityResult, SimConfig, Tick};
use gravity_physics::{Body, BroadPhase};
use gravity_storage::{HistoryReader, HistoryStore, RecordStatus, SharedHistory, TickEntry};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::integrator::{Integrator, StepReport};

/// A simulation with a rewindable timeline.
///
/// Holds the bodies loaded at the selected tick. Changes made through
/// [`Simulation::body_mut`] stay in memory until [`Simulation::apply_edits`]
/// writes them back and discards the now stale future.
pub struct Simulation {
    config: SimConfig,
    history: SharedHistory,
    integrator: Integrator,
    /// Every body the store knows about, loaded at `tick`
    bodies: BTreeMap<BodyId, Body>,
    /// The selected tick; always inside the retained window
    tick: Tick,
    last_report: Option<StepReport>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> GravityResult<Self> {
        config.validate()?;
        info!(
            "Simulation: G={}, {} sub-steps/tick, {} real bodies min, threshold {}, \
             {} byte history",
            config.g,
            config.physics_steps,
            config.real_bodies_min,
            config.real_mass_threshold,
            config.max_cache_memory
        );

        let history = Arc::new(RwLock::new(HistoryStore::new(config.max_cache_memory)));
        Ok(Self {
            integrator: Integrator::new(config.clone()),
            config,
            history,
            bodies: BTreeMap::new(),
            tick: 0,
            last_report: None,
        })
    }

    pub fn from_yaml_str(source: &str) -> GravityResult<Self> {
        Self::new(SimConfig::from_yaml_str(source)?)
    }

    /// Report broad-phase contacts after every step
    pub fn with_broad_phase(mut self, broad_phase: impl BroadPhase + 'static) -> Self {
        self.integrator = Integrator::new(self.config.clone()).with_broad_phase(broad_phase);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn max_tick(&self) -> Tick {
        self.history.read().max_tick()
    }

    pub fn min_tick(&self) -> Tick {
        self.history.read().min_tick()
    }

    /// Read-only handle to the timeline, safe to hand to other threads
    pub fn history(&self) -> HistoryReader {
        HistoryReader::new(Arc::clone(&self.history))
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.last_report.as_ref()
    }

    /// Existing bodies at the selected tick, in id order
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values().filter(|body| body.exists())
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies().count()
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id).filter(|body| body.exists())
    }

    /// Mutable access for edits. Setting the mass to zero or below deletes
    /// the body once the edit is applied.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id).filter(|body| body.exists())
    }

    /// Load every body at `tick`. Unapplied edits are dropped.
    pub fn select_tick(&mut self, tick: Tick) -> GravityResult<()> {
        let history = Arc::clone(&self.history);
        let store = history.read();
        check_tick(&store, tick)?;
        self.load(&store, tick);
        Ok(())
    }

    /// Apply edits at the selected tick
    pub fn apply_edits(&mut self) -> GravityResult<()> {
        self.apply_edits_at(self.tick)
    }

    /// Make `tick` the newest tick and simulate one tick past it.
    ///
    /// If `tick` is the selected tick, the in-memory bodies are written back
    /// first. Everything after `tick` is discarded before the new tick is
    /// written, so the timeline ends at `tick + 1`.
    ///
    /// An out-of-range `tick` changes nothing. Any later failure, such as
    /// `OutOfBudget` while writing, leaves the timeline truncated at `tick`
    /// and reloads the selection from the store, so unapplied edits are lost.
    pub fn apply_edits_at(&mut self, tick: Tick) -> GravityResult<()> {
        self.rebranch(tick, &[]).map(|_| ())
    }

    /// Create a body at the selected tick
    pub fn create_body(&mut self, spec: BodySpec) -> GravityResult<BodyId> {
        let ids = self.create_bodies_at(&[spec], self.tick)?;
        Ok(ids[0])
    }

    pub fn create_bodies(&mut self, specs: &[BodySpec]) -> GravityResult<Vec<BodyId>> {
        self.create_bodies_at(specs, self.tick)
    }

    /// Create bodies at `tick` and re-simulate from there.
    ///
    /// Bodies created with a mass of zero or below are recorded as destroyed
    /// at `tick` and never appear.
    pub fn create_bodies_at(
        &mut self,
        specs: &[BodySpec],
        tick: Tick,
    ) -> GravityResult<Vec<BodyId>> {
        let ids = self.rebranch(tick, specs)?;
        info!("Created {} bodies at tick {}", ids.len(), tick);
        Ok(ids)
    }

    /// Simulate one new tick past the newest one and select it
    pub fn advance(&mut self) -> GravityResult<Tick> {
        let max = self.max_tick();
        if self.tick != max {
            self.select_tick(max)?;
        }
        self.apply_edits_at(max)?;
        self.select_tick(max + 1)?;
        Ok(max + 1)
    }

    /// Truncate the timeline at `tick`, write edits and new bodies there and
    /// simulate `tick + 1`, all under one write lock. Returns the ids given
    /// to `specs`. The selection is reloaded even when a later stage fails.
    fn rebranch(&mut self, tick: Tick, specs: &[BodySpec]) -> GravityResult<Vec<BodyId>> {
        let history = Arc::clone(&self.history);
        let mut store = history.write();
        check_tick(&store, tick)?;

        let created: Vec<(BodyId, TickEntry)> = specs
            .iter()
            .map(|spec| {
                let body = Body::new(store.allocate_id(), spec);
                (body.id, entry_for(&body))
            })
            .collect();
        let ids = created.iter().map(|(id, _)| *id).collect();

        let result = self.resimulate(&mut store, tick, created);

        let selected = self.tick.clamp(store.min_tick(), store.max_tick());
        self.load(&store, selected);
        result.map(|()| ids)
    }

    fn resimulate(
        &mut self,
        store: &mut HistoryStore,
        tick: Tick,
        created: Vec<(BodyId, TickEntry)>,
    ) -> GravityResult<()> {
        let discarded = store.invalidate_after(tick)?;
        self.bodies.retain(|id, _| store.contains(*id));

        let mut entries = created;
        if tick == self.tick {
            entries.extend(
                self.bodies
                    .values()
                    .filter(|body| {
                        matches!(store.status(body.id, tick), RecordStatus::Present(_))
                    })
                    .map(|body| (body.id, entry_for(body))),
            );
        }
        if !entries.is_empty() {
            entries.sort_by_key(|(id, _)| *id);
            store.write(tick, &entries)?;
        }
        for (id, _) in &entries {
            self.bodies.entry(*id).or_insert_with(|| Body::absent(*id));
        }

        let snapshot = store.read(tick);
        let report = self.integrator.step(tick, &snapshot, store)?;
        debug!(
            "Re-simulated from tick {} ({} records discarded), {} bodies alive",
            tick, discarded, report.alive
        );
        self.last_report = Some(report);
        Ok(())
    }

    fn load(&mut self, store: &HistoryStore, tick: Tick) {
        for (id, body) in self.bodies.iter_mut() {
            match store.status(*id, tick) {
                RecordStatus::Present(record) => body.load(&record),
                _ => body.mark_absent(),
            }
        }
        self.tick = tick;
    }
}

fn check_tick(store: &HistoryStore, tick: Tick) -> GravityResult<()> {
    if tick < store.min_tick() || tick > store.max_tick() {
        return Err(GravityError::InvalidTick {
            tick,
            min: store.min_tick(),
            max: store.max_tick(),
        });
    }
    Ok(())
}

fn entry_for(body: &Body) -> TickEntry {
    if body.exists() {
        TickEntry::Alive(body.to_record())
    } else {
        TickEntry::Destroyed
    }
}
