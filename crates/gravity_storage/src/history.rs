use std::collections::{BTreeMap, VecDeque};

use gravity_core::{BodyId, GravityError, GravityResult, RECORD_BYTES, Tick, TickRecord};
use tracing::{debug, info};

/// What the integrator or the orchestrator reports for one body at one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickEntry {
    Alive(TickRecord),
    /// The body stops existing at this tick
    Destroyed,
}

/// Outcome of looking up one body at one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordStatus {
    Present(TickRecord),
    /// The body is created later, or never was in this timeline
    NotCreated,
    /// The body was destroyed at or before this tick
    Destroyed,
    /// The record was evicted, or the tick has not been simulated
    Unavailable,
}

impl RecordStatus {
    pub fn record(&self) -> Option<&TickRecord> {
        match self {
            Self::Present(record) => Some(record),
            _ => None,
        }
    }
}

/// Receiver of a completed tick
pub trait TickSink {
    fn write(&mut self, tick: Tick, entries: &[(BodyId, TickEntry)]) -> GravityResult<()>;
}

/// Time series of one body
#[derive(Debug, Clone)]
struct BodyHistory {
    created_at: Tick,
    /// First tick at which the body no longer exists
    destroyed_at: Option<Tick>,
    /// Tick of `records[0]`; moves forward when old ticks are evicted
    base: Tick,
    records: VecDeque<TickRecord>,
}

impl BodyHistory {
    fn new(tick: Tick) -> Self {
        Self {
            created_at: tick,
            destroyed_at: None,
            base: tick,
            records: VecDeque::new(),
        }
    }

    /// One past the last recorded tick
    fn end(&self) -> Tick {
        self.base + self.records.len() as Tick
    }

    fn get(&self, tick: Tick) -> Option<&TickRecord> {
        if tick < self.base {
            return None;
        }
        self.records.get((tick - self.base) as usize)
    }

    /// Records at `tick` and later
    fn records_from(&self, tick: Tick) -> u64 {
        self.end().saturating_sub(tick.max(self.base))
    }

    fn truncate_from(&mut self, tick: Tick) {
        let keep = tick.saturating_sub(self.base) as usize;
        self.records.truncate(keep);
    }

    fn is_destroyed_at(&self, tick: Tick) -> bool {
        self.destroyed_at.is_some_and(|d| tick >= d)
    }
}

/// Tick-indexed history of every body, bounded by a byte budget.
///
/// Ticks are evicted oldest first, a whole tick at a time, and never at or
/// after the tick being written, so the latest tick can always be resumed.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    bodies: BTreeMap<BodyId, BodyHistory>,
    next_id: u64,
    max_tick: Tick,
    /// Earliest tick that has not been evicted
    min_tick: Tick,
    /// Retained records across all bodies
    retained: u64,
    budget: u64,
}

impl HistoryStore {
    pub fn new(budget: u64) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 0,
            max_tick: 0,
            min_tick: 0,
            retained: 0,
            budget,
        }
    }

    /// Issue a fresh id. Ids are never reused, even after destruction or
    /// invalidation.
    pub fn allocate_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn max_tick(&self) -> Tick {
        self.max_tick
    }

    pub fn min_tick(&self) -> Tick {
        self.min_tick
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn bytes_used(&self) -> u64 {
        self.retained * RECORD_BYTES
    }

    /// Whether `id` has a history in the current timeline
    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Ids with a history in the current timeline, ascending
    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    /// First and last retained tick of a body, if any record is retained
    pub fn retained_range(&self, id: BodyId) -> Option<(Tick, Tick)> {
        let history = self.bodies.get(&id)?;
        (!history.records.is_empty()).then(|| (history.base, history.end() - 1))
    }

    pub fn status(&self, id: BodyId, tick: Tick) -> RecordStatus {
        if tick > self.max_tick {
            return RecordStatus::Unavailable;
        }
        let Some(history) = self.bodies.get(&id) else {
            return RecordStatus::NotCreated;
        };
        if tick < history.created_at {
            return RecordStatus::NotCreated;
        }
        if history.is_destroyed_at(tick) {
            return RecordStatus::Destroyed;
        }
        history
            .get(tick)
            .map_or(RecordStatus::Unavailable, |record| RecordStatus::Present(*record))
    }

    /// Every body present at `tick`, by id
    pub fn read(&self, tick: Tick) -> BTreeMap<BodyId, TickRecord> {
        if tick > self.max_tick {
            return BTreeMap::new();
        }
        self.bodies
            .iter()
            .filter(|(_, history)| !history.is_destroyed_at(tick))
            .filter_map(|(id, history)| history.get(tick).map(|record| (*id, *record)))
            .collect()
    }

    fn invalid_tick(&self, tick: Tick) -> GravityError {
        GravityError::InvalidTick {
            tick,
            min: self.min_tick,
            max: self.max_tick,
        }
    }

    /// Check one entry against the current state and return the change in
    /// retained records it would cause.
    fn plan_entry(&self, tick: Tick, id: BodyId, entry: &TickEntry) -> GravityResult<i64> {
        if id.0 >= self.next_id {
            return Err(GravityError::UnknownBody(id));
        }
        let Some(history) = self.bodies.get(&id) else {
            return Ok(match entry {
                TickEntry::Alive(_) => 1,
                TickEntry::Destroyed => 0,
            });
        };

        if matches!(entry, TickEntry::Destroyed) && history.is_destroyed_at(tick) {
            return Ok(0);
        }
        if tick < history.base || tick > history.end() {
            return Err(self.invalid_tick(tick));
        }

        match entry {
            TickEntry::Alive(_) => {
                if history.is_destroyed_at(tick) {
                    return Err(self.invalid_tick(tick));
                }
                Ok(if tick == history.end() { 1 } else { 0 })
            }
            TickEntry::Destroyed => Ok(-(history.records_from(tick) as i64)),
        }
    }

    /// Earliest tick to retain so that `records` fit the budget, evicting
    /// only ticks before `limit`.
    fn plan_eviction(&self, records: u64, limit: Tick) -> GravityResult<Tick> {
        let capacity = self.budget / RECORD_BYTES;
        let mut remaining = records;
        let mut watermark = self.min_tick;

        while remaining > capacity {
            if watermark >= limit {
                return Err(GravityError::OutOfBudget {
                    budget: self.budget,
                    required: remaining * RECORD_BYTES,
                });
            }
            let freed = self
                .bodies
                .values()
                .filter(|history| history.get(watermark).is_some())
                .count() as u64;
            remaining -= freed;
            watermark += 1;
        }

        Ok(watermark)
    }

    fn evict_before(&mut self, watermark: Tick) {
        if watermark <= self.min_tick {
            return;
        }
        let mut evicted = 0u64;
        for history in self.bodies.values_mut() {
            while history.base < watermark && !history.records.is_empty() {
                history.records.pop_front();
                history.base += 1;
                evicted += 1;
            }
        }
        info!(
            "Evicted ticks {}..{} ({} records), retaining {} of {} bytes",
            self.min_tick,
            watermark,
            evicted,
            (self.retained - evicted) * RECORD_BYTES,
            self.budget
        );
        self.retained -= evicted;
        self.min_tick = watermark;
    }

    /// Record `entries` at `tick`.
    ///
    /// `tick` may overwrite any retained tick or be exactly one past
    /// `max_tick`, which advances it. Ids without a history start one here.
    /// Validation and eviction planning happen before anything is changed, so
    /// a failed write leaves the store untouched.
    pub fn write(&mut self, tick: Tick, entries: &[(BodyId, TickEntry)]) -> GravityResult<()> {
        if tick < self.min_tick || tick > self.max_tick + 1 {
            return Err(self.invalid_tick(tick));
        }

        let mut delta = 0i64;
        for (id, entry) in entries {
            delta += self.plan_entry(tick, *id, entry)?;
        }
        let records = (self.retained as i64 + delta).max(0) as u64;
        let watermark = self.plan_eviction(records, tick)?;

        self.evict_before(watermark);

        for (id, entry) in entries {
            let history = self
                .bodies
                .entry(*id)
                .or_insert_with(|| BodyHistory::new(tick));

            match entry {
                TickEntry::Alive(record) => {
                    if tick == history.end() {
                        history.records.push_back(*record);
                        self.retained += 1;
                    } else if let Some(slot) =
                        history.records.get_mut((tick - history.base) as usize)
                    {
                        *slot = *record;
                    }
                }
                TickEntry::Destroyed => {
                    if history.is_destroyed_at(tick) {
                        continue;
                    }
                    self.retained -= history.records_from(tick);
                    history.truncate_from(tick);
                    history.destroyed_at = Some(tick);
                    debug!("Body {} destroyed at tick {}", id, tick);
                }
            }
        }

        if tick > self.max_tick {
            self.max_tick = tick;
        }
        Ok(())
    }

    /// Discard everything recorded after `tick` and make it the latest tick.
    /// Bodies created after `tick` are forgotten. Returns the number of
    /// discarded records.
    pub fn invalidate_after(&mut self, tick: Tick) -> GravityResult<u64> {
        if tick < self.min_tick || tick > self.max_tick {
            return Err(self.invalid_tick(tick));
        }

        let mut discarded = 0u64;
        self.bodies.retain(|_, history| {
            if history.created_at > tick {
                discarded += history.records.len() as u64;
                return false;
            }
            if history.destroyed_at.is_some_and(|d| d > tick) {
                history.destroyed_at = None;
            }
            discarded += history.records_from(tick + 1);
            history.truncate_from(tick + 1);
            true
        });

        self.retained -= discarded;
        if tick < self.max_tick {
            debug!(
                "Invalidated ticks {}..={} ({} records)",
                tick + 1,
                self.max_tick,
                discarded
            );
        }
        self.max_tick = tick;
        Ok(discarded)
    }
}

impl TickSink for HistoryStore {
    fn write(&mut self, tick: Tick, entries: &[(BodyId, TickEntry)]) -> GravityResult<()> {
        HistoryStore::write(self, tick, entries)
    }
}
