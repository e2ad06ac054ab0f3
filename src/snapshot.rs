// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::ephemeris_trait::EphemerisTrait;
use crate::error::OrreryError;
use crate::position_resolver::{Observation, resolve};

/// Enough for the longest sequence we accept, plus headroom for single-date
/// requests.
pub const DEFAULT_CACHE_CAPACITY: usize = 2000;

/// All body observations for one calendar date. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub planets: Vec<Observation>,
}

/// Builds Snapshots, memoized by date. Safe to share between request
/// handlers; the cache is the only mutable state.
pub struct SnapshotBuilder {
    ephemeris: Box<dyn EphemerisTrait + Send + Sync>,
    cache: Mutex<SnapshotCache>,
}

impl SnapshotBuilder {
    pub fn new(ephemeris: Box<dyn EphemerisTrait + Send + Sync>,
               cache_capacity: usize) -> Self {
        SnapshotBuilder{
            ephemeris,
            cache: Mutex::new(SnapshotCache::new(cache_capacity)),
        }
    }

    /// Returns the Snapshot for `date`. Repeated calls for a cached date
    /// return the same Arc without consulting the ephemeris.
    pub fn build(&self, date: NaiveDate) -> Result<Arc<Snapshot>, OrreryError> {
        if let Some(snapshot) = self.cache.lock().unwrap().get(&date) {
            debug!("Snapshot cache hit for {}", date);
            return Ok(snapshot);
        }
        debug!("Snapshot cache miss for {}", date);
        // The lock is not held while computing. Two callers racing on the same
        // date both compute the same value; the first insertion is kept.
        let snapshot = Arc::new(Snapshot{
            date,
            planets: resolve(self.ephemeris.as_ref(), date)?,
        });
        Ok(self.cache.lock().unwrap().insert(date, snapshot))
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

// Least-recently-used map from date to Snapshot. `recency` orders entries by
// the tick of their last access; the smallest tick is evicted first.
struct SnapshotCache {
    capacity: usize,
    tick: u64,
    entries: HashMap<NaiveDate, (Arc<Snapshot>, u64)>,
    recency: BTreeMap<u64, NaiveDate>,
}

impl SnapshotCache {
    fn new(capacity: usize) -> Self {
        SnapshotCache{
            capacity: capacity.max(1),
            tick: 0,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, date: &NaiveDate) -> Option<Arc<Snapshot>> {
        let tick = self.next_tick();
        let (snapshot, last_used) = self.entries.get_mut(date)?;
        self.recency.remove(&*last_used);
        *last_used = tick;
        self.recency.insert(tick, *date);
        Some(snapshot.clone())
    }

    // Returns the cached value for `date`: `snapshot` unless an entry was
    // already present.
    fn insert(&mut self, date: NaiveDate, snapshot: Arc<Snapshot>) -> Arc<Snapshot> {
        if let Some(existing) = self.get(&date) {
            return existing;
        }
        if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.recency.pop_first() {
                self.entries.remove(&oldest);
            }
        }
        let tick = self.next_tick();
        self.entries.insert(date, (snapshot.clone(), tick));
        self.recency.insert(tick, date);
        snapshot
    }
}

// mod tests.
