//! Per-user caches for load states and baselines
//!
//! The engine is stateless; callers that analyze the same users repeatedly
//! hand it an [`EngineCache`] to skip refolding long load histories and
//! re-deriving baselines. Entries carry the key they were computed under
//! and are ignored when the key no longer matches. Concurrent writers for
//! the same user overwrite each other (last writer wins); a poisoned lock is
//! recovered since every entry is a complete value.

use crate::baseline::Baselines;
use crate::models::DailyMetricPoint;
use crate::pmc::LoadState;
use chrono::{Days, NaiveDate};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, RwLock};
use tracing::debug;

/// Invalidation key for cached baselines
///
/// Covers every HRV and resting-HR value inside the baseline window, so a
/// corrected reading changes the key even when no day is added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaselineKey {
    /// Evaluation day
    pub as_of: NaiveDate,

    pub window_days: u32,

    /// Number of days with a point inside the window
    pub point_count: usize,

    /// Hash of the windowed (day, HRV, resting HR) triples
    pub digest: u64,
}

impl BaselineKey {
    pub fn new(
        as_of: NaiveDate,
        window_days: u32,
        points: &BTreeMap<NaiveDate, DailyMetricPoint>,
    ) -> Self {
        let window_days = window_days.max(1);
        let window_start = as_of
            .checked_sub_days(Days::new(u64::from(window_days)))
            .unwrap_or(NaiveDate::MIN);

        let mut hasher = DefaultHasher::new();
        let mut point_count = 0;
        for (date, point) in points.range(window_start..as_of) {
            date.hash(&mut hasher);
            point.hrv_ms.map(f64::to_bits).hash(&mut hasher);
            point.resting_hr.map(f64::to_bits).hash(&mut hasher);
            point_count += 1;
        }

        BaselineKey {
            as_of,
            window_days,
            point_count,
            digest: hasher.finish(),
        }
    }
}

/// Fingerprint of the daily loads a cached state was folded from
///
/// Hashes every (day, load) pair in order, so load moved between days is
/// caught as well as load added or changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadFingerprint {
    pub first_day: NaiveDate,
    pub days: usize,
    pub digest: u64,
}

impl LoadFingerprint {
    /// Fingerprint of every load on or before `through`
    pub fn of(daily_loads: &BTreeMap<NaiveDate, f64>, through: NaiveDate) -> Option<Self> {
        let mut range = daily_loads.range(..=through).peekable();
        let (&first_day, _) = range.peek().copied()?;

        let mut hasher = DefaultHasher::new();
        let mut days = 0;
        for (date, load) in range {
            date.hash(&mut hasher);
            load.to_bits().hash(&mut hasher);
            days += 1;
        }

        Some(LoadFingerprint {
            first_day,
            days,
            digest: hasher.finish(),
        })
    }
}

#[derive(Debug, Clone)]
struct LoadEntry {
    state: LoadState,
    fingerprint: LoadFingerprint,
}

/// Cache statistics and metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetrics {
    pub total_lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub invalidations: u64,
}

impl CacheMetrics {
    /// Get hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        if self.total_lookups == 0 {
            return 0.0;
        }
        (self.cache_hits as f64 / self.total_lookups as f64) * 100.0
    }
}

/// Thread-safe per-user cache
#[derive(Debug, Default)]
pub struct EngineCache {
    load_states: RwLock<HashMap<String, LoadEntry>>,
    baselines: RwLock<HashMap<String, (BaselineKey, Baselines)>>,
    metrics: Mutex<CacheMetrics>,
}

impl EngineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached baselines if they were computed under `key`
    pub fn baselines(&self, user_id: &str, key: &BaselineKey) -> Option<Baselines> {
        let guard = self.baselines.read().unwrap_or_else(|e| e.into_inner());
        let found = match guard.get(user_id) {
            Some((cached_key, baselines)) if cached_key == key => Some(baselines.clone()),
            Some(_) => {
                self.record(|m| m.invalidations += 1);
                None
            }
            None => None,
        };
        drop(guard);

        self.record_lookup(found.is_some());
        found
    }

    pub fn store_baselines(&self, user_id: &str, key: BaselineKey, baselines: Baselines) {
        let mut guard = self.baselines.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(user_id.to_string(), (key, baselines));
    }

    /// Latest cached state that can be resumed toward `as_of`
    ///
    /// The state is only returned when the loads it was folded from are
    /// unchanged and it does not lie after `as_of`.
    pub fn resumable_state(
        &self,
        user_id: &str,
        daily_loads: &BTreeMap<NaiveDate, f64>,
        as_of: NaiveDate,
    ) -> Option<LoadState> {
        let guard = self.load_states.read().unwrap_or_else(|e| e.into_inner());
        let found = guard.get(user_id).and_then(|entry| {
            if entry.state.date() > as_of {
                return None;
            }
            let current = LoadFingerprint::of(daily_loads, entry.state.date());
            if current == Some(entry.fingerprint) {
                Some(entry.state)
            } else {
                debug!(user_id, "load history changed, dropping cached state");
                self.record(|m| m.invalidations += 1);
                None
            }
        });
        drop(guard);

        self.record_lookup(found.is_some());
        found
    }

    pub fn store_load_state(
        &self,
        user_id: &str,
        state: LoadState,
        daily_loads: &BTreeMap<NaiveDate, f64>,
    ) {
        let Some(fingerprint) = LoadFingerprint::of(daily_loads, state.date()) else {
            return;
        };
        let mut guard = self.load_states.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(user_id.to_string(), LoadEntry { state, fingerprint });
    }

    /// Drop everything cached for a user
    pub fn invalidate(&self, user_id: &str) {
        self.load_states
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(user_id);
        self.baselines
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(user_id);
        self.record(|m| m.invalidations += 1);
    }

    pub fn clear(&self) {
        self.load_states
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.baselines
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of users with a cached load state
    pub fn len(&self) -> usize {
        self.load_states
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record_lookup(&self, hit: bool) {
        self.record(|m| {
            m.total_lookups += 1;
            if hit {
                m.cache_hits += 1;
            } else {
                m.cache_misses += 1;
            }
        });
    }

    fn record(&self, update: impl FnOnce(&mut CacheMetrics)) {
        let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut metrics);
    }
}
