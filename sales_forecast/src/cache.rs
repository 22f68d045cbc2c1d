//! Memoisation of forecasts by input fingerprint
//!
//! Entries are keyed by a SHA-256 digest of the full series content, the
//! horizon and the model order, never by object identity. Each key owns its
//! own slot lock, so concurrent requests for the same fingerprint fit the
//! model once and share the outcome, while requests for different
//! fingerprints proceed in parallel. A failed fit is handed to the requests
//! that were already waiting on it and then forgotten; later requests retry.

use crate::config::EngineConfig;
use crate::error::{ForecastError, Result};
use crate::models::ModelSpec;
use crate::series::{ActualSeries, ForecastSeries};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Content digest of `(series, horizon, model)`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(series: &ActualSeries, horizon: usize, model: &ModelSpec) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"sales-forecast:v1:");
        for order in [model.p, model.d, model.q, horizon] {
            hasher.update((order as u64).to_le_bytes());
        }
        hasher.update((series.len() as u64).to_le_bytes());
        for observation in series.iter() {
            let date = observation.period.date();
            hasher.update(date.to_string().as_bytes());
            hasher.update(observation.value.to_bits().to_le_bytes());
        }
        Fingerprint(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_string()[..16])
    }
}

/// Counters describing cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Outcome of a cached lookup; failures are shared, not cloned
pub type CacheResult = std::result::Result<Arc<ForecastSeries>, Arc<ForecastError>>;

#[derive(Debug, Default)]
struct Slot {
    /// Finished fit attempts, successful or not
    attempts: AtomicU64,
    state: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    forecast: Option<Arc<ForecastSeries>>,
    /// Most recent failure and the attempt number that produced it
    failure: Option<(u64, Arc<ForecastError>)>,
}

#[derive(Debug, Default)]
struct Entries {
    slots: HashMap<Fingerprint, Arc<Slot>>,
    /// Least recently used first
    order: VecDeque<Fingerprint>,
}

/// Bounded forecast cache shared between sessions
#[derive(Debug)]
pub struct ForecastCache {
    capacity: usize,
    entries: Mutex<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ForecastCache {
    /// A cache keeping at most `capacity` fingerprints (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// A cache sized by `config.cache_capacity`
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the stored forecast for these inputs, or run `compute`, store
    /// its result and return it.
    ///
    /// Requests already blocked on a fit that fails receive that same error
    /// without fitting again. The failure is not stored for anyone else; the
    /// next request retries.
    pub fn get_or_compute<F>(
        &self,
        series: &ActualSeries,
        horizon: usize,
        model: &ModelSpec,
        compute: F,
    ) -> CacheResult
    where
        F: FnOnce() -> Result<ForecastSeries>,
    {
        let key = Fingerprint::of(series, horizon, model);
        let slot = self.slot(key);
        let seen = slot.attempts.load(Ordering::Acquire);

        // Holding the slot lock across the fit serialises work per key
        let mut state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = state.forecast.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = ?key, "forecast cache hit");
            return Ok(Arc::clone(cached));
        }
        if let Some((attempt, err)) = state.failure.as_ref() {
            if *attempt > seen {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = ?key, error = %err, "sharing failed fit");
                return Err(Arc::clone(err));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(fingerprint = ?key, "forecast cache miss");
        let outcome = compute();
        let attempt = slot.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        match outcome {
            Ok(forecast) => {
                let forecast = Arc::new(forecast);
                state.forecast = Some(Arc::clone(&forecast));
                state.failure = None;
                Ok(forecast)
            }
            Err(err) => {
                let err = Arc::new(err);
                state.failure = Some((attempt, Arc::clone(&err)));
                Err(err)
            }
        }
    }

    /// Stored forecast for these inputs, without computing
    pub fn get(
        &self,
        series: &ActualSeries,
        horizon: usize,
        model: &ModelSpec,
    ) -> Option<Arc<ForecastSeries>> {
        let key = Fingerprint::of(series, horizon, model);
        let slot = self.lock_entries().slots.get(&key).cloned()?;
        let state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.forecast.as_ref().map(Arc::clone)
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut entries = self.lock_entries();
        entries.slots.clear();
        entries.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.lock_entries().slots.len(),
        }
    }

    /// Slot for `key`, created if missing; marks it most recently used and
    /// evicts the least recently used slots beyond capacity.
    fn slot(&self, key: Fingerprint) -> Arc<Slot> {
        let mut entries = self.lock_entries();

        if let Some(existing) = entries.slots.get(&key).cloned() {
            if let Some(pos) = entries.order.iter().position(|k| *k == key) {
                entries.order.remove(pos);
            }
            entries.order.push_back(key);
            return existing;
        }

        let slot = Arc::new(Slot::default());
        entries.slots.insert(key, Arc::clone(&slot));
        entries.order.push_back(key);

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.slots.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = ?oldest, "forecast cache eviction");
            }
        }

        slot
    }

    fn lock_entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
