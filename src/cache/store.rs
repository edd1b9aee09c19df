//! Bounded in-memory cache for assembled forecast records.
//!
//! Two maps: records keyed by canonical location identity, and aliases
//! mapping user-typed names to those identities. Records go stale an hour
//! after capture and are evicted lazily on lookup; both maps are bounded and
//! shed their single globally-oldest entry when an insertion exceeds the
//! bound.

use crate::cache::resolver::{canonical_key, LocationQuery};
use crate::types::position::Position;
use crate::types::weather_data::WeatherData;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;

pub const DEFAULT_RECORD_CAPACITY: usize = 500;
pub const DEFAULT_ALIAS_CAPACITY: usize = 5000;

/// Maximum great-circle distance at which a coordinate query matches a
/// cached record, in kilometers.
pub const PROXIMITY_THRESHOLD_KM: f64 = 2.5;

const STALE_AFTER_MS: i64 = 3_600_000;

/// An alias map entry: the canonical identity it points at and when the
/// alias was last written. The target record may have been evicted since;
/// a dangling alias simply resolves to a miss.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub canonical: String,
    pub time: DateTime<Utc>,
}

/// The dual-key forecast cache.
///
/// Not internally synchronized; callers that share a store across tasks wrap
/// it in a mutex so that each `add`/`get` (including the staleness and
/// eviction scans inside them) runs as one atomic unit.
#[derive(Debug)]
pub struct WeatherStore {
    records: HashMap<String, WeatherData>,
    aliases: HashMap<String, AliasEntry>,
    record_capacity: usize,
    alias_capacity: usize,
}

impl Default for WeatherStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherStore {
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_RECORD_CAPACITY, DEFAULT_ALIAS_CAPACITY)
    }

    pub fn with_capacities(record_capacity: usize, alias_capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            aliases: HashMap::new(),
            record_capacity,
            alias_capacity,
        }
    }

    /// Inserts `record` under its uppercased location identity, overwriting
    /// any previous record for that identity. A non-empty `user_alias` is
    /// recorded (uppercased) as pointing at that identity, stamped with
    /// `now`. Exceeding either capacity evicts that map's single oldest
    /// entry. Never fails; `record.location` is expected to be non-empty.
    pub fn add(&mut self, mut record: WeatherData, user_alias: Option<&str>, now: DateTime<Utc>) {
        let identity = canonical_key(&record.location);
        record.location = identity.clone();
        self.records.insert(identity.clone(), record);

        if let Some(alias) = user_alias.filter(|a| !a.trim().is_empty()) {
            self.aliases.insert(
                canonical_key(alias),
                AliasEntry {
                    canonical: identity,
                    time: now,
                },
            );
            if self.aliases.len() > self.alias_capacity {
                evict_oldest(&mut self.aliases, |entry| entry.time);
            }
        }

        if self.records.len() > self.record_capacity {
            evict_oldest(&mut self.records, |record| record.time);
        }
    }

    /// Looks up a fresh record for `query` at time `now`.
    ///
    /// A stale record found on the way is removed and reported as a miss;
    /// the store never refetches on its own. Misses are a normal outcome,
    /// not an error.
    pub fn get(&mut self, query: &LocationQuery, now: DateTime<Utc>) -> Option<WeatherData> {
        match query {
            LocationQuery::Name(name) => self.find_by_name(name, now),
            LocationQuery::Position(position) => self.find_by_position(position, now),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    fn find_by_name(&mut self, name: &str, now: DateTime<Utc>) -> Option<WeatherData> {
        let key = canonical_key(name);
        // A matching alias redirects to the canonical identity; otherwise
        // the normalized name itself is tried as the identity.
        let identity = match self.aliases.get(&key) {
            Some(entry) => entry.canonical.clone(),
            None => key,
        };

        let record = self.records.get(&identity)?;
        if is_stale(record, now) {
            debug!("evicting stale record for {identity}");
            self.records.remove(&identity);
            return None;
        }
        Some(record.clone())
    }

    fn find_by_position(&mut self, position: &Position, now: DateTime<Utc>) -> Option<WeatherData> {
        let mut stale_keys = Vec::new();
        let mut hit = None;

        for (key, record) in &self.records {
            if is_stale(record, now) {
                stale_keys.push(key.clone());
                continue;
            }
            if record.position.distance_km(position) <= PROXIMITY_THRESHOLD_KM {
                hit = Some(record.clone());
                break;
            }
        }

        for key in stale_keys {
            debug!("evicting stale record for {key}");
            self.records.remove(&key);
        }
        hit
    }
}

fn is_stale(record: &WeatherData, now: DateTime<Utc>) -> bool {
    (now - record.time).num_milliseconds() >= STALE_AFTER_MS
}

/// Removes the entry with the minimum time field. O(n), invoked at most
/// once per insertion that exceeds a capacity.
fn evict_oldest<V>(map: &mut HashMap<String, V>, time_of: impl Fn(&V) -> DateTime<Utc>) {
    let oldest = map
        .iter()
        .min_by_key(|(_, value)| time_of(value))
        .map(|(key, _)| key.clone());
    if let Some(key) = oldest {
        debug!("cache at capacity, evicting oldest entry {key}");
        map.remove(&key);
    }
}
