/**
 * A concurrent key/value cache whose entries expire.
 *
 * Each entry has a time-to-live counted from when it was admitted and an idle
 * timeout counted from when it was last admitted or recovered. An entry past either
 * deadline is never returned. Expired entries are dropped lazily on access, by
 * `sweep`, and by the optional background sweeper.
 */
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted: Instant,
    last_access: Instant,
    ttl: Duration,
    idle: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration, idle: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted: now,
            last_access: now,
            ttl,
            idle,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted) > self.ttl
            || now.duration_since(self.last_access) > self.idle
    }
}

pub struct ExpiringCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    idle: Duration,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Cache without a background sweeper; expired entries go away on access or `sweep`
    pub fn new(ttl: Duration, idle: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            idle,
        }
    }

    /**
     * Cache with a sweeper task that runs every `interval` on the current tokio
     * runtime. The task only holds a weak reference and ends once the cache is dropped.
     */
    pub fn with_sweep(ttl: Duration, idle: Duration, interval: Duration) -> Arc<Self> {
        let cache = Arc::new(Self::new(ttl, idle));
        let weak = Arc::downgrade(&cache);
        tokio::spawn(sweep_loop(weak, interval));
        cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Admit with the cache-wide timeouts
    pub fn admit(&self, key: K, value: V) -> Option<V> {
        self.admit_with(key, value, self.ttl, self.idle)
    }

    /**
     * Insert or refresh an entry.
     *
     * Admitting a value equal to the live one only refreshes its timestamps. A
     * different value replaces the live one, which is returned.
     */
    pub fn admit_with(&self, key: K, value: V, ttl: Duration, idle: Duration) -> Option<V> {
        let now = Instant::now();
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.is_expired(now) {
                    *entry = CacheEntry::new(value, ttl, idle);
                    None
                } else if entry.value == value {
                    entry.inserted = now;
                    entry.last_access = now;
                    entry.ttl = ttl;
                    entry.idle = idle;
                    None
                } else {
                    let previous = std::mem::replace(entry, CacheEntry::new(value, ttl, idle));
                    Some(previous.value)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(value, ttl, idle));
                None
            }
        }
    }

    /// The live value for `key`, counting as an access for the idle timeout
    pub fn recover<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        {
            let mut entry = self.entries.get_mut(key)?;
            if !entry.is_expired(now) {
                entry.last_access = now;
                return Some(entry.value.clone());
            }
        }
        // the guard has to be released before removing
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    /// Whether a live entry exists, without touching its idle timer
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        self.entries
            .remove(key)
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(_, entry)| entry.value)
    }

    /// Number of stored entries, expired ones not yet swept included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

async fn sweep_loop<K, V>(cache: Weak<ExpiringCache<K, V>>, interval: Duration)
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match cache.upgrade() {
            Some(cache) => {
                cache.sweep();
            }
            None => break,
        }
    }
}
