/**
 * Link Verdict Cache
 *
 * Bounded, TTL-expiring cache of link reputation verdicts, owned by the link
 * safety checker. Only definitive verdicts (`malicious`, `clean`) are stored;
 * an `unknown` verdict means the lookup failed and must be retried next time.
 *
 * The map sits behind a std `Mutex` that is never held across an await.
 * When the cache is full, expired entries are purged first and then the
 * oldest entry is evicted.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::clock::Clock;
use crate::shared::moderation::LinkVerdict;

pub const DEFAULT_LINK_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_LINK_CACHE_CAPACITY: usize = 10_000;

struct CacheEntry {
    verdict: LinkVerdict,
    inserted_at: Instant,
}

pub struct LinkVerdictCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl LinkVerdictCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) < self.ttl
    }

    /// Cached verdict for `url`, if one exists and has not expired
    pub fn get(&self, url: &str) -> Option<LinkVerdict> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let cached = entries
            .get(url)
            .map(|entry| (entry.verdict, self.is_fresh(entry, now)));
        match cached {
            Some((verdict, true)) => Some(verdict),
            Some((_, false)) => {
                entries.remove(url);
                None
            }
            None => None,
        }
    }

    /// Remember a verdict. `Unknown` verdicts are ignored.
    pub fn insert(&self, url: &str, verdict: LinkVerdict) {
        if verdict == LinkVerdict::Unknown || self.capacity == 0 {
            return;
        }

        let now = self.clock.now();
        let mut entries = self.lock();
        if !entries.contains_key(url) && entries.len() >= self.capacity {
            entries.retain(|_, entry| self.is_fresh(entry, now));
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            url.to_string(),
            CacheEntry {
                verdict,
                inserted_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
