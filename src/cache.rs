//! Time-bounded resolution cache.
//!
//! Maps a canonical tag-set key to the profile that won resolution for it.
//! Entries expire by age only; there is no entry-count bound because tag-set
//! cardinality is small in practice. Every mutation of the profile set wipes
//! the whole cache, so entries never outlive the ordering they were computed
//! against.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::profile::DelayProfile;

/// How long a resolved profile stays fresh.
pub const DEFAULT_RESOLUTION_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CacheEntry {
    profile: DelayProfile,
    expires_at: Instant,
}

/// In-memory TTL cache for tag-set resolutions.
///
/// Owned by the service instance; all invalidation routes through
/// [`ResolutionCache::clear`].
#[derive(Debug)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResolutionCache {
    /// Creates a cache with the default 30-second TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_RESOLUTION_TTL)
    }

    /// Creates a cache with an explicit TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached profile for `key` if present and not expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DelayProfile> {
        let guard = self.entries.read().expect("resolution cache lock poisoned");
        let entry = guard.get(key)?;
        if Instant::now() < entry.expires_at {
            Some(entry.profile.clone())
        } else {
            None
        }
    }

    /// Stores a resolution under `key` with a fresh TTL.
    ///
    /// Expired entries under the same key are overwritten in place.
    pub fn insert(&self, key: String, profile: DelayProfile) {
        let entry = CacheEntry {
            profile,
            expires_at: Instant::now() + self.ttl,
        };
        let mut guard = self.entries.write().expect("resolution cache lock poisoned");
        guard.insert(key, entry);
    }

    /// Drops every entry, expired or not.
    pub fn clear(&self) {
        let mut guard = self.entries.write().expect("resolution cache lock poisoned");
        guard.clear();
    }

    /// Number of entries currently held, including expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("resolution cache lock poisoned")
            .len()
    }

    /// True when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}
