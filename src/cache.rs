//! In-memory translation cache.
//!
//! Entries are keyed by `(source text, target language)` and never by the
//! currently active language, so switching languages back and forth keeps
//! earlier translations reusable. The cache is bounded: once `capacity`
//! entries are stored, the least recently used one is evicted.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Capacity used when none (or zero) is configured.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Upper bound on the configured capacity; `LruCache` allocates it up front.
pub const MAX_CAPACITY: usize = 1_000_000;

/// Identity of a translation: the exact source text and the target code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub target: String,
}

impl CacheKey {
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
        }
    }
}

/// Bounded LRU map from `CacheKey` to translated text.
pub struct TranslationCache {
    entries: Mutex<LruCache<CacheKey, String>>,
}

impl TranslationCache {
    /// Create a cache holding at most `capacity` entries (0 means `DEFAULT_CAPACITY`,
    /// anything above `MAX_CAPACITY` is lowered to it).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.min(MAX_CAPACITY))
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a translation, marking it as recently used.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Store a translation.
    ///
    /// Repeated identical writes are harmless. Empty translations are refused
    /// so a bad provider answer can never shadow the original text.
    ///
    /// # Returns
    /// `true` if the entry was stored.
    pub fn put(&self, key: CacheKey, translated: String) -> bool {
        if translated.trim().is_empty() {
            return false;
        }
        self.lock().put(key, translated);
        true
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
