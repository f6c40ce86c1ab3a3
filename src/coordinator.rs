//! Translation coordinator: cache first, provider on a miss, original text on failure.
//!
//! Callers always get a string back. Provider failures are logged and the
//! input is returned unchanged, and nothing is cached for a failed request,
//! so the next call tries again.
//!
//! # Coalescing
//!
//! At most one provider request is in flight per `(text, target)` pair. The
//! in-flight map is checked together with the cache under one lock, so a
//! second caller for the same pair awaits the first caller's result instead
//! of issuing its own request. Provider calls run on spawned tasks: a caller
//! that goes away does not cancel the request, and its result is still cached.

use crate::cache::{CacheKey, TranslationCache};
use crate::i18n::{Language, MetricsReport, TranslationMetrics, TranslationValidator};
use crate::provider::{is_translatable, TranslationProvider};
use crate::selector::LanguageSelector;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Result of an in-flight request for one key; `None` means "use the original".
type InFlight = Shared<BoxFuture<'static, Option<String>>>;

type PendingMap = HashMap<CacheKey, InFlight>;

pub struct TranslationCoordinator {
    selector: Arc<LanguageSelector>,
    cache: Arc<TranslationCache>,
    provider: Arc<dyn TranslationProvider>,
    pending: Arc<Mutex<PendingMap>>,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationCoordinator {
    pub fn new(
        selector: Arc<LanguageSelector>,
        cache: Arc<TranslationCache>,
        provider: Arc<dyn TranslationProvider>,
    ) -> Self {
        Self {
            selector,
            cache,
            provider,
            pending: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(TranslationMetrics::new()),
        }
    }

    /// Translate `text` into the active display language.
    pub async fn translate(&self, text: &str) -> String {
        let target = self.selector.active_language();
        self.translate_to(text, target).await
    }

    /// Translate `text` into an explicit target language.
    pub async fn translate_to(&self, text: &str, target: Language) -> String {
        if target.is_canonical() || !is_translatable(text) {
            return text.to_string();
        }

        let key = CacheKey::new(text, target.code());
        let flight = {
            let mut pending = lock(&self.pending);

            if let Some(hit) = self.cache.get(&key) {
                self.metrics.record_cache_hit();
                return hit;
            }
            self.metrics.record_cache_miss();

            match pending.get(&key) {
                Some(flight) => {
                    debug!("Joining in-flight translation to {}", key.target);
                    self.metrics.record_coalesced();
                    flight.clone()
                }
                None => {
                    let flight = self.spawn_single(key.clone());
                    pending.insert(key, flight.clone());
                    flight
                }
            }
        };

        flight.await.unwrap_or_else(|| text.to_string())
    }

    /// Translate many strings into the active display language in one round trip.
    ///
    /// The output has the same length and order as `texts`. Cached strings are
    /// served locally, strings already in flight are joined, and the remaining
    /// distinct non-blank strings go out in a single provider batch. Anything
    /// that cannot be translated comes back unchanged.
    pub async fn translate_batch(&self, texts: &[String]) -> Vec<String> {
        let target = self.selector.active_language();
        self.translate_batch_to(texts, target).await
    }

    pub async fn translate_batch_to(&self, texts: &[String], target: Language) -> Vec<String> {
        let mut results = texts.to_vec();
        if target.is_canonical() || texts.is_empty() {
            return results;
        }

        let mut waits: Vec<(usize, InFlight)> = Vec::new();
        {
            let mut pending = lock(&self.pending);
            let mut submit: Vec<CacheKey> = Vec::new();
            // (position in `texts`, slot in `submit`)
            let mut submitted: Vec<(usize, usize)> = Vec::new();

            for (i, text) in texts.iter().enumerate() {
                if !is_translatable(text) {
                    continue;
                }

                let key = CacheKey::new(text.as_str(), target.code());
                if let Some(hit) = self.cache.get(&key) {
                    self.metrics.record_cache_hit();
                    results[i] = hit;
                    continue;
                }
                self.metrics.record_cache_miss();

                if let Some(flight) = pending.get(&key) {
                    self.metrics.record_coalesced();
                    waits.push((i, flight.clone()));
                    continue;
                }

                let slot = match submit.iter().position(|k| *k == key) {
                    Some(slot) => slot,
                    None => {
                        submit.push(key);
                        submit.len() - 1
                    }
                };
                submitted.push((i, slot));
            }

            if !submit.is_empty() {
                debug!(
                    "Submitting batch of {} string(s) to {} ({} cached or in flight)",
                    submit.len(),
                    target.code(),
                    texts.len() - submitted.len()
                );
                let flights = self.spawn_batch(submit.clone(), target);
                for (key, flight) in submit.into_iter().zip(&flights) {
                    pending.insert(key, flight.clone());
                }
                waits.extend(
                    submitted
                        .into_iter()
                        .map(|(i, slot)| (i, flights[slot].clone())),
                );
            }
        }

        let (positions, flights): (Vec<usize>, Vec<InFlight>) = waits.into_iter().unzip();
        for (i, translated) in positions.into_iter().zip(join_all(flights).await) {
            if let Some(translated) = translated {
                results[i] = translated;
            }
        }
        results
    }

    /// Translation counters for this coordinator.
    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn selector(&self) -> &LanguageSelector {
        &self.selector
    }

    /// Number of keys with a provider request currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Start the provider call for one key. Must be called with the pending lock held.
    fn spawn_single(&self, key: CacheKey) -> InFlight {
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let metrics = Arc::clone(&self.metrics);

        let task = tokio::spawn(async move {
            let _in_flight = PendingGuard {
                pending,
                keys: vec![key.clone()],
            };

            metrics.record_api_call();
            let outcome = match provider.translate_one(&key.text, &key.target).await {
                Ok(translated) if is_translatable(&translated) => {
                    check_quality(&key, &translated);
                    Some(translated)
                }
                Ok(_) => {
                    warn!("Provider returned an empty translation to {}", key.target);
                    None
                }
                Err(e) => {
                    metrics.record_api_failure();
                    warn!("Translation to {} failed, using original text: {}", key.target, e);
                    None
                }
            };

            if let Some(translated) = &outcome {
                cache.put(key.clone(), translated.clone());
            }
            outcome
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                warn!("Translation task failed: {}", e);
                None
            })
        })
        .boxed()
        .shared()
    }

    /// Start one provider batch call for `keys`, returning one in-flight handle
    /// per key (same order). Must be called with the pending lock held.
    fn spawn_batch(&self, keys: Vec<CacheKey>, target: Language) -> Vec<InFlight> {
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let metrics = Arc::clone(&self.metrics);
        let task_keys = keys.clone();

        let task = tokio::spawn(async move {
            let texts: Vec<String> = task_keys.iter().map(|k| k.text.clone()).collect();
            let _in_flight = PendingGuard {
                pending,
                keys: task_keys.clone(),
            };

            metrics.record_api_call();
            let outcome = match provider.translate_batch(&texts, target.code()).await {
                Ok(translated) if translated.len() == texts.len() => Some(translated),
                Ok(translated) => {
                    metrics.record_api_failure();
                    warn!(
                        "Batch translation to {} returned {} results for {} inputs, using originals",
                        target.code(),
                        translated.len(),
                        texts.len()
                    );
                    None
                }
                Err(e) => {
                    metrics.record_api_failure();
                    warn!("Batch translation to {} failed, using originals: {}", target.code(), e);
                    None
                }
            };

            let results: Vec<Option<String>> = match outcome {
                Some(translated) => task_keys
                    .iter()
                    .zip(translated)
                    .map(|(key, translated)| {
                        if !is_translatable(&translated) {
                            return None;
                        }
                        check_quality(key, &translated);
                        cache.put(key.clone(), translated.clone());
                        Some(translated)
                    })
                    .collect(),
                None => vec![None; task_keys.len()],
            };
            Arc::new(results)
        });

        let batch = task
            .map(move |joined| {
                joined.unwrap_or_else(|e| {
                    warn!("Batch translation task failed: {}", e);
                    Arc::new(Vec::new())
                })
            })
            .boxed()
            .shared();

        (0..keys.len())
            .map(|slot| {
                batch
                    .clone()
                    .map(move |results| results.get(slot).cloned().flatten())
                    .boxed()
                    .shared()
            })
            .collect()
    }
}

/// Clears its keys from the in-flight map when the provider task ends, including
/// when the provider panics or the task is aborted. Results are cached before
/// the guard drops, so a caller that no longer finds the key in flight hits the
/// cache instead.
struct PendingGuard {
    pending: Arc<Mutex<PendingMap>>,
    keys: Vec<CacheKey>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = lock(&self.pending);
        for key in &self.keys {
            pending.remove(key);
        }
    }
}

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_quality(key: &CacheKey, translated: &str) {
    let report = TranslationValidator::validate(&key.text, translated);
    if report.has_errors() {
        warn!(
            "Translation validation errors for {}: {:?}",
            key.target, report.errors
        );
    }
    if report.has_warnings() {
        debug!(
            "Translation validation warnings for {}: {:?}",
            key.target, report.warnings
        );
    }
}
