//! Wires the translation components together from a `Config`.

use crate::cache::TranslationCache;
use crate::config::Config;
use crate::coordinator::TranslationCoordinator;
use crate::detector::{DetectionSettings, LanguageDetector};
use crate::preferences::{JsonFilePreferenceStore, PreferenceStore};
use crate::provider::{TranslateApiClient, TranslationProvider};
use crate::selector::LanguageSelector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Owns one selector, cache, coordinator and detector sharing one provider.
pub struct TranslationService {
    selector: Arc<LanguageSelector>,
    coordinator: Arc<TranslationCoordinator>,
    detector: Arc<LanguageDetector>,
}

impl TranslationService {
    /// Build the production stack: HTTP provider and file-backed preferences.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider =
            TranslateApiClient::new(config).context("Failed to create translation API client")?;
        let store = JsonFilePreferenceStore::new(&config.preferences_path);

        Ok(Self::with_provider(
            config,
            Arc::new(provider),
            Arc::new(store),
        ))
    }

    /// Build the stack around caller-supplied provider and preference store.
    pub fn with_provider(
        config: &Config,
        provider: Arc<dyn TranslationProvider>,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        let selector = Arc::new(LanguageSelector::load(store));
        let cache = Arc::new(TranslationCache::new(config.cache_capacity));
        let coordinator = Arc::new(TranslationCoordinator::new(
            Arc::clone(&selector),
            cache,
            Arc::clone(&provider),
        ));
        let detector = Arc::new(LanguageDetector::new(
            provider,
            Arc::clone(&selector),
            DetectionSettings::from(config),
        ));

        info!(
            "Translation service ready (display language: {}, cache capacity: {})",
            selector.active_language(),
            config.cache_capacity
        );

        Self {
            selector,
            coordinator,
            detector,
        }
    }

    pub fn selector(&self) -> Arc<LanguageSelector> {
        Arc::clone(&self.selector)
    }

    pub fn coordinator(&self) -> Arc<TranslationCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn detector(&self) -> Arc<LanguageDetector> {
        Arc::clone(&self.detector)
    }

    /// Stop background work (pending detection timers).
    pub fn shutdown(&self) {
        self.detector.shutdown();
        let metrics = self.coordinator.metrics();
        info!(
            "Translation service stopped ({} provider calls, {:.1}% cache hit rate)",
            metrics.api_calls, metrics.cache_hit_rate
        );
    }
}
