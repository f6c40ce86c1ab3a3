//! Debounced source-language detection for free-form input.
//!
//! Every input change restarts a timer; detection runs only once the input
//! has been stable for the debounce interval and is long enough to be worth
//! a provider call. Results land in the detector's own indicator and, while
//! auto-detect is on, in the selector's source-language slot. The display
//! language is never touched.

use crate::config::Config;
use crate::provider::TranslationProvider;
use crate::selector::LanguageSelector;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Timing knobs for the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSettings {
    /// Quiet period after the last input change before detecting
    pub debounce: Duration,
    /// Inputs must be longer than this (trimmed, in characters)
    pub min_chars: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_chars: 5,
        }
    }
}

impl From<&Config> for DetectionSettings {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.detection_debounce,
            min_chars: config.detection_min_chars,
        }
    }
}

struct DetectorState {
    provider: Arc<dyn TranslationProvider>,
    selector: Arc<LanguageSelector>,
    settings: DetectionSettings,
    auto_detect: AtomicBool,
    latest_text: Mutex<String>,
    detected: Mutex<Option<String>>,
    // Bumped on every input change; results for older generations are dropped
    generation: AtomicU64,
}

pub struct LanguageDetector {
    state: Arc<DetectorState>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl LanguageDetector {
    /// New detector with auto-detect enabled.
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        selector: Arc<LanguageSelector>,
        settings: DetectionSettings,
    ) -> Self {
        Self {
            state: Arc::new(DetectorState {
                provider,
                selector,
                settings,
                auto_detect: AtomicBool::new(true),
                latest_text: Mutex::new(String::new()),
                detected: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Record new input and (re)schedule detection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input_changed(&self, text: &str) {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.state.latest_text) = text.to_string();

        let mut timer = lock(&self.timer);
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        if !self.is_auto_detect() {
            return;
        }
        if text.trim().chars().count() <= self.state.settings.min_chars {
            debug!("Input too short for language detection");
            return;
        }

        let state = Arc::clone(&self.state);
        let text = text.to_string();
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(state.settings.debounce).await;
            // Detached so a later input change or toggle cannot abort it mid-flight
            tokio::spawn(run_detection(state, text, generation));
        }));
    }

    /// Turn auto-detection on or off.
    ///
    /// Turning it off cancels a scheduled detection but lets one that is
    /// already talking to the provider finish. Turning it on with input
    /// present detects right away.
    pub fn set_auto_detect(&self, enabled: bool) {
        let was_enabled = self.state.auto_detect.swap(enabled, Ordering::SeqCst);
        if was_enabled == enabled {
            return;
        }
        info!("Language auto-detection {}", if enabled { "enabled" } else { "disabled" });

        if !enabled {
            self.cancel_timer();
            return;
        }

        let text = lock(&self.state.latest_text).clone();
        if text.trim().is_empty() {
            return;
        }
        self.cancel_timer();
        let generation = self.state.generation.load(Ordering::SeqCst);
        tokio::spawn(run_detection(Arc::clone(&self.state), text, generation));
    }

    pub fn is_auto_detect(&self) -> bool {
        self.state.auto_detect.load(Ordering::SeqCst)
    }

    /// Detect `text` immediately, bypassing the debounce.
    ///
    /// A result updates the indicator (and the source slot while auto-detect
    /// is on) unless the input has changed since it was recorded.
    pub async fn detect_now(&self, text: &str) -> Option<String> {
        let generation = self.state.generation.load(Ordering::SeqCst);
        run_detection(Arc::clone(&self.state), text.to_string(), generation).await
    }

    /// Most recent successful detection.
    pub fn detected_language(&self) -> Option<String> {
        lock(&self.state.detected).clone()
    }

    /// Cancel any scheduled detection.
    pub fn shutdown(&self) {
        self.cancel_timer();
    }

    fn cancel_timer(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }
}

impl Drop for LanguageDetector {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

async fn run_detection(state: Arc<DetectorState>, text: String, generation: u64) -> Option<String> {
    let detected = state.provider.detect_language(&text).await;

    if state.generation.load(Ordering::SeqCst) != generation {
        debug!("Discarding detection result for superseded input");
        return detected;
    }

    match &detected {
        Some(code) => {
            debug!("Detected source language '{}'", code);
            *lock(&state.detected) = Some(code.clone());
            if state.auto_detect.load(Ordering::SeqCst) {
                state.selector.set_source_language(code.as_str());
            }
        }
        None => debug!("Language detection was inconclusive"),
    }
    detected
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::preferences::MemoryPreferenceStore;
    use crate::provider::fake::FakeProvider;

    struct Fixture {
        detector: LanguageDetector,
        provider: Arc<FakeProvider>,
        selector: Arc<LanguageSelector>,
    }

    fn fixture(provider: FakeProvider) -> Fixture {
        let provider = Arc::new(provider);
        let selector = Arc::new(LanguageSelector::load(Arc::new(
            MemoryPreferenceStore::with_language("fr"),
        )));
        let detector = LanguageDetector::new(
            provider.clone(),
            selector.clone(),
            DetectionSettings::default(),
        );
        Fixture {
            detector,
            provider,
            selector,
        }
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_detects_once_with_last_text() {
        let f = fixture(FakeProvider::new().detecting("es"));

        for text in ["Hola q", "Hola qu", "Hola que", "Hola que tal"] {
            f.detector.on_input_changed(text);
            advance(100).await;
        }
        advance(600).await;

        assert_eq!(f.provider.detected_texts(), vec!["Hola que tal"]);
        assert_eq!(f.detector.detected_language().as_deref(), Some("es"));
        assert_eq!(f.selector.source_language().as_deref(), Some("es"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_happens_before_debounce_elapses() {
        let f = fixture(FakeProvider::new().detecting("es"));

        f.detector.on_input_changed("Buenos dias");
        advance(400).await;

        assert!(f.provider.detected_texts().is_empty());
        assert_eq!(f.detector.detected_language(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_is_not_detected() {
        let f = fixture(FakeProvider::new().detecting("es"));

        // Five characters after trimming is not enough
        f.detector.on_input_changed("  Hola!  ");
        advance(1000).await;

        assert!(f.provider.detected_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_cancels_pending_detection() {
        let f = fixture(FakeProvider::new().detecting("es"));

        f.detector.on_input_changed("Buenos dias");
        advance(100).await;
        f.detector.on_input_changed("Bue");
        advance(1000).await;

        assert!(f.provider.detected_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_auto_detect_schedules_nothing() {
        let f = fixture(FakeProvider::new().detecting("es"));
        f.detector.set_auto_detect(false);

        f.detector.on_input_changed("Buenos dias a todos");
        advance(1000).await;

        assert!(f.provider.detected_texts().is_empty());
        assert_eq!(f.selector.source_language(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_cancels_pending_timer() {
        let f = fixture(FakeProvider::new().detecting("es"));

        f.detector.on_input_changed("Buenos dias a todos");
        advance(200).await;
        f.detector.set_auto_detect(false);
        advance(1000).await;

        assert!(f.provider.detected_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_lets_in_flight_detection_finish() {
        let f = fixture(
            FakeProvider::new()
                .detecting("de")
                .with_delay(Duration::from_millis(300)),
        );

        f.detector.on_input_changed("Guten Morgen zusammen");
        advance(600).await; // timer fired, provider still working
        assert_eq!(f.provider.detected_texts().len(), 1);

        f.detector.set_auto_detect(false);
        advance(500).await;

        // The indicator is updated but the source slot is left alone
        assert_eq!(f.detector.detected_language().as_deref(), Some("de"));
        assert_eq!(f.selector.source_language(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_detects_current_input_immediately() {
        let f = fixture(FakeProvider::new().detecting("fr"));
        f.detector.set_auto_detect(false);
        f.detector.on_input_changed("Bonjour tout le monde");

        f.detector.set_auto_detect(true);
        advance(1).await;

        assert_eq!(f.provider.detected_texts(), vec!["Bonjour tout le monde"]);
        assert_eq!(f.selector.source_language().as_deref(), Some("fr"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_with_blank_input_does_nothing() {
        let f = fixture(FakeProvider::new().detecting("fr"));
        f.detector.set_auto_detect(false);
        f.detector.set_auto_detect(true);
        advance(1000).await;

        assert!(f.provider.detected_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inconclusive_detection_changes_nothing() {
        let f = fixture(FakeProvider::new());
        f.selector.set_source_language("it");

        f.detector.on_input_changed("Something long enough");
        advance(600).await;

        assert_eq!(f.provider.detected_texts().len(), 1);
        assert_eq!(f.detector.detected_language(), None);
        assert_eq!(f.selector.source_language().as_deref(), Some("it"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_never_changes_display_language() {
        let f = fixture(FakeProvider::new().detecting("ja"));

        f.detector.on_input_changed("こんにちは世界、元気ですか");
        advance(600).await;

        assert_eq!(f.selector.source_language().as_deref(), Some("ja"));
        assert_eq!(f.selector.active_language(), Language::FRENCH);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_is_discarded() {
        let f = fixture(
            FakeProvider::new()
                .detecting("es")
                .with_delay(Duration::from_millis(300)),
        );

        f.detector.on_input_changed("Buenos dias amigos");
        advance(600).await; // first detection in flight
        f.detector.on_input_changed("Bue");
        advance(1000).await;

        assert_eq!(f.detector.detected_language(), None);
        assert_eq!(f.selector.source_language(), None);
    }

    #[tokio::test]
    async fn test_detect_now_bypasses_debounce() {
        let f = fixture(FakeProvider::new().detecting("es"));

        let detected = f.detector.detect_now("hi").await;

        assert_eq!(detected.as_deref(), Some("es"));
        assert_eq!(f.detector.detected_language().as_deref(), Some("es"));
        assert_eq!(f.selector.source_language().as_deref(), Some("es"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timer() {
        let f = fixture(FakeProvider::new().detecting("es"));

        f.detector.on_input_changed("Buenos dias a todos");
        f.detector.shutdown();
        advance(1000).await;

        assert!(f.provider.detected_texts().is_empty());
    }
}
