//! Translation coordinator for UI strings.
//!
//! Tracks the selected display language, translates strings through an
//! external provider with caching, batching and request coalescing, and
//! detects the source language of free-form input with debouncing.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod i18n;
pub mod preferences;
pub mod provider;
pub mod retry;
pub mod selector;
pub mod service;

pub use cache::{CacheKey, TranslationCache};
pub use config::Config;
pub use coordinator::TranslationCoordinator;
pub use detector::{DetectionSettings, LanguageDetector};
pub use error::{ProviderError, TranslationError};
pub use i18n::Language;
pub use preferences::{JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use provider::{TranslateApiClient, TranslationProvider};
pub use selector::LanguageSelector;
pub use service::TranslationService;
