use crate::cache::{DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::retry::RetryConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
pub const DEFAULT_DETECT_URL: &str =
    "https://translation.googleapis.com/language/translate/v2/detect";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider
    pub api_key: String,
    pub translate_url: String,
    pub detect_url: String,
    pub request_timeout: Duration,
    pub retry: RetryConfig,

    // Cache
    pub cache_capacity: usize,

    // Persisted preferences
    pub preferences_path: PathBuf,

    // Language detection
    pub detection_debounce: Duration,
    pub detection_min_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            detect_url: DEFAULT_DETECT_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            retry: RetryConfig::api_call(),
            cache_capacity: DEFAULT_CAPACITY,
            preferences_path: PathBuf::from(".translation-preferences.json"),
            detection_debounce: Duration::from_millis(500),
            detection_min_chars: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let parse_or = |name: &str, default: u64| -> u64 {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            // Translation provider
            api_key: lookup("TRANSLATE_API_KEY")
                .filter(|v| !v.trim().is_empty())
                .context("TRANSLATE_API_KEY not set")?,
            translate_url: lookup("TRANSLATE_API_URL").unwrap_or(defaults.translate_url),
            detect_url: lookup("TRANSLATE_DETECT_URL").unwrap_or(defaults.detect_url),
            request_timeout: Duration::from_secs(parse_or("TRANSLATE_TIMEOUT_SECS", 10).max(1)),
            retry: RetryConfig {
                max_attempts: parse_or("TRANSLATE_MAX_ATTEMPTS", 3).clamp(1, 10) as u32,
                ..defaults.retry
            },

            // Cache
            cache_capacity: parse_or("TRANSLATION_CACHE_CAPACITY", DEFAULT_CAPACITY as u64)
                .min(MAX_CAPACITY as u64) as usize,

            // Persisted preferences
            preferences_path: lookup("PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),

            // Language detection
            detection_debounce: Duration::from_millis(parse_or("DETECTION_DEBOUNCE_MS", 500)),
            detection_min_chars: parse_or("DETECTION_MIN_CHARS", 5) as usize,
        })
    }
}
