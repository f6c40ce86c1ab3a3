//! Active display language and detected source language.
//!
//! The display language is what UI strings get translated *into*; the source
//! language describes what free-form input is written *in*. They are separate
//! slots: detection only ever writes the source slot.

use crate::i18n::Language;
use crate::preferences::{PreferenceStore, PREFERRED_LANGUAGE_KEY};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

pub struct LanguageSelector {
    active: RwLock<Language>,
    source: RwLock<Option<String>>,
    store: Arc<dyn PreferenceStore>,
    // Orders switches and their writes without blocking readers of `active`
    switching: Mutex<()>,
}

impl LanguageSelector {
    /// Build a selector, restoring the previously persisted display language.
    ///
    /// Missing, unreadable or unsupported values fall back to the canonical
    /// language; none of them is reported to the caller.
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let active = match store.load(PREFERRED_LANGUAGE_KEY) {
            Ok(Some(code)) => match Language::from_code(&code) {
                Ok(language) => {
                    debug!("Restored preferred language '{}'", code);
                    language
                }
                Err(e) => {
                    warn!("Ignoring persisted language: {}", e);
                    Language::canonical()
                }
            },
            Ok(None) => Language::canonical(),
            Err(e) => {
                warn!("Failed to load preferred language, using default: {:#}", e);
                Language::canonical()
            }
        };

        Self {
            active: RwLock::new(active),
            source: RwLock::new(None),
            store,
            switching: Mutex::new(()),
        }
    }

    pub fn active_language(&self) -> Language {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the display language and persist the choice.
    ///
    /// Unsupported codes are ignored, and re-selecting the current language
    /// does nothing (no second write to the store).
    ///
    /// # Returns
    /// `true` if the active language changed.
    pub fn set_active_language(&self, code: &str) -> bool {
        let language = match Language::from_code(code) {
            Ok(language) => language,
            Err(e) => {
                debug!("Ignoring language change: {}", e);
                return false;
            }
        };

        let _switching = self.switching.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            if *active == language {
                return false;
            }
            *active = language;
        }

        if let Err(e) = self.store.save(PREFERRED_LANGUAGE_KEY, language.code()) {
            warn!("Failed to persist preferred language '{}': {:#}", code, e);
        }
        info!("Display language changed to {} ({})", language.name(), language.code());
        true
    }

    /// Supported display languages in menu order.
    pub fn supported_languages(&self) -> Vec<Language> {
        Language::all()
    }

    /// Language that the current free-form input is written in, if known.
    pub fn source_language(&self) -> Option<String> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_source_language(&self, code: impl Into<String>) {
        let code = code.into();
        debug!("Source language set to '{}'", code);
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = Some(code);
    }

    pub fn clear_source_language(&self) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
