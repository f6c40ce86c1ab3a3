//! Language type: a display language validated against the registry.

use crate::error::TranslationError;
use crate::i18n::{LanguageConfig, LanguageRegistry};
use std::fmt;

/// A supported display language.
///
/// Only codes present in the `LanguageRegistry` can be turned into a
/// `Language`, so holding one is proof of support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "fr")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const FRENCH: Language = Language { code: "fr" };
    pub const SPANISH: Language = Language { code: "es" };
    pub const GERMAN: Language = Language { code: "de" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is supported
    /// * `Err(TranslationError::UnsupportedLanguage)` otherwise
    pub fn from_code(code: &str) -> Result<Language, TranslationError> {
        LanguageRegistry::get()
            .get_by_code(code)
            .map(|config| Language { code: config.code })
            .ok_or_else(|| TranslationError::UnsupportedLanguage(code.to_string()))
    }

    /// The no-translation language. Text targeted at it is returned unchanged.
    pub fn canonical() -> Language {
        let config = LanguageRegistry::get().canonical();
        Language { code: config.code }
    }

    /// Every supported language in menu order.
    pub fn all() -> Vec<Language> {
        LanguageRegistry::get()
            .list()
            .iter()
            .map(|config| Language { code: config.code })
            .collect()
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen for
    /// values built through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English display label (e.g., "French").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn is_canonical(&self) -> bool {
        self.config().is_canonical
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::canonical()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
