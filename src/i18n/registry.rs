//! Language registry: Single source of truth for all supported display languages.
//!
//! The supported set is fixed at startup and never mutated, so it lives in a
//! `OnceLock` singleton. Everything mutable (the active language, the cache)
//! is owned by explicitly constructed services instead.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "fr")
    pub code: &'static str,

    /// English name of the language, used as the menu label
    pub name: &'static str,

    /// Native name of the language (e.g., "Français")
    pub native_name: &'static str,

    /// Whether this is the no-translation language (exactly one should be true)
    pub is_canonical: bool,
}

/// Global language registry singleton.
///
/// Languages are kept in menu order; lookups are linear, which is fine for a
/// handful of entries.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language is supported
    /// * `None` otherwise
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All supported languages, in stable menu order.
    pub fn list(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Get the canonical (no-translation) language configuration.
    ///
    /// # Panics
    /// Panics if the registry does not contain exactly one canonical language,
    /// which is a configuration error in `default_languages`.
    pub fn canonical(&self) -> &LanguageConfig {
        let canonical_langs: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_canonical)
            .collect();

        match canonical_langs.len() {
            0 => panic!("No canonical language found in registry"),
            1 => canonical_langs[0],
            _ => panic!("Multiple canonical languages found in registry"),
        }
    }

    /// Check if a language code is supported.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// Default language configurations: English (canonical), French, Spanish, German.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_canonical: true,
        },
        LanguageConfig {
            code: "fr",
            name: "French",
            native_name: "Français",
            is_canonical: false,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_canonical: false,
        },
        LanguageConfig {
            code: "de",
            name: "German",
            native_name: "Deutsch",
            is_canonical: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();

        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_english() {
        let config = LanguageRegistry::get()
            .get_by_code("en")
            .expect("English should be registered");

        assert_eq!(config.name, "English");
        assert!(config.is_canonical);
    }

    #[test]
    fn test_get_by_code_french() {
        let config = LanguageRegistry::get()
            .get_by_code("fr")
            .expect("French should be registered");

        assert_eq!(config.name, "French");
        assert_eq!(config.native_name, "Français");
        assert!(!config.is_canonical);
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        let registry = LanguageRegistry::get();
        assert!(registry.get_by_code("ja").is_none());
        assert!(registry.get_by_code("").is_none());
        assert!(registry.get_by_code("EN").is_none());
    }

    #[test]
    fn test_list_is_in_menu_order() {
        let codes: Vec<_> = LanguageRegistry::get().list().iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["en", "fr", "es", "de"]);
    }

    #[test]
    fn test_canonical_returns_english() {
        let canonical = LanguageRegistry::get().canonical();
        assert_eq!(canonical.code, "en");
    }

    #[test]
    fn test_exactly_one_canonical() {
        let count = default_languages()
            .iter()
            .filter(|l| l.is_canonical)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_codes_are_unique() {
        let languages = default_languages();
        for (i, a) in languages.iter().enumerate() {
            for b in &languages[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
    }

    #[test]
    fn test_is_supported() {
        let registry = LanguageRegistry::get();
        assert!(registry.is_supported("de"));
        assert!(!registry.is_supported("pt"));
    }
}
