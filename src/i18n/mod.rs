//! Internationalization (i18n) module.
//!
//! - `registry`: the fixed, ordered set of supported display languages
//! - `language`: validated `Language` handle
//! - `validator`: post-translation sanity checks for UI strings
//! - `metrics`: per-coordinator translation counters
//!
//! # Example
//!
//! ```rust
//! use translation_coordinator::i18n::Language;
//!
//! let french = Language::from_code("fr").unwrap();
//! assert_eq!(french.name(), "French");
//! assert!(Language::canonical().is_canonical());
//! ```

mod language;
mod metrics;
mod registry;
mod validator;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use validator::{TranslationValidator, ValidationReport};
