//! Internationalization (i18n) module for multi-language support.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Type-safe Language handle over the registry
//! - `strings`: The built-in English UI strings
//! - `table`: Translation tables, lookup with fallback and `{param}` interpolation
//! - `cache`: Persisted per-language tables
//! - `validator`: Checks machine translations keep their placeholders
//! - `metrics`: Cache and per-key translation counters
//! - `manager`: `LanguageManager`, the single writer of the language state
//!
//! # Example
//!
//! ```rust,ignore
//! use hairstyle_advisor::i18n::LanguageManager;
//!
//! let manager = LanguageManager::new(store, translator, detector, "fr-FR");
//! manager.initialize().await;
//!
//! let mut rx = manager.subscribe();
//! manager.switch_language("ja").await?;
//! let title = rx.borrow_and_update().translate("app.title", None, &[]);
//! ```

mod cache;
mod language;
mod manager;
mod metrics;
mod registry;
mod strings;
mod table;
mod validator;

pub use cache::TranslationCache;
pub use language::Language;
pub use manager::{
    LanguageManager, LanguageSnapshot, DETECTION_CONFIDENCE_THRESHOLD, PREFERENCE_KEY,
};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use strings::ENGLISH_STRINGS;
pub use table::{interpolate, placeholders, TranslationTable};
pub use validator::{TranslationValidator, ValidationReport};
