//! Language registry: Single source of truth for all supported languages.
//!
//! This module provides a centralized registry of all languages the UI can be
//! shown in. It uses a singleton pattern with `OnceLock` to ensure thread-safe
//! initialization and access.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Language tag (e.g., "en", "zh-CN")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Japanese")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "日本語")
    pub native_name: &'static str,

    /// Whether this is the canonical/source language (only one should be true)
    pub is_canonical: bool,
}

/// Global language registry singleton.
///
/// Initialized once on first access and immutable thereafter.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its exact code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Find the supported language matching a detected or platform tag.
    ///
    /// Matching is case-insensitive. A tag matches a language when it is the
    /// language's code, when it extends the code with a subtag (`fr-CA` →
    /// `fr`), or when it is the primary subtag of the code (`zh` → `zh-CN`).
    pub fn match_tag(&self, tag: &str) -> Option<&LanguageConfig> {
        let tag = tag.trim().replace('_', "-").to_ascii_lowercase();
        if tag.is_empty() {
            return None;
        }

        let exact = self
            .languages
            .iter()
            .find(|lang| lang.code.to_ascii_lowercase() == tag);
        if exact.is_some() {
            return exact;
        }

        self.languages.iter().find(|lang| {
            let code = lang.code.to_ascii_lowercase();
            let extends_code = tag
                .strip_prefix(code.as_str())
                .map(|rest| rest.starts_with('-'))
                .unwrap_or(false);
            let primary = code.split('-').next().unwrap_or("");
            let tag_primary = tag.split('-').next().unwrap_or("");
            extends_code || primary == tag_primary
        })
    }

    /// Get all languages in display order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the canonical language configuration.
    ///
    /// # Panics
    /// Panics if no canonical language is found or if multiple canonical
    /// languages are defined (this indicates a configuration error).
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

/// Default language configurations.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_canonical: true,
        },
        LanguageConfig {
            code: "zh-CN",
            name: "Chinese",
            native_name: "中文",
            is_canonical: false,
        },
        LanguageConfig {
            code: "ja",
            name: "Japanese",
            native_name: "日本語",
            is_canonical: false,
        },
        LanguageConfig {
            code: "ko",
            name: "Korean",
            native_name: "한국어",
            is_canonical: false,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_canonical: false,
        },
        LanguageConfig {
            code: "fr",
            name: "French",
            native_name: "Français",
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
