//! The language manager: the single writer of the UI language state.
//!
//! Consumers hold a `watch::Receiver<LanguageSnapshot>` and re-render from the
//! snapshot's table. Only `switch_language` and `reset_to_english` mutate it.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::cache::TranslationCache;
use super::metrics::TranslationMetrics;
use super::table::TranslationTable;
use super::validator::TranslationValidator;
use super::Language;
use crate::capability::{is_ready, Capabilities, LanguageDetector, Translator};
use crate::error::LocalizationError;
use crate::storage::KeyValueStore;

pub const PREFERENCE_KEY: &str = "preferred-language";

/// Detection candidates at or below this confidence are ignored.
pub const DETECTION_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Immutable view of the language state delivered to subscribers.
#[derive(Debug, Clone)]
pub struct LanguageSnapshot {
    pub current_language: Language,
    pub is_translating: bool,
    pub fallback_active: bool,
    pub last_error: Option<String>,
    /// Raw tag of the last confident detection, supported or not.
    pub detected_language: Option<String>,
    pub table: Arc<TranslationTable>,
}

impl LanguageSnapshot {
    fn english() -> Self {
        Self {
            current_language: Language::ENGLISH,
            is_translating: false,
            fallback_active: false,
            last_error: None,
            detected_language: None,
            table: TranslationTable::english(),
        }
    }

    pub fn translate(&self, key: &str, fallback: Option<&str>, params: &[(&str, &str)]) -> String {
        self.table.translate(key, fallback, params)
    }
}

/// Clears `is_translating` when dropped, on every exit path.
struct TranslatingGuard<'a> {
    state: &'a watch::Sender<LanguageSnapshot>,
}

impl<'a> TranslatingGuard<'a> {
    fn begin(state: &'a watch::Sender<LanguageSnapshot>) -> Self {
        state.send_modify(|snapshot| snapshot.is_translating = true);
        Self { state }
    }
}

impl Drop for TranslatingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .send_modify(|snapshot| snapshot.is_translating = false);
    }
}

pub struct LanguageManager {
    state: watch::Sender<LanguageSnapshot>,
    cache: TranslationCache,
    store: Arc<dyn KeyValueStore>,
    translator: Option<Arc<dyn Translator>>,
    detector: Option<Arc<dyn LanguageDetector>>,
    locale: String,
    metrics: TranslationMetrics,
    writer: Mutex<()>,
}

impl LanguageManager {
    /// Start in English. Call `initialize` to restore a saved or detected language.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        translator: Option<Arc<dyn Translator>>,
        detector: Option<Arc<dyn LanguageDetector>>,
        locale: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(LanguageSnapshot::english());
        Self {
            state,
            cache: TranslationCache::new(Arc::clone(&store)),
            store,
            translator,
            detector,
            locale: locale.into(),
            metrics: TranslationMetrics::new(),
            writer: Mutex::new(()),
        }
    }

    pub fn with_capabilities(
        store: Arc<dyn KeyValueStore>,
        capabilities: &Capabilities,
        locale: impl Into<String>,
    ) -> Self {
        Self::new(
            store,
            capabilities.translator.clone(),
            capabilities.detector.clone(),
            locale,
        )
    }

    /// Receive every state change. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<LanguageSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LanguageSnapshot {
        self.state.borrow().clone()
    }

    pub fn current_language(&self) -> Language {
        self.state.borrow().current_language
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Look up a UI string in the active table. See `TranslationTable::translate`.
    pub fn translate(&self, key: &str, fallback: Option<&str>, params: &[(&str, &str)]) -> String {
        self.state.borrow().translate(key, fallback, params)
    }

    /// Restore the saved preference, else adopt a detected language, else English.
    pub async fn initialize(&self) -> Language {
        match self.store.get(PREFERENCE_KEY).await {
            Ok(Some(code)) if Language::from_code(&code).is_ok() => {
                info!("Restoring preferred language: {}", code);
                if let Err(e) = self.switch_language(&code).await {
                    warn!("Could not restore preferred language {}: {}", code, e);
                }
                return self.current_language();
            }
            Ok(Some(code)) => warn!("Ignoring unsupported saved language: '{}'", code),
            Ok(None) => {}
            Err(e) => warn!("Failed to read language preference: {}", e),
        }

        if let Some(language) = self.detect_preferred_language().await {
            if !language.is_canonical() {
                if let Err(e) = self.switch_language(language.code()).await {
                    warn!("Could not switch to detected language {}: {}", language, e);
                }
            }
        }

        self.current_language()
    }

    /// Best supported match for the platform locale, if confident enough.
    ///
    /// Never fails: a missing or broken detector yields `None`.
    pub async fn detect_preferred_language(&self) -> Option<Language> {
        let Some(detector) = self.detector.as_ref() else {
            debug!("Language detection is not available");
            return None;
        };

        let mut candidates = match detector.detect(&self.locale).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Language detection failed: {:#}", e);
                return None;
            }
        };
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let confident: Vec<_> = candidates
            .iter()
            .filter(|c| c.confidence > DETECTION_CONFIDENCE_THRESHOLD)
            .collect();

        let raw = confident.first().map(|c| c.language.clone());
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.detected_language != raw;
            snapshot.detected_language = raw;
            changed
        });

        let detected = confident
            .iter()
            .find_map(|c| Language::from_tag(&c.language));
        debug!("Detected language for locale '{}': {:?}", self.locale, detected);
        detected
    }

    /// Translate one piece of text from English, defaulting to the current
    /// language. Returns `text` unchanged for English, without a ready
    /// translator, or on failure. Does not touch the language state.
    pub async fn translate_text(&self, text: &str, target: Option<&str>) -> String {
        let target = match target {
            Some(code) => match Language::from_code(code) {
                Ok(language) => language,
                Err(_) => {
                    debug!("Not translating into unsupported language '{}'", code);
                    return text.to_string();
                }
            },
            None => self.current_language(),
        };
        if target.is_canonical() {
            return text.to_string();
        }
        let Some(translator) = self.translator.as_ref() else {
            return text.to_string();
        };

        let source = Language::canonical();
        if !is_ready("Translator", translator.availability(source.code(), target.code()).await) {
            return text.to_string();
        }

        let translated = match translator.create(source.code(), target.code()).await {
            Ok(session) => session.translate(text).await,
            Err(e) => Err(e),
        };
        match translated {
            Ok(value) if !value.trim().is_empty() => value,
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!("Failed to translate text into {}: {:#}", target, e);
                text.to_string()
            }
        }
    }

    /// Switch the UI language, building and caching its table if needed.
    ///
    /// On total translation failure the UI reverts to English with
    /// `fallback_active` set, and the error is returned.
    pub async fn switch_language(&self, code: &str) -> Result<Language, LocalizationError> {
        let language = Language::from_code(code)
            .map_err(|_| LocalizationError::UnsupportedLanguage(code.to_string()))?;
        let _writer = self.writer.lock().await;

        {
            let snapshot = self.state.borrow();
            if snapshot.current_language == language && !snapshot.fallback_active {
                return Ok(language);
            }
        }

        info!("Switching language to: {}", language);

        if language.is_canonical() {
            self.adopt(language, TranslationTable::english(), false);
            self.persist_preference(language).await;
            return Ok(language);
        }

        let _translating = TranslatingGuard::begin(&self.state);

        let cached = match self.cache.get(language).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable cached table for {}: {}", language, e);
                None
            }
        };

        let table = match cached {
            Some(table) => {
                self.metrics.record_cache_hit();
                debug!("Serving {} table from cache", language);
                table
            }
            None => {
                self.metrics.record_cache_miss();
                match self.build_translation_table(language).await {
                    Ok(table) => {
                        if let Err(e) = self.cache.put(language, &table).await {
                            warn!("Failed to cache {} table: {}", language, e);
                        }
                        table
                    }
                    Err(e) => {
                        self.metrics.record_total_failure();
                        self.fall_back_to_english(Some(e.to_string()));
                        self.persist_preference(Language::ENGLISH).await;
                        return Err(e);
                    }
                }
            }
        };

        self.adopt(language, Arc::new(table), false);
        self.persist_preference(language).await;
        info!("Language switched to: {}", language);
        Ok(language)
    }

    /// Force English and flag the fallback.
    pub async fn reset_to_english(&self) {
        let _writer = self.writer.lock().await;
        self.fall_back_to_english(None);
        self.persist_preference(Language::ENGLISH).await;
    }

    pub async fn cached_languages(&self) -> Result<Vec<Language>, LocalizationError> {
        Ok(self.cache.cached_languages().await?)
    }

    /// Drop every cached table; the next switch rebuilds from English.
    pub async fn clear_translation_cache(&self) -> Result<usize, LocalizationError> {
        let _writer = self.writer.lock().await;
        let removed = self.cache.clear().await?;
        info!("Cleared {} cached translation tables", removed);
        Ok(removed)
    }

    /// Translate the English table key by key, sequentially.
    ///
    /// A key whose translation fails (or loses a placeholder) keeps its
    /// English text. Zero successful keys is a total failure.
    async fn build_translation_table(
        &self,
        language: Language,
    ) -> Result<TranslationTable, LocalizationError> {
        let total_failure = || LocalizationError::TranslationTotalFailure(language.code().to_string());
        let source = Language::canonical();

        let Some(translator) = self.translator.as_ref() else {
            warn!("No translator configured, cannot build {} table", language);
            return Err(total_failure());
        };

        let answer = translator.availability(source.code(), language.code()).await;
        if !is_ready("Translator", answer) {
            warn!("Translator unavailable for {} -> {}", source, language);
            return Err(total_failure());
        }

        let session = translator
            .create(source.code(), language.code())
            .await
            .map_err(|e| {
                warn!("Failed to create translator session for {}: {:#}", language, e);
                total_failure()
            })?;

        let english = TranslationTable::english();
        let mut table = (*english).clone();
        let mut translated = 0usize;

        for (key, text) in english.iter() {
            self.metrics.record_key_translation();
            match session.translate(text).await {
                Ok(value) => {
                    let validation = TranslationValidator::validate(text, &value);
                    if validation.has_errors() {
                        self.metrics.record_key_failure();
                        debug!("Rejected translation of '{}': {:?}", key, validation.errors);
                        continue;
                    }
                    table.insert(key, value);
                    translated += 1;
                }
                Err(e) => {
                    self.metrics.record_key_failure();
                    debug!("Failed to translate '{}', keeping English: {:#}", key, e);
                }
            }
        }

        if translated == 0 {
            warn!("Every key failed to translate to {}", language);
            return Err(total_failure());
        }

        info!(
            "Built {} table: {}/{} keys translated",
            language,
            translated,
            english.len()
        );
        Ok(table)
    }

    fn adopt(&self, language: Language, table: Arc<TranslationTable>, fallback_active: bool) {
        self.state.send_modify(|snapshot| {
            snapshot.current_language = language;
            snapshot.table = table;
            snapshot.fallback_active = fallback_active;
            snapshot.last_error = None;
        });
    }

    fn fall_back_to_english(&self, error: Option<String>) {
        self.state.send_modify(|snapshot| {
            snapshot.current_language = Language::ENGLISH;
            snapshot.table = TranslationTable::english();
            snapshot.fallback_active = true;
            snapshot.last_error = error;
        });
    }

    async fn persist_preference(&self, language: Language) {
        if let Err(e) = self.store.set(PREFERENCE_KEY, language.code()).await {
            warn!("Failed to save language preference: {}", e);
        }
    }
}
