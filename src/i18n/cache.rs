//! Persistent per-language translation table cache.

use std::sync::Arc;

use super::table::TranslationTable;
use super::Language;
use crate::error::StorageError;
use crate::storage::{load_json, save_json, KeyValueStore};

const KEY_PREFIX: &str = "translation-";

/// Language code → table, stored as `translation-<code>` JSON entries.
///
/// English is never stored: it is always available in memory.
#[derive(Clone)]
pub struct TranslationCache {
    store: Arc<dyn KeyValueStore>,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn storage_key(code: &str) -> String {
        format!("{}{}", KEY_PREFIX, code)
    }

    pub async fn get(&self, language: Language) -> Result<Option<TranslationTable>, StorageError> {
        if language.is_canonical() {
            return Ok(None);
        }
        load_json(self.store.as_ref(), &Self::storage_key(language.code())).await
    }

    pub async fn put(&self, language: Language, table: &TranslationTable) -> Result<(), StorageError> {
        if language.is_canonical() {
            return Ok(());
        }
        save_json(self.store.as_ref(), &Self::storage_key(language.code()), table).await
    }

    /// Codes of supported languages with a stored table.
    pub async fn cached_languages(&self) -> Result<Vec<Language>, StorageError> {
        let keys = self.store.keys_with_prefix(KEY_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX))
            .filter_map(|code| Language::from_code(code).ok())
            .collect())
    }

    /// Remove every stored table. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize, StorageError> {
        let keys = self.store.keys_with_prefix(KEY_PREFIX).await?;
        for key in &keys {
            self.store.remove(key).await?;
        }
        Ok(keys.len())
    }
}
