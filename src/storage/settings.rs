use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{load_json, save_json, KeyValueStore, HISTORY_KEY};
use crate::error::StorageError;

pub const SETTINGS_KEY: &str = "hairstyle-ai-settings";
pub const PREFERENCES_KEY: &str = "hairstyle-ai-user-preferences";

/// Keys counted by `storage_usage`.
pub const USAGE_KEYS: [&str; 3] = [HISTORY_KEY, SETTINGS_KEY, PREFERENCES_KEY];

/// Saved user preferences with the time they were written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub preferences: Value,
    pub last_updated: DateTime<Utc>,
}

/// Free-form application settings and user preferences.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current settings. Missing or unreadable settings read as empty.
    pub async fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match load_json::<Map<String, Value>>(self.store.as_ref(), SETTINGS_KEY).await {
            Ok(settings) => Ok(settings.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                warn!("Discarding unreadable settings: {}", e);
                Ok(Map::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Merge `changes` over the saved settings, top-level keys replacing
    /// existing ones. Returns the merged settings.
    pub async fn update(
        &self,
        changes: Map<String, Value>,
    ) -> Result<Map<String, Value>, StorageError> {
        let mut settings = self.load().await?;
        settings.extend(changes);
        save_json(self.store.as_ref(), SETTINGS_KEY, &settings).await?;
        debug!("Saved {} settings", settings.len());
        Ok(settings)
    }

    /// Replace the saved preferences, stamping them with the current time.
    pub async fn save_preferences(&self, preferences: Value) -> Result<UserPreferences, StorageError> {
        let record = UserPreferences {
            preferences,
            last_updated: Utc::now(),
        };
        save_json(self.store.as_ref(), PREFERENCES_KEY, &record).await?;
        Ok(record)
    }

    /// Saved preferences, or `None` when absent or unreadable.
    pub async fn load_preferences(&self) -> Result<Option<UserPreferences>, StorageError> {
        match load_json::<UserPreferences>(self.store.as_ref(), PREFERENCES_KEY).await {
            Ok(record) => Ok(record),
            Err(StorageError::Serialization(e)) => {
                warn!("Discarding unreadable user preferences: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Bytes held by the history, settings and preferences entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub total_bytes: usize,
}

impl StorageUsage {
    /// Size in megabytes with two decimals, for the `storage.usage` string.
    pub fn megabytes(&self) -> String {
        format!("{:.2}", self.total_bytes as f64 / (1024.0 * 1024.0))
    }
}

pub async fn storage_usage(store: &dyn KeyValueStore) -> Result<StorageUsage, StorageError> {
    let mut total_bytes = 0;
    for key in USAGE_KEYS {
        if let Some(value) = store.get(key).await? {
            total_bytes += value.len();
        }
    }
    Ok(StorageUsage { total_bytes })
}
