use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::{load_json, save_json, KeyValueStore};
use crate::error::StorageError;

pub const HISTORY_KEY: &str = "hairstyle-ai-history";

/// Most-recent records kept; older ones are dropped on append.
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub face_shape: String,
    pub hairstyle_name: String,
    pub recommendation_text: String,
}

impl HistoryRecord {
    pub fn new(
        face_shape: impl Into<String>,
        hairstyle_name: impl Into<String>,
        recommendation_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            face_shape: face_shape.into(),
            hairstyle_name: hairstyle_name.into(),
            recommendation_text: recommendation_text.into(),
        }
    }
}

/// Newest-first list of analysis records.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load all records. A corrupt entry is logged and read as empty.
    pub async fn load(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        match load_json::<Vec<HistoryRecord>>(self.store.as_ref(), HISTORY_KEY).await {
            Ok(records) => Ok(records.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                warn!("Discarding unreadable history: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Prepend a record, keeping at most `MAX_HISTORY` entries.
    pub async fn append(&self, record: HistoryRecord) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut records = self.load().await?;
        records.insert(0, record);
        records.truncate(MAX_HISTORY);
        save_json(self.store.as_ref(), HISTORY_KEY, &records).await?;
        Ok(records)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(HISTORY_KEY).await
    }

    /// Pretty-printed JSON array of every record.
    pub async fn export(&self) -> Result<String, StorageError> {
        let records = self.load().await?;
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Replace the history with an exported JSON array.
    ///
    /// Returns the number of records kept.
    pub async fn import(&self, json: &str) -> Result<usize, StorageError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_array() {
            return Err(StorageError::InvalidImport(
                "expected a JSON array of history records".to_string(),
            ));
        }

        let mut records: Vec<HistoryRecord> = serde_json::from_value(value)?;
        records.truncate(MAX_HISTORY);
        save_json(self.store.as_ref(), HISTORY_KEY, &records).await?;

        info!("Imported {} history records", records.len());
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn create_history() -> (HistoryStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        (HistoryStore::new(memory.clone()), memory)
    }

    #[tokio::test]
    async fn test_empty_history() {
        let (history, _) = create_history();
        assert!(history.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_is_newest_first() {
        let (history, _) = create_history();
        history
            .append(HistoryRecord::new("Oval", "Bob", "first"))
            .await
            .unwrap();
        let records = history
            .append(HistoryRecord::new("Round", "Pixie", "second"))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].recommendation_text, "second");
        assert_eq!(history.load().await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_append_caps_at_fifty() {
        let (history, _) = create_history();
        for i in 0..(MAX_HISTORY + 5) {
            history
                .append(HistoryRecord::new("Oval", "Bob", format!("#{}", i)))
                .await
                .unwrap();
        }

        let records = history.load().await.unwrap();
        assert_eq!(records.len(), MAX_HISTORY);
        assert_eq!(records[0].recommendation_text, format!("#{}", MAX_HISTORY + 4));
        assert_eq!(records[MAX_HISTORY - 1].recommendation_text, "#5");
    }

    #[tokio::test]
    async fn test_export_import_between_stores() {
        let (source, _) = create_history();
        source
            .append(HistoryRecord::new("Heart", "Lob", "advice"))
            .await
            .unwrap();
        let exported = source.export().await.unwrap();
        assert!(exported.contains("\"faceShape\": \"Heart\""));

        let (target, _) = create_history();
        assert_eq!(target.import(&exported).await.unwrap(), 1);
        assert_eq!(target.load().await.unwrap(), source.load().await.unwrap());
    }

    #[tokio::test]
    async fn test_import_rejects_non_array() {
        let (history, _) = create_history();
        let result = history.import(r#"{"faceShape":"Oval"}"#).await;
        assert!(matches!(result, Err(StorageError::InvalidImport(_))));

        let result = history.import("not json").await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_corrupt_history_reads_as_empty() {
        let (history, memory) = create_history();
        memory.set(HISTORY_KEY, "[{\"broken\":").await.unwrap();
        assert!(history.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let (history, memory) = create_history();
        history
            .append(HistoryRecord::new("Oval", "Bob", "x"))
            .await
            .unwrap();
        history.clear().await.unwrap();
        assert!(memory.is_empty());
    }
}
