use crate::error::{Result, SessionError};
use crate::traits::store::BackingStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory backing store implementation
///
/// Stores records in a HashMap. Suitable for development and testing,
/// but not for production (records are lost on restart and not shared
/// across processes). Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl BackingStore for InMemoryStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = glob::Pattern::new(pattern).map_err(|e| {
            SessionError::invalid_config(format!("Invalid key pattern '{}': {}", pattern, e))
        })?;

        let entries = self.entries.read().await;
        Ok(entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect())
    }

    fn is_healthy(&self) -> bool {
        true // In-memory store is always healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = InMemoryStore::new();

        store.set_bytes("abc", b"payload".to_vec()).await.unwrap();
        assert_eq!(store.get_bytes("abc").await.unwrap(), Some(b"payload".to_vec()));

        store.delete("abc").await.unwrap();
        assert_eq!(store.get_bytes("abc").await.unwrap(), None);

        // Deleting an absent key is not an error
        store.delete("abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = InMemoryStore::new();
        let other = store.clone();

        store.set_bytes("shared", vec![1, 2, 3]).await.unwrap();
        assert_eq!(other.get_bytes("shared").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(other.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_pattern() {
        let store = InMemoryStore::new();
        store.set_bytes("sess:1", vec![]).await.unwrap();
        store.set_bytes("sess:2", vec![]).await.unwrap();
        store.set_bytes("other", vec![]).await.unwrap();

        let mut all = store.keys("*").await.unwrap();
        all.sort();
        assert_eq!(all, vec!["other", "sess:1", "sess:2"]);

        let mut prefixed = store.keys("sess:*").await.unwrap();
        prefixed.sort();
        assert_eq!(prefixed, vec!["sess:1", "sess:2"]);

        assert_eq!(store.keys("sess:?").await.unwrap().len(), 2);
        assert_eq!(store.keys("sess:[1]").await.unwrap(), vec!["sess:1"]);
        assert_eq!(store.keys("*:*").await.unwrap().len(), 2);
        assert!(store.keys("sess").await.unwrap().is_empty());
        assert!(store.keys("sess:1x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_on_empty_store() {
        let store = InMemoryStore::new();
        assert!(store.keys("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_rejects_malformed_pattern() {
        let store = InMemoryStore::new();
        store.set_bytes("sess:1", vec![]).await.unwrap();

        let err = store.keys("sess:[").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }
}
