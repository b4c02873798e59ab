use super::ObjectStore;
use crate::error::StoreError;
use crate::types::ObjectDescriptor;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// An object store held entirely in process memory.
///
/// Useful for tests and for embedding the pipeline against data that is
/// already loaded. Listings come back in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, BTreeMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `bucket` if needed and stores `data` under `key`.
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Creates an empty bucket.
    pub fn create_bucket(&self, bucket: &str) {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        buckets.entry(bucket.to_string()).or_default();
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectDescriptor>, StoreError> {
        let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;

        Ok(objects
            .iter()
            .map(|(key, data)| ObjectDescriptor::new(key.clone(), Some(data.len() as u64)))
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;

        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_is_sorted_with_sizes() {
        let store = MemoryStore::new();
        store.insert("b", "z.txt", "zz");
        store.insert("b", "a/", "");
        store.insert("b", "a/x.bin", vec![1u8, 2, 3]);

        let listed = store.list_objects("b").await.unwrap();
        assert_eq!(
            listed,
            vec![
                ObjectDescriptor::new("a/", Some(0)),
                ObjectDescriptor::new("a/x.bin", Some(3)),
                ObjectDescriptor::new("z.txt", Some(2)),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_bucket_and_key() {
        let store = MemoryStore::new();
        store.create_bucket("empty");

        assert!(store.list_objects("empty").await.unwrap().is_empty());
        assert!(matches!(
            store.list_objects("nope").await,
            Err(StoreError::NoSuchBucket(b)) if b == "nope"
        ));
        assert!(matches!(
            store.get_object("empty", "k").await,
            Err(StoreError::NoSuchKey(k)) if k == "k"
        ));
    }
}
