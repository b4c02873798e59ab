//! Bucket listing stage.

use crate::error::MirrorError;
use crate::store::ObjectStore;
use crate::types::ObjectDescriptor;
use tracing::{error, info};

/// Lists every object in `bucket`.
///
/// The listing is collected in full before returning; a failure leaves
/// nothing for later stages to act on.
pub async fn list_bucket(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<Vec<ObjectDescriptor>, MirrorError> {
    info!("Listing objects in bucket {}", bucket);

    let objects = store.list_objects(bucket).await.map_err(|source| {
        error!("Listing bucket {} failed: {}", bucket, source);
        MirrorError::List {
            bucket: bucket.to_string(),
            source,
        }
    })?;

    let markers = objects.iter().filter(|o| o.is_directory_marker()).count();
    info!(
        "Found {} objects ({} directory markers) in {}",
        objects.len(),
        markers,
        bucket
    );
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_missing_bucket_is_list_error() {
        let store = MemoryStore::new();
        let err = list_bucket(&store, "ghost").await.unwrap_err();
        assert!(matches!(
            err,
            MirrorError::List { ref bucket, source: StoreError::NoSuchBucket(_) } if bucket == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_lists_all_objects() {
        let store = MemoryStore::new();
        store.insert("b", "a/", "");
        store.insert("b", "a/b.txt", "hello");

        let objects = list_bucket(&store, "b").await.unwrap();
        let keys: Vec<_> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a/", "a/b.txt"]);
    }
}
