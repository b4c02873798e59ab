//! Concurrent object retrieval.

use crate::bounded::run_bounded;
use crate::error::MirrorError;
use crate::store::ObjectStore;
use crate::types::{FetchedFile, ObjectDescriptor};
use std::sync::Arc;
use tracing::{debug, info};

/// Retrieves the content of every non-marker descriptor.
///
/// At most `max_in_flight` requests are outstanding at once. The result is
/// all-or-nothing: the first failure aborts the remaining retrievals and
/// no fetched content is returned. Output order is unspecified.
///
/// # Arguments
///
/// * `store` - Object store to read from
/// * `bucket` - Bucket holding the objects
/// * `descriptors` - Listing produced by [`list_bucket`](crate::list_bucket)
/// * `max_in_flight` - Concurrency bound, at least 1
pub async fn fetch_all(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    descriptors: &[ObjectDescriptor],
    max_in_flight: usize,
) -> Result<Vec<FetchedFile>, MirrorError> {
    let jobs: Vec<_> = descriptors
        .iter()
        .filter(|d| !d.is_directory_marker())
        .map(|descriptor| {
            let store = Arc::clone(&store);
            let bucket = bucket.to_string();
            let key = descriptor.key.clone();

            async move {
                debug!("⬇️  Fetching {}", key);
                match store.get_object(&bucket, &key).await {
                    Ok(data) => Ok(FetchedFile {
                        filename: key,
                        data,
                    }),
                    Err(source) => Err(MirrorError::Fetch { key, source }),
                }
            }
        })
        .collect();

    info!("Fetching {} objects from {}", jobs.len(), bucket);
    let files = run_bounded(jobs, max_in_flight, "Fetch").await?;

    info!("✅ Fetched {} objects", files.len());
    Ok(files)
}
