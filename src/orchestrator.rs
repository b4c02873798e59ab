//! Main orchestration logic for mirroring a bucket.

use crate::error::MirrorError;
use crate::fetch::fetch_all;
use crate::list::list_bucket;
use crate::store::ObjectStore;
use crate::tree::materialize_tree;
use crate::types::{MirrorConfig, MirrorSummary, Stage};
use crate::write::write_all;
use std::sync::Arc;
use tracing::{error, info};

/// Mirrors `config.bucket` from `store` into `config.output_root`.
///
/// This is the main entry point. It performs the following steps, each
/// finishing before the next begins:
///
/// 1. Lists every object in the bucket
/// 2. Creates the local directory for every key
/// 3. Fetches every object that is not a directory marker
/// 4. Writes the fetched content to disk
///
/// The first error aborts the run. Nothing is retried or cleaned up, so a
/// failed run may leave a partial mirror behind; run it again from scratch.
///
/// # Example
///
/// ```no_run
/// use bucketmirror::{mirror_bucket, MirrorConfig, S3Store};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MirrorConfig {
///     bucket: "my-bucket".to_string(),
///     ..MirrorConfig::default()
/// };
/// let store = Arc::new(S3Store::from_env(None).await);
/// let summary = mirror_bucket(&config, store).await?;
/// println!("wrote {} files", summary.files_written);
/// # Ok(())
/// # }
/// ```
pub async fn mirror_bucket(
    config: &MirrorConfig,
    store: Arc<dyn ObjectStore>,
) -> Result<MirrorSummary, MirrorError> {
    if config.max_in_flight == 0 {
        return Err(MirrorError::Config(
            "max_in_flight must be at least 1".to_string(),
        ));
    }

    let mut stage = Stage::Listing;
    let result = run_stages(config, store, &mut stage).await;
    match &result {
        Ok(summary) => info!(
            "✅ Mirrored {} objects from {} into {} ({} files, {} bytes)",
            summary.objects_listed,
            config.bucket,
            config.output_root.display(),
            summary.files_written,
            summary.bytes_written
        ),
        Err(e) => error!("❌ Mirror aborted during {} stage: {}", stage, e),
    }
    result
}

async fn run_stages(
    config: &MirrorConfig,
    store: Arc<dyn ObjectStore>,
    stage: &mut Stage,
) -> Result<MirrorSummary, MirrorError> {
    let mut summary = MirrorSummary::default();

    let descriptors = list_bucket(store.as_ref(), &config.bucket).await?;
    summary.objects_listed = descriptors.len();

    *stage = Stage::TreeBuild;
    let (descriptors, directories) = materialize_tree(&config.output_root, descriptors).await?;
    summary.directories_ensured = directories;

    *stage = Stage::Fetch;
    let files = fetch_all(store, &config.bucket, &descriptors, config.max_in_flight).await?;
    summary.files_written = files.len();

    *stage = Stage::Write;
    summary.bytes_written = write_all(&config.output_root, files, config.max_in_flight).await?;

    *stage = Stage::Done;
    Ok(summary)
}
