//! bucketmirror - copy an object-storage bucket onto the local filesystem
//!
//! This library mirrors every object of an S3-compatible bucket into a
//! local directory, recreating the bucket's key hierarchy as nested
//! directories.
//!
//! A run is a straight pipeline: list the bucket, create the directories
//! the keys imply, fetch every object and write each one to disk. Keys
//! ending in `/` are directory markers and never become files.
//!
//! # Features
//!
//! - **Bounded Concurrency**: Fetches and writes run concurrently up to a configured limit
//! - **Complete Listings**: Paginated listings are followed to the end
//! - **Fail Fast**: The first error aborts the run; no fetched content is written after a failed fetch
//! - **Pluggable Stores**: AWS SDK, anonymous HTTP or in-memory
//!
//! # Example
//!
//! ```no_run
//! use bucketmirror::{mirror_bucket, HttpStore, MirrorConfig};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MirrorConfig {
//!     bucket: "public-data".to_string(),
//!     output_root: PathBuf::from("out"),
//!     max_in_flight: 16,
//! };
//! let store = Arc::new(HttpStore::new("https://s3.example.com"));
//!
//! mirror_bucket(&config, store).await?;
//! # Ok(())
//! # }
//! ```

mod bounded;
mod error;
mod fetch;
mod list;
mod orchestrator;
pub mod store;
mod tree;
mod types;
mod write;

pub use error::{MirrorError, StoreError};
pub use fetch::fetch_all;
pub use list::list_bucket;
pub use orchestrator::mirror_bucket;
pub use store::{HttpStore, MemoryStore, ObjectStore, S3Store};
pub use tree::{directory_for, local_path, materialize_tree};
pub use types::{FetchedFile, MirrorConfig, MirrorSummary, ObjectDescriptor, Stage};
pub use write::write_all;
