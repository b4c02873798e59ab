//! Remote object store abstraction.
//!
//! The pipeline only needs two calls from a bucket: list every object and
//! fetch one object's bytes. [`ObjectStore`] captures exactly that, with an
//! authenticated S3 client, an anonymous HTTP client and an in-memory store
//! behind it.

mod http;
mod memory;
mod s3;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use crate::error::StoreError;
use crate::types::ObjectDescriptor;
use bytes::Bytes;

/// Read access to a bucket-oriented object store.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns every object in `bucket`, following pagination to the end.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectDescriptor>, StoreError>;

    /// Returns the full content of one object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;
}
