//! Error types for mirror operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an [`ObjectStore`](crate::store::ObjectStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The bucket does not exist or cannot be listed.
    #[error("No such bucket: {0}")]
    NoSuchBucket(String),

    /// The object does not exist in the bucket.
    #[error("No such key: {0}")]
    NoSuchKey(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// HTTP request error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The listing response could not be parsed.
    #[error("Invalid listing response: {0}")]
    Xml(String),

    /// Error reported by the AWS SDK.
    #[error("S3 request failed: {0}")]
    S3(String),
}

/// Errors that abort a mirror run.
///
/// Each stage of the pipeline has its own variant so the caller can tell
/// which stage the run died in.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Listing the bucket failed.
    #[error("Failed to list bucket {bucket}: {source}")]
    List {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// A local directory could not be checked or created.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Retrieving an object failed.
    #[error("Failed to fetch {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Writing a file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The key would resolve outside the output root.
    #[error("Refusing to mirror key {0:?}: it escapes the output directory")]
    InvalidKey(String),

    /// Invalid run configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A spawned fetch or write task panicked or was cancelled.
    #[error("Task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    /// The concurrency limiter was closed while tasks were waiting on it.
    #[error(transparent)]
    LimiterClosed(#[from] tokio::sync::AcquireError),
}
