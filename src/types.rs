//! Data structures for mirror operations.

use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;

/// One remote object as reported by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Slash-delimited object key, unique within the listing.
    pub key: String,
    /// Object size in bytes, when the store reports it.
    pub size: Option<u64>,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Keys ending in `/` are folder placeholders and carry no file content.
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// Downloaded object content paired with the key it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// The original object key.
    pub filename: String,
    /// Raw object bytes.
    pub data: Bytes,
}

/// Configuration for a mirror run.
///
/// # Example
///
/// ```
/// use bucketmirror::MirrorConfig;
/// use std::path::PathBuf;
///
/// let config = MirrorConfig {
///     bucket: "my-bucket".to_string(),
///     output_root: PathBuf::from("/srv/mirror"),
///     max_in_flight: 8,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Bucket to mirror.
    pub bucket: String,
    /// Local directory all output is rooted under.
    pub output_root: PathBuf,
    /// Maximum number of concurrent fetches, and separately of concurrent
    /// writes (default: 16).
    ///
    /// Both stages are I/O-bound; the bound exists to stay under connection
    /// and file-descriptor limits on large buckets.
    pub max_in_flight: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            output_root: PathBuf::from("out"),
            max_in_flight: 16,
        }
    }
}

/// Stages of a mirror run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Enumerating the bucket
    Listing,
    /// Creating local directories
    TreeBuild,
    /// Retrieving object content
    Fetch,
    /// Writing files to disk
    Write,
    /// Finished successfully
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Listing => "listing",
            Stage::TreeBuild => "tree-build",
            Stage::Fetch => "fetch",
            Stage::Write => "write",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Counts reported by a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub objects_listed: usize,
    pub directories_ensured: usize,
    pub files_written: usize,
    pub bytes_written: u64,
}
