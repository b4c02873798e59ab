//! Local directory tree materialization and key-to-path mapping.

use crate::error::MirrorError;
use crate::types::ObjectDescriptor;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Maps an object key to its location under `root`.
///
/// Each `/`-separated segment becomes one path component. Empty and `.`
/// segments are dropped, so `a//b` and `/a/b` both land at `root/a/b`.
/// A `..` segment is rejected.
pub fn local_path(root: &Path, key: &str) -> Result<PathBuf, MirrorError> {
    let mut path = root.to_path_buf();
    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(MirrorError::InvalidKey(key.to_string())),
            segment => path.push(segment),
        }
    }
    Ok(path)
}

/// The directory that must exist before `key` can be written: the parent
/// of [`local_path`], or `root` when there is none.
///
/// For a directory marker such as `a/` this is `root`, not `root/a`.
pub fn directory_for(root: &Path, key: &str) -> Result<PathBuf, MirrorError> {
    let path = local_path(root, key)?;
    Ok(path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf()))
}

/// Ensures the directory for every descriptor exists under `root`.
///
/// Missing intermediate directories are created; existing ones are left
/// alone, so repeated calls are harmless. Stops at the first failure.
/// Returns the descriptors unchanged together with the number of distinct
/// directories ensured.
pub async fn materialize_tree(
    root: &Path,
    descriptors: Vec<ObjectDescriptor>,
) -> Result<(Vec<ObjectDescriptor>, usize), MirrorError> {
    let mut seen = HashSet::new();
    let mut created = 0usize;

    for descriptor in &descriptors {
        let dir = directory_for(root, &descriptor.key)?;
        if !seen.insert(dir.clone()) {
            continue;
        }

        // Anything that is not already a directory goes to create_dir_all,
        // which reports the real failure.
        let is_dir = tokio::fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            continue;
        }

        debug!("Creating directory {}", dir.display());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| MirrorError::DirectoryCreate {
                path: dir.clone(),
                source,
            })?;
        created += 1;
    }

    info!(
        "📂 Ensured {} directories under {} ({} created)",
        seen.len(),
        root.display(),
        created
    );
    Ok((descriptors, seen.len()))
}
