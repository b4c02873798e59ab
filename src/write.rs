//! Concurrent file writing.

use crate::bounded::run_bounded;
use crate::error::MirrorError;
use crate::tree::local_path;
use crate::types::FetchedFile;
use std::path::Path;
use tracing::{debug, info};

/// Writes every fetched file to its location under `root`.
///
/// Existing files are overwritten. At most `max_in_flight` writes run at
/// once and the first failure is returned. Files that were already written
/// when a sibling fails are left on disk.
///
/// Directories are expected to exist already (see
/// [`materialize_tree`](crate::materialize_tree)).
///
/// # Returns
///
/// The total number of bytes written.
pub async fn write_all(
    root: &Path,
    files: Vec<FetchedFile>,
    max_in_flight: usize,
) -> Result<u64, MirrorError> {
    // Resolve every path first so a bad key fails before anything is written.
    let targets = files
        .into_iter()
        .map(|file| local_path(root, &file.filename).map(|path| (path, file)))
        .collect::<Result<Vec<_>, _>>()?;

    let jobs: Vec<_> = targets
        .into_iter()
        .map(|(path, file)| async move {
            debug!("Writing {} bytes to {}", file.data.len(), path.display());
            match tokio::fs::write(&path, &file.data).await {
                Ok(()) => Ok(file.data.len() as u64),
                Err(source) => Err(MirrorError::Write { path, source }),
            }
        })
        .collect();

    let file_count = jobs.len();
    info!("Writing {} files under {}", file_count, root.display());
    let bytes_written: u64 = run_bounded(jobs, max_in_flight, "Write")
        .await?
        .into_iter()
        .sum();

    info!("✅ Wrote {} files ({} bytes)", file_count, bytes_written);
    Ok(bytes_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn fetched(filename: &str, data: &'static str) -> FetchedFile {
        FetchedFile {
            filename: filename.to_string(),
            data: Bytes::from_static(data.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_writes_nested_files_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("a")).unwrap();
        std::fs::write(tmp.path().join("c.txt"), b"stale content that is longer").unwrap();

        let written = write_all(
            tmp.path(),
            vec![fetched("a/b.txt", "hello"), fetched("c.txt", "world")],
            2,
        )
        .await
        .unwrap();

        assert_eq!(written, 10);
        assert_eq!(std::fs::read(tmp.path().join("a/b.txt")).unwrap(), b"hello");
        assert_eq!(std::fs::read(tmp.path().join("c.txt")).unwrap(), b"world");
    }

    #[tokio::test]
    async fn test_missing_directory_is_write_error() {
        let tmp = tempfile::tempdir().unwrap();

        let err = write_all(tmp.path(), vec![fetched("nodir/x.txt", "x")], 1)
            .await
            .unwrap_err();
        match err {
            MirrorError::Write { path, .. } => assert_eq!(path, tmp.path().join("nodir/x.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_escaping_key_before_writing() {
        let tmp = tempfile::tempdir().unwrap();

        let err = write_all(
            tmp.path(),
            vec![fetched("ok.txt", "fine"), fetched("../evil.txt", "nope")],
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MirrorError::InvalidKey(_)));
        assert!(!tmp.path().join("../evil.txt").exists());
        assert!(!tmp.path().join("ok.txt").exists());
    }

    #[tokio::test]
    async fn test_single_slot_writes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let files: Vec<_> = (0..12)
            .map(|i| FetchedFile {
                filename: format!("f{}.txt", i),
                data: Bytes::from(format!("body {}", i)),
            })
            .collect();

        write_all(tmp.path(), files, 1).await.unwrap();

        for i in 0..12 {
            let body = std::fs::read_to_string(tmp.path().join(format!("f{}.txt", i))).unwrap();
            assert_eq!(body, format!("body {}", i));
        }
    }
}
