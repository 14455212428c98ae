//! Filesystem helpers for artifact folders.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::MediaResult;

/// Recursively list all files under `dir` (directories excluded).
///
/// Used to enumerate an artifact folder before handing it to the object
/// store.
pub async fn list_files(dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Remove a local file, e.g. a consumed upload.
pub async fn remove_file(path: impl AsRef<Path>) -> MediaResult<()> {
    fs::remove_file(path.as_ref()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_files_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).await.unwrap();
        fs::write(dir.path().join("a.ts"), b"a").await.unwrap();
        fs::write(dir.path().join("sub/b.ts"), b"b").await.unwrap();
        fs::write(dir.path().join("index.m3u8"), b"#EXTM3U").await.unwrap();

        let files = list_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.is_file()));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.mp4");
        fs::write(&path, b"data").await.unwrap();

        remove_file(&path).await.unwrap();
        assert!(!path.exists());

        assert!(remove_file(&path).await.is_err());
    }
}
