//! Content-hash identity for source files.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::MediaResult;

const HASH_BUF_SIZE: usize = 64 * 1024;

/// Compute the lowercase hex SHA-256 of a file's exact bytes.
///
/// The file is streamed through the digest in chunks; it is never loaded
/// into memory whole. The result names every derived artifact, so
/// re-submission of identical bytes maps to identical output paths.
pub async fn hash_file(path: impl AsRef<Path>) -> MediaResult<String> {
    let mut file = File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_identical_bytes_same_hash() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        tokio::fs::write(&a, b"same content").await.unwrap();
        tokio::fs::write(&b, b"same content").await.unwrap();

        assert_eq!(hash_file(&a).await.unwrap(), hash_file(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_differing_bytes_different_hash() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        tokio::fs::write(&a, b"content one").await.unwrap();
        tokio::fs::write(&b, b"content two").await.unwrap();

        assert_ne!(hash_file(&a).await.unwrap(), hash_file(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        tokio::fs::write(&path, b"").await.unwrap();

        // SHA-256 of the empty string
        assert_eq!(
            hash_file(&path).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        assert!(hash_file("/nonexistent/file.bin").await.is_err());
    }
}
