//! Content Hasher
//!
//! Streams file contents through SHA-256 in fixed-size chunks so peak memory
//! stays bounded no matter how large the vault is. Multi-file digests hash a
//! canonical stream: files sorted lexicographically by relative path, each
//! prefixed by its path and a NUL delimiter, so the digest fingerprints both
//! bytes and position. The hashing loop yields to the runtime after every
//! chunk so a large archive cannot starve other work.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use super::collect::LogicalFile;

/// Chunk size for streaming reads: 8 MiB
pub const HASH_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Hashing errors
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Hex SHA-256 of a single file's contents, streamed chunk by chunk
pub async fn hash_file(path: &Path) -> Result<String, HashError> {
    let mut hasher = Sha256::new();
    feed_file(&mut hasher, path).await?;
    Ok(hex::encode(hasher.finalize()))
}

/// Archive digest over a set of logical files.
///
/// Deterministic for a fixed set of (path, bytes) pairs regardless of the
/// order `files` arrives in: entries are sorted by relative path before
/// hashing, and each file's path (plus a NUL delimiter) is injected into the
/// hash input ahead of its bytes. Identical contents under different paths
/// therefore produce different digests.
pub async fn archive_digest(files: &[LogicalFile]) -> Result<String, HashError> {
    let mut ordered: Vec<&LogicalFile> = files.iter().collect();
    ordered.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let mut hasher = Sha256::new();
    for file in ordered {
        hasher.update(file.relative_path.as_bytes());
        hasher.update([0u8]);
        feed_file(&mut hasher, &file.source).await?;
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Stream one file into the hasher in bounded chunks, yielding between chunks
async fn feed_file(hasher: &mut Sha256, path: &Path) -> Result<(), HashError> {
    let io_err = |source| HashError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);

        // Cooperative suspension point between chunks
        tokio::task::yield_now().await;
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
