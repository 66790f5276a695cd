//! File Collector
//!
//! Normalizes heterogeneous input sources into an ordered collection of
//! logical files. Two shapes are supported: a directory tree (expanded
//! depth-first with an explicit worklist, accumulating the relative-path
//! prefix) and a flat file list where each entry may carry a relative-path
//! hint, falling back to the bare filename.
//!
//! Duplicate relative paths are last-write-wins; the later entry replaces the
//! earlier one in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::session::types::FileReq;

/// One file inside a vault being built
///
/// The local path is the opaque byte source; nothing outside the build reads
/// it.
#[derive(Debug, Clone)]
pub struct LogicalFile {
    /// Slash-separated path inside the vault, no leading `./` or `..`
    pub relative_path: String,

    /// File size in bytes
    pub size_bytes: u64,

    /// Detected MIME type
    pub content_type: String,

    /// Local byte source
    pub source: PathBuf,
}

impl LogicalFile {
    /// Descriptor used to request an upload grant for this file
    pub fn to_file_req(&self) -> FileReq {
        FileReq {
            rel_path: self.relative_path.clone(),
            size: self.size_bytes,
            content_type: self.content_type.clone(),
        }
    }
}

/// Sum of all file sizes
pub fn total_bytes(files: &[LogicalFile]) -> u64 {
    files.iter().map(|f| f.size_bytes).sum()
}

/// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CollectError + '_ {
    move |source| CollectError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Collect every file under a directory, preserving folder structure.
///
/// Traversal is an explicit worklist rather than recursion; entries are
/// visited depth-first in name order so the output is deterministic. An empty
/// directory yields zero files, not an error. Symlinks are followed via
/// `tokio::fs::metadata`.
pub async fn collect_dir(root: &Path) -> Result<Vec<LogicalFile>, CollectError> {
    let meta = tokio::fs::metadata(root).await.map_err(io_err(root))?;
    if !meta.is_dir() {
        return Err(CollectError::NotADirectory(root.to_path_buf()));
    }

    let mut collected = Collected::new();
    let mut worklist: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, prefix)) = worklist.pop() {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(io_err(&dir))?;
        while let Some(entry) = read_dir.next_entry().await.map_err(io_err(&dir))? {
            entries.push(entry.path());
        }

        // Name order; reversed before pushing so the stack pops
        // lexicographically first.
        entries.sort();

        for path in entries.into_iter().rev() {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue, // non-UTF-8 names are skipped
            };

            let rel = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            let meta = tokio::fs::metadata(&path).await.map_err(io_err(&path))?;
            if meta.is_dir() {
                worklist.push((path, rel));
            } else {
                collected.push(logical_file(rel, meta.len(), path));
            }
        }
    }

    let files = collected.into_vec();
    tracing::debug!(root = %root.display(), count = files.len(), "Collected directory");
    Ok(files)
}

/// Collect a flat list of files, each with an optional relative-path hint.
///
/// Without a hint the bare filename is used, so two hint-less files with the
/// same name collapse to one entry (last wins).
pub async fn collect_files(
    entries: &[(PathBuf, Option<String>)],
) -> Result<Vec<LogicalFile>, CollectError> {
    let mut collected = Collected::new();

    for (path, hint) in entries {
        let meta = tokio::fs::metadata(path).await.map_err(io_err(path))?;

        let rel = match hint {
            Some(hint) => hint.clone(),
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unnamed")
                .to_string(),
        };

        collected.push(logical_file(rel, meta.len(), path.clone()));
    }

    Ok(collected.into_vec())
}

fn logical_file(relative_path: String, size_bytes: u64, source: PathBuf) -> LogicalFile {
    let content_type = mime_guess::from_path(&source)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    LogicalFile {
        relative_path,
        size_bytes,
        content_type,
        source,
    }
}

/// Ordered accumulator with last-write-wins on duplicate relative paths
struct Collected {
    files: Vec<LogicalFile>,
    by_path: HashMap<String, usize>,
}

impl Collected {
    fn new() -> Self {
        Self {
            files: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    fn push(&mut self, file: LogicalFile) {
        match self.by_path.get(&file.relative_path) {
            Some(&index) => {
                tracing::debug!(
                    relative_path = %file.relative_path,
                    "Duplicate relative path, keeping latest"
                );
                self.files[index] = file;
            }
            None => {
                self.by_path.insert(file.relative_path.clone(), self.files.len());
                self.files.push(file);
            }
        }
    }

    fn into_vec(self) -> Vec<LogicalFile> {
        self.files
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(dir: &Path, rel: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_collect_dir_preserves_structure() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "readme.md", b"hello").await;
        write(tmp.path(), "docs/guide.txt", b"guide").await;
        write(tmp.path(), "docs/img/logo.png", b"png").await;

        let files = collect_dir(tmp.path()).await.unwrap();
        let mut paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        paths.sort();

        assert_eq!(paths, vec!["docs/guide.txt", "docs/img/logo.png", "readme.md"]);
    }

    #[tokio::test]
    async fn test_collect_dir_is_depth_first_in_name_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.txt", b"b").await;
        write(tmp.path(), "a/inner.txt", b"i").await;
        write(tmp.path(), "c.txt", b"c").await;

        let files = collect_dir(tmp.path()).await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a/inner.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn test_empty_directory_yields_zero_files() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir(tmp.path().join("empty")).await.unwrap();

        let files = collect_dir(tmp.path()).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_collect_dir_rejects_file_root() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "a.txt", b"a").await;

        let result = collect_dir(&file).await;
        assert!(matches!(result, Err(CollectError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_flat_list_uses_hint_or_filename() {
        let tmp = TempDir::new().unwrap();
        let a = write(tmp.path(), "a.txt", b"a").await;
        let b = write(tmp.path(), "b.txt", b"b").await;

        let files = collect_files(&[
            (a, Some("docs/a.txt".to_string())),
            (b, None),
        ])
        .await
        .unwrap();

        assert_eq!(files[0].relative_path, "docs/a.txt");
        assert_eq!(files[1].relative_path, "b.txt");
    }

    #[tokio::test]
    async fn test_duplicate_paths_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        let first = write(tmp.path(), "first.bin", b"one").await;
        let second = write(tmp.path(), "second.bin", b"three").await;

        let files = collect_files(&[
            (first, Some("data.bin".to_string())),
            (second, Some("data.bin".to_string())),
        ])
        .await
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "data.bin");
        assert_eq!(files[0].size_bytes, 5);
    }

    #[tokio::test]
    async fn test_content_type_detection() {
        let tmp = TempDir::new().unwrap();
        let png = write(tmp.path(), "logo.png", b"png").await;
        let blob = write(tmp.path(), "blob", b"data").await;

        let files = collect_files(&[(png, None), (blob, None)]).await.unwrap();
        assert_eq!(files[0].content_type, "image/png");
        assert_eq!(files[1].content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_total_bytes() {
        let tmp = TempDir::new().unwrap();
        let a = write(tmp.path(), "a.txt", b"12345").await;
        let b = write(tmp.path(), "b.txt", b"123").await;

        let files = collect_files(&[(a, None), (b, None)]).await.unwrap();
        assert_eq!(total_bytes(&files), 8);
    }
}
