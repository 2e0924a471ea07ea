//! Local filesystem source
//!
//! Walks a directory tree with `tokio::fs`. Every regular file becomes a Hot
//! object: the container is the root path and the name is the path relative
//! to it, using `/` separators.

use crate::analysis::StorageObject;
use crate::error::{BlobTierError, Result};
use crate::source::{ObjectSource, ObjectStream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry, ReadDir};
use tracing::{debug, warn};

enum WalkEntry {
    File(StorageObject),
    Descend(PathBuf),
    Skip,
}

/// Recursive local directory source
#[derive(Debug, Clone)]
pub struct LocalSource {
    name: String,
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            name: root.display().to_string(),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn objects(&self) -> Result<ObjectStream<'_>> {
        let metadata = fs::metadata(&self.root)
            .await
            .map_err(|e| BlobTierError::source(&self.name, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(BlobTierError::source(&self.name, "not a directory"));
        }

        let walk = Walk {
            root: self.root.clone(),
            container: self.name.clone(),
            pending: vec![self.root.clone()],
            current: None,
        };

        let stream = futures::stream::unfold(walk, |mut walk| async move {
            walk.next_object().await.map(|object| (Ok(object), walk))
        });
        Ok(Box::pin(stream))
    }
}

struct Walk {
    root: PathBuf,
    container: String,
    pending: Vec<PathBuf>,
    current: Option<ReadDir>,
}

impl Walk {
    async fn next_object(&mut self) -> Option<StorageObject> {
        loop {
            if self.current.is_none() {
                let dir = self.pending.pop()?;
                match fs::read_dir(&dir).await {
                    Ok(entries) => self.current = Some(entries),
                    Err(e) => {
                        warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                        continue;
                    }
                }
            }

            let entries = self.current.as_mut()?;
            match entries.next_entry().await {
                Ok(Some(entry)) => match self.classify(entry).await {
                    WalkEntry::File(object) => return Some(object),
                    WalkEntry::Descend(path) => self.pending.push(path),
                    WalkEntry::Skip => {}
                },
                Ok(None) => self.current = None,
                Err(e) => {
                    warn!("Stopped reading a directory under {}: {}", self.root.display(), e);
                    self.current = None;
                }
            }
        }
    }

    async fn classify(&self, entry: DirEntry) -> WalkEntry {
        let path = entry.path();
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return WalkEntry::Skip;
            }
        };

        if file_type.is_dir() {
            return WalkEntry::Descend(path);
        }
        if !file_type.is_file() {
            debug!("Skipping non-regular file {}", path.display());
            return WalkEntry::Skip;
        }

        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return WalkEntry::Skip;
            }
        };

        let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let mut object = StorageObject::new(
            self.container.clone(),
            relative_name(&self.root, &path),
            metadata.len(),
        );
        object.last_modified = last_modified;
        WalkEntry::File(object)
    }
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Tier;
    use futures::TryStreamExt;
    use std::fs as stdfs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_walks_nested_directories() {
        let dir = TempDir::new().unwrap();
        stdfs::create_dir_all(dir.path().join("a/b")).unwrap();
        stdfs::write(dir.path().join("top.txt"), b"12345").unwrap();
        stdfs::write(dir.path().join("a/mid.txt"), b"123").unwrap();
        stdfs::write(dir.path().join("a/b/deep.txt"), b"1").unwrap();

        let source = LocalSource::new(dir.path());
        let mut objects: Vec<StorageObject> = source
            .objects()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a/b/deep.txt", "a/mid.txt", "top.txt"]);
        assert_eq!(objects.iter().map(|o| o.size).sum::<u64>(), 9);
        assert!(objects.iter().all(|o| o.effective_tier() == Tier::Hot));
        assert!(objects.iter().all(|o| o.last_modified.is_some()));
        assert!(objects.iter().all(|o| o.container == source.name()));
    }

    #[tokio::test]
    async fn test_missing_root_is_a_source_error() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(dir.path().join("missing"));
        let result = source.objects().await;
        assert!(matches!(result, Err(BlobTierError::SourceError { .. })));
    }

    #[test]
    fn test_relative_name_uses_forward_slashes() {
        let root = Path::new("/data");
        let path = Path::new("/data/x/y/z.bin");
        assert_eq!(relative_name(root, path), "x/y/z.bin");
    }
}
