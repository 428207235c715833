use async_trait::async_trait;
use std::path::{Path, PathBuf};

use docindex_core::error::{Error, Result};
use docindex_core::traits::ObjectStore;

/// Object store backed by a directory on the local filesystem.
///
/// Object names must be flat (no path separators); each object is one file
/// under the root.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub async fn new(root: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| Error::Operation(format!("failed to create {}: {}", root.display(), e)))?;
        Ok(Self { root: root.to_path_buf() })
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Error::InvalidConfig(format!("invalid object name '{}'", name)));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.object_path(name)?.exists())
    }

    async fn upload(&self, name: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let path = self.object_path(name)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Operation(format!("failed to write {}: {}", path.display(), e)))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Error::Operation(format!("failed to list store: {}", e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Operation(format!("failed to list store: {}", e)))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if prefix.map_or(true, |p| name.starts_with(p)) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.object_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(name.to_string()))
            }
            Err(e) => Err(Error::Operation(format!("failed to delete {}: {}", name, e))),
        }
    }
}
