//! Local filesystem content store

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::domain::{ContentKind, ContentStore, DomainError};

/// Stores files as `<root>/<books|images>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    root: PathBuf,
}

impl LocalContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, DomainError> {
        let path = Path::new(relative);
        // Only paths produced by `save` are accepted
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(DomainError::Storage(format!(
                "refusing to access '{}' outside the store",
                relative
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn save(&self, kind: ContentKind, bytes: &[u8]) -> Result<String, DomainError> {
        let dir = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Storage(format!("cannot create {:?}: {}", dir, e)))?;

        let relative = format!("{}/{}.{}", kind.directory(), Uuid::new_v4(), kind.extension());
        let target = self.root.join(&relative);
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| DomainError::Storage(format!("cannot write {:?}: {}", target, e)))?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), relative);
        Ok(relative)
    }

    async fn load(&self, path: &str) -> Result<Vec<u8>, DomainError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DomainError::not_found("Stored file"))
            }
            Err(e) => Err(DomainError::Storage(format!("cannot read {:?}: {}", target, e))),
        }
    }

    async fn remove(&self, path: &str) -> Result<(), DomainError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Storage(format!("cannot remove {:?}: {}", target, e))),
        }
    }
}
