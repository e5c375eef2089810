//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It keeps roots in a Vec protected by an RwLock.
//!
//! ## Limitations
//!
//! - **No persistence**: everything is gone when the backend is dropped.
//! - **Clones on load**: `load_root()` hands out a deep copy; metadata
//!   sections stay shared inside the copy because they are `Arc`s.
//!
//! Use this backend for:
//! - Testing the mappers end to end through `NixIO`
//! - Embedding neonix in applications that don't need persistence

use std::sync::Arc;
use parking_lot::RwLock;
use async_trait::async_trait;

use crate::nix::RootEntity;
use crate::{Error, Result};
use super::StorageBackend;

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory root storage. Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    roots: RwLock<Vec<RootEntity>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn shutdown(&self) -> Result<()> { Ok(()) }

    async fn store_root(&self, root: RootEntity) -> Result<()> {
        let mut roots = self.inner.roots.write();
        if roots.iter().any(|r| r.info.name == root.info.name) {
            return Err(Error::StorageError(format!(
                "a root named '{}' already exists", root.info.name
            )));
        }
        tracing::trace!(root = %root.info.name, "Storing root");
        roots.push(root);
        Ok(())
    }

    async fn load_root(&self, name: &str) -> Result<Option<RootEntity>> {
        Ok(self.inner.roots.read().iter().find(|r| r.info.name == name).cloned())
    }

    async fn load_all(&self) -> Result<Vec<RootEntity>> {
        Ok(self.inner.roots.read().clone())
    }

    async fn root_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.roots.read().iter().map(|r| r.info.name.clone()).collect())
    }

    async fn root_count(&self) -> Result<usize> {
        Ok(self.inner.roots.read().len())
    }

    async fn remove_root(&self, name: &str) -> Result<bool> {
        let mut roots = self.inner.roots.write();
        let before = roots.len();
        roots.retain(|r| r.info.name != name);
        Ok(roots.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nix::{EntityInfo, TypeTag};

    fn root(name: &str) -> RootEntity {
        RootEntity::new(EntityInfo::new(name, TypeTag::Block))
    }

    #[tokio::test]
    async fn test_store_and_load_root() {
        let db = MemoryBackend::new();
        db.store_root(root("session")).await.unwrap();

        let loaded = db.load_root("session").await.unwrap().unwrap();
        assert_eq!(loaded.info.name, "session");
        assert!(db.load_root("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = MemoryBackend::new();
        db.store_root(root("session")).await.unwrap();

        let result = db.store_root(root("session")).await;
        assert!(matches!(result, Err(Error::StorageError(_))));
        assert_eq!(db.root_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_names_keep_storage_order() {
        let db = MemoryBackend::new();
        for name in ["c", "a", "b"] {
            db.store_root(root(name)).await.unwrap();
        }
        assert_eq!(db.root_names().await.unwrap(), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_remove_root() {
        let db = MemoryBackend::new();
        db.store_root(root("a")).await.unwrap();

        assert!(db.remove_root("a").await.unwrap());
        assert!(!db.remove_root("a").await.unwrap());
        assert_eq!(db.root_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_the_store() {
        let db = MemoryBackend::new();
        let other = db.clone();
        db.store_root(root("a")).await.unwrap();
        assert_eq!(other.load_all().await.unwrap().len(), 1);
    }
}
