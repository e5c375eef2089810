//! # Storage Backend Trait
//!
//! The contract between neonix and whatever persists mapped root entities.
//! The mappers never touch a backend; [`NixIO`](crate::NixIO) maps first and
//! then hands complete roots to one of these.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;

use crate::nix::RootEntity;
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// Whole-root storage. Roots are written once and replaced only by removing
/// them first; there are no partial updates.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Shut down the backend, flushing any pending writes.
    async fn shutdown(&self) -> Result<()>;

    // ========================================================================
    // Roots
    // ========================================================================

    /// Store a root entity. Fails if a root with the same name exists.
    async fn store_root(&self, root: RootEntity) -> Result<()>;

    /// Load the root named `name`. Returns None if not found.
    async fn load_root(&self, name: &str) -> Result<Option<RootEntity>>;

    /// Load every root, in the order they were stored.
    async fn load_all(&self) -> Result<Vec<RootEntity>>;

    /// Names of all stored roots, in storage order.
    async fn root_names(&self) -> Result<Vec<String>>;

    /// Remove a root. Returns true if it existed.
    async fn remove_root(&self, name: &str) -> Result<bool>;

    /// Number of stored roots.
    ///
    /// Default: counts `root_names()`.
    async fn root_count(&self) -> Result<usize> {
        Ok(self.root_names().await?.len())
    }
}
