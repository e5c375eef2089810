//! # neonix: Neo ⇄ NIX model mapping
//!
//! Translates between the typed Neo electrophysiology object graph and the
//! generic NIX storage model, in both directions, without losing structure.
//!
//! ## Design Principles
//!
//! 1. **Pure mappers**: `Block → RootEntity` and back are deterministic
//!    graph-to-graph functions with no I/O and no shared state
//! 2. **Identity is structure**: signals split into per-channel arrays are
//!    regrouped by *which* metadata section they point at (`Arc::ptr_eq`)
//! 3. **Closed tag vocabulary**: reverse mapping matches on [`TypeTag`] and
//!    refuses anything it does not recognise
//! 4. **Trait-first storage**: `StorageBackend` is the seam to whatever
//!    persists the generic graph
//!
//! ## Quick Start
//!
//! ```rust
//! use neonix::neo::{AnalogSignal, Block, Quantity, Segment};
//!
//! # fn example() -> neonix::Result<()> {
//! let mut segment = Segment::new("trial 1");
//! segment.analog_signals.push(AnalogSignal::new(
//!     "lfp",
//!     vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]],
//!     "mV",
//!     Quantity::new(0.001, "s"),
//! ));
//! let mut block = Block::new("session");
//! block.segments.push(segment);
//!
//! let root = neonix::map_block(block.clone())?;
//! assert_eq!(root.groups[0].arrays.len(), 2);
//!
//! let back = neonix::map_entity(&root)?;
//! assert_eq!(back, block);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod neo;
pub mod nix;
pub mod mapping;
pub mod storage;
pub mod export;

// ============================================================================
// Re-exports
// ============================================================================

pub use nix::{
    ArrayEntity, Dimension, Entity, EntityInfo, EntityKind, Feature, Group, LinkType,
    NdArray, Property, RootEntity, Section, SectionRef, SourceNode, SourceRef,
    TaggedRegion, TypeTag, Value,
};

pub use mapping::{
    EntityPath, ForwardMapper, MappingOptions, PathKind, ReverseMapper,
    map_all_blocks, map_all_entities, map_block, map_entity,
};

pub use storage::{MemoryBackend, StorageBackend};

// ============================================================================
// Top-level IO handle
// ============================================================================

use neo::Block;

/// The primary entry point for persisting Neo blocks. Wraps a storage
/// backend and runs the mappers on the way in and out.
pub struct NixIO<B: StorageBackend> {
    backend: B,
    options: MappingOptions,
}

impl<B: StorageBackend> NixIO<B> {
    /// Create a handle over the given backend with default options.
    pub fn with_backend(backend: B) -> Self {
        Self { backend, options: MappingOptions::default() }
    }

    pub fn with_options(mut self, options: MappingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    /// Map `block` and store it. Returns the stored root's name.
    pub async fn write_block(&self, block: Block) -> Result<String> {
        let mut names = self.write_all_blocks(vec![block]).await?;
        names.pop().ok_or_else(|| Error::StorageError("no block was written".into()))
    }

    /// Map every block first, then store them. A mapping failure or a name
    /// clash stores nothing.
    pub async fn write_all_blocks(&self, blocks: Vec<Block>) -> Result<Vec<String>> {
        let offset = self.backend.root_count().await?;
        let mapper = ForwardMapper::new(self.options.clone());
        let roots = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| mapper.map_block_numbered(block, offset + i))
            .collect::<Result<Vec<_>>>()?;

        let existing = self.backend.root_names().await?;
        let mut names: Vec<String> = Vec::with_capacity(roots.len());
        for root in &roots {
            let name = &root.info.name;
            if existing.contains(name) || names.contains(name) {
                return Err(Error::StorageError(format!("a block named '{name}' is already stored")));
            }
            names.push(name.clone());
        }

        for root in roots {
            self.backend.store_root(root).await?;
        }
        tracing::debug!(count = names.len(), "Stored blocks");
        Ok(names)
    }

    /// Load and rebuild the block stored under `name`.
    pub async fn read_block(&self, name: &str) -> Result<Block> {
        let root = self.backend.load_root(name).await?
            .ok_or_else(|| Error::NotFound(format!("block '{name}'")))?;
        ReverseMapper::new().map_entity(&root)
    }

    /// Rebuild every stored block, in storage order.
    pub async fn read_all_blocks(&self) -> Result<Vec<Block>> {
        let roots = self.backend.load_all().await?;
        ReverseMapper::new().map_all_entities(&roots)
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// In-memory store for testing and embedding.
impl NixIO<storage::MemoryBackend> {
    pub async fn open_memory() -> Result<Self> {
        Ok(Self::with_backend(storage::MemoryBackend::new()))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Structural mismatch at {path}: {message}")]
    StructuralMismatch { path: EntityPath, message: String },

    #[error("Missing required attribute '{attribute}' at {path}")]
    MissingRequiredAttribute { path: EntityPath, attribute: &'static str },

    #[error("Annotation '{key}' at {path} collides with a reserved metadata property")]
    ReservedAnnotation { path: EntityPath, key: String },

    #[error("Unrecognized entity at {path}: {message}")]
    UnrecognizedEntity { path: EntityPath, message: String },

    #[error("Ambiguous grouping at {path}: {message}")]
    AmbiguousGrouping { path: EntityPath, message: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn mismatch(path: &EntityPath, message: impl Into<String>) -> Self {
        Error::StructuralMismatch { path: path.clone(), message: message.into() }
    }

    pub(crate) fn unrecognized(path: &EntityPath, message: impl Into<String>) -> Self {
        Error::UnrecognizedEntity { path: path.clone(), message: message.into() }
    }

    pub(crate) fn ambiguous(path: &EntityPath, message: impl Into<String>) -> Self {
        Error::AmbiguousGrouping { path: path.clone(), message: message.into() }
    }

    /// The entity the error was raised for, when it came from a mapper.
    pub fn path(&self) -> Option<&EntityPath> {
        match self {
            Error::StructuralMismatch { path, .. }
            | Error::MissingRequiredAttribute { path, .. }
            | Error::ReservedAnnotation { path, .. }
            | Error::UnrecognizedEntity { path, .. }
            | Error::AmbiguousGrouping { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
