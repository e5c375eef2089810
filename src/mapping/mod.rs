//! # Neo ⇄ NIX Mapping
//!
//! ```text
//! Block ──ForwardMapper──▶ RootEntity ──ReverseMapper──▶ Block
//!          │  SectionManager   (lazy, shared metadata)
//!          │  DimensionBuilder (axis descriptors)
//!          └  FeatureLinker    (indexed waveform links)
//! ```
//!
//! Both directions are pure functions of their input. The forward path
//! consumes the block so sample payloads move into the generic graph; the
//! reverse path only borrows the graph and allocates fresh Neo objects.

pub mod sections;
pub mod dimensions;
pub mod features;
pub mod forward;
pub mod reverse;

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::neo::Block;
use crate::nix::RootEntity;
use crate::Result;

pub use sections::{Attributes, MetadataView, SectionManager, RESERVED_KEYS};
pub use dimensions::{DimensionBuilder, Layout, inverse_time_unit, TIME_LABEL};
pub use features::FeatureLinker;
pub use forward::ForwardMapper;
pub use reverse::ReverseMapper;

// ============================================================================
// Options
// ============================================================================

/// Knobs for the forward mapper. Deserialisable so callers can keep them in
/// their own configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Make every Epoch/Event region reference the signal arrays of its group.
    pub reference_signals: bool,
    /// Generate names for unnamed objects instead of rejecting them.
    pub name_anonymous: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self { reference_signals: true, name_anonymous: true }
    }
}

// ============================================================================
// Entity paths (error context)
// ============================================================================

/// Kind of a step in an [`EntityPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Block,
    Group,
    Source,
    Array,
    Region,
    Feature,
}

impl PathKind {
    fn as_str(self) -> &'static str {
        match self {
            PathKind::Block => "block",
            PathKind::Group => "group",
            PathKind::Source => "source",
            PathKind::Array => "array",
            PathKind::Region => "region",
            PathKind::Feature => "feature",
        }
    }
}

/// Location of an entity in the graph being mapped, rendered as
/// `block:b/group:s/region:ep`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityPath(SmallVec<[(PathKind, String); 4]>);

impl EntityPath {
    pub fn root(kind: PathKind, name: impl Into<String>) -> Self {
        let mut path = SmallVec::new();
        path.push((kind, name.into()));
        Self(path)
    }

    pub fn join(&self, kind: PathKind, name: impl Into<String>) -> Self {
        let mut path = self.0.clone();
        path.push((kind, name.into()));
        Self(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, (kind, name)) in self.0.iter().enumerate() {
            if i > 0 { write!(f, "/")?; }
            write!(f, "{}:{name}", kind.as_str())?;
        }
        Ok(())
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Map one block with default options.
pub fn map_block(block: Block) -> Result<RootEntity> {
    ForwardMapper::new(MappingOptions::default()).map_block(block)
}

/// Map several blocks; anonymous blocks are numbered by position.
pub fn map_all_blocks(blocks: Vec<Block>) -> Result<Vec<RootEntity>> {
    ForwardMapper::new(MappingOptions::default()).map_all_blocks(blocks)
}

/// Rebuild the Neo block described by `root`.
pub fn map_entity(root: &RootEntity) -> Result<Block> {
    ReverseMapper::new().map_entity(root)
}

pub fn map_all_entities(roots: &[RootEntity]) -> Result<Vec<Block>> {
    ReverseMapper::new().map_all_entities(roots)
}
