//! Tagged regions and their feature links.

use serde::{Deserialize, Serialize};

use super::{ArrayEntity, Entity, EntityInfo, EntityKind, SourceRef};

/// How a feature's data relates to the positions of its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Tagged,
    Untagged,
    /// Entry `i` of the target's first axis belongs to position `i`.
    Indexed,
}

/// Auxiliary payload linked to a tagged region.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub link_type: LinkType,
    pub target: ArrayEntity,
}

/// A set of positions (and optional extents) over a time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRegion {
    pub info: EntityInfo,
    pub positions: ArrayEntity,
    pub extents: Option<ArrayEntity>,
    pub features: Vec<Feature>,
    /// Non-owning links into the root's source tree.
    pub sources: Vec<SourceRef>,
    /// Indices into the owning group's `arrays` that this region tags.
    pub references: Vec<usize>,
}

impl TaggedRegion {
    pub fn new(info: EntityInfo, positions: ArrayEntity) -> Self {
        Self {
            info,
            positions,
            extents: None,
            features: Vec::new(),
            sources: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn with_extents(mut self, extents: ArrayEntity) -> Self {
        self.extents = Some(extents);
        self
    }
}

impl Entity for TaggedRegion {
    fn info(&self) -> &EntityInfo { &self.info }
    fn kind(&self) -> EntityKind { EntityKind::TaggedRegion }
}
