//! Common entity header, the root entity and groups.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{ArrayEntity, SectionRef, SourceNode, SourceRef, TaggedRegion, TypeTag};
use super::tag::UnknownTag;

/// The four generic entity kinds of the NIX model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Group,
    ArrayEntity,
    TaggedRegion,
    SourceNode,
}

/// Fields shared by every generic entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub name: String,
    /// Raw type string. Written from a [`TypeTag`], but read back verbatim
    /// so unknown tags can be reported.
    pub type_tag: String,
    pub definition: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub metadata: Option<SectionRef>,
}

impl EntityInfo {
    pub fn new(name: impl Into<String>, tag: TypeTag) -> Self {
        Self::with_raw_tag(name, tag.as_str())
    }

    pub fn with_raw_tag(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            definition: None,
            created_at: None,
            metadata: None,
        }
    }

    pub fn with_definition(mut self, definition: Option<String>) -> Self {
        self.definition = definition;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<NaiveDateTime>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<SectionRef>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Parse the stored type string against the tag registry.
    pub fn tag(&self) -> Result<TypeTag, UnknownTag> {
        self.type_tag.parse()
    }
}

/// Behaviour common to all generic entities.
pub trait Entity {
    fn info(&self) -> &EntityInfo;
    fn kind(&self) -> EntityKind;

    fn name(&self) -> &str {
        &self.info().name
    }

    fn type_tag(&self) -> &str {
        &self.info().type_tag
    }

    fn metadata(&self) -> Option<&SectionRef> {
        self.info().metadata.as_ref()
    }
}

// ============================================================================
// Root
// ============================================================================

/// Top-level group produced from one Neo block.
///
/// Owns the segment groups and the root-level source tree. Every
/// [`SourceRef`] stored anywhere below is resolved against `sources`.
#[derive(Debug, Clone, PartialEq)]
pub struct RootEntity {
    pub info: EntityInfo,
    pub groups: Vec<Group>,
    pub sources: Vec<SourceNode>,
}

impl RootEntity {
    pub fn new(info: EntityInfo) -> Self {
        Self { info, groups: Vec::new(), sources: Vec::new() }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.info.name == name)
    }

    /// Follow a source path from the root-level source list.
    pub fn resolve(&self, source: &SourceRef) -> Option<&SourceNode> {
        let (first, rest) = source.path().split_first()?;
        let mut node = self.sources.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }
}

impl Entity for RootEntity {
    fn info(&self) -> &EntityInfo { &self.info }
    fn kind(&self) -> EntityKind { EntityKind::Group }
}

// ============================================================================
// Group
// ============================================================================

/// A group of arrays and tagged regions (one Neo segment).
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub info: EntityInfo,
    pub arrays: Vec<ArrayEntity>,
    pub regions: Vec<TaggedRegion>,
}

impl Group {
    pub fn new(info: EntityInfo) -> Self {
        Self { info, arrays: Vec::new(), regions: Vec::new() }
    }

    pub fn region(&self, name: &str) -> Option<&TaggedRegion> {
        self.regions.iter().find(|r| r.info.name == name)
    }
}

impl Entity for Group {
    fn info(&self) -> &EntityInfo { &self.info }
    fn kind(&self) -> EntityKind { EntityKind::Group }
}
