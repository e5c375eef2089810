//! Source tree nodes and the handles used to reference them.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use super::{Entity, EntityInfo, EntityKind};

/// A node of the source tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub info: EntityInfo,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(info: EntityInfo) -> Self {
        Self { info, children: Vec::new() }
    }

    pub fn child(&self, name: &str) -> Option<&SourceNode> {
        self.children.iter().find(|c| c.info.name == name)
    }
}

impl Entity for SourceNode {
    fn info(&self) -> &EntityInfo { &self.info }
    fn kind(&self) -> EntityKind { EntityKind::SourceNode }
}

/// Non-owning handle to a [`SourceNode`]: the index path from the root's
/// `sources` list down through `children`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(SmallVec<[usize; 4]>);

impl SourceRef {
    /// A root-level source.
    pub fn root(index: usize) -> Self {
        Self(smallvec![index])
    }

    pub fn from_path(path: impl IntoIterator<Item = usize>) -> Self {
        Self(path.into_iter().collect())
    }

    /// Handle to the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    pub fn path(&self) -> &[usize] {
        &self.0
    }

    /// Index of the root-level source this handle descends from.
    pub fn root_index(&self) -> Option<usize> {
        self.0.first().copied()
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sources")?;
        for idx in &self.0 {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_paths() {
        let group = SourceRef::root(2);
        let unit = group.child(5);
        assert_eq!(unit.path(), &[2, 5]);
        assert_eq!(unit.root_index(), Some(2));
        assert_eq!(unit.to_string(), "sources[2][5]");
    }

    #[test]
    fn test_serialized_as_plain_list() {
        let json = serde_json::to_string(&SourceRef::from_path([0, 3])).unwrap();
        assert_eq!(json, "[0,3]");
    }
}
