//! JSON export: serialize mapped root entities as self-contained documents.
//!
//! Metadata sections are written once into a section table and referenced
//! by id, so entities that shared a section before export share one again
//! after import. This is what keeps multi-channel signals recoverable from
//! a file.
//!
//! ```text
//! RootEntity → to_document() → Document ─serde_json─▶ file
//!   file ─serde_json─▶ Document → from_document() → RootEntity
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use chrono::NaiveDateTime;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::nix::{
    ArrayEntity, Dimension, EntityInfo, Feature, Group, LinkType, NdArray, Property, RootEntity,
    Section, SectionRef, SourceNode, SourceRef, TaggedRegion,
};
use crate::storage::StorageBackend;
use crate::{Error, Result};

/// Value of [`Document::format`].
pub const FORMAT: &str = "neonix";
/// Current document layout version.
pub const VERSION: u32 = 1;

// ============================================================================
// Document types
// ============================================================================

/// One exported root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub format: String,
    pub version: u32,
    pub sections: Vec<SectionDoc>,
    pub root: RootDoc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDoc {
    pub id: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub properties: BTreeMap<String, Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// Id into [`Document::sections`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootDoc {
    #[serde(flatten)]
    pub info: InfoDoc,
    pub groups: Vec<GroupDoc>,
    pub sources: Vec<SourceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDoc {
    #[serde(flatten)]
    pub info: InfoDoc,
    pub arrays: Vec<ArrayDoc>,
    pub regions: Vec<RegionDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDoc {
    #[serde(flatten)]
    pub info: InfoDoc,
    pub data: NdArray,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub dimensions: Vec<Dimension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDoc {
    #[serde(flatten)]
    pub info: InfoDoc,
    pub positions: ArrayDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extents: Option<ArrayDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<FeatureDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDoc {
    pub link_type: LinkType,
    pub target: ArrayDoc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDoc {
    #[serde(flatten)]
    pub info: InfoDoc,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SourceDoc>,
}

// ============================================================================
// Encoding
// ============================================================================

/// Assigns section ids by pointer identity.
#[derive(Default)]
struct Encoder {
    ids: HashMap<*const Section, usize>,
    sections: Vec<SectionDoc>,
}

impl Encoder {
    fn section(&mut self, section: &SectionRef) -> usize {
        let next = self.sections.len();
        let id = *self.ids.entry(Arc::as_ptr(section)).or_insert(next);
        if id == next {
            self.sections.push(SectionDoc {
                id,
                name: section.name.clone(),
                type_tag: section.type_tag.clone(),
                properties: section.properties.clone(),
            });
        }
        id
    }

    fn info(&mut self, info: &EntityInfo) -> InfoDoc {
        InfoDoc {
            name: info.name.clone(),
            type_tag: info.type_tag.clone(),
            definition: info.definition.clone(),
            created_at: info.created_at,
            metadata: info.metadata.as_ref().map(|s| self.section(s)),
        }
    }

    fn array(&mut self, array: &ArrayEntity) -> ArrayDoc {
        ArrayDoc {
            info: self.info(&array.info),
            data: array.data.clone(),
            unit: array.unit.clone(),
            dimensions: array.dimensions.clone(),
            sources: array.sources.clone(),
        }
    }

    fn region(&mut self, region: &TaggedRegion) -> RegionDoc {
        RegionDoc {
            info: self.info(&region.info),
            positions: self.array(&region.positions),
            extents: region.extents.as_ref().map(|e| self.array(e)),
            features: region
                .features
                .iter()
                .map(|f| FeatureDoc { link_type: f.link_type, target: self.array(&f.target) })
                .collect(),
            sources: region.sources.clone(),
            references: region.references.clone(),
        }
    }

    fn group(&mut self, group: &Group) -> GroupDoc {
        GroupDoc {
            info: self.info(&group.info),
            arrays: group.arrays.iter().map(|a| self.array(a)).collect(),
            regions: group.regions.iter().map(|r| self.region(r)).collect(),
        }
    }

    fn source(&mut self, node: &SourceNode) -> SourceDoc {
        SourceDoc {
            info: self.info(&node.info),
            children: node.children.iter().map(|c| self.source(c)).collect(),
        }
    }
}

/// Convert a root entity into its document form.
pub fn to_document(root: &RootEntity) -> Document {
    let mut enc = Encoder::default();
    let root_doc = RootDoc {
        info: enc.info(&root.info),
        groups: root.groups.iter().map(|g| enc.group(g)).collect(),
        sources: root.sources.iter().map(|s| enc.source(s)).collect(),
    };
    Document {
        format: FORMAT.to_owned(),
        version: VERSION,
        sections: enc.sections,
        root: root_doc,
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct Decoder {
    sections: HashMap<usize, SectionRef>,
}

impl Decoder {
    fn new(sections: Vec<SectionDoc>) -> Result<Self> {
        let mut table = HashMap::with_capacity(sections.len());
        for doc in sections {
            let section = Section { name: doc.name, type_tag: doc.type_tag, properties: doc.properties };
            if table.insert(doc.id, Arc::new(section)).is_some() {
                return Err(Error::StorageError(format!("section id {} appears twice", doc.id)));
            }
        }
        Ok(Self { sections: table })
    }

    fn info(&self, doc: InfoDoc) -> Result<EntityInfo> {
        let metadata = match doc.metadata {
            None => None,
            Some(id) => Some(Arc::clone(self.sections.get(&id).ok_or_else(|| {
                Error::StorageError(format!("'{}' refers to unknown section {id}", doc.name))
            })?)),
        };
        Ok(EntityInfo::with_raw_tag(doc.name, doc.type_tag)
            .with_definition(doc.definition)
            .with_created_at(doc.created_at)
            .with_metadata(metadata))
    }

    fn array(&self, doc: ArrayDoc) -> Result<ArrayEntity> {
        if !doc.data.is_consistent() {
            return Err(Error::StorageError(format!(
                "array '{}' has shape {:?} but {} values",
                doc.info.name,
                doc.data.shape(),
                doc.data.data().len()
            )));
        }
        let mut array = ArrayEntity::new(self.info(doc.info)?, doc.data).with_dimensions(doc.dimensions);
        array.unit = doc.unit;
        array.sources = doc.sources;
        Ok(array)
    }

    fn region(&self, doc: RegionDoc) -> Result<TaggedRegion> {
        let mut region = TaggedRegion::new(self.info(doc.info)?, self.array(doc.positions)?);
        region.extents = doc.extents.map(|e| self.array(e)).transpose()?;
        region.features = doc
            .features
            .into_iter()
            .map(|f| Ok(Feature { link_type: f.link_type, target: self.array(f.target)? }))
            .collect::<Result<_>>()?;
        region.sources = doc.sources;
        region.references = doc.references;
        Ok(region)
    }

    fn group(&self, doc: GroupDoc) -> Result<Group> {
        let mut group = Group::new(self.info(doc.info)?);
        group.arrays = doc.arrays.into_iter().map(|a| self.array(a)).collect::<Result<_>>()?;
        group.regions = doc.regions.into_iter().map(|r| self.region(r)).collect::<Result<_>>()?;
        Ok(group)
    }

    fn source(&self, doc: SourceDoc) -> Result<SourceNode> {
        let mut node = SourceNode::new(self.info(doc.info)?);
        node.children = doc.children.into_iter().map(|c| self.source(c)).collect::<Result<_>>()?;
        Ok(node)
    }
}

/// Rebuild a root entity from its document form, restoring section sharing.
pub fn from_document(doc: Document) -> Result<RootEntity> {
    if doc.format != FORMAT || doc.version != VERSION {
        return Err(Error::StorageError(format!(
            "unsupported document format '{}' version {}", doc.format, doc.version
        )));
    }
    let dec = Decoder::new(doc.sections)?;
    let mut root = RootEntity::new(dec.info(doc.root.info)?);
    root.groups = doc.root.groups.into_iter().map(|g| dec.group(g)).collect::<Result<_>>()?;
    root.sources = doc.root.sources.into_iter().map(|s| dec.source(s)).collect::<Result<_>>()?;
    Ok(root)
}

// ============================================================================
// JSON entry points
// ============================================================================

/// Write one root entity as a pretty-printed JSON document.
pub fn export_json(root: &RootEntity, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &to_document(root))?;
    writeln!(writer)?;
    Ok(())
}

/// Read one root entity written by [`export_json`].
pub fn import_json(reader: &mut dyn Read) -> Result<RootEntity> {
    let doc: Document = serde_json::from_reader(reader)?;
    from_document(doc)
}

/// Export every root stored in `backend` as a JSON array of documents.
pub async fn export_backend_json<B: StorageBackend>(
    backend: &B,
    writer: &mut dyn Write,
) -> Result<()> {
    let roots = backend.load_all().await?;
    let docs: Vec<Document> = roots.iter().map(to_document).collect();
    serde_json::to_writer_pretty(&mut *writer, &docs)?;
    writeln!(writer)?;
    tracing::debug!(roots = docs.len(), "Exported backend");
    Ok(())
}

/// Load a JSON array written by [`export_backend_json`] into `backend`.
/// Returns the number of roots stored.
pub async fn import_backend_json<B: StorageBackend>(
    backend: &B,
    reader: &mut dyn Read,
) -> Result<usize> {
    let docs: Vec<Document> = serde_json::from_reader(reader)?;
    let roots = docs.into_iter().map(from_document).collect::<Result<Vec<_>>>()?;
    let count = roots.len();
    for root in roots {
        backend.store_root(root).await?;
    }
    Ok(count)
}
