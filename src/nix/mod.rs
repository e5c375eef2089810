//! # Generic Storage Model (NIX)
//!
//! The small set of primitives the storage backend understands: a root
//! group, groups, array entities, tagged regions, source trees, metadata
//! sections, dimension descriptors and feature links.
//!
//! Design rule: pure data. No mapping logic and no I/O lives here; the
//! mappers in [`crate::mapping`] give these primitives their Neo meaning.

pub mod value;
pub mod tag;
pub mod section;
pub mod dimension;
pub mod entity;
pub mod array;
pub mod region;
pub mod source;

pub use value::Value;
pub use tag::{TypeTag, UnknownTag, METADATA_SUFFIX};
pub use section::{Property, Section, SectionRef};
pub use dimension::{Dimension, DimensionKind};
pub use entity::{Entity, EntityInfo, EntityKind, Group, RootEntity};
pub use array::{ArrayEntity, NdArray};
pub use region::{Feature, LinkType, TaggedRegion};
pub use source::{SourceNode, SourceRef};
