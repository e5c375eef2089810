//! Array entities and their n-dimensional payload.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use super::{Dimension, Entity, EntityInfo, EntityKind, SourceRef};

/// Dense row-major `f64` payload with an explicit shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    shape: SmallVec<[usize; 3]>,
    data: Vec<f64>,
}

impl NdArray {
    /// Build an array, checking that `shape` covers exactly `data.len()` values.
    pub fn new(shape: impl IntoIterator<Item = usize>, data: Vec<f64>) -> Option<Self> {
        let shape: SmallVec<[usize; 3]> = shape.into_iter().collect();
        (shape.iter().product::<usize>() == data.len()).then_some(Self { shape, data })
    }

    /// One-dimensional array over `data`.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { shape: smallvec![data.len()], data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of the first axis.
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Whether shape and data length agree (deserialised arrays are not checked).
    pub fn is_consistent(&self) -> bool {
        self.shape.iter().product::<usize>() == self.data.len()
    }
}

/// A typed n-D payload with unit, axis descriptors and source links.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayEntity {
    pub info: EntityInfo,
    pub data: NdArray,
    pub unit: Option<String>,
    pub dimensions: Vec<Dimension>,
    /// Non-owning links into the root's source tree.
    pub sources: Vec<SourceRef>,
}

impl ArrayEntity {
    pub fn new(info: EntityInfo, data: NdArray) -> Self {
        Self {
            info,
            data,
            unit: None,
            dimensions: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<Dimension>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn dimension(&self, axis: usize) -> Option<&Dimension> {
        self.dimensions.get(axis)
    }
}

impl Entity for ArrayEntity {
    fn info(&self) -> &EntityInfo { &self.info }
    fn kind(&self) -> EntityKind { EntityKind::ArrayEntity }
}
