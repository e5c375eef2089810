//! Axis descriptors attached to array payloads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Describes one axis of an [`ArrayEntity`](super::ArrayEntity) payload.
///
/// The position of a dimension in the entity's list is the payload axis it
/// describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Dimension {
    /// Regularly sampled axis: sample `i` sits at `offset + i * interval`.
    Sampled {
        interval: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Irregular axis given by explicit ticks.
    Range {
        ticks: Arc<[f64]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Unordered collection axis, optionally labelled per entry.
    Set {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        labels: Vec<String>,
    },
}

/// Variant discriminant, used when only the shape of a dimension list matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    Sampled,
    Range,
    Set,
}

impl Dimension {
    pub fn set() -> Self {
        Dimension::Set { labels: Vec::new() }
    }

    pub fn kind(&self) -> DimensionKind {
        match self {
            Dimension::Sampled { .. } => DimensionKind::Sampled,
            Dimension::Range { .. } => DimensionKind::Range,
            Dimension::Set { .. } => DimensionKind::Set,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Dimension::Sampled { unit, .. } | Dimension::Range { unit, .. } => unit.as_deref(),
            Dimension::Set { .. } => None,
        }
    }

    pub fn labels(&self) -> &[String] {
        match self {
            Dimension::Set { labels } => labels,
            _ => &[],
        }
    }
}
