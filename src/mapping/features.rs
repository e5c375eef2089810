//! Feature linker: indexed waveform links on spike-train regions.

use crate::nix::{ArrayEntity, DimensionKind, Feature, LinkType, TaggedRegion, TypeTag};
use crate::{Error, Result};

use super::EntityPath;

const WAVEFORM_AXES: [DimensionKind; 3] = [DimensionKind::Set, DimensionKind::Set, DimensionKind::Sampled];

pub struct FeatureLinker;

impl FeatureLinker {
    /// Attach `target` to `region` as an indexed feature. Entry `i` of the
    /// target's first axis belongs to position `i`, so the counts must agree.
    pub fn link_indexed(path: &EntityPath, region: &mut TaggedRegion, target: ArrayEntity) -> Result<()> {
        let positions = region.positions.data.len();
        if target.data.len() != positions {
            return Err(Error::mismatch(
                path,
                format!("{} waveforms for {positions} spikes", target.data.len()),
            ));
        }
        region.features.push(Feature { link_type: LinkType::Indexed, target });
        Ok(())
    }

    /// The waveform array linked to a spike-train region, if any, after
    /// checking that the link is the one [`link_indexed`](Self::link_indexed)
    /// writes.
    pub fn indexed_target<'r>(path: &EntityPath, region: &'r TaggedRegion) -> Result<Option<&'r ArrayEntity>> {
        let feature = match region.features.as_slice() {
            [] => return Ok(None),
            [feature] => feature,
            more => {
                return Err(Error::unrecognized(path, format!("expected at most one feature, found {}", more.len())));
            }
        };
        if feature.link_type != LinkType::Indexed {
            return Err(Error::unrecognized(path, format!("feature link type {:?} is not indexed", feature.link_type)));
        }

        let target = &feature.target;
        if target.info.type_tag != TypeTag::Waveforms.as_str() {
            return Err(Error::unrecognized(
                path,
                format!("feature target '{}' has type '{}'", target.info.name, target.info.type_tag),
            ));
        }
        let axes: Vec<DimensionKind> = target.dimensions.iter().map(|d| d.kind()).collect();
        if axes != WAVEFORM_AXES {
            return Err(Error::unrecognized(path, format!("waveform dimensions {axes:?} are not [Set, Set, Sampled]")));
        }
        if target.data.ndim() != 3 || !target.data.is_consistent() {
            return Err(Error::unrecognized(path, format!("waveform payload has shape {:?}", target.data.shape())));
        }
        if target.data.len() != region.positions.data.len() {
            return Err(Error::unrecognized(
                path,
                format!("{} waveforms for {} spikes", target.data.len(), region.positions.data.len()),
            ));
        }
        Ok(Some(target))
    }
}
