//! Reverse mapper: `RootEntity → Block`.
//!
//! Nothing in the generic graph says which Neo class an entity came from
//! except its type tag, and nothing says which arrays form one signal except
//! the metadata section they point at. The reverse mapper relies on exactly
//! those two facts and rejects graphs where they disagree with the rest of
//! the structure.

use std::sync::Arc;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::neo::{
    AnalogSignal, Block, Epoch, Event, IrregularlySampledSignal, Quantity, RecordingChannel,
    RecordingChannelGroup, Segment, SpikeTrain, Unit, UnitRef, Waveforms,
};
use crate::nix::{
    ArrayEntity, Dimension, DimensionKind, Entity, EntityInfo, Group, RootEntity, Section,
    SourceNode, SourceRef, TaggedRegion, TypeTag,
};
use crate::{Error, Result};

use super::dimensions::inverse_time_unit;
use super::features::FeatureLinker;
use super::sections::MetadataView;
use super::{EntityPath, PathKind};

/// Rebuilds Neo blocks from the generic model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseMapper;

impl ReverseMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map_entity(&self, root: &RootEntity) -> Result<Block> {
        Reader::new(root)?.block()
    }

    pub fn map_all_entities(&self, roots: &[RootEntity]) -> Result<Vec<Block>> {
        roots.iter().map(|root| self.map_entity(root)).collect()
    }
}

/// Parse an entity's tag, reporting unknown strings against `path`.
fn parse_tag(path: &EntityPath, info: &EntityInfo) -> Result<TypeTag> {
    info.tag().map_err(|e| Error::unrecognized(path, e.to_string()))
}

fn expect_tag(path: &EntityPath, info: &EntityInfo, expected: TypeTag) -> Result<()> {
    let tag = parse_tag(path, info)?;
    if tag != expected {
        return Err(Error::unrecognized(
            path,
            format!("'{}' is tagged '{tag}', expected '{expected}'", info.name),
        ));
    }
    Ok(())
}

/// What a child of a channel-group source node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildRole {
    Channel(usize),
    Unit(usize),
}

// ============================================================================
// Reader (one mapping run)
// ============================================================================

struct Reader<'g> {
    root: &'g RootEntity,
    path: EntityPath,
    /// `roles[g][k]`: role of child `k` of root source `g`.
    roles: Vec<Vec<ChildRole>>,
}

impl<'g> Reader<'g> {
    fn new(root: &'g RootEntity) -> Result<Self> {
        let path = EntityPath::root(PathKind::Block, root.info.name.as_str());
        expect_tag(&path, &root.info, TypeTag::Block)?;
        Ok(Self { root, path, roles: Vec::new() })
    }

    fn block(mut self) -> Result<Block> {
        let root = self.root;
        let view = MetadataView::new(root.metadata(), &self.path);
        let mut block = Block {
            name: Some(root.info.name.clone()),
            description: root.info.definition.clone(),
            file_origin: view.text("file_origin")?,
            file_datetime: view.datetime("file_datetime")?,
            rec_datetime: root.info.created_at,
            annotations: view.annotations(),
            ..Default::default()
        };

        for node in &root.sources {
            let (rcg, roles) = self.channel_group(node)?;
            block.recording_channel_groups.push(rcg);
            self.roles.push(roles);
        }
        for group in &root.groups {
            block.segments.push(self.segment(group)?);
        }

        tracing::debug!(
            block = %root.info.name,
            segments = block.segments.len(),
            channel_groups = block.recording_channel_groups.len(),
            "Rebuilt block"
        );
        Ok(block)
    }

    // ------------------------------------------------------------------
    // Channel organisation
    // ------------------------------------------------------------------

    fn channel_group(&self, node: &SourceNode) -> Result<(RecordingChannelGroup, Vec<ChildRole>)> {
        let path = self.path.join(PathKind::Source, node.name());
        expect_tag(&path, &node.info, TypeTag::RecordingChannelGroup)?;
        let view = MetadataView::new(node.metadata(), &path);
        let mut rcg = RecordingChannelGroup {
            name: Some(node.info.name.clone()),
            description: node.info.definition.clone(),
            file_origin: view.text("file_origin")?,
            annotations: view.annotations(),
            ..Default::default()
        };

        let mut roles = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let child_path = path.join(PathKind::Source, child.name());
            match parse_tag(&child_path, &child.info)? {
                TypeTag::RecordingChannel => {
                    roles.push(ChildRole::Channel(rcg.channels.len()));
                    rcg.channels.push(RecordingChannel { name: child.info.name.clone() });
                }
                TypeTag::Unit => {
                    let view = MetadataView::new(child.metadata(), &child_path);
                    roles.push(ChildRole::Unit(rcg.units.len()));
                    rcg.units.push(Unit {
                        name: Some(child.info.name.clone()),
                        description: child.info.definition.clone(),
                        file_origin: view.text("file_origin")?,
                        annotations: view.annotations(),
                    });
                }
                other => {
                    return Err(Error::unrecognized(
                        &child_path,
                        format!("'{other}' cannot be a child of a channel group"),
                    ));
                }
            }
        }
        // Hardware channel numbers are not stored.
        rcg.channel_indexes = (0..rcg.channels.len() as i64).collect();
        rcg.coordinates = view.coordinates()?;
        if !rcg.coordinates.is_empty() && rcg.coordinates.len() != rcg.channels.len() {
            return Err(Error::unrecognized(
                &path,
                format!("{} coordinates for {} channels", rcg.coordinates.len(), rcg.channels.len()),
            ));
        }
        Ok((rcg, roles))
    }

    /// Check every link in `sources` resolves and that they all descend from
    /// one channel group. Returns that group.
    fn source_group(&self, path: &EntityPath, sources: &[SourceRef]) -> Result<Option<usize>> {
        let mut group = None;
        for source in sources {
            if self.root.resolve(source).is_none() {
                return Err(Error::unrecognized(path, format!("source link {source} does not resolve")));
            }
            match (group, source.root_index()) {
                (None, g) => group = g,
                (Some(existing), Some(g)) if existing == g => {}
                _ => return Err(Error::unrecognized(path, "source links span several channel groups")),
            }
        }
        Ok(group)
    }

    fn role(&self, source: &SourceRef) -> Option<ChildRole> {
        match source.path() {
            [g, k] => self.roles.get(*g)?.get(*k).copied(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Segments
    // ------------------------------------------------------------------

    fn segment(&self, group: &Group) -> Result<Segment> {
        let path = self.path.join(PathKind::Group, group.name());
        expect_tag(&path, &group.info, TypeTag::Segment)?;
        let view = MetadataView::new(group.metadata(), &path);
        let mut segment = Segment {
            name: Some(group.info.name.clone()),
            description: group.info.definition.clone(),
            file_origin: view.text("file_origin")?,
            file_datetime: view.datetime("file_datetime")?,
            rec_datetime: group.info.created_at,
            annotations: view.annotations(),
            ..Default::default()
        };

        for cluster in cluster_by_section(&group.arrays) {
            let members: Vec<&ArrayEntity> = cluster.iter().map(|&i| &group.arrays[i]).collect();
            self.signal(&path, &members, &mut segment)?;
        }

        for region in &group.regions {
            let region_path = path.join(PathKind::Region, region.name());
            if let Some(&bad) = region.references.iter().find(|&&r| r >= group.arrays.len()) {
                return Err(Error::unrecognized(
                    &region_path,
                    format!("reference to array {bad}, group has {}", group.arrays.len()),
                ));
            }
            match parse_tag(&region_path, &region.info)? {
                TypeTag::Epoch => segment.epochs.push(self.epoch(&region_path, region)?),
                TypeTag::Event => segment.events.push(self.event(&region_path, region)?),
                TypeTag::SpikeTrain => segment.spike_trains.push(self.spike_train(&region_path, region)?),
                other => {
                    return Err(Error::unrecognized(&region_path, format!("'{other}' is not a region type")));
                }
            }
        }
        Ok(segment)
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// Rebuild one signal from the arrays that share its section.
    fn signal(&self, segment_path: &EntityPath, members: &[&ArrayEntity], segment: &mut Segment) -> Result<()> {
        let Some((first, rest)) = members.split_first() else {
            return Ok(());
        };
        let path = segment_path.join(PathKind::Array, first.name());
        let tag = parse_tag(&path, &first.info)?;
        let group = self.source_group(&path, &first.sources)?;

        for member in rest {
            let member_path = segment_path.join(PathKind::Array, member.name());
            let disagreement = if member.info.type_tag != first.info.type_tag {
                Some("type")
            } else if member.dimensions != first.dimensions {
                Some("dimensions")
            } else if member.unit != first.unit {
                Some("unit")
            } else if member.data.shape() != first.data.shape() {
                Some("sample count")
            } else if member.info.definition != first.info.definition {
                Some("definition")
            } else if self.source_group(&member_path, &member.sources)? != group {
                Some("channel group")
            } else {
                None
            };
            if let Some(what) = disagreement {
                return Err(Error::ambiguous(
                    &member_path,
                    format!("shares metadata with '{}' but differs in {what}", first.info.name),
                ));
            }
        }

        if first.data.ndim() != 1 {
            return Err(Error::unrecognized(&path, format!("signal row has shape {:?}", first.data.shape())));
        }
        let time_axis = match first.dimensions.as_slice() {
            [axis, channels] if channels.kind() == DimensionKind::Set => axis,
            other => {
                let kinds: Vec<_> = other.iter().map(Dimension::kind).collect();
                return Err(Error::unrecognized(&path, format!("signal dimensions {kinds:?}")));
            }
        };

        let view = MetadataView::new(first.metadata(), &path);
        let name = Some(strip_row_suffix(first.name()).to_owned());
        let description = first.info.definition.clone();
        let file_origin = view.text("file_origin")?;
        let annotations = view.annotations();
        let units = first.unit.clone().unwrap_or_default();
        let signal: Vec<Vec<f64>> = members.iter().map(|m| m.data.data().to_vec()).collect();

        match (tag, time_axis) {
            (TypeTag::AnalogSignal, Dimension::Sampled { interval, offset, unit, .. }) => {
                let unit = unit.clone().unwrap_or_default();
                let t_start = match view.quantity("t_start")? {
                    Some(t_start) => t_start,
                    None => Quantity::new(offset.unwrap_or(0.0), unit.as_str()),
                };
                segment.analog_signals.push(AnalogSignal {
                    name,
                    description,
                    file_origin,
                    annotations,
                    signal,
                    units,
                    sampling_period: Some(Quantity::new(*interval, unit)),
                    t_start,
                    channel_group: group,
                });
            }
            (TypeTag::IrregularlySampledSignal, Dimension::Range { ticks, unit, .. }) => {
                segment.irregular_signals.push(IrregularlySampledSignal {
                    name,
                    description,
                    file_origin,
                    annotations,
                    signal,
                    units,
                    times: ticks.to_vec(),
                    time_units: unit.clone().unwrap_or_default(),
                    channel_group: group,
                });
            }
            (TypeTag::AnalogSignal | TypeTag::IrregularlySampledSignal, axis) => {
                return Err(Error::unrecognized(
                    &path,
                    format!("'{tag}' cannot have a {:?} time axis", axis.kind()),
                ));
            }
            (other, _) => {
                return Err(Error::unrecognized(&path, format!("'{other}' is not a signal type")));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    /// Check the positions/extents roles for a region tagged `tag` and
    /// return the position labels.
    fn region_shape(&self, path: &EntityPath, region: &TaggedRegion, tag: TypeTag) -> Result<Vec<String>> {
        if let Some(role) = tag.positions_role() {
            let positions_path = path.join(PathKind::Array, region.positions.name());
            expect_tag(&positions_path, &region.positions.info, role)?;
        }
        match (tag.extents_role(), &region.extents) {
            (Some(role), Some(extents)) => {
                let extents_path = path.join(PathKind::Array, extents.name());
                expect_tag(&extents_path, &extents.info, role)?;
                if extents.data.ndim() != 1 || extents.data.len() != region.positions.data.len() {
                    return Err(Error::unrecognized(
                        &extents_path,
                        format!("{} extents for {} positions", extents.data.len(), region.positions.data.len()),
                    ));
                }
            }
            (Some(role), None) => {
                return Err(Error::unrecognized(path, format!("'{tag}' region lacks '{role}' extents")));
            }
            (None, Some(extents)) => {
                return Err(Error::unrecognized(
                    path,
                    format!("'{tag}' region has unexpected extents '{}'", extents.info.name),
                ));
            }
            (None, None) => {}
        }
        if tag != TypeTag::SpikeTrain && !region.features.is_empty() {
            return Err(Error::unrecognized(path, format!("'{tag}' region cannot carry features")));
        }

        if region.positions.data.ndim() != 1 {
            return Err(Error::unrecognized(path, "positions are not one-dimensional"));
        }
        let labels = match region.positions.dimensions.as_slice() {
            [Dimension::Set { labels }] => labels.clone(),
            other => {
                let kinds: Vec<_> = other.iter().map(Dimension::kind).collect();
                return Err(Error::unrecognized(path, format!("positions dimensions {kinds:?}")));
            }
        };
        if !labels.is_empty() && labels.len() != region.positions.data.len() {
            return Err(Error::unrecognized(
                path,
                format!("{} labels for {} positions", labels.len(), region.positions.data.len()),
            ));
        }
        Ok(labels)
    }

    fn epoch(&self, path: &EntityPath, region: &TaggedRegion) -> Result<Epoch> {
        let labels = self.region_shape(path, region, TypeTag::Epoch)?;
        let view = MetadataView::new(region.metadata(), path);
        let (durations, duration_units) = region
            .extents
            .as_ref()
            .map(|e| (e.data.data().to_vec(), e.unit.clone().unwrap_or_default()))
            .unwrap_or_default();
        Ok(Epoch {
            name: Some(region.info.name.clone()),
            description: region.info.definition.clone(),
            file_origin: view.text("file_origin")?,
            annotations: view.annotations(),
            times: region.positions.data.data().to_vec(),
            durations,
            labels,
            time_units: region.positions.unit.clone().unwrap_or_default(),
            duration_units,
        })
    }

    fn event(&self, path: &EntityPath, region: &TaggedRegion) -> Result<Event> {
        let labels = self.region_shape(path, region, TypeTag::Event)?;
        let view = MetadataView::new(region.metadata(), path);
        Ok(Event {
            name: Some(region.info.name.clone()),
            description: region.info.definition.clone(),
            file_origin: view.text("file_origin")?,
            annotations: view.annotations(),
            times: region.positions.data.data().to_vec(),
            labels,
            time_units: region.positions.unit.clone().unwrap_or_default(),
        })
    }

    fn spike_train(&self, path: &EntityPath, region: &TaggedRegion) -> Result<SpikeTrain> {
        self.region_shape(path, region, TypeTag::SpikeTrain)?;
        let view = MetadataView::new(region.metadata(), path);

        let mut sampling_rate = view.quantity("sampling_rate")?;
        let waveforms = match FeatureLinker::indexed_target(path, region)? {
            None => None,
            Some(target) => {
                if sampling_rate.is_none() {
                    sampling_rate = rate_from_axis(target.dimension(2));
                }
                Some(Waveforms {
                    data: target.data.clone(),
                    units: target.unit.clone().unwrap_or_default(),
                })
            }
        };

        Ok(SpikeTrain {
            name: Some(region.info.name.clone()),
            description: region.info.definition.clone(),
            file_origin: view.text("file_origin")?,
            annotations: view.annotations(),
            times: region.positions.data.data().to_vec(),
            time_units: region.positions.unit.clone().unwrap_or_default(),
            t_start: view.required_quantity("t_start")?,
            t_stop: view.required_quantity("t_stop")?,
            left_sweep: view.quantity("left_sweep")?,
            sampling_rate,
            waveforms,
            unit: self.unit_ref(path, &region.sources)?,
        })
    }

    /// The unit a spike train's sources point at.
    fn unit_ref(&self, path: &EntityPath, sources: &[SourceRef]) -> Result<Option<UnitRef>> {
        let Some(group) = self.source_group(path, sources)? else {
            return Ok(None);
        };
        let mut units = sources.iter().filter_map(|s| match self.role(s) {
            Some(ChildRole::Unit(unit)) => Some(unit),
            _ => None,
        });
        match (units.next(), units.next()) {
            (Some(unit), None) => Ok(Some(UnitRef { group, unit })),
            (None, _) => Err(Error::unrecognized(path, "spike train sources name no unit")),
            (Some(_), Some(_)) => Err(Error::unrecognized(path, "spike train sources name several units")),
        }
    }
}

/// Group array indices by metadata section identity, in order of first
/// appearance. Arrays without a section stand alone.
fn cluster_by_section(arrays: &[ArrayEntity]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut by_section: HashMap<*const Section, usize> = HashMap::new();
    for (i, array) in arrays.iter().enumerate() {
        match array.metadata() {
            Some(section) => match by_section.entry(Arc::as_ptr(section)) {
                Entry::Occupied(slot) => clusters[*slot.get()].push(i),
                Entry::Vacant(slot) => {
                    slot.insert(clusters.len());
                    clusters.push(vec![i]);
                }
            },
            None => clusters.push(vec![i]),
        }
    }
    clusters
}

/// `lfp.2` → `lfp`. Names without a numeric suffix are returned unchanged.
fn strip_row_suffix(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, row)) if !row.is_empty() && row.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => name,
    }
}

fn rate_from_axis(axis: Option<&Dimension>) -> Option<Quantity> {
    match axis {
        Some(Dimension::Sampled { interval, unit, .. }) if *interval != 0.0 => Some(Quantity::new(
            1.0 / interval,
            inverse_time_unit(unit.as_deref().unwrap_or_default()),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nix::{NdArray, Property, SectionRef, Value};

    fn row(name: &str, section: Option<SectionRef>) -> ArrayEntity {
        ArrayEntity::new(
            EntityInfo::new(name, TypeTag::AnalogSignal).with_metadata(section),
            NdArray::from_vec(vec![0.0, 1.0]),
        )
        .with_unit("mV")
        .with_dimensions(vec![
            Dimension::Sampled { interval: 0.5, offset: Some(0.0), unit: Some("s".into()), label: None },
            Dimension::set(),
        ])
    }

    fn root_with(group: Group) -> RootEntity {
        let mut root = RootEntity::new(EntityInfo::new("b", TypeTag::Block));
        root.groups.push(group);
        root
    }

    fn segment() -> Group {
        Group::new(EntityInfo::new("s", TypeTag::Segment))
    }

    #[test]
    fn test_strip_row_suffix() {
        assert_eq!(strip_row_suffix("lfp.12"), "lfp");
        assert_eq!(strip_row_suffix("a.b.0"), "a.b");
        assert_eq!(strip_row_suffix("lfp"), "lfp");
        assert_eq!(strip_row_suffix("lfp.x"), "lfp.x");
    }

    #[test]
    fn test_clusters_follow_section_identity() {
        let shared: SectionRef = Arc::new(Section::new("x.0", "neo.analogsignal.metadata"));
        let twin: SectionRef = Arc::new(Section::new("x.0", "neo.analogsignal.metadata"));
        let arrays = vec![
            row("x.0", Some(Arc::clone(&shared))),
            row("y.0", None),
            row("x.1", Some(Arc::clone(&shared))),
            row("z.0", Some(twin)),
        ];
        assert_eq!(cluster_by_section(&arrays), vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn test_disagreeing_rows_are_ambiguous() {
        let shared: SectionRef = Arc::new(Section::new("x.0", "neo.analogsignal.metadata"));
        let mut group = segment();
        group.arrays.push(row("x.0", Some(Arc::clone(&shared))));
        group.arrays.push(row("x.1", Some(shared)).with_unit("uV"));
        let err = ReverseMapper::new().map_entity(&root_with(group)).unwrap_err();
        assert!(matches!(err, Error::AmbiguousGrouping { .. }));
        assert_eq!(err.path().unwrap().to_string(), "block:b/group:s/array:x.1");
    }

    #[test]
    fn test_unknown_region_tag() {
        let positions = ArrayEntity::new(
            EntityInfo::with_raw_tag("m.times", "neo.marker.times"),
            NdArray::from_vec(vec![1.0]),
        )
        .with_dimensions(vec![Dimension::set()]);
        let mut group = segment();
        group.regions.push(TaggedRegion::new(EntityInfo::with_raw_tag("m", "neo.marker"), positions));
        let err = ReverseMapper::new().map_entity(&root_with(group)).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedEntity { .. }));
        assert!(err.to_string().contains("neo.marker"));
    }

    #[test]
    fn test_event_with_extents_rejected() {
        let positions = ArrayEntity::new(EntityInfo::new("e.times", TypeTag::EventTimes), NdArray::from_vec(vec![1.0]))
            .with_dimensions(vec![Dimension::set()]);
        let extents = ArrayEntity::new(EntityInfo::new("e.durations", TypeTag::EpochDurations), NdArray::from_vec(vec![1.0]))
            .with_dimensions(vec![Dimension::set()]);
        let mut group = segment();
        group.regions.push(TaggedRegion::new(EntityInfo::new("e", TypeTag::Event), positions).with_extents(extents));
        assert!(matches!(
            ReverseMapper::new().map_entity(&root_with(group)),
            Err(Error::UnrecognizedEntity { .. })
        ));
    }

    #[test]
    fn test_spike_train_rate_falls_back_to_axis() {
        let section: SectionRef = Arc::new(
            Section::new("st", "neo.spiketrain.metadata")
                .with_property("t_start", Property::with_unit(0.0, "s"))
                .with_property("t_stop", Property::with_unit(1.0, "s")),
        );
        let positions = ArrayEntity::new(EntityInfo::new("st.times", TypeTag::SpikeTrainTimes), NdArray::from_vec(vec![0.2]))
            .with_unit("s")
            .with_dimensions(vec![Dimension::set()]);
        let target = ArrayEntity::new(
            EntityInfo::new("st.waveforms", TypeTag::Waveforms),
            NdArray::new([1, 1, 2], vec![0.0, 1.0]).unwrap(),
        )
        .with_dimensions(vec![
            Dimension::set(),
            Dimension::set(),
            Dimension::Sampled { interval: 0.5, offset: None, unit: Some("ms".into()), label: None },
        ]);
        let mut region = TaggedRegion::new(
            EntityInfo::new("st", TypeTag::SpikeTrain).with_metadata(Some(section)),
            positions,
        );
        region.features.push(crate::nix::Feature { link_type: crate::nix::LinkType::Indexed, target });
        let mut group = segment();
        group.regions.push(region);

        let block = ReverseMapper::new().map_entity(&root_with(group)).unwrap();
        let train = &block.segments[0].spike_trains[0];
        assert_eq!(train.sampling_rate, Some(Quantity::new(2.0, "kHz")));
        assert_eq!(train.t_stop, Quantity::new(1.0, "s"));
        assert_eq!(train.waveforms.as_ref().unwrap().data.shape(), &[1, 1, 2]);
    }

    #[test]
    fn test_spike_train_needs_bounds() {
        let positions = ArrayEntity::new(EntityInfo::new("st.times", TypeTag::SpikeTrainTimes), NdArray::from_vec(vec![]))
            .with_dimensions(vec![Dimension::set()]);
        let mut group = segment();
        group.regions.push(TaggedRegion::new(EntityInfo::new("st", TypeTag::SpikeTrain), positions));
        assert!(matches!(
            ReverseMapper::new().map_entity(&root_with(group)),
            Err(Error::UnrecognizedEntity { .. })
        ));
    }

    #[test]
    fn test_channel_indexes_are_ordinal() {
        let mut node = SourceNode::new(EntityInfo::new("g", TypeTag::RecordingChannelGroup));
        for name in ["a", "b", "c"] {
            node.children.push(SourceNode::new(EntityInfo::new(name, TypeTag::RecordingChannel)));
        }
        let mut root = RootEntity::new(EntityInfo::new("b", TypeTag::Block));
        root.sources.push(node);
        let block = ReverseMapper::new().map_entity(&root).unwrap();
        assert_eq!(block.recording_channel_groups[0].channel_indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_coordinates_must_cover_channels() {
        let section: SectionRef = Arc::new(
            Section::new("g", "neo.recordingchannelgroup.metadata")
                .with_property("coordinates", Property::new(Value::List(vec![Value::from(vec![1.0, 2.0])])))
                .with_property("coordinates.units", Property::new(Value::List(vec![Value::from(vec!["um", "um"])]))),
        );
        let mut node = SourceNode::new(
            EntityInfo::new("g", TypeTag::RecordingChannelGroup).with_metadata(Some(section)),
        );
        for name in ["a", "b"] {
            node.children.push(SourceNode::new(EntityInfo::new(name, TypeTag::RecordingChannel)));
        }
        let mut root = RootEntity::new(EntityInfo::new("b", TypeTag::Block));
        root.sources.push(node);

        let err = ReverseMapper::new().map_entity(&root).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedEntity { .. }));
        assert_eq!(err.path().unwrap().to_string(), "block:b/source:g");
    }

    #[test]
    fn test_root_must_be_block() {
        let root = RootEntity::new(EntityInfo::new("b", TypeTag::Segment));
        assert!(matches!(ReverseMapper::new().map_entity(&root), Err(Error::UnrecognizedEntity { .. })));
    }
}
