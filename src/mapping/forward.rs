//! Forward mapper: `Block → RootEntity`.
//!
//! Recording channel groups are mapped first so that the back-references
//! held by signals and spike trains can be checked and turned into
//! [`SourceRef`] paths while the segments are walked.

use std::sync::Arc;

use crate::neo::{
    AnalogSignal, Block, Epoch, Event, IrregularlySampledSignal, RecordingChannelGroup,
    Segment, SpikeTrain,
};
use crate::nix::{
    ArrayEntity, EntityInfo, Group, NdArray, RootEntity, SectionRef, SourceNode, SourceRef,
    TaggedRegion, TypeTag,
};
use crate::{Error, Result};

use super::dimensions::{DimensionBuilder, Layout};
use super::features::FeatureLinker;
use super::sections::{check_annotations, Attributes, SectionManager};
use super::{EntityPath, MappingOptions, PathKind};

/// Maps Neo blocks onto the generic model.
#[derive(Debug, Clone, Default)]
pub struct ForwardMapper {
    options: MappingOptions,
}

impl ForwardMapper {
    pub fn new(options: MappingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    pub fn map_block(&self, block: Block) -> Result<RootEntity> {
        self.map_block_numbered(block, 0)
    }

    /// Map `block`, using `ordinal` to name it if it is anonymous.
    pub fn map_block_numbered(&self, block: Block, ordinal: usize) -> Result<RootEntity> {
        Writer::new(&self.options).block(block, ordinal)
    }

    pub fn map_all_blocks(&self, blocks: Vec<Block>) -> Result<Vec<RootEntity>> {
        blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| self.map_block_numbered(block, i))
            .collect()
    }
}

// ============================================================================
// Writer (one mapping run)
// ============================================================================

/// Child counts of a mapped channel group. Unit `u` of the group sits at
/// child index `channels + u` of its source node.
#[derive(Debug, Clone, Copy)]
struct GroupLayout {
    channels: usize,
    units: usize,
}

/// Anonymous signals and spike trains are numbered by block-wide counts,
/// epochs and events by the regions already in their segment.
struct Writer<'o> {
    options: &'o MappingOptions,
    sections: SectionManager,
    groups: Vec<GroupLayout>,
    /// Arrays emitted so far, including positions, extents and waveforms.
    arrays: usize,
    /// Regions emitted so far.
    regions: usize,
}

impl<'o> Writer<'o> {
    fn new(options: &'o MappingOptions) -> Self {
        Self { options, sections: SectionManager::new(), groups: Vec::new(), arrays: 0, regions: 0 }
    }

    fn name(
        &self,
        name: Option<String>,
        parent: &EntityPath,
        kind: PathKind,
        generated: impl FnOnce() -> String,
    ) -> Result<String> {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => Ok(name),
            None if self.options.name_anonymous => Ok(generated()),
            None => Err(Error::MissingRequiredAttribute {
                path: parent.join(kind, generated()),
                attribute: "name",
            }),
        }
    }

    fn block(mut self, block: Block, ordinal: usize) -> Result<RootEntity> {
        let name = self.name(block.name, &EntityPath::default(), PathKind::Block, || {
            format!("neo.Block{ordinal}")
        })?;
        let path = EntityPath::root(PathKind::Block, name.as_str());
        check_annotations(&path, &block.annotations)?;

        let attrs = Attributes::new()
            .text("file_origin", block.file_origin.as_deref())
            .datetime("file_datetime", block.file_datetime)
            .annotations(&block.annotations);
        let metadata = self.sections.get_or_create(&name, TypeTag::Block, attrs);
        let info = EntityInfo::new(name.as_str(), TypeTag::Block)
            .with_definition(text(block.description))
            .with_created_at(block.rec_datetime)
            .with_metadata(metadata);
        let mut root = RootEntity::new(info);

        for (i, rcg) in block.recording_channel_groups.into_iter().enumerate() {
            let node = self.channel_group(&path, &name, i, rcg)?;
            root.sources.push(node);
        }
        for (i, segment) in block.segments.into_iter().enumerate() {
            let group = self.segment(&path, &name, i, segment)?;
            root.groups.push(group);
        }

        tracing::debug!(
            block = %name,
            groups = root.groups.len(),
            sources = root.sources.len(),
            sections = self.sections.created(),
            shared = self.sections.shared(),
            "Mapped block"
        );
        Ok(root)
    }

    // ------------------------------------------------------------------
    // Channel organisation
    // ------------------------------------------------------------------

    fn channel_group(
        &mut self,
        block_path: &EntityPath,
        block_name: &str,
        index: usize,
        rcg: RecordingChannelGroup,
    ) -> Result<SourceNode> {
        let name = self.name(rcg.name, block_path, PathKind::Source, || {
            format!("{block_name}.RecordingChannelGroup{index}")
        })?;
        let path = block_path.join(PathKind::Source, name.as_str());
        check_annotations(&path, &rcg.annotations)?;

        if !rcg.channel_indexes.is_empty() && rcg.channel_indexes.len() != rcg.channels.len() {
            return Err(Error::mismatch(
                &path,
                format!(
                    "{} channel indexes for {} channels",
                    rcg.channel_indexes.len(),
                    rcg.channels.len()
                ),
            ));
        }
        if !rcg.coordinates.is_empty() && rcg.coordinates.len() != rcg.channels.len() {
            return Err(Error::mismatch(
                &path,
                format!("{} coordinates for {} channels", rcg.coordinates.len(), rcg.channels.len()),
            ));
        }
        let ordinal = rcg.channel_indexes.iter().enumerate().all(|(i, &idx)| idx == i as i64);
        if !ordinal {
            tracing::warn!(group = %name, "channel_indexes are not stored; they read back as 0..n");
        }

        let attrs = Attributes::new()
            .text("file_origin", rcg.file_origin.as_deref())
            .coordinates(&rcg.coordinates)
            .annotations(&rcg.annotations);
        let metadata = self.sections.get_or_create(&name, TypeTag::RecordingChannelGroup, attrs);
        let definition = text(rcg.description);

        let mut node = SourceNode::new(
            EntityInfo::new(name.as_str(), TypeTag::RecordingChannelGroup)
                .with_definition(definition.clone())
                .with_metadata(metadata.clone()),
        );

        let channels = rcg.channels.len();
        for (j, channel) in rcg.channels.into_iter().enumerate() {
            let channel_name = self.name(Some(channel.name), &path, PathKind::Source, || {
                format!("{name}.{j}")
            })?;
            let channel_definition = match &definition {
                Some(d) => format!("{d}.{channel_name}"),
                None => channel_name.clone(),
            };
            let shared = metadata.as_ref().map(|s| self.sections.share(s, &channel_name));
            node.children.push(SourceNode::new(
                EntityInfo::new(channel_name, TypeTag::RecordingChannel)
                    .with_definition(Some(channel_definition))
                    .with_metadata(shared),
            ));
        }

        let units = rcg.units.len();
        for (u, unit) in rcg.units.into_iter().enumerate() {
            let unit_name = self.name(unit.name, &path, PathKind::Source, || {
                format!("{name}.Unit{}", channels + u)
            })?;
            let unit_path = path.join(PathKind::Source, unit_name.as_str());
            check_annotations(&unit_path, &unit.annotations)?;
            let attrs = Attributes::new()
                .text("file_origin", unit.file_origin.as_deref())
                .annotations(&unit.annotations);
            let unit_metadata = self.sections.get_or_create(&unit_name, TypeTag::Unit, attrs);
            node.children.push(SourceNode::new(
                EntityInfo::new(unit_name, TypeTag::Unit)
                    .with_definition(text(unit.description))
                    .with_metadata(unit_metadata),
            ));
        }

        self.groups.push(GroupLayout { channels, units });
        Ok(node)
    }

    /// Source links for channel row `row` of a signal in channel group `group`.
    fn row_sources(&self, path: &EntityPath, group: Option<usize>, row: usize) -> Result<Vec<SourceRef>> {
        let Some(g) = group else {
            return Ok(Vec::new());
        };
        let layout = self
            .groups
            .get(g)
            .ok_or_else(|| Error::mismatch(path, format!("channel_group {g} does not exist")))?;
        let group_ref = SourceRef::root(g);
        let mut sources = vec![group_ref.clone()];
        if row < layout.channels {
            sources.push(group_ref.child(row));
        }
        Ok(sources)
    }

    // ------------------------------------------------------------------
    // Segments
    // ------------------------------------------------------------------

    fn segment(
        &mut self,
        block_path: &EntityPath,
        block_name: &str,
        index: usize,
        segment: Segment,
    ) -> Result<Group> {
        let name = self.name(segment.name, block_path, PathKind::Group, || {
            format!("{block_name}.Segment{index}")
        })?;
        let path = block_path.join(PathKind::Group, name.as_str());
        check_annotations(&path, &segment.annotations)?;

        let attrs = Attributes::new()
            .text("file_origin", segment.file_origin.as_deref())
            .datetime("file_datetime", segment.file_datetime)
            .annotations(&segment.annotations);
        let metadata = self.sections.get_or_create(&name, TypeTag::Segment, attrs);
        let mut group = Group::new(
            EntityInfo::new(name.as_str(), TypeTag::Segment)
                .with_definition(text(segment.description))
                .with_created_at(segment.rec_datetime)
                .with_metadata(metadata),
        );

        for signal in segment.analog_signals {
            self.analog_signal(&path, block_name, signal, &mut group.arrays)?;
        }
        for signal in segment.irregular_signals {
            self.irregular_signal(&path, block_name, signal, &mut group.arrays)?;
        }

        let references: Vec<usize> = if self.options.reference_signals {
            (0..group.arrays.len()).collect()
        } else {
            Vec::new()
        };
        for epoch in segment.epochs {
            let region = self.epoch(&path, &name, group.regions.len(), epoch, &references)?;
            group.regions.push(region);
        }
        for event in segment.events {
            let region = self.event(&path, &name, group.regions.len(), event, &references)?;
            group.regions.push(region);
        }
        for train in segment.spike_trains {
            let region = self.spike_train(&path, block_name, train)?;
            group.regions.push(region);
        }

        tracing::trace!(
            segment = %name,
            arrays = group.arrays.len(),
            regions = group.regions.len(),
            "Mapped segment"
        );
        Ok(group)
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// Metadata for the rows of one signal. A signal split over several
    /// arrays always gets a section, since that is what ties the rows back
    /// together.
    fn signal_section(
        &mut self,
        name: &str,
        tag: TypeTag,
        channels: usize,
        attrs: Attributes,
    ) -> Option<SectionRef> {
        let owner = format!("{name}.0");
        if channels > 1 {
            Some(self.sections.ensure(&owner, tag, attrs))
        } else {
            self.sections.get_or_create(&owner, tag, attrs)
        }
    }

    fn row_metadata(&mut self, section: &Option<SectionRef>, row: usize, owner: &str) -> Option<SectionRef> {
        match section {
            Some(s) if row > 0 => Some(self.sections.share(s, owner)),
            Some(s) => Some(Arc::clone(s)),
            None => None,
        }
    }

    fn analog_signal(
        &mut self,
        segment_path: &EntityPath,
        block_name: &str,
        signal: AnalogSignal,
        arrays: &mut Vec<ArrayEntity>,
    ) -> Result<()> {
        let index = self.arrays;
        let name = self.name(signal.name, segment_path, PathKind::Array, || {
            format!("{block_name}.AnalogSignal{index}")
        })?;
        let path = segment_path.join(PathKind::Array, name.as_str());
        check_annotations(&path, &signal.annotations)?;

        let channels = signal.signal.len();
        if channels == 0 {
            return Err(Error::mismatch(&path, "signal has no channels"));
        }
        let samples = signal.signal[0].len();
        if let Some(row) = signal.signal.iter().position(|r| r.len() != samples) {
            return Err(Error::mismatch(
                &path,
                format!("channel {row} has {} samples, channel 0 has {samples}", signal.signal[row].len()),
            ));
        }
        let period = signal.sampling_period.ok_or_else(|| Error::MissingRequiredAttribute {
            path: path.clone(),
            attribute: "sampling_period",
        })?;
        // Validate the back-reference before anything is emitted.
        self.row_sources(&path, signal.channel_group, 0)?;

        // The axis offset is in the period's unit. A start time measured in
        // another unit is kept verbatim in the section instead.
        let offset_in_axis = signal.t_start.unit == period.unit;
        let attrs = Attributes::new()
            .text("file_origin", signal.file_origin.as_deref())
            .quantity("t_start", (!offset_in_axis).then_some(&signal.t_start))
            .annotations(&signal.annotations);
        let section = self.signal_section(&name, TypeTag::AnalogSignal, channels, attrs);
        let definition = text(signal.description);
        let unit = text(Some(signal.units));

        for (row, data) in signal.signal.into_iter().enumerate() {
            let row_name = format!("{name}.{row}");
            let metadata = self.row_metadata(&section, row, &row_name);
            let mut array = ArrayEntity::new(
                EntityInfo::new(row_name, TypeTag::AnalogSignal)
                    .with_definition(definition.clone())
                    .with_metadata(metadata),
                NdArray::from_vec(data),
            )
            .with_dimensions(DimensionBuilder::build(Layout::Regular {
                sampling_period: &period,
                t_start: offset_in_axis.then_some(&signal.t_start),
            }));
            array.unit = unit.clone();
            array.sources = self.row_sources(&path, signal.channel_group, row)?;
            arrays.push(array);
        }
        self.arrays += channels;
        Ok(())
    }

    fn irregular_signal(
        &mut self,
        segment_path: &EntityPath,
        block_name: &str,
        signal: IrregularlySampledSignal,
        arrays: &mut Vec<ArrayEntity>,
    ) -> Result<()> {
        let index = self.arrays;
        let name = self.name(signal.name, segment_path, PathKind::Array, || {
            format!("{block_name}.IrregularlySampledSignal{index}")
        })?;
        let path = segment_path.join(PathKind::Array, name.as_str());
        check_annotations(&path, &signal.annotations)?;

        let channels = signal.signal.len();
        if channels == 0 {
            return Err(Error::mismatch(&path, "signal has no channels"));
        }
        if let Some(row) = signal.signal.iter().position(|r| r.len() != signal.times.len()) {
            return Err(Error::mismatch(
                &path,
                format!(
                    "channel {row} has {} samples for {} times",
                    signal.signal[row].len(),
                    signal.times.len()
                ),
            ));
        }
        self.row_sources(&path, signal.channel_group, 0)?;

        let attrs = Attributes::new()
            .text("file_origin", signal.file_origin.as_deref())
            .annotations(&signal.annotations);
        let section = self.signal_section(&name, TypeTag::IrregularlySampledSignal, channels, attrs);
        let definition = text(signal.description);
        let unit = text(Some(signal.units));
        let ticks: Arc<[f64]> = Arc::from(signal.times);

        for (row, data) in signal.signal.into_iter().enumerate() {
            let row_name = format!("{name}.{row}");
            let metadata = self.row_metadata(&section, row, &row_name);
            let mut array = ArrayEntity::new(
                EntityInfo::new(row_name, TypeTag::IrregularlySampledSignal)
                    .with_definition(definition.clone())
                    .with_metadata(metadata),
                NdArray::from_vec(data),
            )
            .with_dimensions(DimensionBuilder::build(Layout::Irregular {
                ticks: Arc::clone(&ticks),
                unit: &signal.time_units,
            }));
            array.unit = unit.clone();
            array.sources = self.row_sources(&path, signal.channel_group, row)?;
            arrays.push(array);
        }
        self.arrays += channels;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    fn check_labels(path: &EntityPath, labels: &[String], times: usize) -> Result<()> {
        if !labels.is_empty() && labels.len() != times {
            return Err(Error::mismatch(path, format!("{} labels for {times} times", labels.len())));
        }
        Ok(())
    }

    fn positions(name: &str, tag: TypeTag, data: Vec<f64>, unit: String, labels: Vec<String>) -> ArrayEntity {
        let mut array = ArrayEntity::new(EntityInfo::new(name, tag), NdArray::from_vec(data))
            .with_dimensions(DimensionBuilder::build(Layout::Positions { labels }));
        array.unit = text(Some(unit));
        array
    }

    fn epoch(
        &mut self,
        segment_path: &EntityPath,
        segment_name: &str,
        index: usize,
        epoch: Epoch,
        references: &[usize],
    ) -> Result<TaggedRegion> {
        let name = self.name(epoch.name, segment_path, PathKind::Region, || {
            format!("{segment_name}.Epoch{index}")
        })?;
        let path = segment_path.join(PathKind::Region, name.as_str());
        check_annotations(&path, &epoch.annotations)?;
        Self::check_labels(&path, &epoch.labels, epoch.times.len())?;
        if epoch.durations.len() != epoch.times.len() {
            return Err(Error::mismatch(
                &path,
                format!("{} durations for {} times", epoch.durations.len(), epoch.times.len()),
            ));
        }

        let attrs = Attributes::new()
            .text("file_origin", epoch.file_origin.as_deref())
            .annotations(&epoch.annotations);
        let metadata = self.sections.get_or_create(&name, TypeTag::Epoch, attrs);

        let positions = Self::positions(
            &format!("{name}.times"),
            TypeTag::EpochTimes,
            epoch.times,
            epoch.time_units,
            epoch.labels,
        );
        let extents = Self::positions(
            &format!("{name}.durations"),
            TypeTag::EpochDurations,
            epoch.durations,
            epoch.duration_units,
            Vec::new(),
        );
        let mut region = TaggedRegion::new(
            EntityInfo::new(name, TypeTag::Epoch)
                .with_definition(text(epoch.description))
                .with_metadata(metadata),
            positions,
        )
        .with_extents(extents);
        region.references = references.to_vec();
        self.arrays += 2;
        self.regions += 1;
        Ok(region)
    }

    fn event(
        &mut self,
        segment_path: &EntityPath,
        segment_name: &str,
        index: usize,
        event: Event,
        references: &[usize],
    ) -> Result<TaggedRegion> {
        let name = self.name(event.name, segment_path, PathKind::Region, || {
            format!("{segment_name}.Event{index}")
        })?;
        let path = segment_path.join(PathKind::Region, name.as_str());
        check_annotations(&path, &event.annotations)?;
        Self::check_labels(&path, &event.labels, event.times.len())?;

        let attrs = Attributes::new()
            .text("file_origin", event.file_origin.as_deref())
            .annotations(&event.annotations);
        let metadata = self.sections.get_or_create(&name, TypeTag::Event, attrs);

        let positions = Self::positions(
            &format!("{name}.times"),
            TypeTag::EventTimes,
            event.times,
            event.time_units,
            event.labels,
        );
        let mut region = TaggedRegion::new(
            EntityInfo::new(name, TypeTag::Event)
                .with_definition(text(event.description))
                .with_metadata(metadata),
            positions,
        );
        region.references = references.to_vec();
        self.arrays += 1;
        self.regions += 1;
        Ok(region)
    }

    fn spike_train(
        &mut self,
        segment_path: &EntityPath,
        block_name: &str,
        train: SpikeTrain,
    ) -> Result<TaggedRegion> {
        let index = self.regions;
        let name = self.name(train.name, segment_path, PathKind::Region, || {
            format!("{block_name}.SpikeTrain{index}")
        })?;
        let path = segment_path.join(PathKind::Region, name.as_str());
        check_annotations(&path, &train.annotations)?;

        let sources = match train.unit {
            None => Vec::new(),
            Some(unit_ref) => {
                let layout = self
                    .groups
                    .get(unit_ref.group)
                    .filter(|layout| unit_ref.unit < layout.units)
                    .ok_or_else(|| {
                        Error::mismatch(
                            &path,
                            format!("unit {} of channel group {} does not exist", unit_ref.unit, unit_ref.group),
                        )
                    })?;
                let group_ref = SourceRef::root(unit_ref.group);
                let unit_child = group_ref.child(layout.channels + unit_ref.unit);
                vec![group_ref, unit_child]
            }
        };

        let attrs = Attributes::new()
            .text("file_origin", train.file_origin.as_deref())
            .quantity("t_start", Some(&train.t_start))
            .quantity("t_stop", Some(&train.t_stop))
            .quantity("left_sweep", train.left_sweep.as_ref())
            .quantity("sampling_rate", train.sampling_rate.as_ref())
            .annotations(&train.annotations);
        let metadata = self.sections.get_or_create(&name, TypeTag::SpikeTrain, attrs);

        let spikes = train.times.len();
        let positions = Self::positions(
            &format!("{name}.times"),
            TypeTag::SpikeTrainTimes,
            train.times,
            train.time_units,
            Vec::new(),
        );
        let mut region = TaggedRegion::new(
            EntityInfo::new(name.as_str(), TypeTag::SpikeTrain)
                .with_definition(text(train.description))
                .with_metadata(metadata),
            positions,
        );
        region.sources = sources;

        if let Some(waveforms) = train.waveforms {
            let feature_name = format!("{name}.waveforms");
            let feature_path = path.join(PathKind::Feature, feature_name.as_str());
            let rate = train.sampling_rate.as_ref().ok_or_else(|| Error::MissingRequiredAttribute {
                path: feature_path.clone(),
                attribute: "sampling_rate",
            })?;
            if !(rate.value.is_finite() && rate.value > 0.0) {
                return Err(Error::mismatch(&feature_path, format!("sampling rate {rate} is not positive")));
            }
            if waveforms.data.ndim() != 3 {
                return Err(Error::mismatch(
                    &feature_path,
                    format!("waveforms have shape {:?}, expected (spikes, channels, samples)", waveforms.data.shape()),
                ));
            }
            tracing::trace!(region = %name, spikes, "Linking waveforms");
            let mut target = ArrayEntity::new(EntityInfo::new(feature_name, TypeTag::Waveforms), waveforms.data)
                .with_dimensions(DimensionBuilder::build(Layout::Waveforms { sampling_rate: rate }));
            target.unit = text(Some(waveforms.units));
            FeatureLinker::link_indexed(&feature_path, &mut region, target)?;
            self.arrays += 1;
        }
        self.arrays += 1;
        self.regions += 1;
        Ok(region)
    }
}

/// Empty strings count as unset.
fn text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo::{Quantity, Unit, UnitRef, Waveforms};
    use crate::nix::{Dimension, Entity, LinkType, Value};

    fn mapper() -> ForwardMapper {
        ForwardMapper::new(MappingOptions::default())
    }

    fn block_with(segment: Segment) -> Block {
        let mut block = Block::new("b");
        block.segments.push(segment);
        block
    }

    #[test]
    fn test_epoch_region() {
        let mut seg = Segment::new("s");
        seg.epochs.push(Epoch::new(
            "ep",
            vec![0.0, 1.0, 2.0],
            vec![0.5, 0.5, 0.5],
            vec!["a".into(), "b".into(), "c".into()],
            "s",
        ));
        let root = mapper().map_block(block_with(seg)).unwrap();
        let region = root.groups[0].region("ep").unwrap();
        assert_eq!(region.info.type_tag, "neo.epoch");
        assert_eq!(region.positions.info.name, "ep.times");
        assert_eq!(region.positions.info.type_tag, "neo.epoch.times");
        assert_eq!(region.positions.data.data(), &[0.0, 1.0, 2.0]);
        assert_eq!(region.positions.dimensions[0].labels(), &["a", "b", "c"]);
        let extents = region.extents.as_ref().unwrap();
        assert_eq!(extents.info.name, "ep.durations");
        assert_eq!(extents.data.data(), &[0.5, 0.5, 0.5]);
        assert_eq!(extents.unit.as_deref(), Some("s"));
        assert!(region.info.metadata.is_none());
    }

    #[test]
    fn test_multichannel_signal_shares_one_section() {
        let mut seg = Segment::new("s");
        seg.analog_signals.push(AnalogSignal::new(
            "lfp",
            vec![vec![0.0; 4], vec![1.0; 4], vec![2.0; 4]],
            "mV",
            Quantity::new(0.001, "s"),
        ));
        let root = mapper().map_block(block_with(seg)).unwrap();
        let arrays = &root.groups[0].arrays;
        assert_eq!(arrays.len(), 3);
        let first = arrays[0].info.metadata.as_ref().unwrap();
        assert_eq!(first.name, "lfp.0");
        for array in &arrays[1..] {
            assert!(Arc::ptr_eq(first, array.info.metadata.as_ref().unwrap()));
        }
        assert_eq!(arrays[2].info.name, "lfp.2");
    }

    #[test]
    fn test_single_channel_signal_is_lazy() {
        let mut seg = Segment::new("s");
        seg.analog_signals.push(AnalogSignal::new("v", vec![vec![1.0, 2.0]], "mV", Quantity::new(0.1, "ms")));
        let root = mapper().map_block(block_with(seg)).unwrap();
        assert!(root.groups[0].arrays[0].info.metadata.is_none());
        assert!(root.info.metadata.is_none());
    }

    #[test]
    fn test_missing_sampling_period() {
        let mut seg = Segment::new("s");
        let mut sig = AnalogSignal::new("v", vec![vec![1.0]], "mV", Quantity::new(1.0, "s"));
        sig.sampling_period = None;
        seg.analog_signals.push(sig);
        let err = mapper().map_block(block_with(seg)).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredAttribute { attribute: "sampling_period", .. }));
    }

    #[test]
    fn test_t_start_in_other_unit_goes_to_section() {
        let mut seg = Segment::new("s");
        let mut sig = AnalogSignal::new("v", vec![vec![1.0]], "mV", Quantity::new(1.0, "ms"));
        sig.t_start = Quantity::new(3.0, "s");
        seg.analog_signals.push(sig);
        let root = mapper().map_block(block_with(seg)).unwrap();
        let array = &root.groups[0].arrays[0];
        match &array.dimensions[0] {
            Dimension::Sampled { offset, .. } => assert_eq!(*offset, None),
            other => panic!("unexpected axis {other:?}"),
        }
        let section = array.info.metadata.as_ref().unwrap();
        assert_eq!(section.value("t_start"), Some(&Value::Float(3.0)));
        assert_eq!(section.get("t_start").unwrap().unit.as_deref(), Some("s"));
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let mut seg = Segment::new("s");
        seg.analog_signals.push(AnalogSignal::new(
            "v",
            vec![vec![1.0, 2.0], vec![1.0]],
            "mV",
            Quantity::new(1.0, "ms"),
        ));
        let err = mapper().map_block(block_with(seg)).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "block:b/group:s/array:v");
    }

    #[test]
    fn test_spike_train_with_waveforms_and_unit() {
        let mut block = Block::new("b");
        let mut rcg = RecordingChannelGroup::new("tetrode").with_channels(["ch0", "ch1"]);
        rcg.units.push(Unit::new("u0"));
        block.recording_channel_groups.push(rcg);

        let mut train = SpikeTrain::new("st", vec![0.1, 0.2], "s", 1.0);
        train.sampling_rate = Some(Quantity::new(30.0, "kHz"));
        train.waveforms = Some(Waveforms {
            data: NdArray::new([2, 2, 3], vec![0.0; 12]).unwrap(),
            units: "uV".into(),
        });
        train.unit = Some(UnitRef { group: 0, unit: 0 });
        let mut seg = Segment::new("s");
        seg.spike_trains.push(train);
        block.segments.push(seg);

        let root = mapper().map_block(block).unwrap();
        let region = root.groups[0].region("st").unwrap();
        assert_eq!(region.sources, vec![SourceRef::root(0), SourceRef::from_path([0, 2])]);
        assert_eq!(root.resolve(&region.sources[1]).unwrap().info.type_tag, "neo.unit");
        assert_eq!(region.features.len(), 1);
        assert_eq!(region.features[0].link_type, LinkType::Indexed);
        match &region.features[0].target.dimensions[2] {
            Dimension::Sampled { unit, .. } => assert_eq!(unit.as_deref(), Some("ms")),
            other => panic!("unexpected axis {other:?}"),
        }
        let section = region.info.metadata.as_ref().unwrap();
        assert_eq!(section.get("t_stop").unwrap().unit.as_deref(), Some("s"));
        assert_eq!(section.value("sampling_rate"), Some(&Value::Float(30.0)));
        assert!(region.references.is_empty());
    }

    #[test]
    fn test_waveforms_need_sampling_rate() {
        let mut train = SpikeTrain::new("st", vec![0.1], "s", 1.0);
        train.waveforms = Some(Waveforms { data: NdArray::new([1, 1, 2], vec![0.0; 2]).unwrap(), units: "uV".into() });
        let mut seg = Segment::new("s");
        seg.spike_trains.push(train);
        let err = mapper().map_block(block_with(seg)).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredAttribute { attribute: "sampling_rate", .. }));
    }

    #[test]
    fn test_dangling_channel_group() {
        let mut seg = Segment::new("s");
        let mut sig = AnalogSignal::new("v", vec![vec![1.0]], "mV", Quantity::new(1.0, "ms"));
        sig.channel_group = Some(3);
        seg.analog_signals.push(sig);
        assert!(matches!(mapper().map_block(block_with(seg)), Err(Error::StructuralMismatch { .. })));
    }

    #[test]
    fn test_channels_share_group_section() {
        let mut block = Block::new("b");
        let mut rcg = RecordingChannelGroup::new("g").with_channels(["a", "b"]);
        rcg.description = Some("probe".into());
        rcg.file_origin = Some("x.ns5".into());
        block.recording_channel_groups.push(rcg);
        let root = mapper().map_block(block).unwrap();
        let node = &root.sources[0];
        let group_section = node.info.metadata.as_ref().unwrap();
        for child in &node.children {
            assert!(Arc::ptr_eq(group_section, child.info.metadata.as_ref().unwrap()));
        }
        assert_eq!(node.children[1].info.definition.as_deref(), Some("probe.b"));
    }

    #[test]
    fn test_anonymous_names() {
        let mut block = Block::default();
        let mut seg = Segment::default();
        seg.events.push(Event { times: vec![1.0], time_units: "s".into(), ..Default::default() });
        block.segments.push(seg);
        let root = mapper().map_block_numbered(block.clone(), 4).unwrap();
        assert_eq!(root.info.name, "neo.Block4");
        assert_eq!(root.groups[0].info.name, "neo.Block4.Segment0");
        assert_eq!(root.groups[0].regions[0].info.name, "neo.Block4.Segment0.Event0");

        let strict = ForwardMapper::new(MappingOptions { name_anonymous: false, ..Default::default() });
        assert!(matches!(
            strict.map_block(block),
            Err(Error::MissingRequiredAttribute { attribute: "name", .. })
        ));
    }

    #[test]
    fn test_anonymous_names_use_block_wide_counters() {
        let unnamed_signal = |channels: usize| AnalogSignal {
            signal: vec![vec![0.0; 2]; channels],
            sampling_period: Some(Quantity::new(1.0, "ms")),
            ..Default::default()
        };
        let mut first = Segment::new("s0");
        first.analog_signals.push(unnamed_signal(2));
        first.events.push(Event { times: vec![1.0], ..Default::default() });
        let mut second = Segment::new("s1");
        second.analog_signals.push(unnamed_signal(1));
        second.epochs.push(Epoch { times: vec![1.0], durations: vec![0.5], ..Default::default() });
        second.spike_trains.push(SpikeTrain::default());

        let mut rcg = RecordingChannelGroup::new("g").with_channels(["", ""]);
        rcg.units.push(Unit::default());
        let mut block = Block::new("b");
        block.recording_channel_groups.push(rcg);
        block.segments = vec![first, second];

        let root = mapper().map_block(block).unwrap();
        let names: Vec<&str> = root.groups.iter().flat_map(|g| g.arrays.iter()).map(|a| a.name()).collect();
        assert_eq!(names, vec!["b.AnalogSignal0.0", "b.AnalogSignal0.1", "b.AnalogSignal3.0"]);
        assert_eq!(root.groups[0].regions[0].info.name, "s0.Event0");
        assert_eq!(root.groups[1].regions[0].info.name, "s1.Epoch0");
        assert_eq!(root.groups[1].regions[1].info.name, "b.SpikeTrain2");

        let children: Vec<&str> = root.sources[0].children.iter().map(|c| c.name()).collect();
        assert_eq!(children, vec!["g.0", "g.1", "g.Unit2"]);
    }

    #[test]
    fn test_coordinates_stored_in_group_section() {
        let mut rcg = RecordingChannelGroup::new("g").with_channels(["a", "b"]);
        rcg.coordinates = vec![
            vec![Quantity::new(1.0, "cm"), Quantity::new(2.0, "cm")],
            vec![Quantity::new(1.0, "cm"), Quantity::new(4.0, "cm")],
        ];
        let mut block = Block::new("b");
        block.recording_channel_groups.push(rcg.clone());
        let root = mapper().map_block(block).unwrap();

        let node = &root.sources[0];
        let section = node.info.metadata.as_ref().unwrap();
        assert!(Arc::ptr_eq(section, node.children[0].info.metadata.as_ref().unwrap()));
        assert_eq!(
            section.value("coordinates"),
            Some(&Value::List(vec![Value::from(vec![1.0, 2.0]), Value::from(vec![1.0, 4.0])]))
        );

        rcg.coordinates.pop();
        let mut block = Block::new("b");
        block.recording_channel_groups.push(rcg);
        assert!(matches!(mapper().map_block(block), Err(Error::StructuralMismatch { .. })));
    }

    #[test]
    fn test_event_references_signals() {
        let mut seg = Segment::new("s");
        seg.analog_signals.push(AnalogSignal::new("v", vec![vec![1.0], vec![2.0]], "mV", Quantity::new(1.0, "ms")));
        seg.events.push(Event::new("ev", vec![0.5], vec!["go".into()], "ms"));
        let root = mapper().map_block(block_with(seg.clone())).unwrap();
        assert_eq!(root.groups[0].regions[0].references, vec![0, 1]);

        let plain = ForwardMapper::new(MappingOptions { reference_signals: false, ..Default::default() });
        let root = plain.map_block(block_with(seg)).unwrap();
        assert!(root.groups[0].regions[0].references.is_empty());
    }
}
