//! Channel organisation: groups, channels and sorted units.

use super::{Annotations, Quantity};

/// A set of recording channels and the units sorted from them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordingChannelGroup {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
    /// Hardware channel numbers. Not persisted: reading a group back yields
    /// the ordinal positions `0..channels.len()` instead.
    pub channel_indexes: Vec<i64>,
    pub channels: Vec<RecordingChannel>,
    /// Electrode position of each channel, one entry per channel, or empty
    /// when unknown.
    pub coordinates: Vec<Vec<Quantity>>,
    pub units: Vec<Unit>,
}

impl RecordingChannelGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    /// Append channels named `names`, indexed by their position.
    pub fn with_channels<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            self.channel_indexes.push(self.channels.len() as i64);
            self.channels.push(RecordingChannel { name: name.into() });
        }
        self
    }
}

/// One electrode channel of a group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordingChannel {
    pub name: String,
}

/// A putative neuron; spike trains point at it through [`UnitRef`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }
}

/// Non-owning reference to `block.recording_channel_groups[group].units[unit]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitRef {
    pub group: usize,
    pub unit: usize,
}
