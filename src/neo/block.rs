//! Blocks and segments.

use chrono::NaiveDateTime;

use super::{
    AnalogSignal, Annotations, Epoch, Event, IrregularlySampledSignal, RecordingChannelGroup,
    SpikeTrain,
};

/// Top-level container for one recording session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub file_datetime: Option<NaiveDateTime>,
    pub rec_datetime: Option<NaiveDateTime>,
    pub annotations: Annotations,
    pub segments: Vec<Segment>,
    pub recording_channel_groups: Vec<RecordingChannelGroup>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A time slice of a recording holding its signals and events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub file_datetime: Option<NaiveDateTime>,
    pub rec_datetime: Option<NaiveDateTime>,
    pub annotations: Annotations,
    pub analog_signals: Vec<AnalogSignal>,
    pub irregular_signals: Vec<IrregularlySampledSignal>,
    pub epochs: Vec<Epoch>,
    pub events: Vec<Event>,
    pub spike_trains: Vec<SpikeTrain>,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }
}
