//! Type-tag registry.
//!
//! The NIX model has no notion of Neo's object types: every Neo class
//! collapses onto one of four generic entity kinds and is told apart only by
//! the `type` string stored on the entity. This module is the closed list of
//! those strings. Reverse mapping dispatches on [`TypeTag`] with an
//! exhaustive `match`; anything that does not parse is rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Suffix appended to an owner's tag to form its metadata section's tag.
pub const METADATA_SUFFIX: &str = ".metadata";

/// Canonical type tags written by the forward mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Block,
    Segment,
    RecordingChannelGroup,
    RecordingChannel,
    Unit,
    AnalogSignal,
    IrregularlySampledSignal,
    Epoch,
    EpochTimes,
    EpochDurations,
    Event,
    EventTimes,
    SpikeTrain,
    SpikeTrainTimes,
    Waveforms,
}

impl TypeTag {
    pub const ALL: [TypeTag; 15] = [
        TypeTag::Block,
        TypeTag::Segment,
        TypeTag::RecordingChannelGroup,
        TypeTag::RecordingChannel,
        TypeTag::Unit,
        TypeTag::AnalogSignal,
        TypeTag::IrregularlySampledSignal,
        TypeTag::Epoch,
        TypeTag::EpochTimes,
        TypeTag::EpochDurations,
        TypeTag::Event,
        TypeTag::EventTimes,
        TypeTag::SpikeTrain,
        TypeTag::SpikeTrainTimes,
        TypeTag::Waveforms,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Block => "neo.block",
            TypeTag::Segment => "neo.segment",
            TypeTag::RecordingChannelGroup => "neo.recordingchannelgroup",
            TypeTag::RecordingChannel => "neo.recordingchannel",
            TypeTag::Unit => "neo.unit",
            TypeTag::AnalogSignal => "neo.analogsignal",
            TypeTag::IrregularlySampledSignal => "neo.irregularlysampledsignal",
            TypeTag::Epoch => "neo.epoch",
            TypeTag::EpochTimes => "neo.epoch.times",
            TypeTag::EpochDurations => "neo.epoch.durations",
            TypeTag::Event => "neo.event",
            TypeTag::EventTimes => "neo.event.times",
            TypeTag::SpikeTrain => "neo.spiketrain",
            TypeTag::SpikeTrainTimes => "neo.spiketrain.times",
            TypeTag::Waveforms => "neo.waveforms",
        }
    }

    /// Tag of the positions array belonging to a region tag.
    pub fn positions_role(self) -> Option<TypeTag> {
        match self {
            TypeTag::Epoch => Some(TypeTag::EpochTimes),
            TypeTag::Event => Some(TypeTag::EventTimes),
            TypeTag::SpikeTrain => Some(TypeTag::SpikeTrainTimes),
            _ => None,
        }
    }

    /// Tag of the extents array belonging to a region tag.
    pub fn extents_role(self) -> Option<TypeTag> {
        match self {
            TypeTag::Epoch => Some(TypeTag::EpochDurations),
            _ => None,
        }
    }

    /// Tag for the metadata section owned by an entity with this tag.
    pub fn metadata_tag(self) -> String {
        format!("{}{METADATA_SUFFIX}", self.as_str())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the registered tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type tag '{0}'")]
pub struct UnknownTag(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip_through_strings() {
        for tag in TypeTag::ALL {
            assert_eq!(tag.as_str().parse::<TypeTag>(), Ok(tag));
        }
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!("neo.Epoch".parse::<TypeTag>().is_err());
        assert!("neo.epoch ".parse::<TypeTag>().is_err());
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let err = "neo.marker".parse::<TypeTag>().unwrap_err();
        assert_eq!(err, UnknownTag("neo.marker".into()));
        assert_eq!(err.to_string(), "unknown type tag 'neo.marker'");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_role_suffixes() {
        assert_eq!(TypeTag::Epoch.positions_role(), Some(TypeTag::EpochTimes));
        assert_eq!(TypeTag::Epoch.extents_role(), Some(TypeTag::EpochDurations));
        assert_eq!(TypeTag::Event.extents_role(), None);
        assert_eq!(TypeTag::SpikeTrain.positions_role().map(TypeTag::as_str), Some("neo.spiketrain.times"));
        assert_eq!(TypeTag::Unit.positions_role(), None);
    }

    #[test]
    fn test_metadata_tag() {
        assert_eq!(TypeTag::AnalogSignal.metadata_tag(), "neo.analogsignal.metadata");
    }
}
