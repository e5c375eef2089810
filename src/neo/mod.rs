//! # Source Model (Neo)
//!
//! Typed in-memory objects describing electrophysiology recordings.
//! Containers own their children; the only cross-links are index handles
//! (`AnalogSignal::channel_group`, `SpikeTrain::unit`) into the block's
//! recording channel groups.

pub mod quantity;
pub mod block;
pub mod signal;
pub mod event;
pub mod channel;

pub use quantity::{Annotations, Quantity};
pub use block::{Block, Segment};
pub use signal::{AnalogSignal, IrregularlySampledSignal};
pub use event::{Epoch, Event, SpikeTrain, Waveforms};
pub use channel::{RecordingChannel, RecordingChannelGroup, Unit, UnitRef};
