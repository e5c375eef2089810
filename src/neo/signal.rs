//! Continuous signals.
//!
//! Both signal types store their samples channel-major: `signal[c]` is the
//! full trace of channel `c`. The forward mapper moves each row into its own
//! array entity.

use super::{Annotations, Quantity};

/// Regularly sampled multi-channel signal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalogSignal {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
    pub signal: Vec<Vec<f64>>,
    pub units: String,
    pub sampling_period: Option<Quantity>,
    pub t_start: Quantity,
    /// Index into the block's recording channel groups.
    pub channel_group: Option<usize>,
}

impl AnalogSignal {
    pub fn new(
        name: impl Into<String>,
        signal: Vec<Vec<f64>>,
        units: impl Into<String>,
        sampling_period: Quantity,
    ) -> Self {
        let t_start = Quantity::new(0.0, sampling_period.unit.clone());
        Self {
            name: Some(name.into()),
            signal,
            units: units.into(),
            sampling_period: Some(sampling_period),
            t_start,
            ..Default::default()
        }
    }

    pub fn channel_count(&self) -> usize {
        self.signal.len()
    }
}

/// Multi-channel signal sampled at explicit times.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrregularlySampledSignal {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
    pub signal: Vec<Vec<f64>>,
    pub units: String,
    pub times: Vec<f64>,
    pub time_units: String,
    /// Index into the block's recording channel groups.
    pub channel_group: Option<usize>,
}

impl IrregularlySampledSignal {
    pub fn new(
        name: impl Into<String>,
        times: Vec<f64>,
        time_units: impl Into<String>,
        signal: Vec<Vec<f64>>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            signal,
            units: units.into(),
            times,
            time_units: time_units.into(),
            ..Default::default()
        }
    }

    pub fn channel_count(&self) -> usize {
        self.signal.len()
    }
}
