//! Point and interval annotations of the time axis, and spike trains.

use super::{Annotations, Quantity, UnitRef};
use crate::nix::NdArray;

/// Labelled time intervals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Epoch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
    pub times: Vec<f64>,
    pub durations: Vec<f64>,
    pub labels: Vec<String>,
    pub time_units: String,
    pub duration_units: String,
}

impl Epoch {
    pub fn new(
        name: impl Into<String>,
        times: Vec<f64>,
        durations: Vec<f64>,
        labels: Vec<String>,
        units: impl Into<String>,
    ) -> Self {
        let units = units.into();
        Self {
            name: Some(name.into()),
            times,
            durations,
            labels,
            duration_units: units.clone(),
            time_units: units,
            ..Default::default()
        }
    }
}

/// Labelled time points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
    pub times: Vec<f64>,
    pub labels: Vec<String>,
    pub time_units: String,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        times: Vec<f64>,
        labels: Vec<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            times,
            labels,
            time_units: units.into(),
            ..Default::default()
        }
    }
}

/// Spike waveform snippets, shaped `(spikes, channels, samples)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveforms {
    pub data: NdArray,
    pub units: String,
}

/// Spike times of one sorted unit (or unsorted activity) in one segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpikeTrain {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_origin: Option<String>,
    pub annotations: Annotations,
    pub times: Vec<f64>,
    pub time_units: String,
    pub t_start: Quantity,
    pub t_stop: Quantity,
    pub left_sweep: Option<Quantity>,
    pub sampling_rate: Option<Quantity>,
    pub waveforms: Option<Waveforms>,
    pub unit: Option<UnitRef>,
}

impl SpikeTrain {
    pub fn new(name: impl Into<String>, times: Vec<f64>, units: impl Into<String>, t_stop: f64) -> Self {
        let units = units.into();
        Self {
            name: Some(name.into()),
            times,
            t_start: Quantity::new(0.0, units.clone()),
            t_stop: Quantity::new(t_stop, units.clone()),
            time_units: units,
            ..Default::default()
        }
    }
}
