//! Dimension builder: ordered axis descriptors for each payload layout.

use std::sync::Arc;

use crate::neo::Quantity;
use crate::nix::Dimension;

/// Label written on every time axis.
pub const TIME_LABEL: &str = "time";

/// Shape of a payload, as far as its axes are concerned.
#[derive(Debug, Clone)]
pub enum Layout<'a> {
    /// One channel row of a regularly sampled signal. `t_start` becomes the
    /// axis offset; pass `None` when it is not in the period's unit.
    Regular { sampling_period: &'a Quantity, t_start: Option<&'a Quantity> },
    /// One channel row of an irregularly sampled signal. The ticks are
    /// shared by every row of the signal.
    Irregular { ticks: Arc<[f64]>, unit: &'a str },
    /// Waveform snippets `(spikes, channels, samples)`.
    Waveforms { sampling_rate: &'a Quantity },
    /// Positions (or extents) of a tagged region.
    Positions { labels: Vec<String> },
}

pub struct DimensionBuilder;

impl DimensionBuilder {
    /// Dimensions for `layout`, in payload axis order.
    pub fn build(layout: Layout<'_>) -> Vec<Dimension> {
        match layout {
            Layout::Regular { sampling_period, t_start } => vec![
                Dimension::Sampled {
                    interval: sampling_period.value,
                    offset: t_start.map(|t| t.value),
                    unit: non_empty(&sampling_period.unit),
                    label: Some(TIME_LABEL.to_owned()),
                },
                Dimension::set(),
            ],
            Layout::Irregular { ticks, unit } => vec![
                Dimension::Range {
                    ticks,
                    unit: non_empty(unit),
                    label: Some(TIME_LABEL.to_owned()),
                },
                Dimension::set(),
            ],
            Layout::Waveforms { sampling_rate } => vec![
                Dimension::set(),
                Dimension::set(),
                Dimension::Sampled {
                    interval: 1.0 / sampling_rate.value,
                    offset: None,
                    unit: non_empty(&inverse_time_unit(&sampling_rate.unit)),
                    label: Some(TIME_LABEL.to_owned()),
                },
            ],
            Layout::Positions { labels } => vec![Dimension::Set { labels }],
        }
    }
}

/// Unit of the reciprocal of a quantity measured in `unit`.
///
/// Frequency and time units are paired (`Hz`/`s`, `kHz`/`ms`, `MHz`/`us`);
/// anything else is written as `1/unit`, and `1/unit` inverts back to
/// `unit`. An empty unit stays empty.
pub fn inverse_time_unit(unit: &str) -> String {
    match unit {
        "" => String::new(),
        "Hz" => "s".into(),
        "s" => "Hz".into(),
        "kHz" => "ms".into(),
        "ms" => "kHz".into(),
        "MHz" => "us".into(),
        "us" => "MHz".into(),
        other => match other.strip_prefix("1/") {
            Some(inner) if !inner.is_empty() => inner.to_owned(),
            _ => format!("1/{other}"),
        },
    }
}

fn non_empty(unit: &str) -> Option<String> {
    (!unit.is_empty()).then(|| unit.to_owned())
}
