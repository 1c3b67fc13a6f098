//! Read-time cleaning of channel values for plotting and statistics.
//!
//! Each requested channel gets its own [`ChannelFilter`], a causal single
//! pass: scale to display units, hold the previous output when a sample is
//! out of range, then hold it again when the step from the previous output
//! is larger than `max_step`. The table is never modified.
use log::warn;
use serde::{Deserialize, Serialize};
use crate::frame::channel::ChannelSettings;
use crate::frame::table::{Table, Value};
use crate::frame::FrameError;
/// What to do with out-of-range samples at the start of a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeMode {
    /// An out-of-range first sample is replaced by the channel's `start_pos`.
    #[default]
    Hold,
    /// Leading rows are dropped from every requested channel together until
    /// each channel's first sample is in range.
    Remove,
}
#[derive(Clone, Copy, Debug, PartialEq)]
enum FilterState {
    AwaitingValidFirstSample,
    Streaming { last: f64 },
}
/// Per-channel filter state for one pass.
#[derive(Clone, Debug)]
pub struct ChannelFilter<'a> {
    settings: &'a ChannelSettings,
    state: FilterState,
}
impl<'a> ChannelFilter<'a> {
    pub fn new(settings: &'a ChannelSettings) -> Self {
        Self {
            settings,
            state: FilterState::AwaitingValidFirstSample,
        }
    }
    pub fn is_streaming(&self) -> bool {
        matches!(self.state, FilterState::Streaming { .. })
    }
    /// Cleans one raw sample. Non-numeric values come back unchanged and do
    /// not touch the filter state.
    pub fn process_sample(&mut self, raw: &Value) -> Value {
        let Some(raw) = raw.as_number() else {
            return raw.clone();
        };
        let scaled = self.settings.scale(raw);
        let output = match self.state {
            FilterState::AwaitingValidFirstSample => {
                if self.settings.in_range(scaled) {
                    scaled
                } else {
                    self.settings.start_pos
                }
            }
            FilterState::Streaming { last } => {
                let mut value = scaled;
                if !self.settings.in_range(value) {
                    value = last;
                }
                if (value - last).abs() > self.settings.max_step {
                    value = last;
                }
                value
            }
        };
        self.state = FilterState::Streaming { last: output };
        Value::Number(output)
    }
}
/// Cleaned values of one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct SanitizedChannel {
    pub name: String,
    pub values: Vec<Value>,
    /// Non-numeric values passed through untouched.
    pub unfiltered: usize,
}
impl SanitizedChannel {
    /// Numeric values only, for plotting and statistics.
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_number).collect()
    }
}
/// Result of a sanitize request. All channels have the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct Sanitized {
    pub channels: Vec<SanitizedChannel>,
    pub len: usize,
    /// Leading rows dropped in [`RangeMode::Remove`].
    pub trimmed: usize,
}
impl Sanitized {
    pub fn channel(&self, name: &str) -> Option<&SanitizedChannel> {
        self.channels.iter().find(|c| c.name == name)
    }
}
/// Cleans the requested channels of `table` for display.
pub fn sanitize(table: &Table, names: &[&str], mode: RangeMode) -> Result<Sanitized, FrameError> {
    let mut requested = Vec::with_capacity(names.len());
    for &name in names {
        let channel = table
            .channel(name)
            .ok_or_else(|| FrameError::UnknownChannel(name.to_owned()))?;
        requested.push((channel, table.column(name)?));
    }
    let total = table.len();
    let trimmed = match mode {
        RangeMode::Hold => 0,
        RangeMode::Remove => (0..total)
            .find(|&row| {
                requested.iter().all(|(channel, raw)| {
                    raw[row]
                        .as_number()
                        .map(|v| channel.settings.in_range(channel.settings.scale(v)))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(total),
    };
    let channels = requested
        .into_iter()
        .map(|(channel, raw)| {
            let mut filter = ChannelFilter::new(&channel.settings);
            let mut unfiltered = 0;
            let values: Vec<Value> = raw[trimmed..]
                .iter()
                .map(|value| {
                    if value.as_number().is_none() {
                        unfiltered += 1;
                    }
                    filter.process_sample(value)
                })
                .collect();
            if unfiltered > 0 {
                warn!(
                    "{}: {unfiltered} non-numeric value(s) left unfiltered",
                    channel.name
                );
            }
            SanitizedChannel {
                name: channel.name.clone(),
                values,
                unfiltered,
            }
        })
        .collect();
    Ok(Sanitized {
        channels,
        len: total - trimmed,
        trimmed,
    })
}
