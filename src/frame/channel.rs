use serde::{Deserialize, Serialize};
/// Magnitude used for "no bound configured" on ranges and step limits.
pub const UNBOUNDED: f64 = 18_446_744_073_709_551_615.0;
/// Anything at or beyond this magnitude counts as an unconfigured bound.
const UNBOUNDED_THRESHOLD: f64 = 17_000_000_000_000_000_000.0;
/// Unit string of a channel that has never been configured.
pub const UNKNOWN_UNIT: &str = "unknown";
pub fn is_unbounded(value: f64) -> bool {
    value.abs() >= UNBOUNDED_THRESHOLD
}
/// Editable metadata of one channel. Everything except the name and the
/// column position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub unit: String,
    /// Multiplier from raw value to display units.
    pub conv: f64,
    /// Fixed-point divisor; raw integers scaled by 10 use `10.0`.
    pub precision: f64,
    /// Inclusive bounds in display units.
    pub range_low: f64,
    pub range_high: f64,
    /// Largest allowed change between consecutive display values.
    pub max_step: f64,
    /// Replacement for an out-of-range first sample.
    pub start_pos: f64,
}
impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            unit: UNKNOWN_UNIT.to_owned(),
            conv: 1.0,
            precision: 1.0,
            range_low: -UNBOUNDED,
            range_high: UNBOUNDED,
            max_step: UNBOUNDED,
            start_pos: 0.0,
        }
    }
}
impl ChannelSettings {
    /// True when nothing has been configured yet. Bounds only need to be
    /// beyond the sentinel threshold, since they may have round-tripped
    /// through text.
    pub fn is_factory_default(&self) -> bool {
        self.unit == UNKNOWN_UNIT
            && self.conv == 1.0
            && self.precision == 1.0
            && self.range_low < 0.0
            && is_unbounded(self.range_low)
            && self.range_high > 0.0
            && is_unbounded(self.range_high)
            && self.max_step > 0.0
            && is_unbounded(self.max_step)
            && self.start_pos == 0.0
    }
    /// Raw value to display units.
    pub fn scale(&self, raw: f64) -> f64 {
        raw * (self.conv / self.precision)
    }
    pub fn in_range(&self, value: f64) -> bool {
        value >= self.range_low && value <= self.range_high
    }
}
/// One named data column of a table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Channel {
    pub name: String,
    /// Position of this channel's value inside each row.
    pub index: usize,
    #[serde(flatten)]
    pub settings: ChannelSettings,
}
impl Channel {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            settings: ChannelSettings::default(),
        }
    }
    pub fn with_settings(name: impl Into<String>, index: usize, settings: ChannelSettings) -> Self {
        Self {
            name: name.into(),
            index,
            settings,
        }
    }
    /// Label for a plot axis: `"name (unit)"`, or just the name when the
    /// unit was never configured.
    pub fn axis_label(&self) -> String {
        if self.settings.unit == UNKNOWN_UNIT {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.settings.unit)
        }
    }
}
