use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::frame::channel::{Channel, ChannelSettings};
use crate::frame::FrameError;
/// One cell of the merged table.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    /// A token that did not parse as a number. Kept verbatim.
    Text(String),
    /// No sample at this row for a slower-rate column.
    Absent,
}
impl Value {
    /// Parses a raw log token; anything non-numeric is kept as text.
    pub fn from_token(token: &str) -> Self {
        let trimmed = token.trim();
        match trimmed.parse::<f64>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(trimmed.to_owned()),
        }
    }
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Absent => Ok(()),
        }
    }
}
pub type Row = Vec<Value>;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HeaderVersion {
    /// One line of channel names.
    Basic,
    /// Names, units, conversion factors and precision divisors.
    Extended,
}
/// The merged, rectangular telemetry table.
///
/// Channels are kept in insertion order and looked up by name through a
/// single map, so `name -> Channel -> index` cannot drift apart.
#[derive(Clone, Debug)]
pub struct Table {
    header_version: HeaderVersion,
    channels: Vec<Channel>,
    by_name: HashMap<String, usize>,
    rows: Vec<Row>,
    restarts: Vec<f64>,
    fill_channels: Vec<String>,
    source_path: PathBuf,
}
impl Table {
    pub fn new(header_version: HeaderVersion, source_path: impl Into<PathBuf>) -> Self {
        Self {
            header_version,
            channels: Vec::new(),
            by_name: HashMap::new(),
            rows: Vec::new(),
            restarts: vec![0.0],
            fill_channels: Vec::new(),
            source_path: source_path.into(),
        }
    }
    pub fn header_version(&self) -> HeaderVersion {
        self.header_version
    }
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
    /// Channels in the order they were first seen.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
    /// Channels ordered by their column position.
    pub fn channels_by_index(&self) -> Vec<&Channel> {
        let mut ordered: Vec<&Channel> = self.channels.iter().collect();
        ordered.sort_by_key(|c| c.index);
        ordered
    }
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.by_name.get(name).map(|&slot| &self.channels[slot])
    }
    pub fn width(&self) -> usize {
        self.channels.len()
    }
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    /// Cumulative time offsets, one per logger session. Always starts at 0.
    pub fn restarts(&self) -> &[f64] {
        &self.restarts
    }
    /// Channels contributed by slower files during the current merge.
    pub fn fill_channels(&self) -> &[String] {
        &self.fill_channels
    }
    /// Appends a channel at the next free index. Returns `None` if the name
    /// is already taken.
    pub fn push_channel(&mut self, name: &str, settings: ChannelSettings) -> Option<usize> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let index = self.channels.len();
        self.by_name.insert(name.to_owned(), self.channels.len());
        self.channels.push(Channel::with_settings(name, index, settings));
        Some(index)
    }
    /// Replaces all editable metadata of one channel.
    pub fn configure_channel(
        &mut self,
        name: &str,
        settings: ChannelSettings,
    ) -> Result<(), FrameError> {
        let slot = *self
            .by_name
            .get(name)
            .ok_or_else(|| FrameError::UnknownChannel(name.to_owned()))?;
        self.channels[slot].settings = settings;
        Ok(())
    }
    /// Exchanges the column positions of two channels. Either both indices
    /// change or neither does.
    pub fn swap_channels(&mut self, first: &str, second: &str) -> Result<(), FrameError> {
        if first == second {
            return Err(FrameError::SwapSameChannel(first.to_owned()));
        }
        let a = *self
            .by_name
            .get(first)
            .ok_or_else(|| FrameError::UnknownChannel(first.to_owned()))?;
        let b = *self
            .by_name
            .get(second)
            .ok_or_else(|| FrameError::UnknownChannel(second.to_owned()))?;
        let index_a = self.channels[a].index;
        self.channels[a].index = self.channels[b].index;
        self.channels[b].index = index_a;
        Ok(())
    }
    /// Checks that channel indices form a permutation of `0..width`.
    pub fn validate_indices(&self) -> Result<(), FrameError> {
        let mut seen = vec![false; self.channels.len()];
        for channel in &self.channels {
            match seen.get_mut(channel.index) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(FrameError::DuplicateIndex {
                        index: channel.index,
                    })
                }
            }
        }
        Ok(())
    }
    /// Raw values of one channel, read positionally through its index.
    pub fn column(&self, name: &str) -> Result<Vec<Value>, FrameError> {
        let channel = self
            .channel(name)
            .ok_or_else(|| FrameError::UnknownChannel(name.to_owned()))?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(channel.index).cloned().unwrap_or(Value::Absent))
            .collect())
    }
    /// Time of a row, taken from column 0.
    pub fn time_at(&self, row: usize) -> Option<f64> {
        self.rows.get(row)?.first()?.as_number()
    }
    pub fn is_time_monotonic(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| match (pair[0].first(), pair[1].first()) {
                (Some(Value::Number(a)), Some(Value::Number(b))) => a <= b,
                _ => false,
            })
    }
    pub(crate) fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }
    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }
    pub(crate) fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }
    pub(crate) fn record_restart(&mut self, offset: f64) {
        self.restarts.push(offset);
    }
    pub(crate) fn mark_fill(&mut self, name: &str) {
        if !self.fill_channels.iter().any(|n| n == name) {
            self.fill_channels.push(name.to_owned());
        }
    }
    pub(crate) fn clear_fill(&mut self) {
        self.fill_channels.clear();
    }
    pub(crate) fn set_source_path(&mut self, path: impl Into<PathBuf>) {
        self.source_path = path.into();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn table_with(names: &[&str]) -> Table {
        let mut table = Table::new(HeaderVersion::Basic, "");
        for name in names {
            table.push_channel(name, ChannelSettings::default());
        }
        table
    }
    #[test]
    fn tokens_parse_to_numbers_or_text() {
        assert_eq!(Value::from_token(" 12.5"), Value::Number(12.5));
        assert_eq!(Value::from_token("abc"), Value::Text("abc".into()));
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Absent.to_string(), "");
    }
    #[test]
    fn push_channel_rejects_duplicates() {
        let mut table = table_with(&["Time", "RPM"]);
        assert_eq!(table.push_channel("RPM", ChannelSettings::default()), None);
        assert_eq!(table.push_channel("TPS", ChannelSettings::default()), Some(2));
        assert!(table.validate_indices().is_ok());
    }
    #[test]
    fn swap_exchanges_indices_and_columns() {
        let mut table = table_with(&["Time", "A", "B"]);
        table.push_row(vec![
            Value::Number(0.0),
            Value::Number(1.0),
            Value::Number(2.0),
        ]);
        table.swap_channels("A", "B").unwrap();
        assert_eq!(table.channel("A").unwrap().index, 2);
        assert_eq!(table.column("A").unwrap(), vec![Value::Number(2.0)]);
        assert!(table.validate_indices().is_ok());
        let order: Vec<&str> = table
            .channels_by_index()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(order, ["Time", "B", "A"]);
    }
    #[test]
    fn invalid_swaps_leave_table_untouched() {
        let mut table = table_with(&["Time", "A"]);
        assert!(matches!(
            table.swap_channels("A", "A"),
            Err(FrameError::SwapSameChannel(_))
        ));
        assert!(matches!(
            table.swap_channels("A", "missing"),
            Err(FrameError::UnknownChannel(_))
        ));
        assert_eq!(table.channel("A").unwrap().index, 1);
    }
    #[test]
    fn duplicate_index_is_reported() {
        let mut table = table_with(&["Time", "A", "B"]);
        table.channels_mut()[2].index = 1;
        assert!(matches!(
            table.validate_indices(),
            Err(FrameError::DuplicateIndex { index: 1 })
        ));
    }
    #[test]
    fn monotonic_check_reads_column_zero() {
        let mut table = table_with(&["Time"]);
        table.push_row(vec![Value::Number(0.0)]);
        table.push_row(vec![Value::Number(0.0)]);
        table.push_row(vec![Value::Number(1.0)]);
        assert!(table.is_time_monotonic());
        table.push_row(vec![Value::Number(0.5)]);
        assert!(!table.is_time_monotonic());
    }
}
