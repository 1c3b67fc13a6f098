use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use crate::frame::{ChannelSettings, FrameError, Table};
pub const DEFAULT_TIME_LABEL: &str = "Time";
/// File names and thresholds used while ingesting a log directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Highest-rate log; supplies the row cadence.
    pub fine_file: String,
    pub medium_file: String,
    pub coarse_file: String,
    /// Merged snapshot; its presence skips the three-file merge.
    pub snapshot_file: String,
    /// Header token of the time column. A data line starting with it marks
    /// a logger restart.
    pub time_label: String,
    /// A slower file that scans this many rows without finding a later
    /// fine-rate row is treated as having a corrupt tail.
    pub abandon_after_rows: usize,
    /// Global channel configuration, applied to unconfigured channels.
    pub channel_config: Option<PathBuf>,
}
impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            fine_file: "100HZLOG.CSV".to_owned(),
            medium_file: "10HZLOG.CSV".to_owned(),
            coarse_file: "1HZLOG.CSV".to_owned(),
            snapshot_file: "MONOLITH.CSV".to_owned(),
            time_label: DEFAULT_TIME_LABEL.to_owned(),
            abandon_after_rows: 100,
            channel_config: Some(PathBuf::from("CONFIG.CSV")),
        }
    }
}
impl IngestSettings {
    pub fn from_json_file(path: &Path) -> Result<Self, FrameError> {
        let text = std::fs::read_to_string(path).map_err(|e| FrameError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| FrameError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
    pub fn snapshot_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.snapshot_file)
    }
}
/// One row of the global channel configuration file, in file column order.
#[derive(Debug, Deserialize)]
struct ConfigRow {
    name: String,
    conv: f64,
    unit: String,
    precision: f64,
    range_low: f64,
    range_high: f64,
    max_step: f64,
    start_pos: f64,
}
impl ConfigRow {
    fn into_entry(self) -> (String, ChannelSettings) {
        (
            self.name,
            ChannelSettings {
                unit: self.unit,
                conv: self.conv,
                precision: self.precision,
                range_low: self.range_low,
                range_high: self.range_high,
                max_step: self.max_step,
                start_pos: self.start_pos,
            },
        )
    }
}
/// Default metadata for well-known channel names, shared by every log.
#[derive(Clone, Debug, Default)]
pub struct GlobalChannelConfig {
    entries: HashMap<String, ChannelSettings>,
}
impl GlobalChannelConfig {
    /// Loads the configuration file. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        match std::fs::File::open(path) {
            Ok(file) => Self::from_reader(path, file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no channel config at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(FrameError::io(path, e)),
        }
    }
    /// Like [`Self::load`], but a file that cannot be read only costs a
    /// warning and leaves every channel unconfigured.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("ignoring channel config: {e}");
            Self::default()
        })
    }
    /// Reads `name,conv,unit,precision,range_low,range_high,max_step,start_pos`
    /// rows after one header line. Unparseable rows are skipped.
    pub fn from_reader<R: Read>(path: &Path, reader: R) -> Result<Self, FrameError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = HashMap::new();
        for record in csv_reader.byte_records() {
            let record = record.map_err(|e| FrameError::csv(path, e))?;
            match record.deserialize::<ConfigRow>(None) {
                Ok(row) => {
                    let (name, settings) = row.into_entry();
                    entries.insert(name, settings);
                }
                Err(e) => warn!("{}: skipping channel config row: {e}", path.display()),
            }
        }
        Ok(Self { entries })
    }
    pub fn get(&self, name: &str) -> Option<&ChannelSettings> {
        self.entries.get(name)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Seeds channels whose metadata is still entirely at factory defaults.
    /// Returns how many channels were configured.
    pub fn apply(&self, table: &mut Table) -> usize {
        let mut applied = 0;
        for channel in table.channels_mut() {
            if !channel.settings.is_factory_default() {
                continue;
            }
            if let Some(settings) = self.entries.get(&channel.name) {
                channel.settings = settings.clone();
                applied += 1;
            }
        }
        if applied > 0 {
            info!("applied global config to {applied} channel(s)");
        }
        applied
    }
}
