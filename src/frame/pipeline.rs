use std::path::Path;
use std::sync::Arc;
use log::info;
use serde::Serialize;
use crate::config::{GlobalChannelConfig, IngestSettings};
use crate::frame::diagnostics::Diagnostics;
use crate::frame::fill::fill_gaps;
use crate::frame::filter::{sanitize, RangeMode, Sanitized};
use crate::frame::header::detect_header_version;
use crate::frame::merge::{merge_logs, read_fine_log};
use crate::frame::snapshot::read_snapshot;
use crate::frame::source::{LogReader, LogSet, RateTier};
use crate::frame::stats::{summarize, Summary};
use crate::frame::table::{HeaderVersion, Table};
use crate::frame::{ChannelSettings, FrameError};
use crate::worker::{spawn_snapshot_write, SnapshotJob};
/// A freshly ingested table and everything that went wrong along the way.
#[derive(Debug)]
pub struct Ingested {
    pub table: Table,
    pub diagnostics: Diagnostics,
}
/// Loads a table from `path`.
///
/// A directory is read from its snapshot when one exists, otherwise its three
/// rate logs are merged and gap-filled. A plain file is read as a single
/// Basic log. Unconfigured channels then pick up the global channel config.
pub fn ingest_path(path: &Path, settings: &IngestSettings) -> Result<Ingested, FrameError> {
    let mut diagnostics = Diagnostics::new();
    let mut table = if path.is_dir() {
        let snapshot = settings.snapshot_path(path);
        if snapshot.is_file() {
            info!("loading snapshot {}", snapshot.display());
            read_snapshot(&snapshot, &mut diagnostics)?
        } else {
            merge_dir(path, settings, &mut diagnostics)?
        }
    } else if path.is_file() {
        read_single_log(path, settings, &mut diagnostics)?
    } else {
        return Err(FrameError::MissingInputFile {
            missing: vec![path.to_path_buf()],
        });
    };
    if let Some(config_path) = &settings.channel_config {
        GlobalChannelConfig::load_or_default(config_path).apply(&mut table);
    }
    table.validate_indices()?;
    info!(
        "ingested {}: {:?} header, {} channels, {} rows, {} anomalies",
        path.display(),
        table.header_version(),
        table.width(),
        table.len(),
        diagnostics.len()
    );
    Ok(Ingested { table, diagnostics })
}
/// Merges and gap-fills the three rate logs of one directory.
pub fn merge_dir(
    dir: &Path,
    settings: &IngestSettings,
    diagnostics: &mut Diagnostics,
) -> Result<Table, FrameError> {
    let logs = LogSet::in_dir(dir, settings);
    logs.ensure_present()?;
    let mut probe = LogReader::open(logs.path(RateTier::Fine))?;
    let version = detect_header_version(&mut probe, &settings.time_label)?;
    let fine = LogReader::open(logs.path(RateTier::Fine))?;
    let slower = [
        LogReader::open(logs.path(RateTier::Medium))?,
        LogReader::open(logs.path(RateTier::Coarse))?,
    ];
    let mut table = merge_logs(version, fine, slower, settings, diagnostics)?;
    fill_gaps(&mut table);
    table.clear_fill();
    table.set_source_path(dir);
    Ok(table)
}
/// Reads one Basic log on its own, without merging or gap-fill.
pub fn read_single_log(
    path: &Path,
    settings: &IngestSettings,
    diagnostics: &mut Diagnostics,
) -> Result<Table, FrameError> {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut table = Table::new(HeaderVersion::Basic, parent);
    read_fine_log(&mut table, LogReader::open(path)?, settings, diagnostics)?;
    Ok(table)
}
/// Display-ready view of one channel.
#[derive(Clone, Debug, Serialize)]
pub struct ChannelReport {
    pub name: String,
    pub axis_label: String,
    pub index: usize,
    pub settings: ChannelSettings,
    pub summary: Option<Summary>,
    pub unfiltered: usize,
}
/// The single table a caller works on after ingest.
///
/// Reads are cheap to share; the table is handed to background snapshot
/// writes by reference count, and edits copy it only while such a write is
/// still holding the old version.
pub struct Session {
    table: Arc<Table>,
    settings: IngestSettings,
}
impl Session {
    pub fn open(path: &Path, settings: IngestSettings) -> Result<(Self, Diagnostics), FrameError> {
        let Ingested { table, diagnostics } = ingest_path(path, &settings)?;
        Ok((Self::new(table, settings), diagnostics))
    }
    pub fn new(table: Table, settings: IngestSettings) -> Self {
        Self {
            table: Arc::new(table),
            settings,
        }
    }
    pub fn table(&self) -> &Table {
        &self.table
    }
    pub fn sanitized(&self, names: &[&str], mode: RangeMode) -> Result<Sanitized, FrameError> {
        sanitize(&self.table, names, mode)
    }
    /// Sanitizes the requested channels together and summarizes each.
    pub fn reports(&self, names: &[&str], mode: RangeMode) -> Result<Vec<ChannelReport>, FrameError> {
        let sanitized = self.sanitized(names, mode)?;
        sanitized
            .channels
            .iter()
            .map(|cleaned| {
                let channel = self
                    .table
                    .channel(&cleaned.name)
                    .ok_or_else(|| FrameError::UnknownChannel(cleaned.name.clone()))?;
                Ok(ChannelReport {
                    name: channel.name.clone(),
                    axis_label: channel.axis_label(),
                    index: channel.index,
                    settings: channel.settings.clone(),
                    summary: summarize(&cleaned.numbers()),
                    unfiltered: cleaned.unfiltered,
                })
            })
            .collect()
    }
    pub fn swap_channels(&mut self, first: &str, second: &str) -> Result<(), FrameError> {
        Arc::make_mut(&mut self.table).swap_channels(first, second)
    }
    pub fn configure_channel(
        &mut self,
        name: &str,
        settings: ChannelSettings,
    ) -> Result<(), FrameError> {
        Arc::make_mut(&mut self.table).configure_channel(name, settings)
    }
    /// Starts writing the snapshot next to the source logs.
    pub fn save_snapshot(&self) -> SnapshotJob {
        let path = self.settings.snapshot_path(self.table.source_path());
        spawn_snapshot_write(Arc::clone(&self.table), path)
    }
}
