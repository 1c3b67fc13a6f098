use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use crate::config::IngestSettings;
use crate::frame::FrameError;
/// The three logging cadences of the acquisition unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateTier {
    Fine,
    Medium,
    Coarse,
}
impl RateTier {
    pub fn file_name(self, settings: &IngestSettings) -> &str {
        match self {
            RateTier::Fine => &settings.fine_file,
            RateTier::Medium => &settings.medium_file,
            RateTier::Coarse => &settings.coarse_file,
        }
    }
}
/// Paths of the three per-rate log files inside one log directory.
#[derive(Clone, Debug)]
pub struct LogSet {
    pub fine: PathBuf,
    pub medium: PathBuf,
    pub coarse: PathBuf,
}
impl LogSet {
    pub fn in_dir(dir: &Path, settings: &IngestSettings) -> Self {
        Self {
            fine: dir.join(RateTier::Fine.file_name(settings)),
            medium: dir.join(RateTier::Medium.file_name(settings)),
            coarse: dir.join(RateTier::Coarse.file_name(settings)),
        }
    }
    pub fn path(&self, tier: RateTier) -> &Path {
        match tier {
            RateTier::Fine => &self.fine,
            RateTier::Medium => &self.medium,
            RateTier::Coarse => &self.coarse,
        }
    }
    /// Fails with every missing file listed, not just the first.
    pub fn ensure_present(&self) -> Result<(), FrameError> {
        let missing: Vec<PathBuf> = [RateTier::Fine, RateTier::Medium, RateTier::Coarse]
            .into_iter()
            .map(|tier| self.path(tier))
            .filter(|path| !path.is_file())
            .map(Path::to_path_buf)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FrameError::MissingInputFile { missing })
        }
    }
}
/// One comma-separated line of a log file.
#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    /// 1-based line number in the source file.
    pub number: usize,
    pub tokens: Vec<String>,
}
impl LogLine {
    pub fn first_token(&self) -> &str {
        self.tokens.first().map(|t| t.trim()).unwrap_or("")
    }
}
/// Line reader over a log file. Lines may have any number of tokens.
pub struct LogReader<R: Read = File> {
    path: PathBuf,
    records: csv::ByteRecordsIntoIter<R>,
}
impl LogReader<File> {
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let file = File::open(path).map_err(|e| FrameError::io(path, e))?;
        Ok(Self::from_reader(path, file))
    }
}
impl<R: Read> LogReader<R> {
    /// `path` is only used to label diagnostics.
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_byte_records();
        Self {
            path: path.into(),
            records,
        }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn next_line(&mut self) -> Result<Option<LogLine>, FrameError> {
        let Some(record) = self.records.next() else {
            return Ok(None);
        };
        let record = record.map_err(|e| FrameError::csv(&self.path, e))?;
        let number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        let tokens = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        Ok(Some(LogLine { number, tokens }))
    }
    /// Discards up to `count` lines.
    pub fn skip_lines(&mut self, count: usize) -> Result<(), FrameError> {
        for _ in 0..count {
            if self.next_line()?.is_none() {
                break;
            }
        }
        Ok(())
    }
}
