//! Recoverable problems found while ingesting or reloading a table.
//!
//! None of these stop an ingest. Each one is logged at `warn` the moment it
//! is recorded and kept so callers can show a summary afterwards.
use std::fmt;
use std::path::PathBuf;
use log::warn;
#[derive(Clone, Debug, PartialEq)]
pub enum Anomaly {
    /// A data token that is not a number. It stays in the table as text.
    MalformedToken {
        file: PathBuf,
        line: usize,
        column: usize,
        token: String,
    },
    /// A data line whose time token is not a number; the line is dropped.
    MalformedTime {
        file: PathBuf,
        line: usize,
        token: String,
    },
    /// A data line with more tokens than its header; the line is dropped.
    OverwideLine {
        file: PathBuf,
        line: usize,
        width: usize,
        expected: usize,
    },
    /// A slower file ran past the end of the fine-rate table.
    MergeTailCorruption {
        file: PathBuf,
        line: usize,
        scanned_rows: usize,
    },
    /// A slower file restarted more often than the fine-rate file.
    RestartOffsetMissing { file: PathBuf, line: usize },
    /// Snapshot metadata for a channel did not parse; factory defaults used.
    SnapshotChannelReset { channel: String },
    /// A snapshot data row contained an absent value and was skipped.
    SnapshotRowDropped { line: usize },
    /// A fine-rate line whose time runs backwards without a restart marker.
    NonMonotonicTime {
        file: PathBuf,
        line: usize,
        time: f64,
        previous: f64,
    },
}
impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::MalformedToken {
                file,
                line,
                column,
                token,
            } => write!(
                f,
                "{}:{line}: column {column} holds non-numeric token {token:?}",
                file.display()
            ),
            Anomaly::MalformedTime { file, line, token } => write!(
                f,
                "{}:{line}: time token {token:?} is not a number, line skipped",
                file.display()
            ),
            Anomaly::OverwideLine {
                file,
                line,
                width,
                expected,
            } => write!(
                f,
                "{}:{line}: {width} tokens but header has {expected}, line skipped",
                file.display()
            ),
            Anomaly::MergeTailCorruption {
                file,
                line,
                scanned_rows,
            } => write!(
                f,
                "{}:{line}: no later fine-rate row after scanning {scanned_rows} rows, rest of file ignored",
                file.display()
            ),
            Anomaly::RestartOffsetMissing { file, line } => write!(
                f,
                "{}:{line}: restart has no matching fine-rate restart, reusing last offset",
                file.display()
            ),
            Anomaly::SnapshotChannelReset { channel } => {
                write!(f, "snapshot metadata for {channel:?} is malformed, using defaults")
            }
            Anomaly::SnapshotRowDropped { line } => {
                write!(f, "snapshot line {line} has absent values, row dropped")
            }
            Anomaly::NonMonotonicTime {
                file,
                line,
                time,
                previous,
            } => write!(
                f,
                "{}:{line}: time {time} precedes previous row time {previous}, line skipped",
                file.display()
            ),
        }
    }
}
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    anomalies: Vec<Anomaly>,
}
impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn record(&mut self, anomaly: Anomaly) {
        warn!("{anomaly}");
        self.anomalies.push(anomaly);
    }
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }
    pub fn len(&self) -> usize {
        self.anomalies.len()
    }
    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }
    pub fn count_where(&self, pred: impl Fn(&Anomaly) -> bool) -> usize {
        self.anomalies.iter().filter(|a| pred(a)).count()
    }
}
