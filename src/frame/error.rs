use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("missing input file(s): {}", display_paths(.missing))]
    MissingInputFile { missing: Vec<PathBuf> },
    #[error("could not determine header format of {}", .path.display())]
    UndeterminedHeaderFormat { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write snapshot {}: {reason}", .path.display())]
    SnapshotWrite { path: PathBuf, reason: String },
    #[error("cannot swap channel {0:?} with itself")]
    SwapSameChannel(String),
    #[error("unknown channel {0:?}")]
    UnknownChannel(String),
    #[error("channel index {index} is assigned more than once")]
    DuplicateIndex { index: usize },
    #[error("invalid configuration in {}: {reason}", .path.display())]
    InvalidConfig { path: PathBuf, reason: String },
}
impl FrameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FrameError::Io {
            path: path.into(),
            source,
        }
    }
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        FrameError::Csv {
            path: path.into(),
            source,
        }
    }
    /// Whether the error stops an ingest outright.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FrameError::MissingInputFile { .. }
                | FrameError::UndeterminedHeaderFormat { .. }
                | FrameError::Io { .. }
                | FrameError::Csv { .. }
        )
    }
}
fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
