// src/worker.rs
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use log::error;
use crate::frame::snapshot::write_snapshot;
use crate::frame::Table;
/// Handle to a snapshot write running on its own thread.
///
/// The thread sends exactly one message: `true` once the snapshot is in
/// place, `false` if the write failed (the error is logged there).
pub struct SnapshotJob {
    path: PathBuf,
    rx_done: Receiver<bool>,
    outcome: Option<bool>,
}
impl SnapshotJob {
    pub fn path(&self) -> &Path {
        &self.path
    }
    /// Non-blocking poll. `None` while the write is still running.
    pub fn try_finished(&mut self) -> Option<bool> {
        if self.outcome.is_none() {
            match self.rx_done.try_recv() {
                Ok(ok) => self.outcome = Some(ok),
                Err(TryRecvError::Empty) => {}
                // 线程异常退出，没有发送结果
                Err(TryRecvError::Disconnected) => self.outcome = Some(false),
            }
        }
        self.outcome
    }
    /// Blocks until the write has finished.
    pub fn wait(mut self) -> bool {
        if let Some(ok) = self.outcome {
            return ok;
        }
        let ok = self.rx_done.recv().unwrap_or(false);
        self.outcome = Some(ok);
        ok
    }
}
/// Writes `table` to `path` without blocking the caller.
pub fn spawn_snapshot_write(table: Arc<Table>, path: PathBuf) -> SnapshotJob {
    let (tx_done, rx_done) = mpsc::channel();
    let target = path.clone();
    thread::spawn(move || {
        let ok = match write_snapshot(&table, &target) {
            Ok(()) => true,
            Err(e) => {
                error!("{e}");
                false
            }
        };
        tx_done.send(ok).ok();
    });
    SnapshotJob {
        path,
        rx_done,
        outcome: None,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ChannelSettings, HeaderVersion, Value};
    fn table() -> Arc<Table> {
        let mut table = Table::new(HeaderVersion::Basic, "");
        table.push_channel("Time", ChannelSettings::default());
        table.push_row(vec![Value::Number(0.0)]);
        Arc::new(table)
    }
    #[test]
    fn reports_success_once_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MONOLITH.CSV");
        let job = spawn_snapshot_write(table(), path.clone());
        assert_eq!(job.path(), path.as_path());
        assert!(job.wait());
        assert!(path.is_file());
    }
    #[test]
    fn reports_failure_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("MONOLITH.CSV");
        let mut job = spawn_snapshot_write(table(), path.clone());
        let outcome = loop {
            if let Some(ok) = job.try_finished() {
                break ok;
            }
            thread::yield_now();
        };
        assert!(!outcome);
        // the result stays available after it has been observed
        assert_eq!(job.try_finished(), Some(false));
        assert!(!path.exists());
    }
}
