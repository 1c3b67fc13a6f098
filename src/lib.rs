//! Merges multi-rate vehicle telemetry logs into one time-aligned table and
//! cleans channel values for display.
pub mod config;
pub mod frame;
pub mod worker;
pub use config::{GlobalChannelConfig, IngestSettings};
pub use frame::{FrameError, Session, Table};
