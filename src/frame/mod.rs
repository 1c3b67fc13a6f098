// src/frame/mod.rs
// 遥测数据表：读取、合并、补齐、快照与显示前的清洗
pub mod channel;
pub mod diagnostics;
pub mod error;
pub mod fill;
pub mod filter;
pub mod header;
pub mod merge;
pub mod pipeline;
pub mod snapshot;
pub mod source;
pub mod stats;
pub mod table;
// 公开导出常用类型，方便外部调用
pub use channel::{Channel, ChannelSettings, UNBOUNDED, UNKNOWN_UNIT};
pub use diagnostics::{Anomaly, Diagnostics};
pub use error::FrameError;
pub use fill::fill_gaps;
pub use filter::{sanitize, ChannelFilter, RangeMode, Sanitized, SanitizedChannel};
pub use header::detect_header_version;
pub use merge::merge_logs;
pub use pipeline::{ingest_path, ChannelReport, Ingested, Session};
pub use snapshot::{read_snapshot, write_snapshot};
pub use source::{LogReader, LogSet, RateTier};
pub use stats::{summarize, Summary};
pub use table::{HeaderVersion, Row, Table, Value};
