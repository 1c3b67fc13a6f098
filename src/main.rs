// src/main.rs
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use racelog::frame::{ChannelReport, Diagnostics, HeaderVersion, RangeMode, Session};
use racelog::IngestSettings;
/// Merge multi-rate telemetry logs and summarize sanitized channels.
#[derive(Parser, Debug)]
#[command(name = "racelog", version, about, long_about = None)]
struct Args {
    /// Log directory (three rate logs or a snapshot) or a single CSV log
    #[arg(value_name = "PATH")]
    path: PathBuf,
    /// Ingest settings as JSON
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Global channel configuration CSV (overrides the settings file)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Channels to sanitize and summarize; all channels when omitted
    #[arg(short, long, value_delimiter = ',')]
    channels: Vec<String>,
    /// Drop leading rows until every requested channel is in range
    #[arg(long)]
    remove_out_of_range: bool,
    /// Swap the column positions of two channels before reporting
    #[arg(long, num_args = 2, value_names = ["A", "B"])]
    swap: Option<Vec<String>>,
    /// Write a snapshot next to the source logs
    #[arg(long)]
    save: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}
#[derive(Serialize)]
struct Report<'a> {
    source: &'a Path,
    header_version: HeaderVersion,
    rows: usize,
    trimmed: usize,
    channels: Vec<ChannelReport>,
    anomalies: Vec<String>,
}
fn main() -> Result<()> {
    let args = Args::parse();
    // 初始化日志
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else {
        env_logger::init();
    }
    let mut settings = match &args.settings {
        Some(path) => IngestSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => IngestSettings::default(),
    };
    if let Some(config) = &args.config {
        settings.channel_config = Some(config.clone());
    }
    // 读取与合并
    let (mut session, diagnostics) = Session::open(&args.path, settings)
        .with_context(|| format!("ingesting {}", args.path.display()))?;
    if !diagnostics.is_empty() {
        warn!("{} recoverable anomalies during ingest", diagnostics.len());
    }
    if let Some(pair) = &args.swap {
        if let [first, second] = pair.as_slice() {
            session.swap_channels(first, second)?;
            info!("swapped {first} and {second}");
        }
    }
    // 快照在后台写入，报告生成不必等待
    let job = args.save.then(|| session.save_snapshot());
    let names: Vec<&str> = if args.channels.is_empty() {
        session
            .table()
            .channels_by_index()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect()
    } else {
        args.channels.iter().map(String::as_str).collect()
    };
    let mode = if args.remove_out_of_range {
        RangeMode::Remove
    } else {
        RangeMode::Hold
    };
    let report = build_report(&session, &diagnostics, &names, mode)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    if let Some(job) = job {
        let path = job.path().to_path_buf();
        if !job.wait() {
            bail!("snapshot write to {} failed", path.display());
        }
        info!("snapshot saved to {}", path.display());
    }
    Ok(())
}
fn build_report<'a>(
    session: &'a Session,
    diagnostics: &Diagnostics,
    names: &[&str],
    mode: RangeMode,
) -> Result<Report<'a>> {
    let sanitized = session.sanitized(names, mode)?;
    Ok(Report {
        source: session.table().source_path(),
        header_version: session.table().header_version(),
        rows: sanitized.len,
        trimmed: sanitized.trimmed,
        channels: session.reports(names, mode)?,
        anomalies: diagnostics
            .anomalies()
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}
fn print_text(report: &Report) {
    println!(
        "{} ({:?}): {} rows, {} trimmed, {} anomalies",
        report.source.display(),
        report.header_version,
        report.rows,
        report.trimmed,
        report.anomalies.len()
    );
    for channel in &report.channels {
        let stats = match &channel.summary {
            Some(s) => format!(
                "min {:.3}  max {:.3}  mean {:.3}  std {:.3}",
                s.min, s.max, s.mean, s.std_dev
            ),
            None => "no numeric samples".to_owned(),
        };
        println!("[{:>3}] {:<32} {stats}", channel.index, channel.axis_label);
        if channel.unfiltered > 0 {
            println!("      {} non-numeric value(s) left unfiltered", channel.unfiltered);
        }
    }
    if !report.anomalies.is_empty() {
        println!("anomalies:");
        for anomaly in &report.anomalies {
            println!("  {anomaly}");
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    #[test]
    fn report_lists_each_anomaly() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.csv");
        fs::write(&log, "Time,RPM\n0,1000\n1,oops\n2,1200\n").unwrap();
        let settings = IngestSettings {
            channel_config: None,
            ..IngestSettings::default()
        };
        let (session, diagnostics) = Session::open(&log, settings).unwrap();
        let report = build_report(&session, &diagnostics, &["RPM"], RangeMode::Hold).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert!(report.anomalies[0].contains("oops"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["anomalies"].as_array().unwrap().len(), 1);
        assert_eq!(json["rows"], 3);
    }
}
