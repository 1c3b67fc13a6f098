//! Flat-file snapshot of a merged table.
//!
//! Layout: eight metadata lines (names, units, conv, precision, range_low,
//! range_high, max_step, start_pos), one token per channel in column order,
//! followed by one line per row. Absent cells are written as `None`; text
//! cells that would read back as `None` or as an escape get a leading `\`.
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use log::{debug, info};
use tempfile::NamedTempFile;
use crate::frame::channel::{Channel, ChannelSettings};
use crate::frame::diagnostics::{Anomaly, Diagnostics};
use crate::frame::table::{HeaderVersion, Row, Table, Value};
use crate::frame::FrameError;
/// Token for an absent cell.
pub const ABSENT_TOKEN: &str = "None";
const TEXT_ESCAPE: char = '\\';
const METADATA_LINES: usize = 8;
/// Writes `table` to `path`. The file only appears once it is complete; on
/// any failure the previous contents of `path` (if any) are left alone.
pub fn write_snapshot(table: &Table, path: &Path) -> Result<(), FrameError> {
    let fail = |reason: String| FrameError::SnapshotWrite {
        path: path.to_path_buf(),
        reason,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
    {
        let mut writer = csv::Writer::from_writer(BufWriter::new(staged.as_file_mut()));
        write_records(table, &mut writer).map_err(|e| fail(e.to_string()))?;
        let mut inner = writer.into_inner().map_err(|e| fail(e.to_string()))?;
        inner.flush().map_err(|e| fail(e.to_string()))?;
    }
    staged
        .as_file()
        .sync_all()
        .map_err(|e| fail(e.to_string()))?;
    staged
        .persist(path)
        .map_err(|e| fail(e.error.to_string()))?;
    info!(
        "wrote snapshot {} ({} rows x {} channels)",
        path.display(),
        table.len(),
        table.width()
    );
    Ok(())
}
fn write_records<W: Write>(table: &Table, writer: &mut csv::Writer<W>) -> csv::Result<()> {
    let channels = table.channels_by_index();
    let field = |f: fn(&Channel) -> String| channels.iter().map(|&c| f(c)).collect::<Vec<_>>();
    writer.write_record(field(|c| c.name.clone()))?;
    writer.write_record(field(|c| c.settings.unit.clone()))?;
    writer.write_record(field(|c| c.settings.conv.to_string()))?;
    writer.write_record(field(|c| c.settings.precision.to_string()))?;
    writer.write_record(field(|c| c.settings.range_low.to_string()))?;
    writer.write_record(field(|c| c.settings.range_high.to_string()))?;
    writer.write_record(field(|c| c.settings.max_step.to_string()))?;
    writer.write_record(field(|c| c.settings.start_pos.to_string()))?;
    for row in table.rows() {
        writer.write_record(row.iter().map(snapshot_token))?;
    }
    Ok(())
}
fn snapshot_token(value: &Value) -> String {
    match value {
        Value::Absent => ABSENT_TOKEN.to_owned(),
        Value::Text(text) if text == ABSENT_TOKEN || text.starts_with(TEXT_ESCAPE) => {
            format!("{TEXT_ESCAPE}{text}")
        }
        other => other.to_string(),
    }
}
pub fn read_snapshot(path: &Path, diagnostics: &mut Diagnostics) -> Result<Table, FrameError> {
    let file = File::open(path).map_err(|e| FrameError::io(path, e))?;
    read_snapshot_from(path, file, diagnostics)
}
/// Reads a snapshot. Channels with unparseable metadata get factory
/// defaults; rows with absent cells or the wrong width are dropped.
pub fn read_snapshot_from<R: Read>(
    path: &Path,
    reader: R,
    diagnostics: &mut Diagnostics,
) -> Result<Table, FrameError> {
    let mut records = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .into_byte_records();
    let mut metadata: Vec<Vec<String>> = Vec::with_capacity(METADATA_LINES);
    for _ in 0..METADATA_LINES {
        match records.next() {
            Some(record) => {
                let record = record.map_err(|e| FrameError::csv(path, e))?;
                metadata.push(
                    record
                        .iter()
                        .map(|field| String::from_utf8_lossy(field).into_owned())
                        .collect(),
                );
            }
            None => break,
        }
    }
    let Some(names) = metadata.first() else {
        return Err(FrameError::UndeterminedHeaderFormat {
            path: path.to_path_buf(),
        });
    };
    let source_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut table = Table::new(HeaderVersion::Extended, source_dir);
    for (position, name) in names.iter().enumerate() {
        let settings = parse_settings(&metadata, position).unwrap_or_else(|| {
            diagnostics.record(Anomaly::SnapshotChannelReset {
                channel: name.clone(),
            });
            ChannelSettings::default()
        });
        table.push_channel(name, settings);
    }
    let width = table.width();
    for record in records {
        let record = record.map_err(|e| FrameError::csv(path, e))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        let row: Option<Row> = record
            .iter()
            .map(|field| std::str::from_utf8(field).ok().map(parse_token))
            .collect();
        match row {
            Some(row) if row.len() == width && !row.iter().any(Value::is_absent) => {
                table.push_row(row)
            }
            _ => diagnostics.record(Anomaly::SnapshotRowDropped { line }),
        }
    }
    debug!(
        "read snapshot {}: {} rows x {width} channels",
        path.display(),
        table.len()
    );
    Ok(table)
}
fn parse_settings(metadata: &[Vec<String>], position: usize) -> Option<ChannelSettings> {
    let number = |line: usize| -> Option<f64> {
        metadata.get(line)?.get(position)?.trim().parse().ok()
    };
    Some(ChannelSettings {
        unit: metadata.get(1)?.get(position)?.clone(),
        conv: number(2)?,
        precision: number(3)?,
        range_low: number(4)?,
        range_high: number(5)?,
        max_step: number(6)?,
        start_pos: number(7)?,
    })
}
fn parse_token(token: &str) -> Value {
    if token == ABSENT_TOKEN {
        Value::Absent
    } else if let Some(text) = token.strip_prefix(TEXT_ESCAPE) {
        Value::Text(text.to_owned())
    } else {
        Value::from_token(token)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sample_table() -> Table {
        let mut table = Table::new(HeaderVersion::Extended, "");
        table.push_channel("Time", ChannelSettings::default());
        table.push_channel(
            "Oil, Pressure",
            ChannelSettings {
                unit: "psi".into(),
                conv: 0.145,
                precision: 10.0,
                range_low: 0.0,
                range_high: 150.0,
                max_step: 20.0,
                start_pos: 40.0,
            },
        );
        table.push_channel("Gear", ChannelSettings::default());
        table.push_row(vec![
            Value::Number(0.0),
            Value::Number(412.0),
            Value::Text("N".into()),
        ]);
        table.push_row(vec![
            Value::Number(0.01),
            Value::Number(-3.25e-7),
            Value::Number(1.0),
        ]);
        table
    }
    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MONOLITH.CSV");
        let table = sample_table();
        write_snapshot(&table, &path).unwrap();
        let mut diagnostics = Diagnostics::new();
        let loaded = read_snapshot(&path, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(loaded.channels(), table.channels());
        assert_eq!(loaded.rows(), table.rows());
        assert_eq!(loaded.source_path(), dir.path());
    }
    #[test]
    fn swapped_channels_are_written_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MONOLITH.CSV");
        let mut table = sample_table();
        table.swap_channels("Oil, Pressure", "Gear").unwrap();
        write_snapshot(&table, &path).unwrap();
        let loaded = read_snapshot(&path, &mut Diagnostics::new()).unwrap();
        assert_eq!(loaded.column("Gear").unwrap(), table.column("Gear").unwrap());
        assert_eq!(loaded.channel("Gear").unwrap().index, 1);
        assert_eq!(loaded.channel("Oil, Pressure").unwrap().settings.unit, "psi");
    }
    #[test]
    fn bad_metadata_resets_channel_and_absent_rows_drop() {
        let data = "\
Time,RPM,TPS
s,rpm,%
1,1,x
1,1,1
0,0,0
10,9000,100
5,500,5
0,0,0
0,1000,10
0.01,None,11
0.02,1010,12
";
        let mut diagnostics = Diagnostics::new();
        let table =
            read_snapshot_from(Path::new("dir/MONOLITH.CSV"), data.as_bytes(), &mut diagnostics)
                .unwrap();
        assert_eq!(table.channel("RPM").unwrap().settings.range_high, 9000.0);
        assert!(table.channel("TPS").unwrap().settings.is_factory_default());
        assert_eq!(table.len(), 2);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.count_where(|a| matches!(a, Anomaly::SnapshotRowDropped { line: 10 })),
            1
        );
    }
    #[test]
    fn text_that_looks_like_absent_survives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MONOLITH.CSV");
        let mut table = Table::new(HeaderVersion::Extended, "");
        table.push_channel("Time", ChannelSettings::default());
        table.push_channel("Mode", ChannelSettings::default());
        table.push_row(vec![Value::Number(0.0), Value::Text("None".into())]);
        table.push_row(vec![Value::Number(1.0), Value::Text("\\None".into())]);
        table.push_row(vec![Value::Number(2.0), Value::Text("run".into())]);
        write_snapshot(&table, &path).unwrap();
        let mut diagnostics = Diagnostics::new();
        let loaded = read_snapshot(&path, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(loaded.rows(), table.rows());
    }
    #[test]
    fn invalid_utf8_row_is_dropped() {
        let mut data = b"Time,RPM\ns,rpm\n1,1\n1,1\n0,0\n10,9000\n5,500\n0,0\n".to_vec();
        data.extend_from_slice(b"0.01,\xff\n0.02,1010\n");
        let mut diagnostics = Diagnostics::new();
        let table =
            read_snapshot_from(Path::new("MONOLITH.CSV"), data.as_slice(), &mut diagnostics)
                .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.time_at(0), Some(0.02));
        assert_eq!(
            diagnostics.count_where(|a| matches!(a, Anomaly::SnapshotRowDropped { line: 9 })),
            1
        );
    }
    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("MONOLITH.CSV");
        let err = write_snapshot(&sample_table(), &path).unwrap_err();
        assert!(matches!(err, FrameError::SnapshotWrite { .. }));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
    #[test]
    fn ragged_table_fails_without_replacing_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MONOLITH.CSV");
        std::fs::write(&path, "previous").unwrap();
        let mut table = sample_table();
        table.push_row(vec![Value::Number(1.0)]);
        assert!(write_snapshot(&table, &path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
