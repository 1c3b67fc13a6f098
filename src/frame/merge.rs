//! Multi-rate merge: folds the medium- and coarse-rate logs into the rows of
//! the fine-rate log.
//!
//! The fine-rate file decides the row cadence. Each slower sample is attached
//! to the first fine-rate row whose time is strictly later; fine-rate rows it
//! skips over get [`Value::Absent`] in the slower columns, to be filled by
//! [`crate::frame::fill`]. Logger restarts repeat the header in the middle of
//! a file; every session after the first is shifted by the time of the last
//! row of the previous one so the merged time column never goes backwards.
//!
//! A repeated header seen before a file's first sample never counts as a
//! restart, in the fine log or in the slower ones. A slower log whose first
//! session is empty therefore maps its first samples onto the first fine-rate
//! session.
use std::cmp::Ordering;
use std::io::Read;
use log::{debug, info};
use crate::config::IngestSettings;
use crate::frame::diagnostics::{Anomaly, Diagnostics};
use crate::frame::header::{read_header, HeaderColumn, EXTENDED_METADATA_LINES};
use crate::frame::source::{LogLine, LogReader};
use crate::frame::table::{HeaderVersion, Row, Table, Value};
use crate::frame::FrameError;
/// Which incoming columns survive into the table, by position in the file.
struct ColumnPlan {
    width: usize,
    keep: Vec<usize>,
}
enum Placement {
    /// Values landed on a row; scanning resumes at the contained position.
    Placed(usize),
    /// Ran off the end of the table after scanning this many rows.
    Exhausted(usize),
}
/// Merges one fine-rate log with its slower companions, medium first.
///
/// The last row is always dropped: its slower-rate columns cannot be known
/// until a later sample arrives, which never does.
pub fn merge_logs<R: Read>(
    version: HeaderVersion,
    fine: LogReader<R>,
    slower: impl IntoIterator<Item = LogReader<R>>,
    settings: &IngestSettings,
    diagnostics: &mut Diagnostics,
) -> Result<Table, FrameError> {
    let mut table = Table::new(version, "");
    read_fine_log(&mut table, fine, settings, diagnostics)?;
    for reader in slower {
        append_slower_log(&mut table, reader, settings, diagnostics)?;
    }
    let width = table.width();
    for row in table.rows_mut() {
        if row.len() < width {
            row.resize(width, Value::Absent);
        }
    }
    table.rows_mut().pop();
    info!(
        "merged {} rows x {} channels ({} restart(s))",
        table.len(),
        table.width(),
        table.restarts().len() - 1
    );
    Ok(table)
}
/// Seeds `table` with the channels and rows of the row-cadence log.
///
/// Also used on its own for single-file ingest.
pub fn read_fine_log<R: Read>(
    table: &mut Table,
    mut reader: LogReader<R>,
    settings: &IngestSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(), FrameError> {
    let version = table.header_version();
    let header = read_header(&mut reader, version, diagnostics)?;
    let plan = plan_fine_columns(table, &header);
    // Column 0 is always read as time.
    let value_positions: Vec<usize> = plan.keep.iter().copied().filter(|&p| p != 0).collect();
    let mut offset = 0.0;
    while let Some(line) = reader.next_line()? {
        if is_overwide(&reader, &line, plan.width, diagnostics) {
            continue;
        }
        if line.first_token() == settings.time_label {
            if version == HeaderVersion::Extended {
                reader.skip_lines(EXTENDED_METADATA_LINES)?;
            }
            // A repeated header before any data is just part of the header.
            if let Some(Value::Number(last)) = table.rows().last().and_then(|row| row.first()) {
                offset = *last;
                table.record_restart(offset);
                debug!(
                    "{}:{}: logger restart, offset {offset}",
                    reader.path().display(),
                    line.number
                );
            }
            continue;
        }
        let Some(time) = parse_time(&reader, &line, diagnostics) else {
            continue;
        };
        let time = time + offset;
        if let Some(Value::Number(previous)) = table.rows().last().and_then(|row| row.first()) {
            let ordered = matches!(
                time.partial_cmp(previous),
                Some(Ordering::Greater | Ordering::Equal)
            );
            if !ordered {
                diagnostics.record(Anomaly::NonMonotonicTime {
                    file: reader.path().to_path_buf(),
                    line: line.number,
                    time,
                    previous: *previous,
                });
                continue;
            }
        }
        let mut row: Row = Vec::with_capacity(plan.keep.len());
        row.push(Value::Number(time));
        row.extend(parse_values(&reader, &line, &value_positions, diagnostics));
        table.push_row(row);
    }
    Ok(())
}
/// Folds one slower log into the table.
fn append_slower_log<R: Read>(
    table: &mut Table,
    mut reader: LogReader<R>,
    settings: &IngestSettings,
    diagnostics: &mut Diagnostics,
) -> Result<(), FrameError> {
    let version = table.header_version();
    let header = read_header(&mut reader, version, diagnostics)?;
    let plan = plan_slower_columns(table, &header, settings, &reader);
    if plan.keep.is_empty() {
        info!("{}: no new channels to merge", reader.path().display());
        return Ok(());
    }
    let start_column = table.width() - plan.keep.len();
    let mut cursor = 0;
    let mut session = 0;
    let mut seen_data = false;
    while let Some(line) = reader.next_line()? {
        if is_overwide(&reader, &line, plan.width, diagnostics) {
            continue;
        }
        if line.first_token() == settings.time_label {
            if version == HeaderVersion::Extended {
                reader.skip_lines(EXTENDED_METADATA_LINES)?;
            }
            if seen_data {
                session += 1;
                if session >= table.restarts().len() {
                    diagnostics.record(Anomaly::RestartOffsetMissing {
                        file: reader.path().to_path_buf(),
                        line: line.number,
                    });
                }
            }
            continue;
        }
        let Some(time) = parse_time(&reader, &line, diagnostics) else {
            continue;
        };
        seen_data = true;
        let restarts = table.restarts();
        let offset = restarts
            .get(session)
            .or_else(|| restarts.last())
            .copied()
            .unwrap_or(0.0);
        let values = parse_values(&reader, &line, &plan.keep, diagnostics);
        match place_values(table.rows_mut(), cursor, time + offset, start_column, values) {
            Placement::Placed(next) => cursor = next,
            Placement::Exhausted(scanned) => {
                if scanned >= settings.abandon_after_rows {
                    diagnostics.record(Anomaly::MergeTailCorruption {
                        file: reader.path().to_path_buf(),
                        line: line.number,
                        scanned_rows: scanned,
                    });
                } else {
                    debug!(
                        "{}:{}: sample past the last fine-rate row, stopping",
                        reader.path().display(),
                        line.number
                    );
                }
                break;
            }
        }
    }
    Ok(())
}
/// The fine log keeps every column except repeated names.
fn plan_fine_columns(table: &mut Table, header: &[HeaderColumn]) -> ColumnPlan {
    let mut keep = Vec::with_capacity(header.len());
    for (position, column) in header.iter().enumerate() {
        if table
            .push_channel(&column.name, column.settings.clone())
            .is_some()
        {
            keep.push(position);
        } else {
            debug!("duplicate column {:?} at position {position} ignored", column.name);
        }
    }
    ColumnPlan {
        width: header.len(),
        keep,
    }
}
/// A slower log only contributes channels the table has not seen yet.
/// Position 0 is its own time column and never kept.
fn plan_slower_columns<R: Read>(
    table: &mut Table,
    header: &[HeaderColumn],
    settings: &IngestSettings,
    reader: &LogReader<R>,
) -> ColumnPlan {
    let mut keep = Vec::new();
    for (position, column) in header.iter().enumerate().skip(1) {
        if column.name == settings.time_label {
            continue;
        }
        if table
            .push_channel(&column.name, column.settings.clone())
            .is_some()
        {
            table.mark_fill(&column.name);
            keep.push(position);
        } else {
            debug!(
                "{}: {:?} already logged at a faster rate, dropping it",
                reader.path().display(),
                column.name
            );
        }
    }
    ColumnPlan {
        width: header.len(),
        keep,
    }
}
/// Appends `values` to the first row at or after `cursor` whose time exceeds
/// `time`. Rows passed over get absent markers in the same columns.
fn place_values(
    rows: &mut [Row],
    cursor: usize,
    time: f64,
    start_column: usize,
    values: Vec<Value>,
) -> Placement {
    let count = values.len();
    let scan_from = cursor.min(rows.len());
    for (offset, row) in rows[scan_from..].iter_mut().enumerate() {
        if row.len() < start_column {
            row.resize(start_column, Value::Absent);
        }
        if matches!(row.first(), Some(Value::Number(t)) if *t > time) {
            row.extend(values);
            return Placement::Placed(scan_from + offset + 1);
        }
        row.extend(std::iter::repeat(Value::Absent).take(count));
    }
    Placement::Exhausted(rows.len() - scan_from)
}
fn is_overwide<R: Read>(
    reader: &LogReader<R>,
    line: &LogLine,
    width: usize,
    diagnostics: &mut Diagnostics,
) -> bool {
    if line.tokens.len() <= width {
        return false;
    }
    diagnostics.record(Anomaly::OverwideLine {
        file: reader.path().to_path_buf(),
        line: line.number,
        width: line.tokens.len(),
        expected: width,
    });
    true
}
fn parse_time<R: Read>(
    reader: &LogReader<R>,
    line: &LogLine,
    diagnostics: &mut Diagnostics,
) -> Option<f64> {
    let token = line.first_token();
    match token.parse::<f64>() {
        Ok(time) if time.is_finite() => Some(time),
        _ => {
            diagnostics.record(Anomaly::MalformedTime {
                file: reader.path().to_path_buf(),
                line: line.number,
                token: token.to_owned(),
            });
            None
        }
    }
}
/// Values at the kept positions. Missing trailing tokens become absent;
/// non-numeric tokens stay as text.
fn parse_values<R: Read>(
    reader: &LogReader<R>,
    line: &LogLine,
    positions: &[usize],
    diagnostics: &mut Diagnostics,
) -> Vec<Value> {
    positions
        .iter()
        .map(|&position| match line.tokens.get(position) {
            None => Value::Absent,
            Some(token) => {
                let value = Value::from_token(token);
                if let Value::Text(text) = &value {
                    diagnostics.record(Anomaly::MalformedToken {
                        file: reader.path().to_path_buf(),
                        line: line.number,
                        column: position,
                        token: text.clone(),
                    });
                }
                value
            }
        })
        .collect()
}
