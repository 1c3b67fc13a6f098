//! Header layout detection and parsing for the per-rate log files.
//!
//! A Basic file starts with one line of channel names. An Extended file
//! starts with four: names, units, conversion factors and precision
//! divisors. Both may repeat their header later on when the logger restarts.
use std::io::Read;
use log::debug;
use crate::frame::channel::{ChannelSettings, UNKNOWN_UNIT};
use crate::frame::diagnostics::{Anomaly, Diagnostics};
use crate::frame::source::{LogLine, LogReader};
use crate::frame::table::HeaderVersion;
use crate::frame::FrameError;
/// Number of metadata lines an Extended header carries after the names.
pub const EXTENDED_METADATA_LINES: usize = 3;
/// A column declared by a file header.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderColumn {
    pub name: String,
    pub settings: ChannelSettings,
}
/// Classifies a log by its first data-bearing line.
///
/// Lines starting with the time label are header lines and are skipped. A
/// numeric first token means the file went straight from names to data
/// (Basic); any other text means a units line follows the names (Extended).
pub fn detect_header_version<R: Read>(
    reader: &mut LogReader<R>,
    time_label: &str,
) -> Result<HeaderVersion, FrameError> {
    while let Some(line) = reader.next_line()? {
        let first = line.first_token();
        if first == time_label {
            continue;
        }
        let version = if first.parse::<f64>().is_ok() {
            HeaderVersion::Basic
        } else {
            HeaderVersion::Extended
        };
        debug!(
            "{}: {version:?} header (decided at line {})",
            reader.path().display(),
            line.number
        );
        return Ok(version);
    }
    Err(FrameError::UndeterminedHeaderFormat {
        path: reader.path().to_path_buf(),
    })
}
/// Consumes the header lines at the top of a log and returns its columns.
pub fn read_header<R: Read>(
    reader: &mut LogReader<R>,
    version: HeaderVersion,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<HeaderColumn>, FrameError> {
    let Some(names) = reader.next_line()? else {
        return Err(FrameError::UndeterminedHeaderFormat {
            path: reader.path().to_path_buf(),
        });
    };
    let mut columns: Vec<HeaderColumn> = names
        .tokens
        .iter()
        .map(|name| HeaderColumn {
            name: name.trim().to_owned(),
            settings: ChannelSettings::default(),
        })
        .collect();
    if version == HeaderVersion::Basic {
        return Ok(columns);
    }
    let units = reader.next_line()?.map(|l| l.tokens).unwrap_or_default();
    let convs = reader.next_line()?;
    let precisions = reader.next_line()?;
    for (position, column) in columns.iter_mut().enumerate() {
        if let Some(unit) = units.get(position) {
            let unit = unit.trim();
            column.settings.unit = if unit.is_empty() {
                UNKNOWN_UNIT.to_owned()
            } else {
                unit.to_owned()
            };
        }
        column.settings.conv = metadata_factor(reader, convs.as_ref(), position, diagnostics);
        column.settings.precision =
            metadata_factor(reader, precisions.as_ref(), position, diagnostics);
    }
    Ok(columns)
}
/// Reads one conversion or precision factor, falling back to 1.
fn metadata_factor<R: Read>(
    reader: &LogReader<R>,
    line: Option<&LogLine>,
    position: usize,
    diagnostics: &mut Diagnostics,
) -> f64 {
    let Some(line) = line else {
        return 1.0;
    };
    let Some(token) = line.tokens.get(position) else {
        return 1.0;
    };
    match token.trim().parse::<f64>() {
        Ok(factor) => factor,
        Err(_) => {
            diagnostics.record(Anomaly::MalformedToken {
                file: reader.path().to_path_buf(),
                line: line.number,
                column: position,
                token: token.clone(),
            });
            1.0
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn reader(data: &str) -> LogReader<&[u8]> {
        LogReader::from_reader("100HZLOG.CSV", data.as_bytes())
    }
    #[test]
    fn numeric_first_data_line_is_basic() {
        let mut r = reader("Time,RPM\nTime,RPM\n0.01,1000\n");
        assert_eq!(
            detect_header_version(&mut r, "Time").unwrap(),
            HeaderVersion::Basic
        );
    }
    #[test]
    fn text_after_names_is_extended() {
        let mut r = reader("Time,RPM\ns,rev/min\n1,1\n1,1\n0,1000\n");
        assert_eq!(
            detect_header_version(&mut r, "Time").unwrap(),
            HeaderVersion::Extended
        );
    }
    #[test]
    fn header_only_file_is_undetermined() {
        let mut r = reader("Time,RPM\nTime,RPM\n");
        assert!(matches!(
            detect_header_version(&mut r, "Time"),
            Err(FrameError::UndeterminedHeaderFormat { .. })
        ));
        let mut empty = reader("");
        assert!(detect_header_version(&mut empty, "Time").is_err());
    }
    #[test]
    fn extended_header_fills_metadata() {
        let mut r = reader("Time,Oil\ns,psi\n1,0.145\n1000,10\n0,12\n");
        let mut diagnostics = Diagnostics::new();
        let columns = read_header(&mut r, HeaderVersion::Extended, &mut diagnostics).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].name, "Oil");
        assert_eq!(columns[1].settings.unit, "psi");
        assert_eq!(columns[1].settings.conv, 0.145);
        assert_eq!(columns[1].settings.precision, 10.0);
        assert_eq!(columns[0].settings.precision, 1000.0);
        assert!(is_default_range(&columns[1].settings));
        assert!(diagnostics.is_empty());
        // data is left for the caller
        assert_eq!(r.next_line().unwrap().unwrap().tokens, ["0", "12"]);
    }
    #[test]
    fn malformed_factor_falls_back_to_one() {
        let mut r = reader("Time,Oil\ns,psi\n1,abc\n1,1\n");
        let mut diagnostics = Diagnostics::new();
        let columns = read_header(&mut r, HeaderVersion::Extended, &mut diagnostics).unwrap();
        assert_eq!(columns[1].settings.conv, 1.0);
        assert_eq!(diagnostics.len(), 1);
    }
    #[test]
    fn basic_header_reads_one_line() {
        let mut r = reader("Time, RPM ,TPS\n0,1,2\n");
        let mut diagnostics = Diagnostics::new();
        let columns = read_header(&mut r, HeaderVersion::Basic, &mut diagnostics).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Time", "RPM", "TPS"]);
        assert!(columns.iter().all(|c| c.settings.is_factory_default()));
    }
    fn is_default_range(settings: &ChannelSettings) -> bool {
        let defaults = ChannelSettings::default();
        settings.range_low == defaults.range_low
            && settings.range_high == defaults.range_high
            && settings.max_step == defaults.max_step
            && settings.start_pos == defaults.start_pos
    }
}
