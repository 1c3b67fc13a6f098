//! Gap-fill for the sparse columns contributed by slower logs.
//!
//! Policy: zero-order causal hold with pre-fill. Every absent slot takes the
//! most recent present value above it in the same column, so a slow sample
//! is repeated across all the fast rows that follow it until the next slow
//! sample. Slots before the first present value become `0`. Nothing is
//! interpolated between samples.
use log::debug;
use crate::frame::table::{Row, Table, Value};
/// Value used for slots above the first sample of a column.
pub const PRE_FILL: f64 = 0.0;
/// Fills every channel the merge marked as sparse.
pub fn fill_gaps(table: &mut Table) {
    let columns: Vec<(String, usize)> = table
        .fill_channels()
        .iter()
        .filter_map(|name| table.channel(name).map(|c| (name.clone(), c.index)))
        .collect();
    for (name, index) in columns {
        let filled = fill_column(table.rows_mut(), index);
        debug!("gap-filled {filled} slot(s) of {name}");
    }
}
/// Fills one column in place. Returns how many slots were absent.
pub fn fill_column(rows: &mut [Row], index: usize) -> usize {
    let mut held = Value::Number(PRE_FILL);
    let mut filled = 0;
    for row in rows.iter_mut() {
        let Some(slot) = row.get_mut(index) else {
            continue;
        };
        if slot.is_absent() {
            *slot = held.clone();
            filled += 1;
        } else {
            held = slot.clone();
        }
    }
    filled
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ChannelSettings, HeaderVersion};
    fn column(values: &[Option<f64>]) -> Vec<Row> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                vec![
                    Value::Number(i as f64),
                    v.map(Value::Number).unwrap_or(Value::Absent),
                ]
            })
            .collect()
    }
    fn values(rows: &[Row]) -> Vec<Value> {
        rows.iter().map(|row| row[1].clone()).collect()
    }
    #[test]
    fn holds_last_sample_and_prefills_zero() {
        let mut rows = column(&[None, None, Some(4.0), None, None, Some(7.0), None]);
        assert_eq!(fill_column(&mut rows, 1), 5);
        let n = Value::Number;
        assert_eq!(
            values(&rows),
            [n(0.0), n(0.0), n(4.0), n(4.0), n(4.0), n(7.0), n(7.0)]
        );
    }
    #[test]
    fn full_column_is_untouched() {
        let mut rows = column(&[Some(1.0), Some(2.0), Some(3.0)]);
        let before = rows.clone();
        assert_eq!(fill_column(&mut rows, 1), 0);
        assert_eq!(rows, before);
        // and filling twice changes nothing further
        let mut sparse = column(&[None, Some(5.0), None]);
        fill_column(&mut sparse, 1);
        let once = sparse.clone();
        fill_column(&mut sparse, 1);
        assert_eq!(sparse, once);
    }
    #[test]
    fn only_marked_channels_are_filled() {
        let mut table = Table::new(HeaderVersion::Basic, "");
        table.push_channel("Time", ChannelSettings::default());
        table.push_channel("Fast", ChannelSettings::default());
        table.push_channel("Slow", ChannelSettings::default());
        table.mark_fill("Slow");
        table.push_row(vec![Value::Number(0.0), Value::Absent, Value::Absent]);
        table.push_row(vec![Value::Number(1.0), Value::Number(1.0), Value::Number(9.0)]);
        fill_gaps(&mut table);
        assert_eq!(table.column("Fast").unwrap()[0], Value::Absent);
        assert_eq!(
            table.column("Slow").unwrap(),
            [Value::Number(0.0), Value::Number(9.0)]
        );
    }
}
