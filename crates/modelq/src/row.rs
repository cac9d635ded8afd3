//! Typed conversion of raw result cells.
//!
//! Drivers hand every cell over as its text rendering, and SQL NULL arrives
//! as an empty cell. Converters therefore cannot tell NULL from an empty
//! value: an empty or unparsable cell becomes the type's zero value, and
//! [`as_time`] falls back to the current local time.

use crate::client::RawCell;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

const TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn text(cell: &[u8]) -> Option<&str> {
    std::str::from_utf8(cell).ok().map(str::trim)
}

/// Parsed as a 64-bit integer, then truncated to 32 bits.
pub fn as_int(cell: &[u8]) -> i32 {
    as_int64(cell) as i32
}

pub fn as_int64(cell: &[u8]) -> i64 {
    text(cell).and_then(|s| s.parse().ok()).unwrap_or_default()
}

pub fn as_float64(cell: &[u8]) -> f64 {
    text(cell).and_then(|s| s.parse().ok()).unwrap_or_default()
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn as_bool(cell: &[u8]) -> bool {
    matches!(text(cell), Some("1" | "t" | "T" | "TRUE" | "true" | "True"))
}

pub fn as_string(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}

/// Parse `YYYY-MM-DD HH:MM:SS[.fff]`, `YYYY-MM-DD` or `HH:MM:SS`; anything
/// else (including an empty cell) yields the current local time.
pub fn as_time(cell: &[u8]) -> NaiveDateTime {
    parse_time(cell).unwrap_or_else(|| Local::now().naive_local())
}

pub(crate) fn parse_time(cell: &[u8]) -> Option<NaiveDateTime> {
    let s = text(cell)?;
    if s.is_empty() {
        return None;
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return Some(NaiveDate::default().and_time(t));
    }
    None
}

pub fn as_bytes(cell: &[u8]) -> Vec<u8> {
    cell.to_vec()
}

/// Decode a raw cell into a field type.
///
/// Generated model code calls this once per projected column.
pub trait FromCell: Sized {
    fn from_cell(cell: &[u8]) -> Self;
}

impl FromCell for i32 {
    fn from_cell(cell: &[u8]) -> Self {
        as_int(cell)
    }
}

impl FromCell for i64 {
    fn from_cell(cell: &[u8]) -> Self {
        as_int64(cell)
    }
}

impl FromCell for f64 {
    fn from_cell(cell: &[u8]) -> Self {
        as_float64(cell)
    }
}

impl FromCell for bool {
    fn from_cell(cell: &[u8]) -> Self {
        as_bool(cell)
    }
}

impl FromCell for String {
    fn from_cell(cell: &[u8]) -> Self {
        as_string(cell)
    }
}

impl FromCell for NaiveDateTime {
    fn from_cell(cell: &[u8]) -> Self {
        as_time(cell)
    }
}

impl FromCell for Vec<u8> {
    fn from_cell(cell: &[u8]) -> Self {
        as_bytes(cell)
    }
}

/// Decode the cell at `idx`, treating a missing cell like NULL.
pub fn cell_at<T: FromCell>(cells: &[RawCell], idx: usize) -> T {
    T::from_cell(cells.get(idx).map(Vec::as_slice).unwrap_or_default())
}
