//! Conversions between [`Value`] / text cells and `mysql_async` values.

use crate::client::RawCell;
use crate::value::Value;
use chrono::{Datelike, Timelike};
use mysql_async::{Params, Value as MyValue};

pub(super) fn to_params(params: &[Value]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(to_mysql).collect())
    }
}

pub(super) fn to_mysql(value: &Value) -> MyValue {
    match value {
        Value::Null => MyValue::NULL,
        Value::Bool(v) => MyValue::Int(i64::from(*v)),
        Value::Int(v) => MyValue::Int(*v),
        Value::Float(v) => MyValue::Double(*v),
        Value::Text(v) => MyValue::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => MyValue::Bytes(v.clone()),
        Value::Time(t) => MyValue::Date(
            u16::try_from(t.year()).unwrap_or_default(),
            t.month() as u8,
            t.day() as u8,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            (t.nanosecond() / 1_000).min(999_999),
        ),
    }
}

/// Text rendering of one cell. NULL becomes an empty cell; dates use
/// `YYYY-MM-DD HH:MM:SS[.ffffff]`, times `[-]HH:MM:SS[.ffffff]`.
pub(super) fn render_cell(value: &MyValue) -> RawCell {
    match value {
        MyValue::NULL => Vec::new(),
        MyValue::Bytes(b) => b.clone(),
        MyValue::Int(v) => v.to_string().into_bytes(),
        MyValue::UInt(v) => v.to_string().into_bytes(),
        MyValue::Float(v) => v.to_string().into_bytes(),
        MyValue::Double(v) => v.to_string().into_bytes(),
        MyValue::Date(y, mo, d, h, mi, s, us) => {
            let mut out = format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}");
            push_micros(&mut out, *us);
            out.into_bytes()
        }
        MyValue::Time(negative, days, h, mi, s, us) => {
            let hours = days * 24 + u32::from(*h);
            let sign = if *negative { "-" } else { "" };
            let mut out = format!("{sign}{hours:02}:{mi:02}:{s:02}");
            push_micros(&mut out, *us);
            out.into_bytes()
        }
    }
}

fn push_micros(out: &mut String, us: u32) {
    if us > 0 {
        out.push_str(&format!(".{us:06}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use chrono::NaiveDate;

    #[test]
    fn cells_render_as_text() {
        assert!(render_cell(&MyValue::NULL).is_empty());
        assert_eq!(render_cell(&MyValue::Bytes(b"abc".to_vec())), b"abc");
        assert_eq!(render_cell(&MyValue::Int(-4)), b"-4");
        assert_eq!(render_cell(&MyValue::UInt(u64::MAX)), u64::MAX.to_string().as_bytes());
        assert_eq!(render_cell(&MyValue::Double(2.5)), b"2.5");
        assert_eq!(
            render_cell(&MyValue::Date(2024, 3, 5, 10, 11, 12, 0)),
            b"2024-03-05 10:11:12"
        );
        assert_eq!(
            render_cell(&MyValue::Date(2024, 3, 5, 0, 0, 0, 250_000)),
            b"2024-03-05 00:00:00.250000"
        );
        assert_eq!(render_cell(&MyValue::Time(true, 1, 2, 3, 4, 0)), b"-26:03:04");
    }

    #[test]
    fn rendered_dates_parse_back() {
        let cell = render_cell(&MyValue::Date(2024, 3, 5, 10, 11, 12, 500));
        let t = row::as_time(&cell);
        assert_eq!(t.to_string(), "2024-03-05 10:11:12.000500");
    }

    #[test]
    fn values_bind_to_mysql() {
        assert_eq!(to_mysql(&Value::Null), MyValue::NULL);
        assert_eq!(to_mysql(&Value::Bool(true)), MyValue::Int(1));
        assert_eq!(to_mysql(&Value::Int(7)), MyValue::Int(7));
        assert_eq!(to_mysql(&Value::Float(1.5)), MyValue::Double(1.5));
        assert_eq!(to_mysql(&Value::from("hi")), MyValue::Bytes(b"hi".to_vec()));

        let t = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_micro_opt(10, 11, 12, 42))
            .unwrap();
        assert_eq!(
            to_mysql(&Value::Time(t)),
            MyValue::Date(2024, 3, 5, 10, 11, 12, 42)
        );
    }

    #[test]
    fn empty_params_bind_nothing() {
        assert!(matches!(to_params(&[]), Params::Empty));
        match to_params(&[Value::Int(1), Value::Null]) {
            Params::Positional(values) => assert_eq!(values, vec![MyValue::Int(1), MyValue::NULL]),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
