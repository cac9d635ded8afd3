//! Value binding and text rendering for `tokio-postgres`.
//!
//! Parameters are bound by the target column type reported by the server,
//! so a [`Value::Text`] can feed an integer or timestamp column the same way
//! a MySQL driver would coerce it. Result cells go the other way: every
//! column is rendered to its text form, matching what
//! [`crate::row`] converters expect.

use crate::row::parse_time;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || ty.name() == "citext"
}

fn bind_int(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => v.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        Type::BOOL => (v != 0).to_sql(ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind integer to column of type {ty}").into()),
    }
}

fn bind_float(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => v.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(v)?.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 if v.fract() == 0.0 => bind_int(v as i64, ty, out),
        _ if is_text(ty) => v.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind float {v} to column of type {ty}").into()),
    }
}

fn bind_time(t: &NaiveDateTime, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::TIMESTAMP => t.to_sql(ty, out),
        Type::TIMESTAMPTZ => {
            let local = Local
                .from_local_datetime(t)
                .earliest()
                .ok_or_else(|| format!("local time {t} does not exist"))?;
            local.with_timezone(&Utc).to_sql(ty, out)
        }
        Type::DATE => t.date().to_sql(ty, out),
        Type::TIME => t.time().to_sql(ty, out),
        _ if is_text(ty) => t.format(TIMESTAMP_FORMAT).to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind timestamp to column of type {ty}").into()),
    }
}

fn bind_text(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => bind_int(s.trim().parse()?, ty, out),
        Type::FLOAT4 | Type::FLOAT8 => bind_float(s.trim().parse()?, ty, out),
        Type::NUMERIC => Decimal::from_str(s.trim())?.to_sql(ty, out),
        Type::BOOL => matches!(s.trim(), "1" | "t" | "T" | "TRUE" | "true" | "True").to_sql(ty, out),
        Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE | Type::TIME => {
            let t = parse_time(s.as_bytes()).ok_or_else(|| format!("invalid time value '{s}'"))?;
            bind_time(&t, ty, out)
        }
        Type::UUID => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        // Text-like and enum labels share the raw UTF-8 wire form.
        _ => {
            out.extend_from_slice(s.as_bytes());
            Ok(IsNull::No)
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ => bind_int(i64::from(*b), ty, out),
            },
            Value::Int(v) => bind_int(*v, ty, out),
            Value::Float(v) => bind_float(*v, ty, out),
            Value::Text(s) => bind_text(s, ty, out),
            Value::Bytes(b) => match *ty {
                Type::BYTEA => b.as_slice().to_sql(ty, out),
                _ => bind_text(&String::from_utf8_lossy(b), ty, out),
            },
            Value::Time(t) => bind_time(t, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// A result cell rendered as text bytes. SQL NULL decodes to an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextCell(pub Vec<u8>);

fn render(ty: &Type, raw: &[u8]) -> Result<Vec<u8>, BoxError> {
    let text = match *ty {
        Type::BOOL => bool::from_sql(ty, raw)?.to_string(),
        Type::INT2 => i16::from_sql(ty, raw)?.to_string(),
        Type::INT4 => i32::from_sql(ty, raw)?.to_string(),
        Type::INT8 => i64::from_sql(ty, raw)?.to_string(),
        Type::OID => u32::from_sql(ty, raw)?.to_string(),
        Type::FLOAT4 => f32::from_sql(ty, raw)?.to_string(),
        Type::FLOAT8 => f64::from_sql(ty, raw)?.to_string(),
        Type::NUMERIC => Decimal::from_sql(ty, raw)?.to_string(),
        Type::TIMESTAMP => NaiveDateTime::from_sql(ty, raw)?
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        Type::TIMESTAMPTZ => DateTime::<Utc>::from_sql(ty, raw)?
            .with_timezone(&Local)
            .naive_local()
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        Type::DATE => NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string(),
        Type::TIME => NaiveTime::from_sql(ty, raw)?.format("%H:%M:%S%.f").to_string(),
        Type::UUID => uuid::Uuid::from_sql(ty, raw)?.to_string(),
        Type::JSON | Type::JSONB => serde_json::Value::from_sql(ty, raw)?.to_string(),
        Type::BYTEA => return Ok(raw.to_vec()),
        _ if is_text(ty) => return Ok(raw.to_vec()),
        _ => {
            return match ty.kind() {
                Kind::Domain(base) => render(base, raw),
                Kind::Enum(_) => Ok(raw.to_vec()),
                _ => Err(format!("unsupported column type {ty}").into()),
            };
        }
    };
    Ok(text.into_bytes())
}

impl<'a> FromSql<'a> for TextCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        render(ty, raw).map(TextCell)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(TextCell::default())
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn bound(value: &Value, ty: &Type) -> (IsNull, Vec<u8>) {
        let mut out = BytesMut::new();
        let is_null = value.to_sql(ty, &mut out).unwrap();
        (is_null, out.to_vec())
    }

    #[test]
    fn null_binds_as_null() {
        let (is_null, bytes) = bound(&Value::Null, &Type::INT4);
        assert!(matches!(is_null, IsNull::Yes));
        assert!(bytes.is_empty());
    }

    #[test]
    fn int_binds_by_column_width() {
        assert_eq!(bound(&Value::Int(7), &Type::INT2).1, 7i16.to_be_bytes());
        assert_eq!(bound(&Value::Int(7), &Type::INT4).1, 7i32.to_be_bytes());
        assert_eq!(bound(&Value::Int(7), &Type::INT8).1, 7i64.to_be_bytes());
        assert_eq!(bound(&Value::Int(7), &Type::TEXT).1, b"7");

        let mut out = BytesMut::new();
        assert!(Value::Int(1 << 40).to_sql(&Type::INT4, &mut out).is_err());
    }

    #[test]
    fn text_is_parsed_for_typed_columns() {
        assert_eq!(
            bound(&Value::from("42"), &Type::INT8).1,
            42i64.to_be_bytes()
        );
        assert_eq!(bound(&Value::from("true"), &Type::BOOL).1, [1u8]);
        assert_eq!(bound(&Value::from("abc"), &Type::VARCHAR).1, b"abc");

        let mut out = BytesMut::new();
        assert!(Value::from("nope").to_sql(&Type::INT4, &mut out).is_err());
    }

    #[test]
    fn cells_render_as_text() {
        let raw = 31i32.to_be_bytes();
        let cell = TextCell::from_sql(&Type::INT4, &raw).unwrap();
        assert_eq!(row::as_int(&cell.0), 31);

        let cell = TextCell::from_sql(&Type::BOOL, &[1]).unwrap();
        assert!(row::as_bool(&cell.0));

        let cell = TextCell::from_sql(&Type::TEXT, b"hello").unwrap();
        assert_eq!(cell.0, b"hello");

        let cell = TextCell::from_sql_null(&Type::INT4).unwrap();
        assert!(cell.0.is_empty());
    }

    #[test]
    fn timestamp_round_trips_through_text() {
        let t = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let (_, raw) = bound(&Value::Time(t), &Type::TIMESTAMP);
        let cell = TextCell::from_sql(&Type::TIMESTAMP, &raw).unwrap();
        assert_eq!(row::as_time(&cell.0), t);
    }
}
