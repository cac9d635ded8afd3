use modelq::Dialect;

/// Rust field type for a column's database type.
///
/// Only types with a `modelq::FromCell` impl are produced; anything
/// unrecognized decodes as `String`.
pub fn map_field_type(dialect: Dialect, data_type: &str) -> &'static str {
    let t = normalize_type(data_type);
    match dialect {
        Dialect::Postgres => map_pg(&t),
        Dialect::MySql => map_mysql(&t),
    }
}

fn map_pg(t: &str) -> &'static str {
    match t {
        "bigint" | "int8" | "bigserial" | "serial8" => "i64",
        "integer" | "int" | "int4" | "smallint" | "int2" | "serial" | "serial4" | "smallserial"
        | "serial2" => "i32",
        "real" | "float4" | "double precision" | "float8" | "numeric" | "decimal" => "f64",
        "boolean" | "bool" => "bool",
        "timestamp" | "timestamptz" | "date" => "chrono::NaiveDateTime",
        "bytea" => "Vec<u8>",
        _ => "String",
    }
}

fn map_mysql(t: &str) -> &'static str {
    // `int unsigned`, `tinyint zerofill`, ...
    let base = t.split_whitespace().next().unwrap_or_default();
    match base {
        "bigint" => "i64",
        "int" | "integer" | "tinyint" | "smallint" | "mediumint" => "i32",
        "decimal" | "float" | "double" => "f64",
        "datetime" | "timestamp" | "date" => "chrono::NaiveDateTime",
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => "Vec<u8>",
        _ => "String",
    }
}

/// Lowercase, strip `(...)` typmods and compress whitespace.
pub fn normalize_type(data_type: &str) -> String {
    let mut s = data_type.trim().to_lowercase();

    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    match s.as_str() {
        "character varying" => "varchar".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        "timestamp without time zone" => "timestamp".to_string(),
        "time with time zone" => "timetz".to_string(),
        "time without time zone" => "time".to_string(),
        _ => s,
    }
}
