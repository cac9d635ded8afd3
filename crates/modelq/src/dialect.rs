//! SQL dialect rules: identifier quoting, table naming, placeholder
//! rebinding and LIMIT syntax.
//!
//! Statements are always assembled with the canonical `?` placeholder.
//! [`Dialect::rebind`] is the last pass before the SQL text leaves the
//! builder.

use crate::error::OrmError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// The canonical placeholder used while assembling SQL.
pub const PLACEHOLDER: char = '?';

/// Supported SQL backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Backtick quoting, no schema prefix, `?` placeholders, `LIMIT start, size`.
    MySql,
    /// Double-quote quoting, schema-qualified tables, `$n` placeholders,
    /// `LIMIT size OFFSET offset`.
    Postgres,
}

impl Dialect {
    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres => '"',
        }
    }

    /// Quote an identifier. Embedded quote characters are doubled.
    pub fn quote_ident(self, name: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
        out
    }

    /// Qualified table name with an optional alias.
    ///
    /// MySQL ignores `schema` (the connection picks the database); Postgres
    /// prefixes it when non-empty.
    pub fn table_name(self, schema: &str, table: &str, alias: &str) -> String {
        let mut out = match self {
            Dialect::Postgres if !schema.is_empty() => {
                format!("{}.{}", self.quote_ident(schema), self.quote_ident(table))
            }
            _ => self.quote_ident(table),
        };
        if !alias.is_empty() {
            out.push_str(" AS ");
            out.push_str(&self.quote_ident(alias));
        }
        out
    }

    /// Column reference, prefixed with the alias when one is given.
    pub fn column_name(self, name: &str, alias: &str) -> String {
        if alias.is_empty() {
            self.quote_ident(name)
        } else {
            format!("{}.{}", self.quote_ident(alias), self.quote_ident(name))
        }
    }

    /// `n` canonical placeholders joined with `", "`.
    pub fn placeholders(n: usize) -> String {
        let mut out = String::with_capacity(n * 3);
        for i in 0..n {
            if i > 0 {
                out.push_str(", ");
            }
            out.push(PLACEHOLDER);
        }
        out
    }

    /// Rewrite canonical placeholders into this dialect's marker.
    ///
    /// Every `?` is treated literally; identifiers are already quoted and
    /// values never appear inline, so no lexical awareness is needed.
    pub fn rebind(self, sql: &str) -> String {
        match self {
            Dialect::MySql => sql.to_string(),
            Dialect::Postgres => {
                let mut out = String::with_capacity(sql.len() + 8);
                let mut idx = 0usize;
                for ch in sql.chars() {
                    if ch == PLACEHOLDER {
                        idx += 1;
                        out.push('$');
                        out.push_str(&idx.to_string());
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
        }
    }

    /// LIMIT clause text (canonical placeholders) and its params for a
    /// one-based `(start, size)` pair.
    pub fn limit_clause(self, start: i64, size: i64) -> (String, Vec<Value>) {
        match self {
            Dialect::MySql => (
                "LIMIT ?, ?".to_string(),
                vec![Value::Int(start), Value::Int(size)],
            ),
            Dialect::Postgres => (
                "LIMIT ? OFFSET ?".to_string(),
                vec![Value::Int(size), Value::Int(start.saturating_sub(1).max(0))],
            ),
        }
    }

    /// Count the placeholders in rendered (already rebound) SQL text.
    pub fn placeholder_count(self, sql: &str) -> usize {
        match self {
            Dialect::MySql => sql.matches(PLACEHOLDER).count(),
            Dialect::Postgres => {
                let bytes = sql.as_bytes();
                let mut count = 0;
                for (i, b) in bytes.iter().enumerate() {
                    if *b == b'$' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                        count += 1;
                    }
                }
                count
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(OrmError::not_supported(format!("driver '{other}'"))),
        }
    }
}
