//! Boolean filter trees for WHERE clauses.
//!
//! A [`Filter`] renders to SQL text with canonical `?` placeholders and
//! exposes its parameters in exactly the order those placeholders appear.
//!
//! ```
//! use modelq::{Dialect, Filter};
//!
//! let f = Filter::unit("id", ">", 10).and(Filter::in_list("status", [1, 2]));
//! assert_eq!(
//!     f.render("", Dialect::Postgres),
//!     r#"("id" > ? AND "status" IN (?, ?))"#
//! );
//! assert_eq!(f.params().len(), 3);
//! ```

use crate::dialect::{Dialect, PLACEHOLDER};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::fmt;

/// A composable WHERE predicate.
///
/// `And`/`Or` nodes keep their children as given: combining never flattens
/// nested groups and never touches the operands' own structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `<column> <op> ?`
    Unit { name: String, op: String, value: Value },
    /// `<column> IN (?, ?, ...)`
    In { name: String, values: Vec<Value> },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn unit(name: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Unit {
            name: name.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    pub fn in_list<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter for a per-column helper: `IN` (any case) builds an IN-list
    /// from `first` and `rest`, every other operator compares against `first`.
    pub fn from_op<V: Into<Value>>(
        name: impl Into<String>,
        op: &str,
        first: V,
        rest: impl IntoIterator<Item = V>,
    ) -> Self {
        if op.trim().eq_ignore_ascii_case("IN") {
            let values = std::iter::once(first).chain(rest);
            Filter::in_list(name, values)
        } else {
            Filter::unit(name, op.trim(), first)
        }
    }

    pub fn and_all(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(children.into_iter().collect())
    }

    pub fn or_any(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(children.into_iter().collect())
    }

    /// `(self AND other)`
    pub fn and(self, other: Filter) -> Filter {
        Filter::And(vec![self, other])
    }

    /// `(self OR other)`
    pub fn or(self, other: Filter) -> Filter {
        Filter::Or(vec![self, other])
    }

    /// Render with canonical placeholders. `alias` prefixes every column
    /// reference when non-empty.
    pub fn render(&self, alias: &str, dialect: Dialect) -> String {
        let mut out = String::new();
        self.render_into(&mut out, alias, dialect);
        out
    }

    fn render_into(&self, out: &mut String, alias: &str, dialect: Dialect) {
        match self {
            Filter::Unit { name, op, .. } => {
                out.push_str(&dialect.column_name(name, alias));
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                out.push(PLACEHOLDER);
            }
            Filter::In { name, values } => {
                out.push_str(&dialect.column_name(name, alias));
                out.push_str(" IN (");
                out.push_str(&Dialect::placeholders(values.len()));
                out.push(')');
            }
            Filter::And(children) => render_group(out, children, " AND ", alias, dialect),
            Filter::Or(children) => render_group(out, children, " OR ", alias, dialect),
        }
    }

    /// Parameters in placeholder order (depth-first, left to right).
    pub fn params(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.placeholder_count());
        self.collect_params(&mut out);
        out
    }

    fn collect_params(&self, out: &mut Vec<Value>) {
        match self {
            Filter::Unit { value, .. } => out.push(value.clone()),
            Filter::In { values, .. } => out.extend(values.iter().cloned()),
            Filter::And(children) | Filter::Or(children) => {
                for child in children {
                    child.collect_params(out);
                }
            }
        }
    }

    pub fn placeholder_count(&self) -> usize {
        match self {
            Filter::Unit { .. } => 1,
            Filter::In { values, .. } => values.len(),
            Filter::And(children) | Filter::Or(children) => {
                children.iter().map(Filter::placeholder_count).sum()
            }
        }
    }

    /// Column names referenced anywhere in the tree.
    pub fn column_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Unit { name, .. } | Filter::In { name, .. } => out.push(name),
            Filter::And(children) | Filter::Or(children) => {
                for child in children {
                    child.collect_names(out);
                }
            }
        }
    }

    /// Reject trees that cannot render valid SQL.
    ///
    /// An empty IN-list is a caller error: it would otherwise render `IN ()`.
    pub fn check(&self) -> OrmResult<()> {
        match self {
            Filter::Unit { .. } => Ok(()),
            Filter::In { name, values } if values.is_empty() => {
                Err(OrmError::EmptyInList(name.clone()))
            }
            Filter::In { .. } => Ok(()),
            Filter::And(children) if children.is_empty() => Err(OrmError::EmptyFilterGroup("AND")),
            Filter::Or(children) if children.is_empty() => Err(OrmError::EmptyFilterGroup("OR")),
            Filter::And(children) | Filter::Or(children) => {
                children.iter().try_for_each(Filter::check)
            }
        }
    }
}

fn render_group(out: &mut String, children: &[Filter], sep: &str, alias: &str, dialect: Dialect) {
    out.push('(');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        child.render_into(out, alias, dialect);
    }
    out.push(')');
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("", Dialect::Postgres))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_with_alias() {
        let f = Filter::unit("id", "=", 1);
        let sql = f.render("User", Dialect::Postgres);
        assert!(sql.ends_with(r#""User"."id" = ?"#));
        assert_eq!(f.params(), vec![Value::Int(1)]);
    }

    #[test]
    fn unit_without_alias_mysql() {
        let f = Filter::unit("name", "LIKE", "a%");
        assert_eq!(f.render("", Dialect::MySql), "`name` LIKE ?");
    }

    #[test]
    fn in_list_preserves_order() {
        let f = Filter::in_list("id", [10, 20, 30]);
        assert_eq!(f.render("", Dialect::Postgres), r#""id" IN (?, ?, ?)"#);
        assert_eq!(
            f.params(),
            vec![Value::Int(10), Value::Int(20), Value::Int(30)]
        );
    }

    #[test]
    fn and_concatenates_params() {
        let f1 = Filter::in_list("a", [1, 2]);
        let f2 = Filter::unit("b", "<", 3).or(Filter::unit("c", ">", 4));
        let mut expected = f1.params();
        expected.extend(f2.params());
        assert_eq!(f1.clone().and(f2.clone()).params(), expected);
    }

    #[test]
    fn nesting_is_not_flattened() {
        let f = Filter::unit("a", "=", 1)
            .and(Filter::unit("b", "=", 2))
            .and(Filter::unit("c", "=", 3));
        assert_eq!(
            f.render("", Dialect::MySql),
            "((`a` = ? AND `b` = ?) AND `c` = ?)"
        );
    }

    #[test]
    fn or_group_with_alias() {
        let f = Filter::or_any([
            Filter::unit("a", "=", 1),
            Filter::in_list("b", ["x", "y"]),
            Filter::unit("c", "!=", 0),
        ]);
        assert_eq!(
            f.render("t", Dialect::Postgres),
            r#"("t"."a" = ? OR "t"."b" IN (?, ?) OR "t"."c" != ?)"#
        );
        assert_eq!(f.placeholder_count(), 4);
        assert_eq!(f.params().len(), 4);
    }

    #[test]
    fn from_op_dispatches_on_in() {
        let f = Filter::from_op("id", "in", 1, [2, 3]);
        assert_eq!(f, Filter::in_list("id", [1, 2, 3]));

        let f = Filter::from_op("id", ">=", 5, [6]);
        assert_eq!(f, Filter::unit("id", ">=", 5));
    }

    #[test]
    fn empty_in_list_is_rejected() {
        let f = Filter::unit("a", "=", 1).and(Filter::in_list("id", Vec::<i64>::new()));
        match f.check() {
            Err(OrmError::EmptyInList(name)) => assert_eq!(name, "id"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_group_is_a_build_error() {
        let err = Filter::unit("a", "=", 1).and(Filter::Or(Vec::new())).check().unwrap_err();
        assert!(matches!(err, OrmError::EmptyFilterGroup("OR")));
        assert!(err.is_build_error());

        let err = Filter::And(Vec::new()).check().unwrap_err();
        assert!(matches!(err, OrmError::EmptyFilterGroup("AND")));
    }

    #[test]
    fn display_uses_no_alias() {
        let f = Filter::unit("id", "=", 1);
        assert_eq!(f.to_string(), r#""id" = ?"#);
    }
}
