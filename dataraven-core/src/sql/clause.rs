//! Normalization of caller-supplied columns, predicates and sources.
//!
//! Callers may hand over plain names, raw SQL fragments or already-built
//! expressions. Everything passes through [`Clause`] so that the query builder
//! and the measure formulas only ever see canonical [`Expr`] and
//! [`FromClause`] values.

use super::expr::{BinaryOperator, Expr};
use super::query::Query;

/// A column or predicate as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Plain text: a column name, or a predicate fragment such as `x > 0`
    Raw(String),
    /// An expression built with the [`super::expr`] helpers
    Compiled(Expr),
}

impl From<&str> for Clause {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

impl From<String> for Clause {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<&String> for Clause {
    fn from(value: &String) -> Self {
        Self::Raw(value.clone())
    }
}

impl From<Expr> for Clause {
    fn from(value: Expr) -> Self {
        Self::Compiled(value)
    }
}

impl Clause {
    /// Canonical column expression for this clause.
    ///
    /// Text is taken as a column name, whether it arrived as a plain string
    /// or as a raw expression fragment.
    pub fn into_column(self) -> Expr {
        match self {
            Self::Raw(name) | Self::Compiled(Expr::Raw(name)) => Expr::Column { table: None, name },
            Self::Compiled(expr) => expr,
        }
    }

    /// Canonical predicate expression for this clause.
    pub fn into_predicate(self) -> Expr {
        match self {
            Self::Raw(sql) => Expr::Raw(sql),
            Self::Compiled(expr) => expr,
        }
    }
}

/// Canonical source reference for a query's FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    /// Opaque source reference (`schema.table`, a view, ...), emitted verbatim
    Text(String),
    /// Derived table: `(SELECT ...) AS alias`
    Subquery {
        /// Inner query
        query: Box<Query>,
        /// Name the outer query uses
        alias: String,
    },
    /// `left JOIN right ON condition`
    Join {
        /// Left source
        left: Box<FromClause>,
        /// Right source
        right: Box<FromClause>,
        /// Join condition
        on: Expr,
    },
}

impl From<&str> for FromClause {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FromClause {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FromClause {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl FromClause {
    /// Wraps a query as a derived table.
    pub fn subquery(query: Query, alias: impl Into<String>) -> Self {
        Self::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        }
    }

    /// Joins this source with another on a condition.
    pub fn join(self, right: FromClause, on: Expr) -> Self {
        Self::Join {
            left: Box::new(self),
            right: Box::new(right),
            on,
        }
    }
}

/// Normalizes a source into its canonical form.
///
/// Applying it to a value that is already canonical returns it unchanged.
pub fn format_from_clause(source: impl Into<FromClause>) -> FromClause {
    source.into()
}

/// Normalizes columns into canonical column expressions, preserving order.
pub fn format_select_columns<I, C>(columns: I) -> Vec<Expr>
where
    I: IntoIterator<Item = C>,
    C: Into<Clause>,
{
    columns
        .into_iter()
        .map(|column| column.into().into_column())
        .collect()
}

/// Attaches predicates to a query's WHERE clause.
///
/// Predicates are ANDed in the order given, after any predicates the query
/// already carries. An empty sequence returns the query unchanged.
pub fn apply_where_clause<I, C>(query: Query, where_clause: I) -> Query
where
    I: IntoIterator<Item = C>,
    C: Into<Clause>,
{
    where_clause
        .into_iter()
        .map(|predicate| predicate.into().into_predicate())
        .fold(query, Query::filter)
}

/// True when a predicate must be parenthesized to survive an AND chain.
///
/// Raw fragments are opaque, so they are always grouped.
pub(crate) fn needs_grouping(predicate: &Expr) -> bool {
    match predicate {
        Expr::BinaryOp { op, .. } => op.precedence() <= BinaryOperator::And.precedence(),
        Expr::Raw(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{col, lit, raw};

    const FROM: &str = "test_schema.Orders";

    fn strip(sql: &str) -> String {
        sql.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    fn base_query() -> Query {
        Query::new()
            .select(format_select_columns(["col1", "col2"]))
            .from(format_from_clause(FROM))
    }

    #[test]
    fn test_format_from_clause() {
        let from = format_from_clause(FROM);
        assert_eq!(from, FromClause::Text(FROM.to_string()));

        let again = format_from_clause(from.clone());
        assert_eq!(again, from);
    }

    #[test]
    fn test_format_select_columns_homogenizes_inputs() {
        let from_names = format_select_columns(["col1", "col2"]);
        let from_raw = format_select_columns([raw("col1"), raw("col2")]);
        let from_columns = format_select_columns([col("col1"), col("col2")]);

        assert_eq!(from_names, vec![col("col1"), col("col2")]);
        assert_eq!(from_raw, from_names);
        assert_eq!(from_columns, from_names);
    }

    #[test]
    fn test_format_select_columns_mixed_order() {
        let columns = format_select_columns(vec![
            Clause::from("b"),
            Clause::from(col("a")),
            Clause::from(raw("c")),
        ]);
        assert_eq!(columns, vec![col("b"), col("a"), col("c")]);
    }

    #[test]
    fn test_apply_where_clause() {
        let target = strip(&format!("SELECT col1, col2 FROM {FROM} WHERE col2 > 0"));

        let query1 = apply_where_clause(base_query(), ["col2 > 0"]);
        assert_eq!(strip(&query1.to_string()), target);

        let query2 = apply_where_clause(base_query(), [raw("col2 > 0")]);
        assert_eq!(strip(&query2.to_string()), target);

        let query3 = apply_where_clause(base_query(), [col("col2").gt(raw("0"))]);
        assert_eq!(strip(&query3.to_string()), target);
    }

    #[test]
    fn test_apply_where_clause_empty_is_noop() {
        let query = apply_where_clause(base_query(), Vec::<&str>::new());
        assert_eq!(query, base_query());
        assert!(!query.to_string().contains("WHERE"));
    }

    #[test]
    fn test_apply_where_clause_groups_or_predicates() {
        let query = apply_where_clause(
            base_query(),
            vec![Clause::from("a = 1 or b = 2"), Clause::from(col("c").gt(lit(3)))],
        );
        assert!(query.to_string().contains("WHERE (a = 1 or b = 2) AND c > 3"));
    }
}
