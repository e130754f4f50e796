//! Abstract SELECT queries and the two query builders.

use super::clause::{Clause, FromClause, apply_where_clause, format_from_clause, format_select_columns};
use super::dialect::Dialect;
use super::expr::{AggregateFunc, Expr, col};

/// One entry of a SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// Selected expression
    pub expr: Expr,
    /// Output name
    pub alias: Option<String>,
}

impl SelectItem {
    /// Select an expression without an alias.
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Select an expression as `alias`.
    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self::new(expr)
    }
}

/// A dialect-neutral SELECT query.
///
/// `where_clause` holds predicates that are ANDed together in order.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Query has no effect until compiled with compile_to_dialect()"]
pub struct Query {
    /// Emit `SELECT DISTINCT`
    pub distinct: bool,
    /// SELECT list in order
    pub select: Vec<SelectItem>,
    /// FROM source; `None` selects constants
    pub from: Option<FromClause>,
    /// Predicates ANDed in order
    pub where_clause: Vec<Expr>,
    /// GROUP BY expressions
    pub group_by: Vec<Expr>,
}

impl Query {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SELECT list.
    pub fn select(mut self, items: Vec<impl Into<SelectItem>>) -> Self {
        self.select = items.into_iter().map(Into::into).collect();
        self
    }

    /// Add DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set the FROM source.
    pub fn from(mut self, source: FromClause) -> Self {
        self.from = Some(source);
        self
    }

    /// Add a WHERE predicate (ANDed with existing predicates).
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.where_clause.push(predicate);
        self
    }

    /// Set the GROUP BY clause.
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Dialect::Canonical.render(self))
    }
}

/// Builds `SELECT columns FROM from_clause [WHERE ...]`.
///
/// Columns keep their call order. The WHERE clause is omitted entirely when
/// `where_clause` yields no predicates.
///
/// # Example
/// ```rust
/// use dataraven_core::sql::build_select_query;
///
/// let query = build_select_query("orders", ["id", "price"], ["price > 0"]);
/// assert_eq!(query.to_string(), "SELECT id, price \nFROM orders \nWHERE price > 0");
/// ```
pub fn build_select_query<F, I, C, W, P>(from_clause: F, columns: I, where_clause: W) -> Query
where
    F: Into<FromClause>,
    I: IntoIterator<Item = C>,
    C: Into<Clause>,
    W: IntoIterator<Item = P>,
    P: Into<Clause>,
{
    let query = Query::new()
        .select(format_select_columns(columns))
        .from(format_from_clause(from_clause));

    apply_where_clause(query, where_clause)
}

/// Builds a grouped aggregate query.
///
/// Group columns appear in both the SELECT list and GROUP BY, in the order
/// given. Each `(name, func)` pair appends `func(name) AS name` after them,
/// so the aggregate always targets the column it is named after.
///
/// # Example
/// ```rust
/// use dataraven_core::sql::{AggregateFunc, build_aggregate_query};
///
/// let query = build_aggregate_query("orders", ["region"], [("price", AggregateFunc::Sum)]);
/// assert_eq!(
///     query.to_string(),
///     "SELECT region, sum(price) AS price \nFROM orders \nGROUP BY region"
/// );
/// ```
pub fn build_aggregate_query<F, I, C, A, N>(from_clause: F, group_columns: I, aggregates: A) -> Query
where
    F: Into<FromClause>,
    I: IntoIterator<Item = C>,
    C: Into<Clause>,
    A: IntoIterator<Item = (N, AggregateFunc)>,
    N: Into<String>,
{
    let group_columns = format_select_columns(group_columns);

    let mut select: Vec<SelectItem> = group_columns.iter().cloned().map(SelectItem::new).collect();
    select.extend(aggregates.into_iter().map(|(name, func)| {
        let name = name.into();
        SelectItem::aliased(func.apply(col(name.clone())), name)
    }));

    Query::new()
        .select(select)
        .from(format_from_clause(from_clause))
        .group_by(group_columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{col, raw};

    const FROM: &str = "test_schema.Orders";

    fn strip(sql: &str) -> String {
        sql.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    #[test]
    fn test_build_select_query() {
        let query = build_select_query(FROM, ["col1", "col2"], Vec::<&str>::new());
        assert_eq!(
            strip(&query.to_string()),
            strip(&format!("SELECT col1, col2 FROM {FROM}"))
        );
    }

    #[test]
    fn test_build_select_query_typed_where() {
        let query = build_select_query(FROM, ["col1", "col2"], [col("col3").gt(raw("0"))]);
        assert_eq!(
            strip(&query.to_string()),
            strip(&format!("SELECT col1, col2 FROM {FROM} WHERE col3 > 0"))
        );
    }

    #[test]
    fn test_build_select_query_conjoins_predicates_in_order() {
        let where_clause = vec![
            Clause::from(col("col3").gt(raw("0"))),
            Clause::from("col4 like 'A%'"),
        ];
        let query = build_select_query(FROM, ["col1", "col2"], where_clause);
        assert_eq!(
            strip(&query.to_string()),
            strip(&format!(
                "SELECT col1, col2 FROM {FROM} WHERE col3 > 0 AND (col4 like 'A%')"
            ))
        );
    }

    #[test]
    fn test_build_select_query_groups_raw_predicates() {
        let query = build_select_query("t", ["a"], ["s = 'x'", "a = 1\tOR\tb = 1"]);
        assert!(query.to_string().ends_with("WHERE (s = 'x') AND (a = 1\tOR\tb = 1)"));

        let query = build_select_query("t", ["a"], ["a = 1 OR(b = 1)"]);
        assert!(query.to_string().ends_with("WHERE a = 1 OR(b = 1)"));
    }

    #[test]
    fn test_build_aggregate_query() {
        let query = build_aggregate_query(FROM, ["col1", "col2"], [("col3", AggregateFunc::Count)]);
        assert_eq!(
            strip(&query.to_string()),
            strip(&format!(
                "SELECT col1, col2, count(col3) AS col3 FROM {FROM} GROUP BY col1, col2"
            ))
        );
    }

    #[test]
    fn test_build_aggregate_query_keeps_aggregate_order() {
        let query = build_aggregate_query(
            FROM,
            ["region"],
            [("price", AggregateFunc::Max), ("id", AggregateFunc::CountDistinct)],
        );
        assert_eq!(
            strip(&query.to_string()),
            strip(&format!(
                "SELECT region, max(price) AS price, count(DISTINCT id) AS id FROM {FROM} GROUP BY region"
            ))
        );
    }
}
