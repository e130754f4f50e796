//! Measure formulas.
//!
//! Each formula turns a source into bounded violation ratios in `[0, 1]`.
//! Ratios are guarded with `CASE WHEN total > 0`, so an empty source yields
//! NULL instead of a misleading zero.

use super::clause::{
    Clause, FromClause, apply_where_clause, format_from_clause, format_select_columns,
};
use super::expr::{AggregateFunc, Expr, lit, qualified};
use super::query::{Query, SelectItem};

/// Alias of the total row count inside measure subqueries.
const TOTAL: &str = "1";

fn count_rows() -> Expr {
    AggregateFunc::Count.apply(lit(1))
}

/// `CASE WHEN (total > 0) THEN 1 - CAST(part AS FLOAT) / total END`
fn guarded_ratio(part: Expr, total: Expr) -> Expr {
    lit(1)
        .minus(part.cast("FLOAT").divided_by(total.clone()))
        .when(total.gt(lit(0)).nested())
}

/// Label of a set-based measure: column names joined by commas, in order.
pub fn set_label<I, C>(columns: I) -> String
where
    I: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    columns
        .into_iter()
        .map(|c| c.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Computes `1 - aggregate(column) / count(*)` for every column in one scan.
///
/// The inner query counts all rows once and aggregates every column next to
/// it; the outer query turns each aggregate into a ratio named after its
/// column. With [`AggregateFunc::Count`] the result is the NULL fraction of
/// each column, with [`AggregateFunc::CountDistinct`] the duplicate fraction.
pub fn measure_proportion_each_column<F, I, C>(
    from_clause: F,
    aggregate_func: AggregateFunc,
    columns: I,
    where_clause: &[Clause],
) -> Query
where
    F: Into<FromClause>,
    I: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let columns: Vec<String> = columns.into_iter().map(|c| c.as_ref().to_string()).collect();

    let mut inner_select = vec![SelectItem::aliased(count_rows(), TOTAL)];
    inner_select.extend(columns.iter().map(|name| {
        SelectItem::aliased(aggregate_func.apply(Expr::Column { table: None, name: name.clone() }), name)
    }));

    let inner = apply_where_clause(
        Query::new()
            .select(inner_select)
            .from(format_from_clause(from_clause)),
        where_clause.iter().cloned(),
    );

    let ratios: Vec<SelectItem> = columns
        .iter()
        .map(|name| {
            SelectItem::aliased(guarded_ratio(qualified("t", name), qualified("t", TOTAL)), name)
        })
        .collect();

    Query::new()
        .select(ratios)
        .from(FromClause::subquery(inner, "t"))
}

/// Computes `1 - count(DISTINCT columns) / count(*)` over a column set.
///
/// `r` counts every row, `u` counts the rows of a DISTINCT projection over
/// `columns`, and the outer query divides them. The single output column is
/// named by [`set_label`]. WHERE predicates restrict both counts.
pub fn measure_set_duplication<F, I, C>(from_clause: F, columns: I, where_clause: &[Clause]) -> Query
where
    F: Into<FromClause>,
    I: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let from_clause = format_from_clause(from_clause);
    let columns: Vec<String> = columns.into_iter().map(|c| c.as_ref().to_string()).collect();
    let label = set_label(&columns);

    let total = apply_where_clause(
        Query::new()
            .select(vec![SelectItem::aliased(count_rows(), TOTAL)])
            .from(from_clause.clone()),
        where_clause.iter().cloned(),
    );

    let distinct_rows = apply_where_clause(
        Query::new()
            .distinct()
            .select(format_select_columns(&columns))
            .from(from_clause),
        where_clause.iter().cloned(),
    );

    let unique = Query::new()
        .select(vec![SelectItem::aliased(count_rows(), TOTAL)])
        .from(FromClause::subquery(distinct_rows, "t"));

    let source = FromClause::subquery(total, "r").join(
        FromClause::subquery(unique, "u"),
        qualified("r", TOTAL).is_not_null(),
    );

    Query::new()
        .select(vec![SelectItem::aliased(
            guarded_ratio(qualified("u", TOTAL), qualified("r", TOTAL)),
            label,
        )])
        .from(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Dialect;

    const FROM: &str = "test_schema.Orders";

    fn strip(sql: &str) -> String {
        sql.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    #[test]
    fn test_measure_proportion_each_column() {
        let query = measure_proportion_each_column(FROM, AggregateFunc::Count, ["col1", "col2"], &[]);
        let target = format!(
            r#"
            SELECT
            CASE
                WHEN (t."1" > 0) THEN 1 - CAST(t.col1 AS FLOAT) / t."1"
            END AS col1,
            CASE
                WHEN (t."1" > 0) THEN 1 - CAST(t.col2 AS FLOAT) / t."1"
            END AS col2
            FROM (SELECT count(1) AS "1", count(col1) AS col1, count(col2) AS col2
            FROM {FROM}) AS t
            "#
        );
        assert_eq!(strip(&query.to_string()), strip(&target));
    }

    #[test]
    fn test_measure_proportion_distinct_with_where() {
        let query = measure_proportion_each_column(
            FROM,
            AggregateFunc::CountDistinct,
            ["id"],
            &[Clause::from("date(order_ts) = '2020-09-08'")],
        );
        let target = format!(
            r#"
            SELECT CASE WHEN (t."1" > 0) THEN 1 - CAST(t.id AS FLOAT) / t."1" END AS id
            FROM (SELECT count(1) AS "1", count(DISTINCT id) AS id
            FROM {FROM} WHERE date(order_ts) = '2020-09-08') AS t
            "#
        );
        assert_eq!(strip(&query.to_string()), strip(&target));
    }

    #[test]
    fn test_measure_set_duplication() {
        let query = measure_set_duplication(FROM, ["col1", "col2"], &[]);
        let target = format!(
            r#"
            SELECT CASE WHEN (r."1" > 0) THEN 1 - CAST(u."1" AS FLOAT) / r."1" END AS "col1,col2"
            FROM (SELECT count(1) AS "1"
            FROM {FROM}) AS r JOIN (SELECT count(1) AS "1"
            FROM (SELECT DISTINCT col1, col2
            FROM {FROM}) AS t) AS u ON r."1" IS NOT NULL
            "#
        );
        assert_eq!(strip(&query.to_string()), strip(&target));
    }

    #[test]
    fn test_measure_set_duplication_filters_both_scans() {
        let query = measure_set_duplication(FROM, ["col1", "col2"], &[Clause::from("col3 > 0")]);
        let sql = query.to_string();
        assert_eq!(sql.matches("WHERE col3 > 0").count(), 2);
    }

    #[test]
    fn test_set_label_preserves_order() {
        assert_eq!(set_label(["last_name", "first_name"]), "last_name,first_name");
    }

    #[test]
    fn test_mysql_measure_quotes_with_backticks() {
        let query = measure_set_duplication(FROM, ["a", "b"], &[]);
        let sql = Dialect::MySql.render(&query);
        assert!(sql.contains("AS `a,b`"));
        assert!(sql.contains("r.`1` IS NOT NULL"));
    }
}
