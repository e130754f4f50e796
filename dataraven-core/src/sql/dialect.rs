//! Rendering of abstract queries into dialect-specific SQL text.
//!
//! Dialects only differ in how identifiers are quoted. The logic of a query,
//! and therefore the rows it returns, is the same for every dialect.

use super::clause::{FromClause, needs_grouping};
use super::expr::{BinaryOperator, Expr};
use super::query::{Query, SelectItem};
use crate::{Result, error::DataRavenError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Words that cannot be left unquoted when used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "cast", "column", "create", "cross",
    "desc", "distinct", "else", "end", "exists", "false", "from", "full", "group", "having", "in",
    "inner", "is", "join", "left", "like", "limit", "not", "null", "on", "or", "order", "outer",
    "right", "select", "table", "then", "true", "union", "user", "when", "where", "with",
];

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// The engine's own ANSI rendering, used when no dialect is named
    #[default]
    Canonical,
    /// PostgreSQL
    Postgres,
    /// MySQL and MariaDB
    MySql,
    /// SQLite
    Sqlite,
}

impl std::str::FromStr for Dialect {
    type Err = DataRavenError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DataRavenError::configuration(format!(
                "Unsupported SQL dialect '{}'. Expected one of: postgres, mysql, sqlite",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn plain_identifier() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[a-z_][a-z0-9_$]*$").expect("Invalid identifier pattern")
    })
}

impl Dialect {
    /// Resolves an optional dialect name; `None` selects the canonical form.
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        name.map_or(Ok(Self::Canonical), str::parse)
    }

    /// Dialect name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Quote an identifier unconditionally.
    ///
    /// - Canonical/PostgreSQL/SQLite: `"identifier"`
    /// - MySQL: `` `identifier` ``
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Canonical | Self::Postgres | Self::Sqlite => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
        }
    }

    /// Quote an identifier only when it cannot be written bare.
    pub fn identifier(&self, ident: &str) -> String {
        if plain_identifier().is_match(ident) && !RESERVED_WORDS.contains(&ident) {
            ident.to_string()
        } else {
            self.quote_identifier(ident)
        }
    }

    /// Quote a string literal.
    pub fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Renders a query as SQL text in this dialect.
    pub fn render(&self, query: &Query) -> String {
        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }

        let items: Vec<String> = query.select.iter().map(|item| self.render_item(item)).collect();
        sql.push_str(&items.join(", "));

        if let Some(from) = &query.from {
            sql.push_str(" \nFROM ");
            sql.push_str(&self.render_from(from));
        }

        if !query.where_clause.is_empty() {
            let grouped = query.where_clause.len() > 1;
            let predicates: Vec<String> = query
                .where_clause
                .iter()
                .map(|predicate| {
                    let rendered = self.render_expr(predicate);
                    if grouped && needs_grouping(predicate) {
                        format!("({})", rendered)
                    } else {
                        rendered
                    }
                })
                .collect();
            sql.push_str(" \nWHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        if !query.group_by.is_empty() {
            let group_by: Vec<String> = query.group_by.iter().map(|e| self.render_expr(e)).collect();
            sql.push_str(" \nGROUP BY ");
            sql.push_str(&group_by.join(", "));
        }

        sql
    }

    fn render_item(&self, item: &SelectItem) -> String {
        let expr = self.render_expr(&item.expr);
        match &item.alias {
            Some(alias) => format!("{} AS {}", expr, self.identifier(alias)),
            None => expr,
        }
    }

    fn render_from(&self, from: &FromClause) -> String {
        match from {
            FromClause::Text(source) => source.clone(),
            FromClause::Subquery { query, alias } => {
                format!("({}) AS {}", self.render(query), self.identifier(alias))
            }
            FromClause::Join { left, right, on } => format!(
                "{} JOIN {} ON {}",
                self.render_from(left),
                self.render_from(right),
                self.render_expr(on)
            ),
        }
    }

    /// Renders one side of a binary operation, parenthesized when the
    /// operand would otherwise bind differently than the tree says.
    fn render_operand(&self, operand: &Expr, parent: BinaryOperator, right_side: bool) -> String {
        let rendered = self.render_expr(operand);
        let grouped = match operand {
            Expr::BinaryOp { op, .. } => {
                let (inner, outer) = (op.precedence(), parent.precedence());
                inner < outer || (inner == outer && (right_side || parent.is_comparison()))
            }
            Expr::Raw(_) => parent.is_logical(),
            _ => false,
        };

        if grouped { format!("({})", rendered) } else { rendered }
    }

    fn render_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Column { table, name } => match table {
                Some(table) => format!("{}.{}", self.identifier(table), self.identifier(name)),
                None => self.identifier(name),
            },
            Expr::Raw(sql) => sql.clone(),
            Expr::Integer(value) => value.to_string(),
            Expr::Float(value) => value.to_string(),
            Expr::Text(value) => self.quote_string(value),
            Expr::Function {
                name,
                args,
                distinct,
            } => {
                let args: Vec<String> = args.iter().map(|a| self.render_expr(a)).collect();
                let distinct = if *distinct { "DISTINCT " } else { "" };
                format!("{}({}{})", name, distinct, args.join(", "))
            }
            Expr::BinaryOp { left, op, right } => format!(
                "{} {} {}",
                self.render_operand(left, *op, false),
                op.as_sql(),
                self.render_operand(right, *op, true)
            ),
            Expr::Cast { expr, data_type } => {
                format!("CAST({} AS {})", self.render_expr(expr), data_type)
            }
            Expr::Case {
                when_clauses,
                else_clause,
            } => {
                let mut sql = String::from("CASE");
                for (condition, result) in when_clauses {
                    sql.push_str(&format!(
                        " WHEN {} THEN {}",
                        self.render_expr(condition),
                        self.render_expr(result)
                    ));
                }
                if let Some(otherwise) = else_clause {
                    sql.push_str(&format!(" ELSE {}", self.render_expr(otherwise)));
                }
                sql.push_str(" END");
                sql
            }
            Expr::Nested(inner) => format!("({})", self.render_expr(inner)),
            Expr::IsNull { expr, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {}NULL", self.render_expr(expr), not)
            }
        }
    }
}

/// Compiles a query into SQL text for a named dialect.
///
/// `None` selects the canonical rendering. Unknown names are a configuration
/// error rather than a silent fallback.
///
/// # Example
/// ```rust
/// use dataraven_core::sql::{build_select_query, compile_to_dialect};
///
/// let query = build_select_query("orders", ["id"], Vec::<&str>::new());
/// assert_eq!(compile_to_dialect(&query, Some("postgres")).unwrap(), "SELECT id \nFROM orders");
/// assert!(compile_to_dialect(&query, Some("oracle")).is_err());
/// ```
pub fn compile_to_dialect(query: &Query, dialect_name: Option<&str>) -> Result<String> {
    let dialect = Dialect::from_name(dialect_name)?;
    Ok(dialect.render(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{col, lit, qualified, raw};
    use crate::sql::query::build_select_query;

    const FROM: &str = "test_schema.Orders";

    fn strip(sql: &str) -> String {
        sql.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    #[test]
    fn test_compile_to_dialect_postgres() {
        let query = build_select_query(FROM, [raw("col1"), raw("col2")], Vec::<&str>::new());
        let sql = compile_to_dialect(&query, Some("postgres")).unwrap();
        assert_eq!(strip(&sql), strip(&format!("SELECT col1, col2 FROM {FROM}")));
    }

    #[test]
    fn test_compile_to_dialect_unknown_name() {
        let query = build_select_query(FROM, ["col1"], Vec::<&str>::new());
        let err = compile_to_dialect(&query, Some("db2")).unwrap_err();
        assert!(matches!(err, DataRavenError::Configuration { .. }));
        assert!(err.to_string().contains("db2"));
    }

    #[test]
    fn test_compile_without_dialect_is_canonical() {
        let query = build_select_query(FROM, ["col1"], Vec::<&str>::new());
        assert_eq!(compile_to_dialect(&query, None).unwrap(), query.to_string());
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::from_name(None).unwrap(), Dialect::Canonical);
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(Dialect::Postgres.identifier("order_ts"), "order_ts");
        assert_eq!(Dialect::Postgres.identifier("1"), "\"1\"");
        assert_eq!(Dialect::Postgres.identifier("a,b"), "\"a,b\"");
        assert_eq!(Dialect::Postgres.identifier("Name"), "\"Name\"");
        assert_eq!(Dialect::Postgres.identifier("user"), "\"user\"");
        assert_eq!(Dialect::MySql.identifier("1"), "`1`");
        assert_eq!(Dialect::Sqlite.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_nested_binary_ops_keep_their_grouping() {
        let render = |expr: Expr| {
            Dialect::Canonical.render(&Query::new().select(vec![SelectItem::new(expr)]))
        };

        let predicate = col("s")
            .equals(lit(1))
            .and(col("a").equals(lit(1)).or(col("b").equals(lit(1))));
        assert_eq!(render(predicate), "SELECT s = 1 AND (a = 1 OR b = 1)");

        assert_eq!(render(lit(1).minus(col("a").minus(col("b")))), "SELECT 1 - (a - b)");
        assert_eq!(render(col("a").minus(col("b")).minus(col("c"))), "SELECT a - b - c");
        assert_eq!(
            render(col("a").plus(col("b")).divided_by(col("c"))),
            "SELECT (a + b) / c"
        );
        assert_eq!(
            render(col("x").gt(lit(0)).and(raw("a = 1 OR b = 1"))),
            "SELECT x > 0 AND (a = 1 OR b = 1)"
        );
    }

    #[test]
    fn test_where_groups_compound_predicates() {
        let query = Query::new()
            .select(vec![SelectItem::new(col("a"))])
            .from(FromClause::Text("t".to_string()))
            .filter(col("s").equals(lit(1)))
            .filter(col("a").equals(lit(1)).or(col("b").equals(lit(1))));
        assert!(Dialect::Postgres
            .render(&query)
            .ends_with("WHERE s = 1 AND (a = 1 OR b = 1)"));
    }

    #[test]
    fn test_dialects_differ_only_in_quoting() {
        let query = Query::new()
            .select(vec![SelectItem::aliased(
                lit(1).minus(qualified("t", "price")).when(qualified("t", "1").gt(lit(0)).nested()),
                "a,b",
            )])
            .from(FromClause::Text("orders".to_string()))
            .filter(col("price").is_not_null());

        let postgres = Dialect::Postgres.render(&query);
        let mysql = Dialect::MySql.render(&query);

        assert!(postgres.contains("t.\"1\""));
        assert!(mysql.contains("t.`1`"));
        assert_eq!(postgres.replace('"', "`"), mysql);
    }
}
