//! Expression AST for measurement queries.
//!
//! Expressions are dialect-neutral; [`super::Dialect`] decides how identifiers
//! and literals are spelled when a query is compiled.

use serde::{Deserialize, Serialize};

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        /// Qualifying table or alias
        table: Option<String>,
        /// Column name
        name: String,
    },

    /// Caller-supplied SQL fragment, emitted verbatim
    Raw(String),

    /// Integer literal
    Integer(i64),

    /// Floating point literal
    Float(f64),

    /// String literal
    Text(String),

    /// Function call: name(args...)
    Function {
        /// Function name
        name: String,
        /// Arguments in order
        args: Vec<Expr>,
        /// Emit `DISTINCT` before the arguments
        distinct: bool,
    },

    /// Binary operation: left op right
    BinaryOp {
        /// Left operand
        left: Box<Expr>,
        /// Operator
        op: BinaryOperator,
        /// Right operand
        right: Box<Expr>,
    },

    /// CAST(expr AS data_type)
    Cast {
        /// Value to convert
        expr: Box<Expr>,
        /// Target type, emitted verbatim
        data_type: String,
    },

    /// CASE WHEN ... THEN ... [ELSE ...] END
    Case {
        /// `WHEN condition THEN value` pairs in order
        when_clauses: Vec<(Expr, Expr)>,
        /// `ELSE` value
        else_clause: Option<Box<Expr>>,
    },

    /// Parenthesized expression
    Nested(Box<Expr>),

    /// IS NULL / IS NOT NULL
    IsNull {
        /// Tested expression
        expr: Box<Expr>,
        /// `IS NOT NULL` when set
        negated: bool,
    },
}

/// Binary operators used by predicates and measure formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `LIKE`
    Like,
}

impl BinaryOperator {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Like => "LIKE",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::Like => 3,
            Self::Plus | Self::Minus => 4,
            Self::Multiply | Self::Divide => 5,
        }
    }

    /// `AND` / `OR`.
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Comparisons do not chain, so equal-precedence operands are grouped.
    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }
}

/// Aggregate functions available to aggregate queries and measure formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunc {
    /// count(col) - non-NULL values
    Count,
    /// count(DISTINCT col) - distinct non-NULL values
    CountDistinct,
    /// `sum`
    Sum,
    /// `avg`
    Avg,
    /// `min`
    Min,
    /// `max`
    Max,
}

impl AggregateFunc {
    /// Function name as rendered in SQL.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count | Self::CountDistinct => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Applies the aggregate to an expression.
    pub fn apply(&self, expr: Expr) -> Expr {
        Expr::Function {
            name: self.name().to_string(),
            args: vec![expr],
            distinct: matches!(self, Self::CountDistinct),
        }
    }
}

/// Unqualified column reference.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column {
        table: None,
        name: name.into(),
    }
}

/// Column reference qualified by a table or subquery alias.
pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        name: name.into(),
    }
}

/// Verbatim SQL fragment.
pub fn raw(sql: impl Into<String>) -> Expr {
    Expr::Raw(sql.into())
}

/// Integer literal.
pub fn lit(value: i64) -> Expr {
    Expr::Integer(value)
}

impl Expr {
    fn binary(self, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// self = right
    pub fn equals(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Eq, right)
    }

    /// self > right
    pub fn gt(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Gt, right)
    }

    /// self < right
    pub fn lt(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Lt, right)
    }

    /// self + right
    pub fn plus(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Plus, right)
    }

    /// self - right
    pub fn minus(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Minus, right)
    }

    /// self / right
    pub fn divided_by(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Divide, right)
    }

    /// self AND right
    pub fn and(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::And, right)
    }

    /// self OR right
    pub fn or(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Or, right)
    }

    /// self LIKE right
    pub fn like(self, right: Expr) -> Expr {
        self.binary(BinaryOperator::Like, right)
    }

    /// CAST(self AS data_type)
    pub fn cast(self, data_type: impl Into<String>) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            data_type: data_type.into(),
        }
    }

    /// self IS NOT NULL
    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// self IS NULL
    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// (self)
    pub fn nested(self) -> Expr {
        Expr::Nested(Box::new(self))
    }

    /// CASE WHEN condition THEN self END
    pub fn when(self, condition: Expr) -> Expr {
        Expr::Case {
            when_clauses: vec![(condition, self)],
            else_clause: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_apply() {
        assert_eq!(
            AggregateFunc::CountDistinct.apply(col("id")),
            Expr::Function {
                name: "count".to_string(),
                args: vec![col("id")],
                distinct: true,
            }
        );
        assert_eq!(AggregateFunc::Avg.name(), "avg");
    }

    #[test]
    fn test_aggregate_func_deserialize() {
        let func: AggregateFunc = serde_json::from_str("\"count_distinct\"").unwrap();
        assert_eq!(func, AggregateFunc::CountDistinct);
    }

    #[test]
    fn test_case_builder() {
        let expr = lit(1).when(col("n").gt(lit(0)));
        assert!(matches!(expr, Expr::Case { ref when_clauses, else_clause: None } if when_clauses.len() == 1));
    }
}
