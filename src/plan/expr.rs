//! Expression nodes for the query tree

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scalar expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    /// Literal scalar
    Constant { value: Constant },
    /// Column or property reference as a dotted path, e.g. `properties.$browser`
    Field { chain: Vec<String> },
    /// Scalar or aggregate function application
    Call { name: String, args: Vec<Expr> },
    /// Fixed-arity composite value
    Tuple { exprs: Vec<Expr> },
    /// Sequence literal
    Array { exprs: Vec<Expr> },
    /// Bind a computed expression to an output name
    Alias { alias: String, expr: Box<Expr> },
    /// Binary predicate
    CompareOperation {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// Conjunction of predicates
    And { exprs: Vec<Expr> },
    /// Windowed aggregate or ranking function
    WindowFunction {
        name: String,
        args: Vec<Expr>,
        over: WindowExpr,
    },
}

impl Expr {
    pub fn constant(value: impl Into<Constant>) -> Self {
        Expr::Constant { value: value.into() }
    }

    /// Reference a dotted path, e.g. `Expr::field(["properties", "$browser"])`
    pub fn field<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Field {
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }

    /// Reference a single unqualified column
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Field {
            chain: vec![name.into()],
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn tuple(exprs: Vec<Expr>) -> Self {
        Expr::Tuple { exprs }
    }

    pub fn array(exprs: Vec<Expr>) -> Self {
        Expr::Array { exprs }
    }

    pub fn alias(alias: impl Into<String>, expr: Expr) -> Self {
        Expr::Alias {
            alias: alias.into(),
            expr: Box::new(expr),
        }
    }

    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Expr::CompareOperation {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And { exprs }
    }

    pub fn window(name: impl Into<String>, args: Vec<Expr>, over: WindowExpr) -> Self {
        Expr::WindowFunction {
            name: name.into(),
            args,
            over,
        }
    }

    /// Name of the output column this expression produces in a SELECT list.
    ///
    /// Aliases produce their alias, field references their last path segment.
    /// Anything else is anonymous.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Expr::Alias { alias, .. } => Some(alias),
            Expr::Field { chain } => chain.last().map(String::as_str),
            _ => None,
        }
    }

    /// Strip a top-level alias, if any
    pub fn unaliased(&self) -> &Expr {
        match self {
            Expr::Alias { expr, .. } => expr.unaliased(),
            other => other,
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Bool(value)
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Constant::Float(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_string())
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Self {
        Constant::String(value)
    }
}

impl From<DateTime<Utc>> for Constant {
    fn from(value: DateTime<Utc>) -> Self {
        Constant::DateTime(value)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// An ordering key: expr ASC|DESC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExpr {
    pub expr: Expr,
    pub order: SortOrder,
}

impl OrderExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Desc,
        }
    }
}

/// The OVER (...) clause of a window function.
///
/// Both lists may be empty: an empty partition spans the whole relation, an
/// empty ordering makes aggregates cover the full partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowExpr {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderExpr>,
}

impl WindowExpr {
    pub fn partitioned_by(partition_by: Vec<Expr>) -> Self {
        Self {
            partition_by,
            order_by: Vec::new(),
        }
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderExpr>) -> Self {
        self.order_by = order_by;
        self
    }
}
