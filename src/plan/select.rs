//! SELECT query nodes

use serde::{Deserialize, Serialize};

use super::expr::{Expr, OrderExpr};

/// The single table-like source of a SELECT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableExpr {
    /// A named relation, e.g. `events`
    Table { chain: Vec<String> },
    /// A nested query
    Subquery(Box<SelectQuery>),
}

impl TableExpr {
    pub fn table(name: impl Into<String>) -> Self {
        TableExpr::Table {
            chain: vec![name.into()],
        }
    }
}

impl From<SelectQuery> for TableExpr {
    fn from(query: SelectQuery) -> Self {
        TableExpr::Subquery(Box::new(query))
    }
}

/// A relational query, nestable through `from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub select: Vec<Expr>,
    pub from: TableExpr,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl SelectQuery {
    pub fn new(select: Vec<Expr>, from: impl Into<TableExpr>) -> Self {
        Self {
            select,
            from: from.into(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn with_where(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<Expr>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_having(mut self, predicate: Expr) -> Self {
        self.having = Some(predicate);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderExpr>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The nested query this one reads from, if any
    pub fn subquery(&self) -> Option<&SelectQuery> {
        match &self.from {
            TableExpr::Subquery(inner) => Some(inner),
            TableExpr::Table { .. } => None,
        }
    }

    /// Number of SELECT layers, counting this one
    pub fn depth(&self) -> usize {
        1 + self.subquery().map(SelectQuery::depth).unwrap_or(0)
    }

    /// The innermost query of the pipeline
    pub fn innermost(&self) -> &SelectQuery {
        match self.subquery() {
            Some(inner) => inner.innermost(),
            None => self,
        }
    }

    /// Output column names, in SELECT order
    pub fn output_names(&self) -> Vec<Option<&str>> {
        self.select.iter().map(Expr::output_name).collect()
    }
}
