//! Top-K rows per partition
//!
//! Given a relation with a partition key column and a value column, builds the
//! three layers that count each (partition, value) pair, attach the partition's
//! grand total, rank values inside their partition and keep the best `k`:
//!
//! ```text
//! SELECT key, value, count, total_count                -- filter + sort
//! FROM (
//!   SELECT key, value, count, total_count,
//!          row_number() OVER (PARTITION BY key ORDER BY count DESC) AS rn
//!   FROM (
//!     SELECT key, value, count() AS count,
//!            sum(count) OVER (PARTITION BY key) AS total_count
//!     FROM <source>
//!     GROUP BY key, value
//!   )
//! )
//! WHERE rn <= k
//! ORDER BY key ASC, count DESC
//! ```
//!
//! The total is computed over the grouped rows, so it covers every distinct
//! value of the partition and does not depend on `k`.

use crate::plan::{CompareOp, Expr, OrderExpr, SelectQuery, TableExpr, WindowExpr};

/// Output column holding the per-value count
pub const COUNT: &str = "count";
/// Output column holding the per-partition total
pub const TOTAL_COUNT: &str = "total_count";
/// Rank column, only visible between the rank and filter layers
pub const RANK: &str = "rn";

/// Builder for the top-K-per-partition pattern
#[derive(Debug, Clone, PartialEq)]
pub struct TopKPerPartition {
    partition_key: String,
    value_key: String,
    rank_by: OrderExpr,
    k: i64,
}

impl TopKPerPartition {
    /// Rank values of `value_key` inside each `partition_key` by descending count.
    ///
    /// A `k` of zero or less keeps no rows.
    pub fn new(partition_key: impl Into<String>, value_key: impl Into<String>, k: i64) -> Self {
        Self {
            partition_key: partition_key.into(),
            value_key: value_key.into(),
            rank_by: OrderExpr::desc(Expr::column(COUNT)),
            k,
        }
    }

    /// Replace the ranking order; it may refer to `count` and `total_count`
    pub fn with_rank_by(mut self, rank_by: OrderExpr) -> Self {
        self.rank_by = rank_by;
        self
    }

    /// Build all three layers on top of `source`
    pub fn build(&self, source: impl Into<TableExpr>) -> SelectQuery {
        self.filter(self.rank(self.aggregate(source)))
    }

    /// Count each (partition, value) pair and attach the partition total
    pub fn aggregate(&self, source: impl Into<TableExpr>) -> SelectQuery {
        let total = Expr::window(
            "sum",
            vec![Expr::column(COUNT)],
            WindowExpr::partitioned_by(vec![self.partition()]),
        );

        SelectQuery::new(
            vec![
                self.partition(),
                self.value(),
                Expr::alias(COUNT, Expr::call("count", vec![])),
                Expr::alias(TOTAL_COUNT, total),
            ],
            source,
        )
        .with_group_by(vec![self.partition(), self.value()])
    }

    /// Number rows inside each partition by the ranking order
    pub fn rank(&self, aggregated: SelectQuery) -> SelectQuery {
        let row_number = Expr::window(
            "row_number",
            vec![],
            WindowExpr::partitioned_by(vec![self.partition()])
                .with_order_by(vec![self.rank_by.clone()]),
        );

        let mut select = self.carried_columns();
        select.push(Expr::alias(RANK, row_number));
        SelectQuery::new(select, aggregated)
    }

    /// Keep the first `k` ranks and sort by partition, then ranking order
    pub fn filter(&self, ranked: SelectQuery) -> SelectQuery {
        SelectQuery::new(self.carried_columns(), ranked)
            .with_where(Expr::compare(
                Expr::column(RANK),
                CompareOp::LtEq,
                Expr::constant(self.k),
            ))
            .with_order_by(vec![OrderExpr::asc(self.partition()), self.rank_by.clone()])
    }

    fn partition(&self) -> Expr {
        Expr::column(&self.partition_key)
    }

    fn value(&self) -> Expr {
        Expr::column(&self.value_key)
    }

    fn carried_columns(&self) -> Vec<Expr> {
        vec![
            self.partition(),
            self.value(),
            Expr::column(COUNT),
            Expr::column(TOTAL_COUNT),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Constant, SortOrder};

    fn source() -> SelectQuery {
        SelectQuery::new(
            vec![Expr::column("key"), Expr::column("value")],
            TableExpr::table("pairs"),
        )
    }

    #[test]
    fn test_three_layers_over_source() {
        let plan = TopKPerPartition::new("key", "value", 3).build(source());
        assert_eq!(plan.depth(), 4);
        assert_eq!(plan.innermost(), &source());
    }

    #[test]
    fn test_aggregate_layer() {
        let layer = TopKPerPartition::new("key", "value", 3).aggregate(source());
        assert_eq!(layer.group_by, vec![Expr::column("key"), Expr::column("value")]);
        assert_eq!(
            layer.output_names(),
            vec![Some("key"), Some("value"), Some(COUNT), Some(TOTAL_COUNT)]
        );

        match layer.select[3].unaliased() {
            Expr::WindowFunction { name, args, over } => {
                assert_eq!(name, "sum");
                assert_eq!(args, &vec![Expr::column(COUNT)]);
                assert_eq!(over.partition_by, vec![Expr::column("key")]);
                assert!(over.order_by.is_empty());
            }
            other => panic!("expected window function, got {:?}", other),
        }
    }

    #[test]
    fn test_rank_layer_orders_by_count_desc() {
        let topk = TopKPerPartition::new("key", "value", 3);
        let layer = topk.rank(topk.aggregate(source()));
        let rank = layer.select.last().unwrap();
        assert_eq!(rank.output_name(), Some(RANK));

        match rank.unaliased() {
            Expr::WindowFunction { name, args, over } => {
                assert_eq!(name, "row_number");
                assert!(args.is_empty());
                assert_eq!(over.order_by, vec![OrderExpr::desc(Expr::column(COUNT))]);
            }
            other => panic!("expected window function, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_layer() {
        let plan = TopKPerPartition::new("key", "value", 5).build(source());
        assert_eq!(
            plan.where_clause,
            Some(Expr::compare(
                Expr::column(RANK),
                CompareOp::LtEq,
                Expr::Constant { value: Constant::Int(5) },
            ))
        );
        assert_eq!(plan.order_by[0], OrderExpr::asc(Expr::column("key")));
        assert_eq!(plan.order_by[1].order, SortOrder::Desc);
        assert!(plan.output_names().iter().all(|n| *n != Some(RANK)));
    }

    #[test]
    fn test_custom_rank_order() {
        let by_value = OrderExpr::asc(Expr::column("value"));
        let plan = TopKPerPartition::new("key", "value", 1)
            .with_rank_by(by_value.clone())
            .build(source());
        assert_eq!(plan.order_by[1], by_value);
    }
}
