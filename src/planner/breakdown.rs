//! Breakdown plan building logic

use tracing::debug;

use crate::config::{BreakdownConfig, BREAKDOWN_NULL_VALUE};
use crate::dates::ResolvedWindow;
use crate::plan::{Expr, SelectQuery, TableExpr};
use crate::query::BreakdownQuery;
use super::error::PlanError;
use super::filter::build_where_clause;
use super::topk::TopKPerPartition;

/// Exploded `(property, value)` tuple produced by the unpivot layer
pub const BREAKDOWN_TUPLE: &str = "breakdown_tuple";
/// Property name column
pub const BREAKDOWN_PROPERTY: &str = "breakdown_property";
/// Property value column
pub const BREAKDOWN_VALUE: &str = "breakdown_value";

/// Build the five-layer breakdown query.
///
/// 1. unpivot: one `(property, value)` tuple per requested property, exploded
///    into rows with `arrayJoin`, over the filtered events
/// 2. decompose: split the tuple into `breakdown_property`, `breakdown_value`
/// 3. aggregate: count per pair plus the per-property total
/// 4. rank: `row_number()` per property by descending count
/// 5. filter: keep `rn <= limit`, order by property then count
///
/// Missing property values are replaced by `BREAKDOWN_NULL_VALUE` and counted
/// like any other value.
pub fn build_breakdown_query(
    query: &BreakdownQuery,
    window: &ResolvedWindow,
    config: &BreakdownConfig,
) -> Result<SelectQuery, PlanError> {
    if query.breakdown_properties.is_empty() {
        return Err(PlanError::EmptyBreakdown);
    }

    let limit = query.limit.unwrap_or(config.default_limit);

    let unpivot = build_unpivot(query, window, config);
    let decompose = build_decompose(unpivot);
    let plan = TopKPerPartition::new(BREAKDOWN_PROPERTY, BREAKDOWN_VALUE, limit).build(decompose);

    debug!(
        properties = query.breakdown_properties.len(),
        limit,
        date_from = %window.date_from(),
        date_to = %window.date_to(),
        filter_test_accounts = query.filter_test_accounts,
        "built breakdown plan"
    );

    Ok(plan)
}

fn build_unpivot(
    query: &BreakdownQuery,
    window: &ResolvedWindow,
    config: &BreakdownConfig,
) -> SelectQuery {
    let tuples: Vec<Expr> = query
        .breakdown_properties
        .iter()
        .map(|property| {
            let value = Expr::call(
                "ifNull",
                vec![
                    Expr::call(
                        "toString",
                        vec![Expr::field(config.property_chain(property))],
                    ),
                    Expr::constant(BREAKDOWN_NULL_VALUE),
                ],
            );
            Expr::tuple(vec![Expr::constant(property.as_str()), value])
        })
        .collect();

    SelectQuery::new(
        vec![Expr::alias(
            BREAKDOWN_TUPLE,
            Expr::call("arrayJoin", vec![Expr::array(tuples)]),
        )],
        TableExpr::table(&config.events_table),
    )
    .with_where(build_where_clause(query, window, config))
}

fn build_decompose(unpivot: SelectQuery) -> SelectQuery {
    let element = |index: i64| {
        Expr::call(
            "tupleElement",
            vec![Expr::column(BREAKDOWN_TUPLE), Expr::constant(index)],
        )
    };

    SelectQuery::new(
        vec![
            Expr::alias(BREAKDOWN_PROPERTY, element(1)),
            Expr::alias(BREAKDOWN_VALUE, element(2)),
        ],
        unpivot,
    )
}
