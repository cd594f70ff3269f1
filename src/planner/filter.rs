//! WHERE clause of the unpivot layer

use crate::config::BreakdownConfig;
use crate::dates::ResolvedWindow;
use crate::plan::{CompareOp, Expr};
use crate::query::BreakdownQuery;

/// Restrict events to the window, the exception event and the subject.
///
/// Conjuncts keep insertion order so the generated query text is stable:
/// lower bound, upper bound, event name, subject, then the optional
/// identified-person filter.
pub fn build_where_clause(
    query: &BreakdownQuery,
    window: &ResolvedWindow,
    config: &BreakdownConfig,
) -> Expr {
    let timestamp = || Expr::column(&config.timestamp_field);

    let mut conditions = vec![
        Expr::compare(timestamp(), CompareOp::GtEq, Expr::constant(window.date_from())),
        Expr::compare(timestamp(), CompareOp::LtEq, Expr::constant(window.date_to())),
        Expr::compare(
            Expr::column(&config.event_field),
            CompareOp::Eq,
            Expr::constant(config.exception_event.as_str()),
        ),
        Expr::compare(
            Expr::field(config.property_chain(&config.subject_property)),
            CompareOp::Eq,
            Expr::constant(query.subject_id.as_str()),
        ),
    ];

    if query.filter_test_accounts {
        conditions.push(Expr::compare(
            Expr::call(
                "ifNull",
                vec![
                    Expr::field(config.property_chain(&config.identified_property)),
                    Expr::constant(false),
                ],
            ),
            CompareOp::Eq,
            Expr::constant(true),
        ));
    }

    Expr::and(conditions)
}
