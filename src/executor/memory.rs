//! In-memory executor over a fixed set of events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::emitter::emit_sql;
use crate::plan::SelectQuery;
use super::context::{ExecutionContext, TeamId};
use super::error::{ExecutionError, ExecutionErrorKind};
use super::eval::{evaluate_select, Frame, TableSource};
use super::result::QueryResult;
use super::value::Value;
use super::QueryExecutor;

/// Table served by [`MemoryExecutor`]
pub const EVENTS_TABLE: &str = "events";

/// A captured event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub team: TeamId,
    pub event: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn new(team: TeamId, event: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            team,
            event: event.into(),
            timestamp,
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Runs plans against events held in memory.
///
/// The plan is printed before it is evaluated so that the result and any
/// error carry the same query text a database-backed executor would report.
/// Every scan only sees the events of the context's team.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    events: Vec<Event>,
    max_rows_scanned: Option<usize>,
}

impl MemoryExecutor {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            max_rows_scanned: None,
        }
    }

    /// Fail any scan that would read more than `limit` rows
    pub fn with_max_rows_scanned(mut self, limit: usize) -> Self {
        self.max_rows_scanned = Some(limit);
        self
    }
}

/// The events table as seen by one team
struct TeamEvents<'a> {
    executor: &'a MemoryExecutor,
    team: TeamId,
}

impl TableSource for TeamEvents<'_> {
    fn scan(&self, chain: &[String]) -> Result<Frame, ExecutionError> {
        if chain.len() != 1 || chain[0] != EVENTS_TABLE {
            return Err(ExecutionError::invalid_plan(format!(
                "unknown table '{}'",
                chain.join(".")
            )));
        }

        let rows: Vec<Vec<Value>> = self
            .executor
            .events
            .iter()
            .filter(|e| e.team == self.team)
            .map(|e| {
                vec![
                    Value::Int(i64::try_from(e.team.0).unwrap_or(i64::MAX)),
                    Value::String(e.event.clone()),
                    Value::DateTime(e.timestamp),
                    Value::Map(e.properties.clone()),
                ]
            })
            .collect();

        if let Some(limit) = self.executor.max_rows_scanned {
            if rows.len() > limit {
                return Err(ExecutionError::new(
                    ExecutionErrorKind::ResourceLimit,
                    format!("scan of {} rows exceeds the limit of {}", rows.len(), limit),
                ));
            }
        }

        Ok(Frame {
            columns: ["team_id", "event", "timestamp", "properties"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows,
        })
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(
        &self,
        query: &SelectQuery,
        context: &mut ExecutionContext<'_>,
    ) -> Result<QueryResult, ExecutionError> {
        let team = context.team;
        let row_cap = context.limit_context.row_cap(query.limit);

        let query_text = context.timings.measure("print", |_| {
            emit_sql(query).map_err(|e| ExecutionError::invalid_plan(e.to_string()))
        })?;

        let frame = context
            .timings
            .measure("execute", |_| {
                evaluate_select(query, &TeamEvents { executor: self, team })
            })
            .map_err(|e| e.with_query_text(query_text.clone()))?;

        let mut rows = frame.rows;
        let has_more = rows.len() > row_cap;
        if has_more {
            warn!(
                query_type = %context.query_type,
                team = team.0,
                rows = rows.len(),
                row_cap,
                "result truncated to the row cap"
            );
            rows.truncate(row_cap);
        }
        debug!(
            query_type = %context.query_type,
            team = team.0,
            rows = rows.len(),
            "executed in memory"
        );

        Ok(QueryResult {
            columns: frame.columns,
            rows,
            has_more,
            query_text,
            timings: context.timings.to_list(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Timings;
    use crate::plan::{CompareOp, Expr, TableExpr};
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()
    }

    fn executor() -> MemoryExecutor {
        MemoryExecutor::new(vec![
            Event::new(TeamId(1), "$exception", ts(1)).with_property("$browser", "Chrome"),
            Event::new(TeamId(1), "$pageview", ts(2)),
            Event::new(TeamId(2), "$exception", ts(3)).with_property("$browser", "Safari"),
        ])
    }

    fn browsers() -> SelectQuery {
        SelectQuery::new(
            vec![Expr::alias("browser", Expr::field(["properties", "$browser"]))],
            TableExpr::table(EVENTS_TABLE),
        )
        .with_where(Expr::compare(
            Expr::column("event"),
            CompareOp::Eq,
            Expr::constant("$exception"),
        ))
    }

    #[test]
    fn test_scan_is_team_scoped() {
        let mut timings = Timings::new();
        let mut context = ExecutionContext::new(TeamId(1), "test", &mut timings);
        let result = executor().execute(&browsers(), &mut context).unwrap();

        assert_eq!(result.columns, vec!["browser"]);
        assert_eq!(result.rows, vec![vec![Value::from("Chrome")]]);
        assert!(result.query_text.contains("FROM events"));

        let keys: Vec<&str> = result.timings.iter().map(|t| t.k.as_str()).collect();
        assert_eq!(keys, vec!["./print", "./execute", "."]);
    }

    #[test]
    fn test_missing_property_is_null() {
        let query = SelectQuery::new(
            vec![Expr::field(["properties", "$os"])],
            TableExpr::table(EVENTS_TABLE),
        );
        let mut timings = Timings::new();
        let mut context = ExecutionContext::new(TeamId(1), "test", &mut timings);
        let result = executor().execute(&query, &mut context).unwrap();
        assert_eq!(result.rows, vec![vec![Value::Null], vec![Value::Null]]);
    }

    #[test]
    fn test_row_cap_applies_to_output() {
        let events = (1..=5)
            .map(|day| Event::new(TeamId(1), "$exception", ts(day)))
            .collect();
        let query = SelectQuery::new(vec![Expr::column("event")], TableExpr::table(EVENTS_TABLE))
            .with_limit(3);
        let mut timings = Timings::new();
        let mut context = ExecutionContext::new(TeamId(1), "test", &mut timings);
        let result = MemoryExecutor::new(events).execute(&query, &mut context).unwrap();
        assert_eq!(result.rows.len(), 3);
        // The query's own LIMIT already produced exactly three rows
        assert!(!result.has_more);
    }

    #[test]
    fn test_default_row_cap_marks_truncation() {
        let events = (0..150)
            .map(|_| Event::new(TeamId(1), "$exception", ts(1)))
            .collect();
        let query = SelectQuery::new(vec![Expr::column("event")], TableExpr::table(EVENTS_TABLE));
        let mut timings = Timings::new();
        let mut context = ExecutionContext::new(TeamId(1), "test", &mut timings);
        let result = MemoryExecutor::new(events).execute(&query, &mut context).unwrap();
        assert_eq!(result.rows.len(), 100);
        assert!(result.has_more);
    }

    #[test]
    fn test_scan_limit() {
        let mut timings = Timings::new();
        let mut context = ExecutionContext::new(TeamId(1), "test", &mut timings);
        let err = executor()
            .with_max_rows_scanned(1)
            .execute(&browsers(), &mut context)
            .unwrap_err();
        assert_eq!(err.kind(), ExecutionErrorKind::ResourceLimit);
        assert!(err.query_text().unwrap().contains("$exception"));
    }

    #[test]
    fn test_unknown_table() {
        let query = SelectQuery::new(vec![Expr::column("x")], TableExpr::table("persons"));
        let mut timings = Timings::new();
        let mut context = ExecutionContext::new(TeamId(1), "test", &mut timings);
        let err = executor().execute(&query, &mut context).unwrap_err();
        assert_eq!(err.kind(), ExecutionErrorKind::InvalidPlan);
        assert!(err.query_text().is_some());
    }
}
