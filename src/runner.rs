//! Breakdown query runner
//!
//! Ties the pieces together for one request: validate, resolve the window,
//! build the plan, execute it and group the rows.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BreakdownConfig;
use crate::dates::{DateError, DateResolver, ResolvedWindow};
use crate::error::BreakdownError;
use crate::executor::{ExecutionContext, LimitContext, QueryExecutor, QueryTiming, TeamId, Timings};
use crate::grouper::{group_rows, GroupedBreakdownResult};
use crate::plan::SelectQuery;
use crate::planner::build_breakdown_query;
use crate::query::BreakdownQuery;

/// Label passed to the executor with every breakdown plan
pub const QUERY_TYPE: &str = "ErrorTrackingBreakdownsQuery";
/// Timing scope wrapping plan execution
pub const EXECUTE_SCOPE: &str = "error_tracking_breakdowns_hogql_execute";

/// Grouped result plus the executor's diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownResponse {
    pub results: GroupedBreakdownResult,
    pub timings: Vec<QueryTiming>,
    /// Printed form of the executed plan
    pub hogql: String,
}

/// Runs one validated breakdown request for a team
#[derive(Debug, Clone)]
pub struct BreakdownQueryRunner {
    query: BreakdownQuery,
    team: TeamId,
    config: BreakdownConfig,
    window: ResolvedWindow,
    limit_context: LimitContext,
}

impl BreakdownQueryRunner {
    /// Validate `query` and resolve its window against `now`
    pub fn new(
        query: BreakdownQuery,
        team: TeamId,
        config: &BreakdownConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, BreakdownError> {
        query.validate()?;

        let lookback = TimeDelta::try_days(config.default_lookback_days)
            .ok_or_else(|| DateError::OutOfRange(format!("{} days", config.default_lookback_days)))?;
        let window = DateResolver::new(now)
            .with_lookback(lookback)
            .resolve_window(query.date_from(), query.date_to())?;

        Ok(Self {
            query,
            team,
            config: config.clone(),
            window,
            limit_context: LimitContext::default(),
        })
    }

    pub fn with_limit_context(mut self, limit_context: LimitContext) -> Self {
        self.limit_context = limit_context;
        self
    }

    pub fn window(&self) -> &ResolvedWindow {
        &self.window
    }

    /// The plan this runner executes
    pub fn to_query(&self) -> Result<SelectQuery, BreakdownError> {
        Ok(build_breakdown_query(&self.query, &self.window, &self.config)?)
    }

    pub fn calculate(&self, executor: &dyn QueryExecutor) -> Result<BreakdownResponse, BreakdownError> {
        let plan = self.to_query()?;

        let mut timings = Timings::new();
        let team = self.team;
        let limit_context = self.limit_context;
        let outcome = timings.measure(EXECUTE_SCOPE, |timings| {
            let mut context =
                ExecutionContext::new(team, QUERY_TYPE, timings).with_limit_context(limit_context);
            executor.execute(&plan, &mut context)
        });

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(team = team.0, kind = %err.kind(), error = %err, "breakdown query failed");
                return Err(err.with_timings(timings.to_list()).into());
            }
        };

        let rows = result
            .breakdown_rows()
            .map_err(|e| e.with_query_text(result.query_text.clone()).with_timings(timings.to_list()))?;
        let results = group_rows(&rows);

        info!(
            team = team.0,
            rows = rows.len(),
            dimensions = results.len(),
            "breakdown query finished"
        );

        Ok(BreakdownResponse {
            results,
            timings: timings.to_list(),
            hogql: result.query_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutionError, ExecutionErrorKind, QueryResult, Value};
    use crate::query::SpecError;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    struct Canned(Result<Vec<Vec<Value>>, ExecutionErrorKind>);

    impl QueryExecutor for Canned {
        fn execute(
            &self,
            _query: &SelectQuery,
            context: &mut ExecutionContext<'_>,
        ) -> Result<QueryResult, ExecutionError> {
            assert_eq!(context.query_type, QUERY_TYPE);
            context.timings.measure("execute", |_| ());
            match &self.0 {
                Ok(rows) => Ok(QueryResult {
                    columns: vec![],
                    rows: rows.clone(),
                    has_more: false,
                    query_text: "SELECT 1".to_string(),
                    timings: context.timings.to_list(),
                }),
                Err(kind) => Err(ExecutionError::new(*kind, "boom").with_query_text("SELECT 1")),
            }
        }
    }

    fn runner(query: BreakdownQuery) -> BreakdownQueryRunner {
        BreakdownQueryRunner::new(query, TeamId(1), &BreakdownConfig::default(), now()).unwrap()
    }

    #[test]
    fn test_default_window() {
        let runner = runner(BreakdownQuery::new("issue", ["$browser"]));
        assert_eq!(runner.window().date_to(), now());
        assert_eq!(runner.window().date_from(), now() - TimeDelta::days(7));
    }

    #[test]
    fn test_rejects_all_time_end() {
        let query = BreakdownQuery::new("issue", ["$browser"]).with_date_range(None, Some("all"));
        let err = BreakdownQueryRunner::new(query, TeamId(1), &BreakdownConfig::default(), now())
            .unwrap_err();
        assert!(matches!(err, BreakdownError::InvalidRange(DateError::AllTimeEnd)));
    }

    #[test]
    fn test_rejects_empty_breakdown() {
        let query = BreakdownQuery::new("issue", Vec::<String>::new());
        let err = BreakdownQueryRunner::new(query, TeamId(1), &BreakdownConfig::default(), now())
            .unwrap_err();
        assert!(matches!(err, BreakdownError::InvalidSpec(SpecError::EmptyBreakdown)));
    }

    #[test]
    fn test_groups_rows() {
        let row = |d: &str, v: &str, c: i64, t: i64| {
            vec![Value::from(d), Value::from(v), Value::Int(c), Value::Int(t)]
        };
        let executor = Canned(Ok(vec![
            row("$browser", "Chrome", 5, 8),
            row("$browser", "Firefox", 3, 8),
        ]));
        let response = runner(BreakdownQuery::new("issue", ["$browser"]))
            .calculate(&executor)
            .unwrap();

        let browser = response.results.get("$browser").unwrap();
        assert_eq!(browser.total_count, 8);
        assert_eq!(browser.values.len(), 2);
        assert_eq!(response.hogql, "SELECT 1");

        let keys: Vec<&str> = response.timings.iter().map(|t| t.k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "./error_tracking_breakdowns_hogql_execute/execute",
                "./error_tracking_breakdowns_hogql_execute",
                "."
            ]
        );
    }

    #[test]
    fn test_execution_error_keeps_diagnostics() {
        let executor = Canned(Err(ExecutionErrorKind::Timeout));
        let err = runner(BreakdownQuery::new("issue", ["$browser"]))
            .calculate(&executor)
            .unwrap_err();

        let err = match err {
            BreakdownError::Execution(err) => err,
            other => panic!("expected an execution error, got {:?}", other),
        };
        assert_eq!(err.kind(), ExecutionErrorKind::Timeout);
        assert_eq!(err.query_text(), Some("SELECT 1"));
        assert!(err
            .timings()
            .iter()
            .any(|t| t.k == "./error_tracking_breakdowns_hogql_execute"));
    }

    #[test]
    fn test_malformed_rows() {
        let executor = Canned(Ok(vec![vec![Value::Null]]));
        let err = runner(BreakdownQuery::new("issue", ["$browser"]))
            .calculate(&executor)
            .unwrap_err();
        assert!(matches!(
            err,
            BreakdownError::Execution(ref e) if e.kind() == ExecutionErrorKind::InvalidResult
        ));
    }
}
