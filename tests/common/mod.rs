//! Shared test utilities for integration tests

#![allow(dead_code)]

use breakdown_planner::{
    parser, BreakdownConfig, BreakdownError, BreakdownQuery, BreakdownQueryRunner,
    BreakdownResponse, Event, MemoryExecutor, TeamId,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

pub const TEAM: TeamId = TeamId(1);
pub const OTHER_TEAM: TeamId = TeamId(2);
pub const ISSUE: &str = "01890f1c-issue";

/// Load a test fixture from the tests/test_data directory
pub fn load_fixture(name: &str) -> BreakdownConfig {
    let path = format!("tests/test_data/{}", name);
    parser::parse_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load test data {}: {}", name, e))
}

/// Fixed anchor time for every request
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

/// `hours` before `now()`
pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    now() - TimeDelta::hours(hours)
}

/// An exception event for `ISSUE` of `TEAM`, one hour old
pub fn exception() -> Event {
    Event::new(TEAM, "$exception", hours_ago(1)).with_property("$exception_issue_id", ISSUE)
}

/// `count` exceptions per browser, in the order given
pub fn browser_events(counts: &[(&str, usize)]) -> Vec<Event> {
    counts
        .iter()
        .flat_map(|(browser, count)| {
            (0..*count).map(move |_| exception().with_property("$browser", *browser))
        })
        .collect()
}

/// Run the full pipeline: config + query → grouped response
pub fn run_pipeline(
    config: &BreakdownConfig,
    query: BreakdownQuery,
    events: Vec<Event>,
) -> Result<BreakdownResponse, BreakdownError> {
    let runner = BreakdownQueryRunner::new(query, TEAM, config, now())?;
    runner.calculate(&MemoryExecutor::new(events))
}
